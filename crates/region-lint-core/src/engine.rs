//! The dispatch engine: walks a compilation snapshot and invokes registered
//! rules per node kind.

use crate::analyzer::AnalyzerError;
use crate::compilation::Compilation;
use crate::config::Config;
use crate::context::{AnnotationOwner, AnnotationSite, CancellationToken, RuleContext};
use crate::reporter::DiagnosticBag;
use crate::rule::{NodeKind, RuleRef, RuleRegistry};
use crate::types::Diagnostic;
use tracing::debug;

/// Runs one analysis pass over `compilation`.
///
/// Each rule invocation is independent and side-effect-free except for
/// reporting. The cancellation token is checked between node visits only,
/// never inside a rule body.
///
/// # Errors
///
/// Returns [`AnalyzerError::Cancelled`] when the token is cancelled between
/// visits; diagnostics reported before that point are discarded with the
/// aborted pass.
pub fn run(
    compilation: &Compilation,
    registry: &RuleRegistry,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<Vec<Diagnostic>, AnalyzerError> {
    let member_rules = enabled_rules(registry, NodeKind::Member, config);
    let annotation_rules = enabled_rules(registry, NodeKind::Annotation, config);

    let reporter = DiagnosticBag::new();
    let ctx = RuleContext {
        compilation,
        reporter: &reporter,
    };

    for file in compilation.files() {
        debug!("Visiting {}", file.relative_path.display());
        for decl in &file.types {
            check_cancelled(cancel)?;

            for annotation in &decl.annotations {
                let site = AnnotationSite {
                    annotation,
                    owner: AnnotationOwner::Type(decl),
                };
                for rule in &annotation_rules {
                    rule.check_annotation(&ctx, &site);
                }
            }

            for member in &decl.members {
                check_cancelled(cancel)?;

                for rule in &member_rules {
                    rule.check_member(&ctx, member);
                }

                for annotation in &member.annotations {
                    let site = AnnotationSite {
                        annotation,
                        owner: AnnotationOwner::Member { decl, member },
                    };
                    for rule in &annotation_rules {
                        rule.check_annotation(&ctx, &site);
                    }
                }
            }
        }
    }

    let mut diagnostics = reporter.into_diagnostics();
    for diagnostic in &mut diagnostics {
        if let Some(severity) = config.rule_severity(&diagnostic.rule) {
            diagnostic.severity = severity;
        }
    }

    Ok(diagnostics)
}

fn enabled_rules<'r>(
    registry: &'r RuleRegistry,
    kind: NodeKind,
    config: &Config,
) -> Vec<&'r RuleRef> {
    registry
        .rules_for(kind)
        .iter()
        .filter(|rule| {
            let descriptor = rule.descriptor();
            let enabled = config.is_rule_enabled(descriptor.name, descriptor.enabled_by_default);
            if !enabled {
                debug!("Skipping disabled rule: {}", descriptor.name);
            }
            enabled
        })
        .collect()
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), AnalyzerError> {
    if cancel.is_cancelled() {
        return Err(AnalyzerError::Cancelled);
    }
    Ok(())
}
