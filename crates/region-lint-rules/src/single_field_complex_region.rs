//! Rule against complex regions whose type declares a single field.
//!
//! # Rationale
//!
//! A complex region type exists to group several fields. When the
//! referenced type declares exactly one field-marked member, the region
//! degenerates to a wrapper around a single field and should be replaced by
//! the single-field region idiom.
//!
//! # Detected Patterns
//!
//! ```ignore
//! pub struct Gallery {
//!     #[field]
//!     pub image: ImageField,
//! }
//!
//! pub struct StandardPage {
//!     #[region]
//!     pub content: Gallery,
//! }
//! ```

use region_lint_core::annotations::members_marked_with;
use region_lint_core::well_known::{FIELD_MARKER, REGION_MARKER};
use region_lint_core::{
    AnnotationOwner, AnnotationSite, NodeKind, Rule, RuleContext, RuleDescriptor, Severity,
};

/// Rule code for single-field-complex-region.
pub const CODE: &str = "RL0002";

/// Rule name for single-field-complex-region.
pub const NAME: &str = "single-field-complex-region";

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: CODE,
    name: NAME,
    title: "Complex region holds a single field",
    message_format: "Complex region type declares a single field; use a single-field region instead",
    description: "Declare the member with the field type directly, or add the remaining fields to the region type.",
    category: "Usage",
    severity: Severity::Error,
    enabled_by_default: true,
};

/// Flags the region marker on members whose declared type is a locally
/// defined struct with exactly one field-marked member.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleFieldComplexRegion;

impl SingleFieldComplexRegion {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for SingleFieldComplexRegion {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Annotation]
    }

    fn check_annotation(&self, ctx: &RuleContext<'_>, site: &AnnotationSite<'_>) {
        let compilation = ctx.compilation;

        let Some(marker) = compilation.resolve(REGION_MARKER) else {
            return;
        };
        if !compilation.same_identity(marker, compilation.resolve_annotation(site.annotation)) {
            return;
        }

        // The marker only matters on members; regions declared on types go
        // through other framework machinery.
        let AnnotationOwner::Member { member, .. } = site.owner else {
            return;
        };

        let Some(declared) = compilation.resolve_ref(&member.ty) else {
            return;
        };
        // Types without a definition in this compilation (binary-only
        // references) cannot have their members inspected.
        let Some(decl) = compilation.definition(declared) else {
            return;
        };

        let Some(field_marker) = compilation.resolve(FIELD_MARKER) else {
            return;
        };

        if members_marked_with(compilation, decl, field_marker).len() == 1 {
            ctx.reporter
                .report(&DESCRIPTOR, member.location.clone(), &[]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use region_lint_core::well_known;
    use region_lint_core::{
        engine, CancellationToken, Compilation, Config, Diagnostic, RuleRegistry,
    };

    fn check(code: &str) -> Vec<Diagnostic> {
        check_with_externs(code, well_known::framework_exports().collect())
    }

    fn check_with_externs(code: &str, externs: Vec<&str>) -> Vec<Diagnostic> {
        let compilation = Compilation::builder()
            .extern_types(externs)
            .source("src/models.rs", code)
            .build()
            .expect("fixture should build");

        let mut registry = RuleRegistry::new();
        registry.register_rule(SingleFieldComplexRegion::new());

        engine::run(
            &compilation,
            &registry,
            &Config::default(),
            &CancellationToken::new(),
        )
        .expect("pass should complete")
    }

    #[test]
    fn single_field_region_type_is_an_error() {
        let diagnostics = check(
            r"
use cms::{field, region};
use cms::fields::ImageField;

pub struct Gallery {
    #[field]
    pub image: ImageField,
}

pub struct StandardPage {
    #[region]
    pub content: Gallery,
}
",
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, CODE);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        // Reported at the outer member, not at the region type.
        assert_eq!(diagnostics[0].location.line, 11);
    }

    #[test]
    fn two_field_region_type_is_correct_usage() {
        let diagnostics = check(
            r"
use cms::{field, region};
use cms::fields::{ImageField, StringField};

pub struct Gallery {
    #[field]
    pub image: ImageField,
    #[field]
    pub caption: StringField,
}

pub struct StandardPage {
    #[region]
    pub content: Gallery,
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn zero_marked_fields_is_not_this_rules_concern() {
        let diagnostics = check(
            r"
use cms::region;

pub struct Gallery {
    pub image: String,
}

pub struct StandardPage {
    #[region]
    pub content: Gallery,
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn only_field_marked_members_are_counted() {
        // Three members, one carrying the field marker: still a single-field
        // region by the rule's literal count.
        let diagnostics = check(
            r"
use cms::{field, region};
use cms::fields::ImageField;

pub struct Gallery {
    #[field]
    pub image: ImageField,
    pub alt_text: String,
    pub updated_at: u64,
}

pub struct StandardPage {
    #[region]
    pub content: Gallery,
}
",
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn inert_when_region_marker_is_unresolvable() {
        let diagnostics = check_with_externs(
            r"
use cms::{field, region};

pub struct Gallery {
    #[field]
    pub image: String,
}

pub struct StandardPage {
    #[region]
    pub content: Gallery,
}
",
            vec![well_known::FIELD_MARKER],
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn inert_when_field_marker_is_unresolvable() {
        let diagnostics = check_with_externs(
            r"
use cms::{field, region};

pub struct Gallery {
    #[field]
    pub image: String,
}

pub struct StandardPage {
    #[region]
    pub content: Gallery,
}
",
            vec![well_known::REGION_MARKER],
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn external_region_types_cannot_be_inspected() {
        // The declared type resolves but has no definition in this
        // compilation, so the rule is inert for the member.
        let diagnostics = check(
            r"
use cms::region;
use cms::fields::ImageField;

pub struct StandardPage {
    #[region]
    pub content: ImageField,
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn markers_on_type_declarations_are_ignored() {
        let diagnostics = check(
            r"
use cms::{field, region};

pub struct Gallery {
    #[field]
    pub image: String,
}

#[region]
pub struct StandardPage {
    pub content: Gallery,
}
",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn growing_the_region_clears_the_diagnostic() {
        let single = r"
use cms::{field, region};
use cms::fields::{ImageField, StringField};

pub struct Gallery {
    #[field]
    pub image: ImageField,
}

pub struct StandardPage {
    #[region]
    pub content: Gallery,
}
";
        let grown = r"
use cms::{field, region};
use cms::fields::{ImageField, StringField};

pub struct Gallery {
    #[field]
    pub image: ImageField,
    #[field]
    pub caption: StringField,
}

pub struct StandardPage {
    #[region]
    pub content: Gallery,
}
";
        assert_eq!(check(single).len(), 1);
        assert!(check(grown).is_empty());
    }

    #[test]
    fn passes_are_idempotent() {
        let code = r"
use cms::{field, region};

pub struct Gallery {
    #[field]
    pub image: String,
}

pub struct StandardPage {
    #[region]
    pub content: Gallery,
}
";
        assert_eq!(check(code), check(code));
    }
}
