//! Rule traits and the node-kind dispatch registry.

use crate::context::{AnnotationSite, RuleContext};
use crate::model::MemberDeclaration;
use crate::types::Severity;
use std::sync::Arc;

/// Immutable description of a rule, defined once per rule.
///
/// The identifier is globally unique and stable: downstream tooling uses it
/// to suppress and filter findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDescriptor {
    /// Stable identifier (e.g., "RL0001").
    pub id: &'static str,
    /// Kebab-case rule name (e.g., "non-single-field-region").
    pub name: &'static str,
    /// Human-readable title.
    pub title: &'static str,
    /// Message template with positional `{0}` placeholders.
    pub message_format: &'static str,
    /// Longer description, surfaced as help text on diagnostics.
    pub description: &'static str,
    /// Category tag (e.g., "Usage").
    pub category: &'static str,
    /// Severity of diagnostics produced from this descriptor.
    pub severity: Severity,
    /// Whether the rule runs unless configuration disables it.
    pub enabled_by_default: bool,
}

/// Syntax node kinds a rule can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A member declaration (a named, typed field of a type declaration).
    Member,
    /// An annotation usage, on a member or on a type declaration.
    Annotation,
}

/// A rule evaluator.
///
/// Rules declare the node kinds they want to be invoked for and receive a
/// context bundle per visited node. Evaluators are synchronous, never block,
/// and never fail: an inapplicable node is an early return, and findings go
/// through the context's reporter. Implementations must be safe for
/// concurrent invocation across distinct nodes.
///
/// # Example
///
/// ```ignore
/// use region_lint_core::{NodeKind, Rule, RuleContext, RuleDescriptor};
///
/// struct DenyCaption;
///
/// impl Rule for DenyCaption {
///     fn descriptor(&self) -> &'static RuleDescriptor { &DESCRIPTOR }
///     fn node_kinds(&self) -> &'static [NodeKind] { &[NodeKind::Member] }
///
///     fn check_member(&self, ctx: &RuleContext<'_>, member: &MemberDeclaration) {
///         if member.name == "caption" {
///             ctx.reporter.report(&DESCRIPTOR, member.location.clone(), &[]);
///         }
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// The rule's immutable descriptor.
    fn descriptor(&self) -> &'static RuleDescriptor;

    /// Node kinds this rule wants to be invoked for.
    fn node_kinds(&self) -> &'static [NodeKind];

    /// Invoked for every visited member declaration, when registered for
    /// [`NodeKind::Member`].
    fn check_member(&self, _ctx: &RuleContext<'_>, _member: &MemberDeclaration) {}

    /// Invoked for every visited annotation usage, when registered for
    /// [`NodeKind::Annotation`].
    fn check_annotation(&self, _ctx: &RuleContext<'_>, _site: &AnnotationSite<'_>) {}
}

/// Shared handle to a rule evaluator.
pub type RuleRef = Arc<dyn Rule>;

/// Explicit dispatch table from node kind to the evaluators registered for
/// it. The traversal layer looks rules up here per visited node.
#[derive(Default)]
pub struct RuleRegistry {
    member: Vec<RuleRef>,
    annotation: Vec<RuleRef>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule under every node kind it declares.
    pub fn register(&mut self, rule: RuleRef) {
        for kind in rule.node_kinds() {
            match kind {
                NodeKind::Member => self.member.push(Arc::clone(&rule)),
                NodeKind::Annotation => self.annotation.push(Arc::clone(&rule)),
            }
        }
    }

    /// Convenience for registering an owned rule.
    pub fn register_rule<R: Rule + 'static>(&mut self, rule: R) {
        self.register(Arc::new(rule));
    }

    /// The evaluators registered for a node kind.
    #[must_use]
    pub fn rules_for(&self, kind: NodeKind) -> &[RuleRef] {
        match kind {
            NodeKind::Member => &self.member,
            NodeKind::Annotation => &self.annotation,
        }
    }

    /// Returns true if no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.member.is_empty() && self.annotation.is_empty()
    }
}
