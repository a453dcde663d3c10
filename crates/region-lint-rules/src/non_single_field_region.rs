//! Rule against declaring a region from a single built-in field type.
//!
//! # Rationale
//!
//! The built-in field types (`cms::fields::*`) are primarily intended for
//! use inside complex regions. A member declared with one of them and
//! marked as a region on its own should use the single-field region form
//! instead, which renders and serializes without the extra nesting.
//!
//! # Detected Patterns
//!
//! ```ignore
//! pub struct StandardPage {
//!     #[region]
//!     pub hero: StringField,
//! }
//! ```
//!
//! # Good Patterns
//!
//! ```ignore
//! pub struct StandardPage {
//!     #[region]
//!     pub hero: HeroRegion,
//! }
//! ```

use region_lint_core::well_known::{self, BUILT_IN_FIELD_TYPES, REGION_MARKER};
use region_lint_core::{MemberDeclaration, NodeKind, Rule, RuleContext, RuleDescriptor, Severity};

/// Rule code for non-single-field-region.
pub const CODE: &str = "RL0001";

/// Rule name for non-single-field-region.
pub const NAME: &str = "non-single-field-region";

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: CODE,
    name: NAME,
    title: "Built-in field type used as a region",
    message_format: "{0} is primarily intended for use in complex regions",
    description: "Use the single-field region form, or wrap the field in a complex region type.",
    category: "Usage",
    severity: Severity::Warning,
    enabled_by_default: true,
};

/// Warns when a member whose declared type is a built-in field type carries
/// the region marker directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonSingleFieldRegion;

impl NonSingleFieldRegion {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NonSingleFieldRegion {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Member]
    }

    fn check_member(&self, ctx: &RuleContext<'_>, member: &MemberDeclaration) {
        let compilation = ctx.compilation;

        // The declared type identity is resolved once per visit.
        let Some(declared) = compilation.resolve_ref(&member.ty) else {
            return;
        };

        let Some(field_type) = BUILT_IN_FIELD_TYPES
            .iter()
            .find(|name| compilation.same_identity(declared, compilation.resolve(name)))
        else {
            return;
        };

        let Some(marker) = compilation.resolve(REGION_MARKER) else {
            return;
        };

        // Every offending annotation is flagged individually so each one
        // can be fixed on its own; no deduplication.
        for annotation in &member.annotations {
            if compilation.same_identity(marker, compilation.resolve_annotation(annotation)) {
                ctx.reporter.report(
                    &DESCRIPTOR,
                    member.location.clone(),
                    &[well_known::short_name(field_type)],
                );
            }
        }
    }
}
