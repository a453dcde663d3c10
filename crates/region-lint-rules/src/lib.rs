//! # region-lint-rules
//!
//! Built-in region rules for region-lint.
//!
//! ## Available Rules
//!
//! | Code | Name | Severity | Description |
//! |------|------|----------|-------------|
//! | RL0001 | `non-single-field-region` | warning | Built-in field type used directly as a region |
//! | RL0002 | `single-field-complex-region` | error | Complex region whose type declares a single field |
//!
//! ## Usage
//!
//! ```ignore
//! use region_lint_core::Analyzer;
//! use region_lint_rules::all_rules;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./src")
//!     .rules(all_rules())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod non_single_field_region;
mod single_field_complex_region;

pub use non_single_field_region::NonSingleFieldRegion;
pub use single_field_complex_region::SingleFieldComplexRegion;

/// Re-export core types for convenience.
pub use region_lint_core::{Rule, RuleRef, Severity};

use std::sync::Arc;

/// All shipped rules.
#[must_use]
pub fn all_rules() -> Vec<RuleRef> {
    vec![
        Arc::new(NonSingleFieldRegion::new()),
        Arc::new(SingleFieldComplexRegion::new()),
    ]
}
