//! # region-lint
//!
//! Static analysis for CMS content models.
//!
//! This is the main facade crate that re-exports the core framework and the
//! built-in rules.
//!
//! ## Quick Start — `cargo test` Integration
//!
//! ```toml
//! [dev-dependencies]
//! region-lint = "0.1"
//! ```
//!
//! ```rust,ignore
//! // tests/content_model.rs
//! #[test]
//! fn content_model_lint() {
//!     region_lint::runner::run_check(None, None);
//! }
//! ```
//!
//! This runs region-lint as part of `cargo test`. Configure via
//! `region-lint.toml`.
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! let result = region_lint::analyze("./src")?;
//! result.print_report();
//! ```

#![forbid(unsafe_code)]

// Re-export core types and traits
pub use region_lint_core::*;

/// Built-in rules.
pub mod rules {
    pub use region_lint_rules::*;
}

pub mod runner;

use std::path::Path;

/// Analyzes the sources under `root` with all shipped rules.
///
/// # Errors
///
/// Returns an error if discovery or analysis fails.
pub fn analyze(root: impl AsRef<Path>) -> Result<LintResult, AnalyzerError> {
    let analyzer = Analyzer::builder()
        .root(root.as_ref())
        .rules(region_lint_rules::all_rules())
        .build()?;
    analyzer.analyze()
}
