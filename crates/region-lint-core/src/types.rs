//! Core types for diagnostics and pass results.

use miette::SourceSpan;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for reported diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail a check.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to the analysis root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in the file.
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a new location with explicit line and column.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }
}

/// A finding produced by a rule during an analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable rule identifier (e.g., "RL0001").
    pub code: String,
    /// Kebab-case rule name (e.g., "non-single-field-region").
    pub rule: String,
    /// Severity inherited from the rule descriptor.
    pub severity: Severity,
    /// Primary location of the finding.
    pub location: Location,
    /// Resolved message (template with arguments substituted).
    pub message: String,
    /// Optional help text from the rule descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            location,
            message: message.into(),
            help: None,
        }
    }

    /// Attaches help text to this diagnostic.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Formats the diagnostic for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.code,
            self.rule,
            self.location.file.display(),
            self.location.line,
            self.location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(help) = &self.help {
            let _ = writeln!(output, "  = help: {help}");
        }
        output
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// Converts a [`Diagnostic`] to a miette diagnostic for rich error display.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{message}")]
pub struct RenderedDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl From<&Diagnostic> for RenderedDiagnostic {
    fn from(d: &Diagnostic) -> Self {
        Self {
            message: format!("[{}] {}", d.code, d.message),
            help: d.help.clone(),
            span: SourceSpan::from((d.location.offset, d.location.length)),
            label_message: d.rule.clone(),
        }
    }
}

/// Result of running an analysis pass.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All diagnostics found. The set is unordered as far as rule semantics
    /// go; the host sorts by location for display only.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of files analyzed.
    pub files_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Checks if any diagnostics meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_diagnostics_at(&self, severity: Severity) -> bool {
        self.diagnostics.iter().any(|d| d.severity >= severity)
    }

    /// Counts diagnostics by severity as (errors, warnings, infos).
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let errors = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        let warnings = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        let infos = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Info)
            .count();
        (errors, warnings, infos)
    }

    /// Prints a summary report to stdout.
    pub fn print_report(&self) {
        let (errors, warnings, infos) = self.count_by_severity();

        for diagnostic in &self.diagnostics {
            println!("{}", diagnostic.format());
        }

        println!(
            "\nFound {} error(s), {} warning(s), {} info(s) in {} file(s)",
            errors, warnings, infos, self.files_checked
        );
    }

    /// Formats diagnostics as a test failure report.
    ///
    /// Produces a human-readable multi-line report suitable for `panic!()`
    /// messages in `cargo test` integration.
    #[must_use]
    pub fn format_test_report(&self, fail_on: Severity) -> String {
        use std::fmt::Write;

        let failing: Vec<&Diagnostic> = self
            .diagnostics
            .iter()
            .filter(|d| d.severity >= fail_on)
            .collect();

        let mut report = String::new();
        let _ = writeln!(
            report,
            "\n=== region-lint: {} diagnostic(s) ===\n",
            failing.len()
        );

        for d in &failing {
            let _ = writeln!(
                report,
                "{} [{}] at {}:{}:{}",
                d.rule,
                d.code,
                d.location.file.display(),
                d.location.line,
                d.location.column,
            );
            let _ = writeln!(report, "  {}: {}", d.severity, d.message);
            if let Some(help) = &d.help {
                let _ = writeln!(report, "  = help: {help}");
            }
            let _ = writeln!(report);
        }

        let (errors, warnings, infos) = self.count_by_severity();
        let _ = writeln!(
            report,
            "Total: {} error(s), {} warning(s), {} info(s) in {} file(s)",
            errors, warnings, infos, self.files_checked
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_diagnostic(severity: Severity) -> Diagnostic {
        Diagnostic::new(
            "RL0001",
            "non-single-field-region",
            severity,
            Location::new(PathBuf::from("src/models.rs"), 12, 5),
            "StringField is primarily intended for use in complex regions",
        )
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn diagnostic_format_includes_help() {
        let d = make_diagnostic(Severity::Warning).with_help("Use a single-field region");
        let formatted = d.format();
        assert!(formatted.contains("= help: Use a single-field region"));
    }

    #[test]
    fn diagnostic_format_omits_help_when_none() {
        let d = make_diagnostic(Severity::Warning);
        assert!(!d.format().contains("help:"));
    }

    #[test]
    fn diagnostic_display_has_location_and_code() {
        let d = make_diagnostic(Severity::Error);
        let display = format!("{d}");
        assert!(display.contains("src/models.rs:12:5"));
        assert!(display.contains("[RL0001]"));
    }

    #[test]
    fn rendered_diagnostic_carries_span() {
        let mut d = make_diagnostic(Severity::Error);
        d.location = d.location.clone().with_span(140, 27);
        let rendered = RenderedDiagnostic::from(&d);
        assert_eq!(rendered.span.offset(), 140);
        assert_eq!(rendered.span.len(), 27);
    }

    #[test]
    fn has_diagnostics_at_respects_threshold() {
        let mut result = LintResult::new();
        result.diagnostics.push(make_diagnostic(Severity::Warning));
        assert!(!result.has_diagnostics_at(Severity::Error));
        assert!(result.has_diagnostics_at(Severity::Warning));
        assert!(!result.has_errors());
    }

    #[test]
    fn format_test_report_filters_by_severity() {
        let mut result = LintResult::new();
        result.files_checked = 3;
        result.diagnostics.push(make_diagnostic(Severity::Warning));
        result.diagnostics.push(make_diagnostic(Severity::Error));

        let report = result.format_test_report(Severity::Error);
        assert!(report.contains("1 diagnostic(s)"));
        assert!(report.contains("1 error(s)"));
        assert!(report.contains("1 warning(s)"));
    }

    #[test]
    fn count_by_severity_buckets() {
        let mut result = LintResult::new();
        result.diagnostics.push(make_diagnostic(Severity::Error));
        result.diagnostics.push(make_diagnostic(Severity::Error));
        result.diagnostics.push(make_diagnostic(Severity::Info));
        assert_eq!(result.count_by_severity(), (2, 0, 1));
    }
}
