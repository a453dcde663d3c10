//! The diagnostic reporting sink.

use crate::rule::RuleDescriptor;
use crate::types::{Diagnostic, Location};
use std::sync::{Mutex, PoisonError};

/// Accumulates diagnostics for one analysis pass.
///
/// The bag is shared by reference across all rule invocations of a pass and
/// is safe for concurrent reporting. Reporting never fails; diagnostics are
/// never retracted once appended. No ordering holds across rules beyond
/// source order within a single rule's own traversal.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a diagnostic for `rule` at `location`, substituting `args`
    /// into the descriptor's message template.
    pub fn report(&self, rule: &RuleDescriptor, location: Location, args: &[&str]) {
        let message = render_template(rule.message_format, args);
        let mut diagnostic = Diagnostic::new(rule.id, rule.name, rule.severity, location, message);
        if !rule.description.is_empty() {
            diagnostic = diagnostic.with_help(rule.description);
        }
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    /// Number of diagnostics reported so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the bag and yields the accumulated diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Substitutes positional `{0}`-style placeholders with arguments.
fn render_template(template: &str, args: &[&str]) -> String {
    let mut message = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        message = message.replace(&format!("{{{i}}}"), arg);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use std::path::PathBuf;

    static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
        id: "RL9999",
        name: "probe",
        title: "Probe",
        message_format: "{0} clashes with {1}",
        description: "Try something else.",
        category: "Usage",
        severity: Severity::Warning,
        enabled_by_default: true,
    };

    fn location() -> Location {
        Location::new(PathBuf::from("src/models.rs"), 3, 1)
    }

    #[test]
    fn report_renders_positional_arguments() {
        let bag = DiagnosticBag::new();
        bag.report(&DESCRIPTOR, location(), &["ImageField", "Gallery"]);

        let diagnostics = bag.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "ImageField clashes with Gallery");
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].help.as_deref(), Some("Try something else."));
    }

    #[test]
    fn templates_without_placeholders_pass_through() {
        assert_eq!(render_template("nothing to fill", &[]), "nothing to fill");
        assert_eq!(render_template("{0}!", &["hi"]), "hi!");
    }

    #[test]
    fn reports_accumulate() {
        let bag = DiagnosticBag::new();
        assert!(bag.is_empty());
        bag.report(&DESCRIPTOR, location(), &["a", "b"]);
        bag.report(&DESCRIPTOR, location(), &["c", "d"]);
        assert_eq!(bag.len(), 2);
    }
}
