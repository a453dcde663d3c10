//! Context types for rule execution.

use crate::compilation::Compilation;
use crate::model::{AnnotationUsage, MemberDeclaration, TypeDeclaration};
use crate::reporter::DiagnosticBag;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Context bundle handed to a rule per visited node: the compilation
/// snapshot for resolution queries and the reporter sink for findings.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    /// The immutable compilation snapshot for this pass.
    pub compilation: &'a Compilation,
    /// Sink for diagnostics produced by this pass.
    pub reporter: &'a DiagnosticBag,
}

/// The declaration an annotation is attached to.
#[derive(Clone, Copy)]
pub enum AnnotationOwner<'a> {
    /// The annotation sits on a type declaration.
    Type(&'a TypeDeclaration),
    /// The annotation sits on a member of a type declaration.
    Member {
        /// The declaring type.
        decl: &'a TypeDeclaration,
        /// The annotated member.
        member: &'a MemberDeclaration,
    },
}

/// An annotation usage together with its owner, as handed to annotation
/// rules by the traversal layer.
#[derive(Clone, Copy)]
pub struct AnnotationSite<'a> {
    /// The visited annotation.
    pub annotation: &'a AnnotationUsage,
    /// The declaration the annotation is attached to.
    pub owner: AnnotationOwner<'a>,
}

/// Cooperative cancellation signal for an analysis pass.
///
/// The traversal layer checks the token between node visits only; rule
/// bodies are small, bounded computations and never consult it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of the pass.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
