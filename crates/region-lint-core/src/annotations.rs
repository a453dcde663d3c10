//! Annotation matching utilities for rule implementations.

use crate::compilation::{Compilation, TypeIdentity};
use crate::model::{AnnotationUsage, MemberDeclaration, TypeDeclaration};

/// Finds the first annotation on `member`, in source order, whose converted
/// type resolves to `target`.
///
/// First-match-in-source-order, not best-match: given the same annotation
/// list and target, the result is stable.
#[must_use]
pub fn find_annotation<'a>(
    compilation: &Compilation,
    member: &'a MemberDeclaration,
    target: TypeIdentity,
) -> Option<&'a AnnotationUsage> {
    member
        .annotations
        .iter()
        .find(|ann| compilation.same_identity(target, compilation.resolve_annotation(ann)))
}

/// Enumerates the members of `decl` annotated with `marker`, in declaration
/// order.
#[must_use]
pub fn members_marked_with<'a>(
    compilation: &Compilation,
    decl: &'a TypeDeclaration,
    marker: TypeIdentity,
) -> Vec<&'a MemberDeclaration> {
    decl.members
        .iter()
        .filter(|member| find_annotation(compilation, member, marker).is_some())
        .collect()
}
