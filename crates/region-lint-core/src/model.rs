//! Lowered syntax model for analysis.
//!
//! Rules do not walk `syn` trees directly. Each source file is lowered once
//! into an owned model of the declarations the engine cares about: struct
//! declarations, their named fields, and the attributes on both. Lowered
//! nodes carry their source file id so the resolver can apply that file's
//! imports when resolving references lazily at visit time.

use crate::types::Location;
use proc_macro2::Span;
use quote::quote;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use syn::spanned::Spanned;

/// Identifies a source file within one compilation snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceFileId(pub(crate) usize);

/// An application of an annotation to a declaration.
#[derive(Debug, Clone)]
pub struct AnnotationUsage {
    /// The annotation's path as written in source (e.g., `region` or
    /// `cms::region`).
    pub path: String,
    /// Raw argument tokens, if the annotation has any. Present for
    /// completeness; the shipped rules do not consume them.
    pub args: Option<String>,
    /// File the annotation appears in.
    pub file: SourceFileId,
    /// Source location of the annotation.
    pub location: Location,
}

/// A declared type reference, unresolved until a rule asks for it.
#[derive(Debug, Clone)]
pub struct TypeRef {
    /// The reference text as written in source (e.g., `Option<ImageField>`).
    pub raw: String,
    /// File the reference appears in.
    pub file: SourceFileId,
}

/// A named, typed member of a type declaration.
#[derive(Debug, Clone)]
pub struct MemberDeclaration {
    /// Member name.
    pub name: String,
    /// Declared type reference.
    pub ty: TypeRef,
    /// Annotations in source order.
    pub annotations: Vec<AnnotationUsage>,
    /// File the member is declared in.
    pub file: SourceFileId,
    /// Source location spanning the whole member declaration.
    pub location: Location,
}

/// A struct declaration with its members.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    /// Bare type name.
    pub name: String,
    /// Canonical qualified name (e.g., `crate::models::Gallery`).
    pub qualified_name: String,
    /// Annotations on the declaration itself, in source order.
    pub annotations: Vec<AnnotationUsage>,
    /// Members in declaration order.
    pub members: Vec<MemberDeclaration>,
    /// File the type is declared in.
    pub file: SourceFileId,
    /// Source location of the declaration.
    pub location: Location,
}

/// Import information gathered from a file's `use` items.
///
/// Imports are tracked per file, not per module scope: `use` items from
/// inline modules are merged into the file's map.
#[derive(Debug, Clone, Default)]
pub(crate) struct ImportMap {
    aliases: HashMap<String, String>,
    globs: Vec<String>,
}

impl ImportMap {
    pub(crate) fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub(crate) fn globs(&self) -> &[String] {
        &self.globs
    }
}

/// One lowered source file.
#[derive(Debug, Clone)]
pub struct FileModel {
    /// Identity of this file within the compilation.
    pub id: SourceFileId,
    /// Path relative to the analysis root.
    pub relative_path: PathBuf,
    /// Module path derived from the relative path (e.g., `["crate",
    /// "models"]`).
    pub module_path: Vec<String>,
    pub(crate) imports: ImportMap,
    /// Type declarations in source order.
    pub types: Vec<TypeDeclaration>,
}

/// Lowers a parsed file into the analysis model.
pub(crate) fn lower_file(
    ast: &syn::File,
    relative_path: PathBuf,
    content: &str,
    id: SourceFileId,
) -> FileModel {
    let module_path = module_path_for(&relative_path);
    let mut lowering = Lowering {
        id,
        relative_path: &relative_path,
        content,
        imports: ImportMap::default(),
        types: Vec::new(),
    };
    lowering.collect_items(&ast.items, &mut module_path.clone());

    let Lowering { imports, types, .. } = lowering;
    FileModel {
        id,
        relative_path,
        module_path,
        imports,
        types,
    }
}

struct Lowering<'a> {
    id: SourceFileId,
    relative_path: &'a Path,
    content: &'a str,
    imports: ImportMap,
    types: Vec<TypeDeclaration>,
}

impl Lowering<'_> {
    fn collect_items(&mut self, items: &[syn::Item], module: &mut Vec<String>) {
        for item in items {
            match item {
                syn::Item::Use(item_use) => {
                    self.collect_use(&item_use.tree, Vec::new());
                }
                syn::Item::Struct(item_struct) => {
                    let decl = self.lower_struct(item_struct, module);
                    self.types.push(decl);
                }
                syn::Item::Mod(item_mod) => {
                    if let Some((_, items)) = &item_mod.content {
                        module.push(item_mod.ident.to_string());
                        self.collect_items(items, module);
                        module.pop();
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_use(&mut self, tree: &syn::UseTree, prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                let mut prefix = prefix;
                prefix.push(path.ident.to_string());
                self.collect_use(&path.tree, prefix);
            }
            syn::UseTree::Name(name) => {
                let mut segments = prefix;
                segments.push(name.ident.to_string());
                self.imports
                    .aliases
                    .insert(name.ident.to_string(), segments.join("::"));
            }
            syn::UseTree::Rename(rename) => {
                let mut segments = prefix;
                segments.push(rename.ident.to_string());
                self.imports
                    .aliases
                    .insert(rename.rename.to_string(), segments.join("::"));
            }
            syn::UseTree::Glob(_) => {
                self.imports.globs.push(prefix.join("::"));
            }
            syn::UseTree::Group(group) => {
                for tree in &group.items {
                    self.collect_use(tree, prefix.clone());
                }
            }
        }
    }

    fn lower_struct(&self, node: &syn::ItemStruct, module: &[String]) -> TypeDeclaration {
        let name = node.ident.to_string();
        let qualified_name = format!("{}::{}", module.join("::"), name);

        let members = match &node.fields {
            syn::Fields::Named(fields) => fields
                .named
                .iter()
                .filter_map(|field| self.lower_member(field))
                .collect(),
            // Tuple and unit structs declare no named members; the type is
            // still resolvable as a definition with an empty member list.
            syn::Fields::Unnamed(_) | syn::Fields::Unit => Vec::new(),
        };

        TypeDeclaration {
            annotations: self.lower_annotations(&node.attrs),
            members,
            name,
            qualified_name,
            file: self.id,
            location: self.location_of(node.ident.span()),
        }
    }

    fn lower_member(&self, field: &syn::Field) -> Option<MemberDeclaration> {
        let ident = field.ident.as_ref()?;
        let ty = &field.ty;

        Some(MemberDeclaration {
            name: ident.to_string(),
            ty: TypeRef {
                raw: quote!(#ty).to_string(),
                file: self.id,
            },
            annotations: self.lower_annotations(&field.attrs),
            file: self.id,
            location: self.location_of(field.span()),
        })
    }

    fn lower_annotations(&self, attrs: &[syn::Attribute]) -> Vec<AnnotationUsage> {
        attrs
            .iter()
            .filter(|attr| !attr.path().is_ident("doc"))
            .map(|attr| {
                let path = attr
                    .path()
                    .segments
                    .iter()
                    .map(|s| s.ident.to_string())
                    .collect::<Vec<_>>()
                    .join("::");

                let args = match &attr.meta {
                    syn::Meta::Path(_) => None,
                    syn::Meta::List(list) => Some(list.tokens.to_string()),
                    syn::Meta::NameValue(nv) => {
                        let value = &nv.value;
                        Some(quote!(#value).to_string())
                    }
                };

                AnnotationUsage {
                    path,
                    args,
                    file: self.id,
                    location: self.location_of(attr.span()),
                }
            })
            .collect()
    }

    fn location_of(&self, span: Span) -> Location {
        let start = span.start();
        let end = span.end();
        let offset = byte_offset(self.content, start.line, start.column);
        let end_offset = byte_offset(self.content, end.line, end.column);

        Location::new(
            self.relative_path.to_path_buf(),
            start.line,
            start.column + 1,
        )
        .with_span(offset, end_offset.saturating_sub(offset))
    }
}

/// Computes the module path from a relative file path.
///
/// `src/models/gallery.rs` becomes `["crate", "models", "gallery"]`;
/// `mod.rs`, `lib.rs`, and `main.rs` name their parent module.
pub(crate) fn module_path_for(relative_path: &Path) -> Vec<String> {
    let mut parts: Vec<String> = relative_path
        .with_extension("")
        .components()
        .filter_map(|c| {
            if let std::path::Component::Normal(s) = c {
                s.to_str().map(String::from)
            } else {
                None
            }
        })
        .collect();

    if parts.first().is_some_and(|first| first == "src") {
        parts.remove(0);
    }

    if let Some(last) = parts.last() {
        if last == "mod" || last == "lib" || last == "main" {
            parts.pop();
        }
    }

    parts.insert(0, "crate".to_string());
    parts
}

/// Byte offset for a 1-indexed line and 0-indexed column.
fn byte_offset(content: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }

    let mut offset = 0;
    for (i, line_content) in content.lines().enumerate() {
        if i + 1 == line {
            return offset + column.min(line_content.len());
        }
        offset += line_content.len() + 1;
    }

    offset
}
