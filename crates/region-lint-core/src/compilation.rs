//! Compilation snapshots and symbol resolution.
//!
//! A [`Compilation`] is an immutable snapshot of the sources under analysis
//! plus the extern symbol universe (names that resolve without a source
//! definition, the way types from binary-only dependencies do). Everything a
//! rule can ask — name lookups, reference resolution, identity comparison,
//! definition access — is answered from the snapshot; nothing mutates it
//! during a pass.

use crate::model::{self, AnnotationUsage, FileModel, SourceFileId, TypeDeclaration, TypeRef};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use tracing::warn;

/// Canonical, compilation-wide identity of a resolved type.
///
/// Two identities are equal iff they denote the same declared type,
/// independent of `Option` wrapping or syntactic spelling of the reference
/// that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeIdentity(u32);

/// Errors produced while building a compilation snapshot.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A source file failed to parse.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path of the file that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },
}

struct Symbol {
    qualified: String,
    definition: Option<(usize, usize)>,
}

enum ShortName {
    Unique(TypeIdentity),
    Ambiguous,
}

/// Builder for a [`Compilation`] snapshot.
#[derive(Default)]
pub struct CompilationBuilder {
    sources: Vec<(PathBuf, String)>,
    extern_types: Vec<String>,
    skip_unparseable: bool,
}

impl CompilationBuilder {
    /// Creates a new builder with an empty symbol universe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source file, identified by its path relative to the analysis
    /// root. Parsing happens at [`build`](Self::build) time.
    #[must_use]
    pub fn source(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.sources.push((path.into(), content.into()));
        self
    }

    /// Registers a qualified name that resolves without a source definition.
    #[must_use]
    pub fn extern_type(mut self, name: impl Into<String>) -> Self {
        self.extern_types.push(name.into());
        self
    }

    /// Registers several extern names at once.
    #[must_use]
    pub fn extern_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extern_types
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets whether unparseable sources are skipped with a warning instead
    /// of failing the build (default: fail).
    #[must_use]
    pub fn skip_unparseable(mut self, skip: bool) -> Self {
        self.skip_unparseable = skip;
        self
    }

    /// Parses the sources and interns the symbol universe.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Parse`] for the first unparseable source,
    /// unless [`skip_unparseable`](Self::skip_unparseable) is set.
    pub fn build(self) -> Result<Compilation, CompileError> {
        let mut files = Vec::new();
        for (path, content) in self.sources {
            match syn::parse_file(&content) {
                Ok(ast) => {
                    let id = SourceFileId(files.len());
                    files.push(model::lower_file(&ast, path, &content, id));
                }
                Err(e) if self.skip_unparseable => {
                    warn!("Skipping unparseable file {}: {e}", path.display());
                }
                Err(e) => {
                    return Err(CompileError::Parse {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        let mut symbols: Vec<Symbol> = Vec::new();
        let mut by_qualified: HashMap<String, TypeIdentity> = HashMap::new();
        let mut by_short: HashMap<String, ShortName> = HashMap::new();

        for name in self.extern_types {
            let qualified = normalize(&name);
            if qualified.is_empty() || by_qualified.contains_key(&qualified) {
                continue;
            }
            let identity = TypeIdentity(u32::try_from(symbols.len()).unwrap_or(u32::MAX));
            by_qualified.insert(qualified.clone(), identity);
            symbols.push(Symbol {
                qualified,
                definition: None,
            });
        }

        for (file_idx, file) in files.iter().enumerate() {
            for (type_idx, decl) in file.types.iter().enumerate() {
                if by_qualified.contains_key(&decl.qualified_name) {
                    warn!(
                        "Duplicate type declaration {} in {}; keeping the first",
                        decl.qualified_name,
                        file.relative_path.display()
                    );
                    continue;
                }
                let identity = TypeIdentity(u32::try_from(symbols.len()).unwrap_or(u32::MAX));
                by_qualified.insert(decl.qualified_name.clone(), identity);
                symbols.push(Symbol {
                    qualified: decl.qualified_name.clone(),
                    definition: Some((file_idx, type_idx)),
                });

                by_short
                    .entry(decl.name.clone())
                    .and_modify(|entry| *entry = ShortName::Ambiguous)
                    .or_insert(ShortName::Unique(identity));
            }
        }

        Ok(Compilation {
            files,
            symbols,
            by_qualified,
            by_short,
            cache: RwLock::new(HashMap::new()),
        })
    }
}

/// An immutable compilation snapshot: lowered sources plus the symbol
/// universe they resolve against.
pub struct Compilation {
    files: Vec<FileModel>,
    symbols: Vec<Symbol>,
    by_qualified: HashMap<String, TypeIdentity>,
    by_short: HashMap<String, ShortName>,
    // Memoizes qualified-name lookups for the duration of the pass. Misses
    // are recomputed idempotently, so concurrent writers need no
    // coordination beyond the lock itself.
    cache: RwLock<HashMap<String, Option<TypeIdentity>>>,
}

impl Compilation {
    /// Creates a new snapshot builder.
    #[must_use]
    pub fn builder() -> CompilationBuilder {
        CompilationBuilder::new()
    }

    /// The lowered source files in this snapshot.
    #[must_use]
    pub fn files(&self) -> &[FileModel] {
        &self.files
    }

    /// Resolves a fully-qualified name to a type identity.
    ///
    /// Returns `None` when the name is absent from the symbol universe —
    /// an expected outcome that callers treat as "rule does not apply".
    #[must_use]
    pub fn resolve(&self, qualified: &str) -> Option<TypeIdentity> {
        let key = normalize(qualified);
        let key = path_of(&key)?;

        {
            let cache = self
                .cache
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = cache.get(&key) {
                return *hit;
            }
        }

        let resolved = self.by_qualified.get(&key).copied();
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, resolved);
        resolved
    }

    /// Compares two type references with nullability-insensitive equality.
    ///
    /// `Option` wrapping never reaches an identity — normalization peels it
    /// before lookup — so equality here is plain identity equality, with an
    /// unresolved right-hand side never equal to anything.
    #[must_use]
    pub fn same_identity(&self, a: TypeIdentity, b: Option<TypeIdentity>) -> bool {
        b.is_some_and(|b| a == b)
    }

    /// Resolves a declared type reference as written in source, applying the
    /// declaring file's imports.
    #[must_use]
    pub fn resolve_ref(&self, reference: &TypeRef) -> Option<TypeIdentity> {
        self.resolve_in_file(reference.file, &reference.raw)
    }

    /// Resolves an annotation's converted type: the identity its path
    /// denotes once the declaring file's imports are applied.
    #[must_use]
    pub fn resolve_annotation(&self, annotation: &AnnotationUsage) -> Option<TypeIdentity> {
        self.resolve_in_file(annotation.file, &annotation.path)
    }

    /// The defining declaration for an identity, when the definition is
    /// available in this compilation. Extern symbols have none; that is a
    /// valid terminal state, not an error.
    #[must_use]
    pub fn definition(&self, identity: TypeIdentity) -> Option<&TypeDeclaration> {
        let (file_idx, type_idx) = self.symbols.get(identity.0 as usize)?.definition?;
        Some(&self.files[file_idx].types[type_idx])
    }

    /// The canonical qualified name behind an identity.
    #[must_use]
    pub fn qualified_name(&self, identity: TypeIdentity) -> &str {
        self.symbols
            .get(identity.0 as usize)
            .map_or("", |s| s.qualified.as_str())
    }

    fn resolve_in_file(&self, file: SourceFileId, text: &str) -> Option<TypeIdentity> {
        let file = self.files.get(file.0)?;
        let normalized = normalize(text);
        let path = path_of(&normalized)?;
        let segments: Vec<&str> = path.split("::").collect();

        if let [name] = segments.as_slice() {
            if let Some(qualified) = file.imports.alias(name) {
                return self.resolve(qualified);
            }
            for glob in file.imports.globs() {
                if let Some(identity) = self.resolve(&format!("{glob}::{name}")) {
                    return Some(identity);
                }
            }
            let same_module = format!("{}::{name}", file.module_path.join("::"));
            if let Some(identity) = self.resolve(&same_module) {
                return Some(identity);
            }
            // Last resort: a short name unique across the snapshot. An
            // ambiguous short name resolves to nothing.
            return match self.by_short.get(*name) {
                Some(ShortName::Unique(identity)) => Some(*identity),
                _ => None,
            };
        }

        if segments[0] == "crate" {
            return self.resolve(&path);
        }
        if segments[0] == "self" {
            let joined = format!(
                "{}::{}",
                file.module_path.join("::"),
                segments[1..].join("::")
            );
            return self.resolve(&joined);
        }
        if let Some(identity) = self.resolve(&path) {
            return Some(identity);
        }
        // The head segment may itself be an imported module
        // (`use cms::fields; ... fields::ImageField`).
        if let Some(base) = file.imports.alias(segments[0]) {
            let joined = format!("{base}::{}", segments[1..].join("::"));
            return self.resolve(&joined);
        }
        None
    }
}

/// Normalizes a type reference for identity lookup: whitespace removed,
/// `Option` wrapping peeled, leading `::` stripped.
fn normalize(name: &str) -> String {
    let mut s: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    loop {
        if let Some(stripped) = s.strip_prefix("::") {
            s = stripped.to_string();
            continue;
        }
        let peeled = ["Option<", "std::option::Option<", "core::option::Option<"]
            .iter()
            .find_map(|prefix| {
                s.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_suffix('>'))
            });
        match peeled {
            Some(inner) => s = inner.to_string(),
            None => break,
        }
    }
    s
}

/// Extracts the path portion of a normalized reference, or `None` when the
/// reference is not a plain path (tuples, references, slices, ...).
/// Generic arguments other than `Option` wrapping are dropped, so
/// `Vec<ImageField>` is the reference `Vec`.
fn path_of(normalized: &str) -> Option<String> {
    let base = normalized.split('<').next().unwrap_or(normalized);
    if base.is_empty() {
        return None;
    }
    let is_path = base
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == ':');
    is_path.then(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well_known;

    fn snapshot(sources: &[(&str, &str)]) -> Compilation {
        let mut builder = Compilation::builder().extern_types(well_known::framework_exports());
        for (path, content) in sources {
            builder = builder.source(*path, *content);
        }
        builder.build().expect("fixture should build")
    }

    #[test]
    fn resolves_extern_and_local_names() {
        let compilation = snapshot(&[(
            "src/models.rs",
            "pub struct Gallery { pub caption: String }",
        )]);

        let image = compilation.resolve("cms::fields::ImageField");
        assert!(image.is_some());
        assert!(compilation.resolve("crate::models::Gallery").is_some());
        assert!(compilation.resolve("cms::fields::MissingField").is_none());
    }

    #[test]
    fn resolution_is_nullability_insensitive() {
        let compilation = snapshot(&[]);
        let plain = compilation.resolve("cms::fields::ImageField");
        let optional = compilation.resolve("Option<cms::fields::ImageField>");
        let spelled = compilation.resolve(" :: cms :: fields :: ImageField ");
        assert!(plain.is_some());
        assert_eq!(plain, optional);
        assert_eq!(plain, spelled);
        assert!(compilation.same_identity(plain.expect("resolved"), optional));
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let compilation = snapshot(&[]);
        let first = compilation.resolve("cms::region");
        let second = compilation.resolve("cms::region");
        assert_eq!(first, second);
        let misses = compilation.resolve("cms::gone");
        assert_eq!(misses, compilation.resolve("cms::gone"));
    }

    #[test]
    fn reference_resolution_applies_imports() {
        let compilation = snapshot(&[(
            "src/models.rs",
            r"
use cms::fields::ImageField;
use cms::fields::StringField as Text;
use cms::fields;

pub struct Page {
    pub hero: ImageField,
    pub title: Text,
    pub intro: fields::StringField,
    pub teaser: Option<ImageField>,
}
",
        )]);

        let page = &compilation.files()[0].types[0];
        let hero = compilation.resolve_ref(&page.members[0].ty);
        assert_eq!(hero, compilation.resolve("cms::fields::ImageField"));

        let title = compilation.resolve_ref(&page.members[1].ty);
        assert_eq!(title, compilation.resolve("cms::fields::StringField"));

        let intro = compilation.resolve_ref(&page.members[2].ty);
        assert_eq!(intro, title);

        let teaser = compilation.resolve_ref(&page.members[3].ty);
        assert_eq!(teaser, hero);
    }

    #[test]
    fn glob_imports_resolve() {
        let compilation = snapshot(&[(
            "src/models.rs",
            r"
use cms::fields::*;

pub struct Page {
    pub hero: VideoField,
}
",
        )]);

        let page = &compilation.files()[0].types[0];
        let hero = compilation.resolve_ref(&page.members[0].ty);
        assert_eq!(hero, compilation.resolve("cms::fields::VideoField"));
    }

    #[test]
    fn local_references_resolve_by_module_and_short_name() {
        let compilation = snapshot(&[
            (
                "src/models.rs",
                r"
pub struct Gallery { pub caption: String }

pub struct Page {
    pub media: Gallery,
    pub media_again: crate::models::Gallery,
}
",
            ),
            (
                "src/pages.rs",
                r"
pub struct Landing {
    pub media: Gallery,
}
",
            ),
        ]);

        let gallery = compilation.resolve("crate::models::Gallery");
        let page = &compilation.files()[0].types[1];
        assert_eq!(compilation.resolve_ref(&page.members[0].ty), gallery);
        assert_eq!(compilation.resolve_ref(&page.members[1].ty), gallery);

        // Cross-file bare-name reference falls back to the unique short name.
        let landing = &compilation.files()[1].types[0];
        assert_eq!(compilation.resolve_ref(&landing.members[0].ty), gallery);
    }

    #[test]
    fn ambiguous_short_names_resolve_to_none() {
        let compilation = snapshot(&[
            ("src/a.rs", "pub struct Gallery { pub x: String }"),
            ("src/b.rs", "pub struct Gallery { pub y: String }"),
            (
                "src/pages.rs",
                "pub struct Landing { pub media: Gallery }",
            ),
        ]);

        let landing = &compilation.files()[2].types[0];
        assert!(compilation.resolve_ref(&landing.members[0].ty).is_none());
        // The qualified names still resolve independently.
        assert!(compilation.resolve("crate::a::Gallery").is_some());
        assert!(compilation.resolve("crate::b::Gallery").is_some());
    }

    #[test]
    fn definitions_exist_only_for_local_types() {
        let compilation = snapshot(&[(
            "src/models.rs",
            "pub struct Gallery { pub caption: String }",
        )]);

        let gallery = compilation
            .resolve("crate::models::Gallery")
            .expect("local type resolves");
        let image = compilation
            .resolve("cms::fields::ImageField")
            .expect("extern type resolves");

        assert!(compilation.definition(gallery).is_some());
        assert!(compilation.definition(image).is_none());
        assert_eq!(
            compilation.qualified_name(image),
            "cms::fields::ImageField"
        );
    }

    #[test]
    fn non_path_references_are_unresolved() {
        let compilation = snapshot(&[(
            "src/models.rs",
            r"
pub struct Page {
    pub pair: (u8, u8),
    pub items: Vec<String>,
}
",
        )]);

        let page = &compilation.files()[0].types[0];
        assert!(compilation.resolve_ref(&page.members[0].ty).is_none());
        assert!(compilation.resolve_ref(&page.members[1].ty).is_none());
    }

    #[test]
    fn unparseable_sources_fail_or_skip() {
        let result = Compilation::builder()
            .source("src/bad.rs", "struct {")
            .build();
        assert!(matches!(result, Err(CompileError::Parse { .. })));

        let compilation = Compilation::builder()
            .source("src/bad.rs", "struct {")
            .source("src/ok.rs", "pub struct Fine { pub x: u8 }")
            .skip_unparseable(true)
            .build()
            .expect("skip mode should build");
        assert_eq!(compilation.files().len(), 1);
    }
}
