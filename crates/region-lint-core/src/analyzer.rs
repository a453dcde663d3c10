//! Host layer orchestrating an analysis pass over a source tree.

use crate::compilation::{Compilation, CompileError};
use crate::config::Config;
use crate::context::CancellationToken;
use crate::engine;
use crate::rule::{Rule, RuleRef, RuleRegistry};
use crate::types::LintResult;
use crate::well_known;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing a source file.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The pass was cancelled between node visits.
    #[error("Analysis cancelled")]
    Cancelled,
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    registry: RuleRegistry,
    exclude_patterns: Vec<String>,
    extern_types: Option<Vec<String>>,
    config: Option<Config>,
    fail_on_parse_error: bool,
    cancellation: Option<CancellationToken>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Registers a rule with the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.registry.register_rule(rule);
        self
    }

    /// Registers a shared rule handle.
    #[must_use]
    pub fn rule_ref(mut self, rule: RuleRef) -> Self {
        self.registry.register(rule);
        self
    }

    /// Registers several shared rule handles at once.
    #[must_use]
    pub fn rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = RuleRef>,
    {
        for rule in rules {
            self.registry.register(rule);
        }
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Replaces the default extern symbol universe (the framework's
    /// well-known exports) with an explicit list.
    #[must_use]
    pub fn extern_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extern_types = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets whether to fail on parse errors (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Sets the cancellation token consulted between node visits.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be resolved.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let root = self
            .root
            .or_else(|| self.config.as_ref().map(|c| c.analyzer.root.clone()))
            .unwrap_or_else(|| PathBuf::from("."));

        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        // Merge exclude patterns from config
        let mut exclude_patterns = self.exclude_patterns;
        if let Some(ref config) = self.config {
            exclude_patterns.extend(config.analyzer.exclude.clone());
        }

        // Add default excludes if none specified
        if exclude_patterns.is_empty() {
            exclude_patterns.extend(["**/target/**".to_string(), "**/vendor/**".to_string()]);
        }

        Ok(Analyzer {
            root,
            registry: self.registry,
            exclude_patterns,
            extern_types: self
                .extern_types
                .unwrap_or_else(|| well_known::framework_exports().map(String::from).collect()),
            config: self.config.unwrap_or_default(),
            fail_on_parse_error: self.fail_on_parse_error,
            cancellation: self.cancellation.unwrap_or_default(),
        })
    }
}

/// The host-side analyzer: discovers sources, builds a compilation
/// snapshot, and runs the dispatch engine over it.
///
/// Use [`Analyzer::builder()`] to construct an instance. Each
/// [`analyze`](Analyzer::analyze) call is an independent, stateless pass.
pub struct Analyzer {
    root: PathBuf,
    registry: RuleRegistry,
    exclude_patterns: Vec<String>,
    extern_types: Vec<String>,
    config: Config,
    fail_on_parse_error: bool,
    cancellation: CancellationToken,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Analyzes all files under the root and returns the results.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery fails, a file cannot be read, a
    /// source fails to parse while `fail_on_parse_error` is set, or the
    /// pass is cancelled.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let files = self.discover_files()?;
        info!("Found {} files to analyze", files.len());

        let mut builder = Compilation::builder()
            .extern_types(self.extern_types.iter().cloned())
            .skip_unparseable(!self.fail_on_parse_error);

        for path in &files {
            debug!("Reading: {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let relative = path
                .strip_prefix(&self.root)
                .map_or_else(|_| path.clone(), Path::to_path_buf);
            builder = builder.source(relative, content);
        }

        let compilation = builder.build().map_err(|e| match e {
            CompileError::Parse { path, message } => AnalyzerError::Parse { path, message },
        })?;

        let mut diagnostics =
            engine::run(&compilation, &self.registry, &self.config, &self.cancellation)?;

        // Sort diagnostics by file, then line, for display. Rule semantics
        // treat the set as unordered.
        diagnostics.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
        });

        let result = LintResult {
            files_checked: compilation.files().len(),
            diagnostics,
        };

        info!(
            "Analysis complete: {} diagnostics in {} files",
            result.diagnostics.len(),
            result.files_checked
        );

        Ok(result)
    }

    /// Runs a pass over already-loaded sources instead of the filesystem.
    ///
    /// This is the embedder's entry point: hosts that hold sources in
    /// memory build the snapshot themselves and hand it in.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass is cancelled.
    pub fn analyze_compilation(&self, compilation: &Compilation) -> Result<LintResult, AnalyzerError> {
        let diagnostics =
            engine::run(compilation, &self.registry, &self.config, &self.cancellation)?;
        Ok(LintResult {
            files_checked: compilation.files().len(),
            diagnostics,
        })
    }

    /// Discovers all Rust source files to analyze.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let pattern = format!("{}/**/*.rs", self.root.display());
        let mut files = Vec::new();

        for entry in glob::glob(&pattern)? {
            let path = entry.map_err(|e| AnalyzerError::Io(e.into_error()))?;

            if self.should_exclude(&path) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            files.push(path);
        }

        files.sort();
        Ok(files)
    }

    /// Checks if a path should be excluded.
    fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.exclude_patterns {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
            }

            // Also check as substring for patterns like "**/target/**"
            let normalized_pattern = pattern.replace("**", "");
            if !normalized_pattern.is_empty() && path_str.contains(&normalized_pattern) {
                return true;
            }
        }

        false
    }
}
