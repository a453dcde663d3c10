//! `cargo test` integration runner.
//!
//! Call [`run_check`] from a test function to fail the build when content
//! models violate the shipped rules.

use region_lint_core::{Analyzer, Config, Severity};
use region_lint_rules::all_rules;
use std::path::{Path, PathBuf};

/// Config file names to search for, in priority order.
const CONFIG_CANDIDATES: &[&str] = &["region-lint.toml", ".region-lint.toml"];

/// Runs region-lint analysis as part of `cargo test`.
///
/// # Panics
///
/// Panics with a formatted report if diagnostics at or above the `fail_on`
/// severity are found, or if the analyzer cannot be built.
pub fn run_check(config_path: Option<&str>, fail_on: Option<&str>) {
    let root = find_project_root();
    let config = load_config(&root, config_path);
    let effective_fail_on = resolve_fail_on(fail_on, &config);

    let analyzer = Analyzer::builder()
        .root(&root)
        .rules(all_rules())
        .config(config)
        .build()
        .unwrap_or_else(|e| {
            panic!("region-lint: failed to build analyzer: {e}");
        });

    let result = analyzer.analyze().unwrap_or_else(|e| {
        panic!("region-lint: analysis failed: {e}");
    });

    if result.has_diagnostics_at(effective_fail_on) {
        let report = result.format_test_report(effective_fail_on);
        panic!("{report}");
    }
}

/// Loads the effective configuration for `root`.
fn load_config(root: &Path, explicit_path: Option<&str>) -> Config {
    if let Some(path) = explicit_path {
        let full_path = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            root.join(path)
        };
        return Config::from_file(&full_path).unwrap_or_else(|e| {
            panic!("region-lint: {e}");
        });
    }

    for candidate in CONFIG_CANDIDATES {
        let path = root.join(candidate);
        if path.exists() {
            return Config::from_file(&path).unwrap_or_else(|e| {
                panic!("region-lint: {e}");
            });
        }
    }

    Config::default()
}

/// Checks whether a `Cargo.toml` file defines a `[workspace]` section
/// by parsing as TOML, avoiding false positives from comments or strings.
fn has_workspace_section(cargo_toml: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(cargo_toml) else {
        return false;
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        return false;
    };
    table.contains_key("workspace")
}

/// Finds the project root by looking for `Cargo.toml` from `CARGO_MANIFEST_DIR`.
fn find_project_root() -> PathBuf {
    // CARGO_MANIFEST_DIR points to the crate containing the test, which may
    // be a workspace member. Walk up to find the workspace root.
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let manifest_path = PathBuf::from(&manifest_dir);

        let mut candidate = manifest_path.as_path();
        loop {
            let cargo_toml = candidate.join("Cargo.toml");
            if cargo_toml.exists() && has_workspace_section(&cargo_toml) {
                return candidate.to_path_buf();
            }
            match candidate.parent() {
                Some(parent) => candidate = parent,
                None => break,
            }
        }

        // No workspace root found — use manifest dir itself
        return manifest_path;
    }

    // Fallback: current directory
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolves the effective `fail_on` severity from arg > config > default.
fn resolve_fail_on(arg: Option<&str>, config: &Config) -> Severity {
    let name = arg.or(config.fail_on.as_deref()).unwrap_or("error");

    match name {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "info" => Severity::Info,
        other => {
            panic!("region-lint: unknown severity `{other}`. Valid values: error, warning, info")
        }
    }
}
