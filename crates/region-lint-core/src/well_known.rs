//! Qualified names of the framework types the shipped rules are built
//! around.
//!
//! These tables are compile-time constants, not run-time configuration:
//! the rules are defined in terms of these exact names, and downstream
//! tooling relies on the rule identifiers derived from them staying stable.

/// Marker attribute that declares a struct field as a region.
pub const REGION_MARKER: &str = "cms::region";

/// Marker attribute that declares a struct field as a field of a complex
/// region type.
pub const FIELD_MARKER: &str = "cms::field";

/// The built-in field types, which the framework documentation intends
/// primarily for use inside complex regions.
pub const BUILT_IN_FIELD_TYPES: [&str; 11] = [
    "cms::fields::AudioField",
    "cms::fields::CheckBoxField",
    "cms::fields::DateField",
    "cms::fields::DocumentField",
    "cms::fields::ImageField",
    "cms::fields::MediaField",
    "cms::fields::NumberField",
    "cms::fields::PageField",
    "cms::fields::PostField",
    "cms::fields::StringField",
    "cms::fields::VideoField",
];

/// All framework exports the analyzer registers as extern symbols by
/// default, so they resolve even though their definitions live in a
/// binary-only dependency.
pub fn framework_exports() -> impl Iterator<Item = &'static str> {
    [REGION_MARKER, FIELD_MARKER]
        .into_iter()
        .chain(BUILT_IN_FIELD_TYPES)
}

/// Returns the tail of a qualified name after the last `::` separator.
#[must_use]
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit("::").next().unwrap_or(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_takes_path_tail() {
        assert_eq!(short_name("cms::fields::ImageField"), "ImageField");
        assert_eq!(short_name("ImageField"), "ImageField");
    }

    #[test]
    fn framework_exports_cover_markers_and_fields() {
        let exports: Vec<_> = framework_exports().collect();
        assert_eq!(exports.len(), 13);
        assert!(exports.contains(&REGION_MARKER));
        assert!(exports.contains(&FIELD_MARKER));
        assert!(exports.contains(&"cms::fields::VideoField"));
    }
}
