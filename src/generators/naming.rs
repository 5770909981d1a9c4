// Wistro Coder: Script Naming
// Free-text task descriptions to identifier-safe slugs

/// Lower-case the description, turn spaces into `_`, then replace every
/// character outside `[a-zA-Z0-9_]` with `_`.
///
/// Pure and total. Distinct descriptions may collide; callers that need
/// unique names must disambiguate themselves.
pub fn sanitize_name(description: &str) -> String {
    description
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
