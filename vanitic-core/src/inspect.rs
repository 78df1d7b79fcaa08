//! Parsing of `go list` output.

use crate::contract::PackageListing;

/// Template handed to `go list -f`: one `<import-path> <doc>` line per package.
pub const PACKAGE_LIST_FORMAT: &str = "{{ .ImportPath }} {{ .Doc }}";

/// Module path printed by `go list -m`, trimmed of surrounding whitespace.
pub fn parse_module(output: &str) -> String {
    output.trim().to_string()
}

/// Splits package listing output into one entry per line.
///
/// The whole output is trimmed first; each line is then split on its first
/// space only, so descriptions keep their inner spaces. `path` and `path `
/// both yield an empty description. Blank lines carry no package and are
/// skipped.
pub fn parse_package_listing(output: &str) -> Vec<PackageListing> {
    output
        .trim()
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (import_path, description) = line.split_once(' ').unwrap_or((line, ""));
            PackageListing {
                import_path: import_path.to_string(),
                description: description.to_string(),
            }
        })
        .collect()
}
