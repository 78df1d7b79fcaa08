use std::path::{Component, Path, PathBuf};

/// Lexically cleans `path`: drops `.` segments and redundant separators,
/// collapses `name/..` pairs, and turns an empty result into `.`.
///
/// `..` segments that cannot be collapsed are kept for relative paths and
/// dropped directly under the root.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Name of the staging directory for a repository: the last `/`-separated
/// segment of its URL, ignoring trailing slashes.
///
/// Returns `None` when that segment is empty, `.` or `..`, since joining it
/// onto the staging root would not yield a directory of its own.
pub fn repository_dir_name(repo_url: &str) -> Option<&str> {
    let trimmed = repo_url.trim_end_matches('/');
    let base = match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };

    match base {
        "" | "." | ".." => None,
        name => Some(name),
    }
}
