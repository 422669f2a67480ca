/// Rewrite Windows separators as `/`. Doubled backslashes collapse into a single `/`.
pub fn normalize_separators(path: &str) -> String {
    path.replace("\\\\", "/").replace('\\', "/")
}

/// Join a root and a path relative to it with exactly one `/` between them.
pub fn join_root(root: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    if root.ends_with('/') {
        format!("{}{}", root, relative)
    } else {
        format!("{}/{}", root, relative)
    }
}
