//! Remote path helpers. Remote paths are always `/`-separated strings,
//! independent of the local platform.

/// Strip trailing separators, keeping a lone root `/`.
pub fn trim_trailing(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// Join a directory and a child name without producing `//`.
pub fn join(dir: &str, name: &str) -> String {
    let dir = trim_trailing(dir);
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Last component of a remote path (`/a/b.txt` → `b.txt`, `/a/dir/` → `dir`).
pub fn basename(path: &str) -> &str {
    let trimmed = trim_trailing(path);
    match trimmed.rfind('/') {
        Some(pos) if trimmed.len() > 1 => &trimmed[pos + 1..],
        _ => trimmed,
    }
}

/// Parent directory of a remote path; `None` for the root or a bare name.
pub fn parent(path: &str) -> Option<&str> {
    let trimmed = trim_trailing(path);
    match trimmed.rfind('/') {
        Some(0) if trimmed.len() > 1 => Some("/"),
        Some(pos) if pos > 0 => Some(&trimmed[..pos]),
        _ => None,
    }
}
