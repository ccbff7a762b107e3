//! Hierarchical blob path helpers.
//!
//! Every path handed to a storage is normalized into the canonical form:
//! forward slashes only, a single leading `/`, no empty or `.` segments and
//! no trailing separator (except the root itself, which is `/`).

use crate::{Error, Result};

/// Separator used in canonical paths.
pub const PATH_SEPARATOR: char = '/';

/// Canonical root path.
pub const ROOT: &str = "/";

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Split a path into its non-empty segments.
pub fn split(path: &str) -> Vec<&str> {
    path.split(is_separator)
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Normalize a path into canonical form.
pub fn normalize(path: &str) -> String {
    let segments = split(path);
    if segments.is_empty() {
        return ROOT.to_string();
    }

    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments {
        out.push(PATH_SEPARATOR);
        out.push_str(segment);
    }
    out
}

/// True when the path denotes the root folder.
pub fn is_root(path: &str) -> bool {
    split(path).is_empty()
}

/// Join path parts with single separators and normalize the result.
pub fn combine<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = parts
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

/// Parent folder of a path. The parent of the root is the root.
pub fn parent(path: &str) -> String {
    let segments = split(path);
    match segments.len() {
        0 | 1 => ROOT.to_string(),
        n => combine(&segments[..n - 1]),
    }
}

/// Last segment of a path, empty for the root.
pub fn file_name(path: &str) -> &str {
    split(path).last().copied().unwrap_or("")
}

/// Compare two paths after normalization.
pub fn paths_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// True when `path` lies strictly below `folder`.
pub fn is_descendant_of(path: &str, folder: &str) -> bool {
    let path = split(path);
    let folder = split(folder);
    path.len() > folder.len() && path[..folder.len()] == folder[..]
}

/// Validate a path addressing a single blob and return its normalized form.
///
/// The root folder can never be read, written or deleted as a blob.
pub fn validate_blob_path(path: &str) -> Result<String> {
    if path.contains('\0') {
        return Err(Error::InvalidArgument(format!(
            "path contains a NUL character: {:?}",
            path
        )));
    }
    let normalized = normalize(path);
    if normalized == ROOT {
        return Err(Error::InvalidArgument(format!(
            "path {:?} does not address a blob",
            path
        )));
    }
    Ok(normalized)
}
