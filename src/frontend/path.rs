//! Request path classification.
//!
//! A path ending in `/` (or the empty path) names the root document. Any
//! other path names a file relative to the static root, with its leading
//! `/` stripped.

use std::path::{Component, Path, PathBuf};

/// What a request path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// A concrete file, relative to the static root. Streamed untouched.
    File(&'a str),
    /// The root document, identified by its cache key.
    Document(&'a str),
}

/// Cache key of the root document.
pub const ROOT_DOCUMENT: &str = "";

/// Whether `path` asks for the root document rather than an asset.
pub fn is_document_request(path: &str) -> bool {
    path.is_empty() || path.ends_with('/')
}

/// Classify a request path.
pub fn resolve(path: &str) -> Target<'_> {
    if is_document_request(path) {
        return Target::Document(ROOT_DOCUMENT);
    }

    match path.strip_prefix('/').unwrap_or(path) {
        "" => Target::Document(ROOT_DOCUMENT),
        file => Target::File(file),
    }
}

/// Path forwarded upstream in proxy mode: document requests collapse to `/`
/// so the dev server answers with its SPA entry point.
pub fn upstream_path(path: &str) -> &str {
    if path.ends_with('/') {
        "/"
    } else {
        path
    }
}

/// Join a relative request path onto `root`, refusing anything that could
/// step outside it (`..`, absolute or prefixed components).
pub fn join_under(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut joined = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(joined)
}
