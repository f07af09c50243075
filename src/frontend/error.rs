//! Errors surfaced by the serving strategies.
//!
//! Collaborator errors (network, disk) are carried as-is; turning them into
//! status codes is the HTTP layer's job (see `http::response`).

use std::io;
use std::path::PathBuf;

use crate::cache::MemoError;

#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    /// The upstream dev server could not be reached or the exchange failed.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The upstream answered but its body could not be read.
    #[error("failed to read upstream response body: {0}")]
    UpstreamBody(#[source] axum::Error),

    /// A request or response could not be assembled.
    #[error("failed to build message: {0}")]
    Http(#[from] axum::http::Error),

    /// Direct file streaming failed.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// Loading a cached document failed. Nothing was cached.
    #[error("failed to load document {}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: MemoError<io::Error>,
    },
}

impl FrontendError {
    /// The underlying I/O error kind, for disk failures.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            FrontendError::Io(err) => Some(err.kind()),
            FrontendError::Document { source, .. } => source.failure().map(io::Error::kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::NotFound)
    }
}
