//! Production serving from the built front-end directory.
//!
//! # Responsibilities
//! - Stream asset files byte-for-byte with an extension-derived content type
//! - Serve the root document through the memo cache, rewritten once
//!
//! # Design Decisions
//! - Assets bypass the cache entirely; only documents are memoized
//! - Files are assumed static for the process lifetime (no invalidation)
//! - Nothing on disk is touched at construction; missing files surface per
//!   request

use std::io;
use std::path::PathBuf;

use axum::{
    body::Body,
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    response::Response,
};
use bytes::Bytes;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::cache::MemoMap;
use crate::frontend::error::FrontendError;
use crate::frontend::path::{self, Target};
use crate::frontend::rewrite::ContentRewriter;
use crate::observability::metrics;

/// Rewritten document bodies keyed by normalized request path.
pub type DocumentCache = MemoMap<Bytes, io::Error>;

const HTML: &str = "text/html; charset=utf-8";

/// Serves a directory of static files, memoizing rewritten documents.
#[derive(Clone)]
pub struct StaticFrontend {
    root: PathBuf,
    index_file: String,
    rewriter: ContentRewriter,
    cache: DocumentCache,
}

impl StaticFrontend {
    pub fn new(
        root: impl Into<PathBuf>,
        index_file: impl Into<String>,
        rewriter: ContentRewriter,
        cache: DocumentCache,
    ) -> Self {
        Self {
            root: root.into(),
            index_file: index_file.into(),
            rewriter,
            cache,
        }
    }

    /// The document cache owned by this server.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Serve the given request path.
    pub async fn handle(&self, request_path: &str) -> Result<Response, FrontendError> {
        match path::resolve(request_path) {
            Target::File(file) => self.stream_file(file).await,
            Target::Document(key) => self.serve_document(key).await,
        }
    }

    async fn stream_file(&self, relative: &str) -> Result<Response, FrontendError> {
        let file_path = path::join_under(&self.root, relative).ok_or_else(|| not_found(relative))?;

        let file = File::open(&file_path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(not_found(relative).into());
        }

        let content_type = mime_guess::from_path(&file_path).first_or_octet_stream();
        tracing::debug!(
            file = %file_path.display(),
            content_type = %content_type,
            size = metadata.len(),
            "Streaming file"
        );

        let response = Response::builder()
            .header(CONTENT_TYPE, content_type.as_ref())
            .header(CONTENT_LENGTH, metadata.len())
            .body(Body::from_stream(ReaderStream::new(file)))?;
        Ok(response)
    }

    /// Every document key is served from the index file.
    async fn serve_document(&self, key: &str) -> Result<Response, FrontendError> {
        let file_path = self.root.join(&self.index_file);

        let rewriter = self.rewriter.clone();
        let load_path = file_path.clone();
        let body = self
            .cache
            .get_or_set(key, move || async move {
                let raw = tokio::fs::read(&load_path).await?;
                tracing::debug!(file = %load_path.display(), size = raw.len(), "Loaded document");
                metrics::record_rewrite("static");
                Ok::<_, io::Error>(Bytes::from(rewriter.rewrite_bytes(&raw)))
            })
            .await
            .map_err(|source| FrontendError::Document {
                path: file_path,
                source,
            })?;

        let response = Response::builder()
            .header(CONTENT_TYPE, HTML)
            .body(Body::from(body))?;
        Ok(response)
    }
}

fn not_found(relative: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("`{relative}` not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::fs;
    use std::path::Path;

    fn frontend(root: &Path) -> StaticFrontend {
        StaticFrontend::new(
            root,
            "index.html",
            ContentRewriter::new("/base/"),
            DocumentCache::new(),
        )
    }

    async fn body_of(response: Response) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn test_root_document_is_rewritten_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), r#"<script src="/app.js"></script>"#).unwrap();
        let frontend = frontend(dir.path());

        let response = frontend.handle("/").await.unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], HTML);
        assert_eq!(body_of(response).await, r#"<script src="/base/app.js"></script>"#);

        // A changed file is not picked up: the entry is permanent.
        fs::write(dir.path().join("index.html"), "changed").unwrap();
        let response = frontend.handle("/some/route/").await.unwrap();
        assert_eq!(body_of(response).await, r#"<script src="/base/app.js"></script>"#);

        let stats = frontend.cache().stats();
        assert_eq!(stats.computations, 1);
        assert_eq!(stats.lookups, 2);
    }

    #[tokio::test]
    async fn test_nested_route_serves_root_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<a href=\"/root\">").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("index.html"), "<a href=\"/nested\">").unwrap();
        let frontend = frontend(dir.path());

        let response = frontend.handle("/docs/").await.unwrap();
        assert_eq!(body_of(response).await, "<a href=\"/base/root\">");
        assert!(frontend.cache().contains(path::ROOT_DOCUMENT));
        assert_eq!(frontend.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_file_streamed_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let script = br#"document.write('<img src="/x.png">')"#;
        fs::write(dir.path().join("app.js"), script).unwrap();
        let frontend = frontend(dir.path());

        let response = frontend.handle("/app.js").await.unwrap();
        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.contains("javascript"), "got {content_type}");
        assert_eq!(response.headers()[CONTENT_LENGTH], script.len().to_string().as_str());
        assert_eq!(body_of(response).await, &script[..]);
        assert_eq!(frontend.cache().stats().lookups, 0);
    }

    #[tokio::test]
    async fn test_unknown_extension_is_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blob.unknownext"), [0u8, 159, 146, 150]).unwrap();
        let frontend = frontend(dir.path());

        let response = frontend.handle("/blob.unknownext").await.unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(body_of(response).await, &[0u8, 159, 146, 150][..]);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let frontend = frontend(dir.path());

        let err = frontend.handle("/missing.js").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_directory_and_traversal_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        let frontend = frontend(dir.path());

        assert!(frontend.handle("/assets").await.unwrap_err().is_not_found());
        assert!(frontend.handle("/../etc/passwd").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_missing_index_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let frontend = frontend(dir.path());

        let err = frontend.handle("/").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(frontend.cache().is_empty());

        fs::write(dir.path().join("index.html"), "<a href=\"/x\">").unwrap();
        let response = frontend.handle("/").await.unwrap();
        assert_eq!(body_of(response).await, "<a href=\"/base/x\">");
        assert_eq!(frontend.cache().stats().computations, 2);
    }
}
