//! Development mode: pass-through to the front-end dev server.
//!
//! # Responsibilities
//! - Forward every request to the upstream, collapsing document paths to `/`
//! - Rewrite document response bodies once, stream everything else as-is
//! - Surface upstream failures to the HTTP layer without retrying
//!
//! # Design Decisions
//! - Conditional and encoding headers are dropped on document requests so
//!   the upstream always answers with a full identity-encoded body to rewrite
//! - Non-document bodies are never buffered or decoded

use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{
            HeaderValue, ACCEPT_ENCODING, CONTENT_LENGTH, HOST, IF_MODIFIED_SINCE, IF_NONE_MATCH,
        },
        uri::{Authority, Scheme},
        Request, Uri, Version,
    },
    response::Response,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::frontend::error::FrontendError;
use crate::frontend::path;
use crate::frontend::rewrite::ContentRewriter;
use crate::observability::metrics;

/// Forwards requests to a fixed upstream.
#[derive(Clone)]
pub struct ProxyFrontend {
    upstream: Authority,
    client: Client<HttpConnector, Body>,
    rewriter: ContentRewriter,
}

impl ProxyFrontend {
    pub fn new(upstream: Authority, connect_timeout: Duration, rewriter: ContentRewriter) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            upstream,
            client,
            rewriter,
        }
    }

    /// Forward `request` and relay the upstream response.
    pub async fn handle(&self, request: Request<Body>) -> Result<Response, FrontendError> {
        let document = path::is_document_request(request.uri().path());
        let upstream_request = self.upstream_request(request, document)?;

        tracing::debug!(
            uri = %upstream_request.uri(),
            document,
            "Forwarding to upstream"
        );

        let response = self.client.request(upstream_request).await.map_err(|e| {
            tracing::warn!(upstream = %self.upstream, error = %e, "Upstream request failed");
            e
        })?;

        let (mut parts, body) = response.into_parts();
        if !document {
            return Ok(Response::from_parts(parts, Body::new(body)));
        }

        let raw = axum::body::to_bytes(Body::new(body), usize::MAX)
            .await
            .map_err(FrontendError::UpstreamBody)?;
        let rewritten = self.rewriter.rewrite_bytes(&raw);
        metrics::record_rewrite("proxy");

        // Length changed; hyper recomputes it from the new body.
        parts.headers.remove(CONTENT_LENGTH);
        Ok(Response::from_parts(parts, Body::from(rewritten)))
    }

    fn upstream_request(
        &self,
        request: Request<Body>,
        document: bool,
    ) -> Result<Request<Body>, FrontendError> {
        let (mut parts, body) = request.into_parts();

        let forward_path = path::upstream_path(parts.uri.path());
        let path_and_query = match parts.uri.query() {
            Some(query) => format!("{forward_path}?{query}"),
            None => forward_path.to_string(),
        };
        parts.uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.upstream.clone())
            .path_and_query(path_and_query)
            .build()?;

        // The upstream connection is always HTTP/1.1, whatever the client spoke.
        parts.version = Version::HTTP_11;

        let host = HeaderValue::from_str(self.upstream.as_str()).map_err(axum::http::Error::from)?;
        parts.headers.insert(HOST, host);

        if document {
            parts.headers.remove(IF_NONE_MATCH);
            parts.headers.remove(IF_MODIFIED_SINCE);
            parts.headers.remove(ACCEPT_ENCODING);
        }

        Ok(Request::from_parts(parts, body))
    }
}
