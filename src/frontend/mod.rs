//! Front-end serving subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     FrontendConfig.dev
//!         true  → Frontend::Proxy  (ProxyFrontend → upstream dev server)
//!         false → Frontend::Static (StaticFrontend + DocumentCache)
//!
//! Per request (Frontend::handle):
//!     Proxy:  path.rs (document?) → forward → rewrite.rs on documents
//!     Static: path.rs (resolve)   → File: stream from disk
//!                                 → Document: cache → read + rewrite.rs
//! ```
//!
//! # Design Decisions
//! - The mode is chosen once; no per-request branching on configuration
//! - Rewriting applies only to documents, never to streamed assets
//! - The document cache is created by the caller and handed in

pub mod error;
pub mod path;
pub mod proxy;
pub mod rewrite;
pub mod static_files;

use std::fmt;
use std::time::Duration;

use axum::{
    body::Body,
    http::{
        uri::{Authority, InvalidUri},
        Request,
    },
    response::Response,
};

use crate::config::GatewayConfig;

pub use error::FrontendError;
pub use proxy::ProxyFrontend;
pub use rewrite::ContentRewriter;
pub use static_files::{DocumentCache, StaticFrontend};

/// The serving strategy selected at startup.
#[derive(Clone)]
pub enum Frontend {
    /// Development: forward to the dev server.
    Proxy(ProxyFrontend),
    /// Production: serve the built files.
    Static(StaticFrontend),
}

/// Which strategy a [`Frontend`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Proxy,
    Static,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Proxy => "proxy",
            Mode::Static => "static",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Frontend {
    /// Pick the strategy from the development flag.
    ///
    /// Only fails on an upstream address that is not a valid `host:port`,
    /// which validated configs never contain.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, InvalidUri> {
        let frontend = &config.frontend;
        let rewriter = ContentRewriter::new(frontend.base_path.clone());

        let selected = if frontend.dev {
            let upstream: Authority = frontend.upstream.parse()?;
            tracing::info!(upstream = %upstream, base_path = %frontend.base_path, "frontend: proxied");
            Frontend::Proxy(ProxyFrontend::new(
                upstream,
                Duration::from_secs(config.timeouts.connect_secs),
                rewriter,
            ))
        } else {
            tracing::info!(
                root_dir = %frontend.root_dir.display(),
                base_path = %frontend.base_path,
                "frontend: static"
            );
            Frontend::Static(StaticFrontend::new(
                frontend.root_dir.clone(),
                frontend.index_file.clone(),
                rewriter,
                DocumentCache::new(),
            ))
        };

        Ok(selected)
    }

    pub fn mode(&self) -> Mode {
        match self {
            Frontend::Proxy(_) => Mode::Proxy,
            Frontend::Static(_) => Mode::Static,
        }
    }

    /// Serve one request with the selected strategy.
    pub async fn handle(&self, request: Request<Body>) -> Result<Response, FrontendError> {
        match self {
            Frontend::Proxy(proxy) => proxy.handle(request).await,
            Frontend::Static(files) => {
                let path = request.uri().path().to_owned();
                files.handle(&path).await
            }
        }
    }

    /// The static server, when running in production mode.
    pub fn as_static(&self) -> Option<&StaticFrontend> {
        match self {
            Frontend::Static(files) => Some(files),
            Frontend::Proxy(_) => None,
        }
    }
}
