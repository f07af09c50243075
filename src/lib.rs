//! Front-end gateway library.
//!
//! Static-asset serving and memoized document rewriting for a bundled web
//! front-end, with a development pass-through proxy mode.

pub mod cache;
pub mod config;
pub mod frontend;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use cache::MemoMap;
pub use config::GatewayConfig;
pub use frontend::{Frontend, Mode};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
