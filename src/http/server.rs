//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router mounting the selected frontend on every path
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve on a listener until shutdown is signalled
//! - Record per-request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{uri::InvalidUri, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::frontend::Frontend;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub frontend: Arc<Frontend>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    frontend: Arc<Frontend>,
}

impl HttpServer {
    /// Create a new HTTP server, selecting the frontend from `config`.
    pub fn new(config: GatewayConfig) -> Result<Self, InvalidUri> {
        let frontend = Frontend::from_config(&config)?;
        Ok(Self::with_frontend(config, frontend))
    }

    /// Create a server around an already constructed frontend.
    pub fn with_frontend(config: GatewayConfig, frontend: Frontend) -> Self {
        let frontend = Arc::new(frontend);
        let state = AppState {
            frontend: Arc::clone(&frontend),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            frontend,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/", any(frontend_handler))
            .route("/{*path}", any(frontend_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = %self.frontend.mode(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn frontend(&self) -> &Arc<Frontend> {
        &self.frontend
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Serves every path through the selected frontend.
async fn frontend_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let mode = state.frontend.mode();

    let response = match state.frontend.handle(request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(mode.as_str(), response.status().as_u16(), start);
    response
}
