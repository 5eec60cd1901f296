//! Gateway server — Axum-based HTTP surface over the router

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use modelrelay_providers::registry::PROVIDERS;
use modelrelay_router::Router as RelayRouter;

use crate::handlers;

/// Shared state for every request
#[derive(Clone)]
pub struct GatewayState {
    pub router: Arc<RelayRouter>,
    pub start_time: Instant,
}

/// The gateway server
pub struct GatewayServer {
    state: GatewayState,
    bind: SocketAddr,
    cors_origins: Vec<String>,
}

impl GatewayServer {
    /// Create a new gateway server
    pub fn new(router: Arc<RelayRouter>, bind: SocketAddr, cors_origins: Vec<String>) -> Self {
        let state = GatewayState {
            router,
            start_time: Instant::now(),
        };
        Self {
            state,
            bind,
            cors_origins,
        }
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        let mut app: Router<GatewayState> = Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health))
            .route("/models", get(handlers::models))
            .route("/verify-key", get(handlers::verify_key))
            .route("/chat", post(handlers::chat))
            .route("/code-generate", post(handlers::code_generate))
            .route("/toggle/{provider}", post(handlers::toggle));

        // Fixed toggle routes: /toggle-openai, /toggle-claude, ...
        for spec in PROVIDERS {
            let id = spec.id;
            for name in std::iter::once(id).chain(spec.aliases.iter().copied()) {
                app = app.route(
                    &format!("/toggle-{name}"),
                    post(move |state: State<GatewayState>| handlers::toggle_named(state, id)),
                );
            }
        }

        app.layer(cors_layer(&self.cors_origins))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the server (blocks until Ctrl+C)
    pub async fn run(self) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind).await?;
        info!("Gateway listening on {}", self.bind);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}

/// CORS policy: listed origins (or any, for `"*"`), GET/POST/OPTIONS, and the
/// headers browser clients send.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::any()
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o.trim()) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
