//! Clarity HTTP/WebSocket server.

use std::future::Future;
use std::sync::Arc;

use clarity_ai::AiGateway;
use clarity_store::{Store, StoreError};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

pub mod bus;
pub mod config;
pub mod http;

pub use bus::{Event, NotificationBus};
pub use config::{ConfigError, ServerConfig};
pub use http::{AppState, router};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self, StoreError> {
        Ok(Self {
            store: Arc::new(Store::open(&config.data_dir)?),
            ai: AiGateway::new(&config.ai),
            bus: NotificationBus::default(),
        })
    }
}

/// Run the server until `shutdown` resolves, then drain in-flight requests.
pub async fn serve(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServeError> {
    let state = AppState::new(&config)?;
    info!(
        chat_model = state.ai.approvals.is_configured(),
        suggestion_webhook = state.ai.suggestions.is_configured(),
        "AI gateway ready"
    );

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: config.bind_addr,
            source,
        })?;
    info!(addr = %config.bind_addr, data_dir = %config.data_dir.display(), "clarity server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("clarity server stopped");
    Ok(())
}
