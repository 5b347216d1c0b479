//! HTTP server startup and shutdown

use crate::core::{AppState, BackgroundTasks, Config};
use crate::routes;

/// HTTP server
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let state = AppState::initialize(&config)?;
        Ok(Self { config, state })
    }

    /// Create a server around existing state (tests, embedded use)
    pub fn with_state(config: Config, state: AppState) -> Self {
        Self { config, state }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let mut tasks = BackgroundTasks::new();
        self.state.start_background_tasks(&mut tasks);
        tracing::info!(tasks = tasks.len(), "Background tasks started");

        let app = routes::build_app(&self.state);
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Fulfillment server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await?;

        tasks.shutdown().await;
        Ok(())
    }
}
