//! Warden Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main Warden web server
pub struct WardenServer {
    config: WebConfig,
    state: AppState,
}

impl WardenServer {
    /// Create a new Warden server
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Start the web server and run until Ctrl+C
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting Warden web server on http://{}", address);
        info!(
            grants = self.state.authorizer.grant_count().await,
            "Authorization policies active"
        );

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for WardenServer
pub struct WardenServerBuilder {
    config: WebConfig,
}

impl WardenServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn with_config(config: WebConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database_url = database_url.into();
        self
    }

    /// Set the problem-details type prefix
    pub fn problem_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.config.problem_base_url = base_url.into();
        self
    }

    /// Verify HS256 tokens with a shared secret
    pub fn jwt_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.config.oauth2.jwt_secret = Some(secret.into());
        self.config.oauth2.public_key_path = None;
        self
    }

    /// Verify RS256 tokens with a PEM public key
    pub fn public_key_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.oauth2.public_key_path = Some(path.into());
        self.config.oauth2.jwt_secret = None;
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<WardenServer> {
        WardenServer::new(self.config).await
    }
}

impl Default for WardenServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
