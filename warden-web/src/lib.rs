//! Warden Web Server
//!
//! Bearer-token authentication and grant-based authorization in front of the
//! admin API.

pub mod auth;
pub mod authz;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;
pub mod storage;

// Re-export main types
pub use server::{WardenServer, WardenServerBuilder};
pub use state::AppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    Router,
};
use handlers::ErrorResponse;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;
use warden_core::{OAuth2Config, WardenConfig, WardenError};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ]))
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Prefix of problem-details `type` URIs
    pub problem_base_url: String,
    /// Token verification key and clock leeway
    pub oauth2: OAuth2Config,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::from_warden_config(&WardenConfig::default())
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            host: var("WARDEN_HOST").unwrap_or(defaults.host),
            port: var("WARDEN_PORT")
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: defaults.max_connections,
            problem_base_url: var("WARDEN_PROBLEM_BASE_URL").unwrap_or(defaults.problem_base_url),
            oauth2: OAuth2Config {
                public_key_path: var("OAUTH2_PUBLIC_KEY_PATH"),
                jwt_secret: var("OAUTH2_JWT_SECRET"),
                leeway_secs: defaults.oauth2.leeway_secs,
            },
        }
    }

    /// Flatten the file-based configuration
    pub fn from_warden_config(config: &WardenConfig) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            database_url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            problem_base_url: config.problem.base_url.clone(),
            oauth2: config.oauth2.clone(),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Core(#[from] WardenError),
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            WebError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            WebError::Forbidden(_) => "forbidden",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server-side causes are logged, not returned.
        let message = if status.is_server_error() {
            match &self {
                WebError::Core(err) => err.log(),
                other => error!("Request failed: {}", other),
            }
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: self.code().to_string(),
                message,
            }),
        )
            .into_response()
    }
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Initialize logging for the web server
pub fn init_logging(
    config: &warden_core::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    warden_core::init_logging(config)
}
