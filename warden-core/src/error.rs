//! Unified error handling system
//!
//! Provides structured error types with context and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type WardenResult<T> = Result<T, WardenError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for Warden
#[derive(Error, Debug)]
pub enum WardenError {
    /// A storage query failed. `code` carries the driver-specific error code when the
    /// driver reported one.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        code: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Authorization error: {message}")]
    Authorization {
        message: String,
        context: ErrorContext,
    },

    /// Raised by policy operations that are deliberately not supported.
    #[error("{operation}: not implemented")]
    Unsupported {
        operation: String,
        context: ErrorContext,
    },
}

impl WardenError {
    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            WardenError::Storage { context, .. }
            | WardenError::Config { context, .. }
            | WardenError::Authorization { context, .. }
            | WardenError::Unsupported { context, .. } => context,
        }
    }

    /// Driver-specific error code of a storage failure
    pub fn storage_code(&self) -> Option<&str> {
        match self {
            WardenError::Storage { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether this is the error raised by an unsupported policy operation
    pub fn is_unsupported(&self) -> bool {
        matches!(self, WardenError::Unsupported { .. })
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().error_id.as_str();
        match self {
            WardenError::Storage { code, .. } => {
                error!(error_id, code = code.as_deref(), error = %self, "Storage error occurred");
            }
            WardenError::Config { .. } => {
                error!(error_id, error = %self, "Configuration error");
            }
            WardenError::Authorization { .. } => {
                warn!(error_id, error = %self, "Access control error");
            }
            WardenError::Unsupported { .. } => {
                warn!(error_id, error = %self, "Unsupported operation requested");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::WardenError::Storage {
            message: $msg.to_string(),
            code: None,
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $code:expr, $component:expr) => {
        $crate::WardenError::Storage {
            message: $msg.to_string(),
            code: $code,
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! unsupported_error {
    ($operation:expr, $component:expr) => {
        $crate::WardenError::Unsupported {
            operation: $operation.to_string(),
            context: $crate::ErrorContext::new($component).with_operation($operation),
        }
    };
}
