//! Helper functions for creating specific error types

use super::types::GatewayError;

impl GatewayError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn store_unavailable<S: Into<String>>(message: S) -> Self {
        Self::StoreUnavailable(message.into())
    }

    pub fn unknown_scope<S: Into<String>>(scope: S) -> Self {
        Self::UnknownScope(scope.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error stems from the counter store rather than from
    /// configuration or the request itself
    pub fn is_store_failure(&self) -> bool {
        match self {
            GatewayError::StoreUnavailable(_) => true,
            #[cfg(feature = "redis")]
            GatewayError::Redis(_) => true,
            _ => false,
        }
    }
}
