//! Error taxonomy surfaced to callers of the client.

use expensync_api_models::ServerMessage;
use thiserror::Error;

use crate::config::ConfigError;
use crate::session::StoreError;

/// Message used when nothing better is available.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

/// Primary error type returned by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered 401.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// `true` when the request was already retried after a refresh.
        retry_exhausted: bool,
        /// Best-available message.
        message: String,
        /// Decoded error body, when the backend sent one.
        body: Option<ServerMessage>,
    },
    /// The session could not be recovered and was cleared.
    #[error("session expired: {reason}")]
    SessionExpired {
        /// Why recovery failed.
        reason: String,
    },
    /// The request never produced a response.
    #[error("network error: {message}")]
    Network {
        /// Transport failure description.
        message: String,
    },
    /// Non-2xx response outside the 4xx range.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Best-available message.
        message: String,
        /// Decoded error body, when the backend sent one.
        body: Option<ServerMessage>,
    },
    /// 4xx response other than 401, typically bad caller input.
    #[error("request rejected ({status}): {message}")]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Best-available message.
        message: String,
        /// Decoded error body, when the backend sent one.
        body: Option<ServerMessage>,
    },
    /// Input was rejected before any request was sent.
    #[error("invalid request: {message}")]
    InvalidInput {
        /// What was wrong.
        message: String,
    },
    /// A request body could not be serialised.
    #[error("failed to encode request body")]
    Encode {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// A successful response body did not match the expected shape.
    #[error("failed to decode response from {url}")]
    Decode {
        /// URL whose response failed to decode.
        url: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// Base URL or setting resolution failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Persisting or clearing session data failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for client results.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Best-available human-readable message for notices.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized { message, .. }
            | Self::Network { message }
            | Self::Server { message, .. }
            | Self::Validation { message, .. }
            | Self::InvalidInput { message } => message.clone(),
            Self::SessionExpired { .. } => "Session expired. Please login again.".to_string(),
            other => other.to_string(),
        }
    }

    /// HTTP status associated with the failure, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Server { status, .. } | Self::Validation { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded error body, when the backend sent one.
    #[must_use]
    pub const fn server_body(&self) -> Option<&ServerMessage> {
        match self {
            Self::Unauthorized { body, .. }
            | Self::Server { body, .. }
            | Self::Validation { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Whether this is a 401 that has not yet been through refresh recovery.
    #[must_use]
    pub const fn is_recoverable_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized {
                retry_exhausted: false,
                ..
            }
        )
    }

    /// Whether the caller should treat the user as signed out.
    #[must_use]
    pub const fn ends_session(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired { .. }
                | Self::Unauthorized {
                    retry_exhausted: true,
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_uses_best_available_text() {
        let err = ApiError::Validation {
            status: 422,
            message: "amount is required".into(),
            body: None,
        };
        assert_eq!(err.message(), "amount is required");
        assert_eq!(err.status(), Some(422));

        let expired = ApiError::SessionExpired {
            reason: "refresh rejected".into(),
        };
        assert_eq!(expired.message(), "Session expired. Please login again.");
        assert!(expired.ends_session());
    }

    #[test]
    fn unauthorized_recoverability_tracks_retry_flag() {
        let first = ApiError::Unauthorized {
            retry_exhausted: false,
            message: "jwt expired".into(),
            body: None,
        };
        let second = ApiError::Unauthorized {
            retry_exhausted: true,
            message: "jwt expired".into(),
            body: None,
        };
        assert!(first.is_recoverable_unauthorized());
        assert!(!first.ends_session());
        assert!(!second.is_recoverable_unauthorized());
        assert!(second.ends_session());
        assert_eq!(second.status(), Some(401));
    }

    #[test]
    fn server_body_is_exposed_for_http_failures() {
        let err = ApiError::Server {
            status: 503,
            message: "maintenance".into(),
            body: Some(ServerMessage {
                msg: Some("maintenance".into()),
                ..ServerMessage::default()
            }),
        };
        assert_eq!(
            err.server_body().and_then(ServerMessage::best_message),
            Some("maintenance")
        );
        assert!(
            ApiError::Network {
                message: "offline".into()
            }
            .server_body()
            .is_none()
        );
    }
}
