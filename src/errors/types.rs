use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the Upstream Client when every ranked instance in scope
/// has failed (a transient upstream failure).
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("all instances exhausted for {kind}: {reasons:?}")]
    AllInstancesFailed {
        kind: String,
        reasons: Vec<(String, String)>,
    },

    #[error("no instances configured for {kind}")]
    NoInstances { kind: String },
}

/// Errors from the Stream Resolver. "Unavailable" is not a crash path — it is
/// the documented terminal outcome when both service kinds are exhausted.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("stream unavailable for video {video_id}")]
    Unavailable { video_id: String },
}

/// Auth-layer errors; never bubble to the core resolve/proxy logic.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application error: a thin enum of `#[from]` wrappers plus a
/// couple of ad-hoc variants for envelope messages that don't map cleanly
/// onto an upstream cause.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Permanent media failure: the retry ladder exhausted all
    /// three attempts. `localized` is the only text ever shown to the client —
    /// never the raw upstream body.
    #[error("stream access denied: {localized}")]
    StreamDenied { localized: String, last_403: bool },

    #[error("stream unavailable: {localized}")]
    StreamUnavailable { localized: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GatewayError::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to reach any upstream instance".to_string(),
            ),
            GatewayError::Resolve(ResolveError::Unavailable { .. }) => (
                StatusCode::NOT_FOUND,
                "Unable to load stream".to_string(),
            ),
            GatewayError::Auth(AuthError::MissingToken) => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            GatewayError::Auth(AuthError::InvalidToken(_)) => {
                (StatusCode::FORBIDDEN, "Invalid or expired token".to_string())
            }
            GatewayError::Auth(AuthError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            GatewayError::StreamDenied { localized, last_403 } => {
                let status = if *last_403 {
                    StatusCode::FORBIDDEN
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, localized.clone())
            }
            GatewayError::StreamUnavailable { localized } => {
                (StatusCode::INTERNAL_SERVER_ERROR, localized.clone())
            }
            GatewayError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone()),
            GatewayError::Internal { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            }
        };

        tracing::error!(error = %self, "request failed");

        let body = ErrorEnvelope {
            message,
            error: None,
        };
        (status, Json(body)).into_response()
    }
}
