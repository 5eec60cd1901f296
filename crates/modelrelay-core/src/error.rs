//! Error taxonomy shared by the providers, the router, and the HTTP surface.
//!
//! `TransportError` describes one failed provider call. `RelayError` is what
//! a routing decision ends with; every variant knows its HTTP status and the
//! fixed user-facing message, while `Display` carries the diagnostic detail.

use http::StatusCode;
use thiserror::Error;

/// Substrings (lowercase) that mark a provider error as a rejected credential.
const AUTH_FAILURE_PATTERNS: &[&str] = &[
    "api key",
    "api_key",
    "x-api-key",
    "authentication",
    "unauthorized",
];

/// Fixed message shown when a provider rejects the configured credential.
pub const MSG_INVALID_KEY: &str = "Invalid API key. Please check your API key configuration.";
/// Fixed message shown for any other provider failure.
pub const MSG_SERVICE_ERROR: &str =
    "I encountered an error connecting to the AI service. Please try again.";
/// Fixed message shown when no provider can serve the request.
pub const MSG_NOT_AVAILABLE: &str = "The requested AI model is not available.";

// ─────────────────────────────────────────────
// TransportError
// ─────────────────────────────────────────────

/// A single provider call that did not produce text.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The provider answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The call exceeded the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection-level failure (DNS, TLS, refused, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered 2xx but the body was not the expected shape.
    #[error("failed to decode provider response: {0}")]
    Decode(String),

    /// The provider answered 2xx with no generated text.
    #[error("provider returned no text")]
    EmptyResponse,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// Whether this failure means the provider rejected our credential.
    pub fn is_auth_failure(&self) -> bool {
        if let TransportError::Http { status, .. } = self {
            if *status == 401 || *status == 403 {
                return true;
            }
        }
        let text = self.to_string().to_lowercase();
        AUTH_FAILURE_PATTERNS.iter().any(|p| text.contains(p))
    }
}

// ─────────────────────────────────────────────
// RelayError
// ─────────────────────────────────────────────

/// Terminal outcome of a request that did not produce text.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required text field was absent or empty.
    #[error("missing {field} in request")]
    Validation { field: &'static str },

    /// The requested model id is not offered by any provider.
    #[error("unknown model: {model}")]
    UnknownModel { model: String },

    /// A toggle named a provider that does not exist.
    #[error("unknown provider: {provider}")]
    UnknownProvider { provider: String },

    /// The provider rejected the configured credential.
    #[error("{provider} rejected the credential for {model}: {detail}")]
    Authorization {
        provider: String,
        model: String,
        detail: String,
    },

    /// The provider call failed for any other reason.
    #[error("{provider} call for {model} failed: {source}")]
    Transport {
        provider: String,
        model: String,
        #[source]
        source: TransportError,
    },

    /// Every candidate was unavailable or failed.
    #[error("no model is available to serve the request")]
    NoProviderAvailable,
}

impl RelayError {
    /// Classify a transport failure: credential rejection becomes
    /// `Authorization`, everything else stays a `Transport` error.
    pub fn from_transport(provider: &str, model: &str, err: TransportError) -> Self {
        if err.is_auth_failure() {
            RelayError::Authorization {
                provider: provider.to_string(),
                model: model.to_string(),
                detail: err.to_string(),
            }
        } else {
            RelayError::Transport {
                provider: provider.to_string(),
                model: model.to_string(),
                source: err,
            }
        }
    }

    /// HTTP status equivalent.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation { .. } => StatusCode::BAD_REQUEST,
            RelayError::UnknownModel { .. } | RelayError::NoProviderAvailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            RelayError::UnknownProvider { .. } => StatusCode::NOT_FOUND,
            RelayError::Authorization { .. } => StatusCode::UNAUTHORIZED,
            RelayError::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Friendly fixed text, distinct from the diagnostic detail.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::Validation { field } => format!("Missing {field} in request"),
            RelayError::UnknownModel { .. } | RelayError::NoProviderAvailable => {
                MSG_NOT_AVAILABLE.to_string()
            }
            RelayError::UnknownProvider { provider } => format!("unknown provider: {provider}"),
            RelayError::Authorization { .. } => MSG_INVALID_KEY.to_string(),
            RelayError::Transport { .. } => MSG_SERVICE_ERROR.to_string(),
        }
    }

    /// Whether the caller should render the "no model" body (`model: "mock"`).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RelayError::UnknownModel { .. } | RelayError::NoProviderAvailable
        )
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
