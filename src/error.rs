use crate::response::ErrorResponse;
use crate::token_claims::TokenDecodeError;
use snafu::Snafu;
use std::sync::Arc;
use std::time::Duration;

/// Failures reported through the `on_auth_error` listeners of a
/// [`SessionManager`](crate::SessionManager).
///
/// Every variant is reported exactly once. Nothing is retried automatically: an authorization code
/// is single-use, so a retry would fail on the provider side anyway.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AuthError {
    /// The token endpoint answered with a non-2xx status or with a body missing the tokens.
    #[snafu(display("AuthError: Token exchange failed with status {status}"))]
    ExchangeFailed {
        status: http::StatusCode,
        body: String,
        /// The OAuth error body, if the provider sent one.
        error_response: Option<ErrorResponse>,
    },

    /// The token endpoint did not answer within the configured deadline.
    #[snafu(display("AuthError: Token exchange timed out after {timeout:?}"))]
    Timeout { timeout: Duration },

    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[snafu(display("AuthError: Could not send token request"))]
    Send {
        #[snafu(source(from(reqwest::Error, Arc::new)))]
        source: Arc<reqwest::Error>,
    },

    /// The identity token received from the exchange could not be decoded.
    #[snafu(display("AuthError: Received a malformed identity token"))]
    MalformedToken { source: TokenDecodeError },

    /// The identity provider redirected back with an `error` instead of a `code`.
    #[snafu(display("AuthError: Identity provider reported '{}'", error_response.error))]
    Provider { error_response: ErrorResponse },
}

impl AuthError {
    /// HTTP status of a failed exchange, if the provider answered at all.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            AuthError::ExchangeFailed { status, .. } => Some(*status),
            AuthError::Timeout { .. }
            | AuthError::Send { .. }
            | AuthError::MalformedToken { .. }
            | AuthError::Provider { .. } => None,
        }
    }

    /// Whether letting the user start a fresh sign-in is likely to succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Timeout { .. } | AuthError::Send { .. })
            || self.status().is_some_and(|status| status.is_server_error())
    }
}
