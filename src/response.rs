use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use url::Url;

/// What the identity provider told us by redirecting back to the application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) enum CallbackResponse {
    SuccessfulLogin(SuccessLoginResponse),
    Error(ErrorResponse),
}

/// A structure representing a successful login callback response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct SuccessLoginResponse {
    pub code: String,
    pub state: Option<String>,
}

/// Query parameters owned by the authorization callback. They are removed from the visible URL
/// once the callback was handled.
pub(crate) const CALLBACK_QUERY_PARAMETERS: [&str; 5] =
    ["code", "state", "error", "error_description", "error_uri"];

impl CallbackResponse {
    /// Inspect the query of `url`. Returns `None` when the URL carries no callback parameters,
    /// which is the expected case on every page load that is not a redirect from the provider.
    pub(crate) fn from_url(url: &Url) -> Option<Self> {
        let mut code = None;
        let mut state = None;
        let mut error = None;
        let mut error_description = None;
        let mut error_uri = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                "error_description" => error_description = Some(value.into_owned()),
                "error_uri" => error_uri = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(code) = code.filter(|it| !it.is_empty()) {
            return Some(CallbackResponse::SuccessfulLogin(SuccessLoginResponse {
                code,
                state,
            }));
        }

        error.map(|error| {
            CallbackResponse::Error(ErrorResponse {
                error: OidcErrorCode::parse(&error),
                error_description,
                error_uri,
            })
        })
    }
}

/// Body of a successful `POST /oauth2/token`.
///
/// Only `id_token` and `access_token` are required. Anything else the provider sends is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct SuccessTokenResponse {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

/// See [RFC 6749 Section 4.1.2.1](https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.2.1)
/// and [Section 5.2](https://datatracker.ietf.org/doc/html/rfc6749#section-5.2) for details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum KnownOidcErrorCode {
    /// The request is missing a required parameter, includes an unsupported parameter value
    /// (other than grant type), repeats a parameter, includes multiple credentials,
    /// utilizes more than one mechanism for authenticating the client, or is otherwise malformed.
    #[serde(rename = "invalid_request")]
    InvalidRequest,

    /// Client authentication failed (e.g., unknown client, no client authentication included,
    /// or unsupported authentication method).
    #[serde(rename = "invalid_client")]
    InvalidClient,

    /// The provided authorization grant (e.g., authorization code, resource owner credentials) or
    /// refresh token is invalid, expired, revoked, does not match the redirection URI used in the
    /// authorization request, or was issued to another client.
    #[serde(rename = "invalid_grant")]
    InvalidGrant,

    /// The authenticated client is not authorized to use this authorization grant type.
    #[serde(rename = "unauthorized_client")]
    UnauthorizedClient,

    /// The authorization grant type is not supported by the authorization server.
    #[serde(rename = "unsupported_grant_type")]
    UnsupportedGrantType,

    /// The requested scope is invalid, unknown, malformed, or exceeds the scope granted by the
    /// resource owner.
    #[serde(rename = "invalid_scope")]
    InvalidScope,

    /// The resource owner or authorization server denied the request.
    /// Hosted login pages report this when the user cancels the sign-in.
    #[serde(rename = "access_denied")]
    AccessDenied,

    /// The authorization server does not support obtaining an authorization code using this method.
    #[serde(rename = "unsupported_response_type")]
    UnsupportedResponseType,

    /// The authorization server encountered an unexpected condition.
    #[serde(rename = "server_error")]
    ServerError,

    /// The authorization server is currently unable to handle the request.
    #[serde(rename = "temporarily_unavailable")]
    TemporarilyUnavailable,
}

impl KnownOidcErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            KnownOidcErrorCode::InvalidRequest => "invalid_request",
            KnownOidcErrorCode::InvalidClient => "invalid_client",
            KnownOidcErrorCode::InvalidGrant => "invalid_grant",
            KnownOidcErrorCode::UnauthorizedClient => "unauthorized_client",
            KnownOidcErrorCode::UnsupportedGrantType => "unsupported_grant_type",
            KnownOidcErrorCode::InvalidScope => "invalid_scope",
            KnownOidcErrorCode::AccessDenied => "access_denied",
            KnownOidcErrorCode::UnsupportedResponseType => "unsupported_response_type",
            KnownOidcErrorCode::ServerError => "server_error",
            KnownOidcErrorCode::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OidcErrorCode {
    Known(KnownOidcErrorCode),
    Unknown(String),
}

impl OidcErrorCode {
    /// Parse a raw error code, as found in a query parameter.
    pub(crate) fn parse(raw: &str) -> Self {
        serde_json::from_value::<KnownOidcErrorCode>(serde_json::Value::String(raw.to_owned()))
            .map(OidcErrorCode::Known)
            .unwrap_or_else(|_| OidcErrorCode::Unknown(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            OidcErrorCode::Known(known) => known.as_str(),
            OidcErrorCode::Unknown(unknown) => unknown.as_str(),
        }
    }
}

impl Display for OidcErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth error response received from the identity provider.
///
/// Either read from the body of a failed token request or from the query parameters of an
/// authorization callback. Errors follow the OAuth 2.0 error response format.
///
/// See [RFC 6749 Section 5.2](https://datatracker.ietf.org/doc/html/rfc6749#section-5.2) for details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// The error code (e.g., `invalid_client` or `invalid_grant`).
    pub error: OidcErrorCode,

    /// OPTIONAL. Human-readable ASCII text providing additional information.
    pub error_description: Option<String>,

    /// OPTIONAL. A URI identifying a human-readable web page with information about the error.
    pub error_uri: Option<String>,
}

impl ErrorResponse {
    /// Check if the provider rejected the authorization code itself, e.g. because it was already
    /// redeemed or has expired.
    pub fn is_invalid_grant(&self) -> bool {
        self.error == OidcErrorCode::Known(KnownOidcErrorCode::InvalidGrant)
    }

    /// Check if the user declined or cancelled the sign-in on the hosted UI.
    pub fn is_access_denied(&self) -> bool {
        self.error == OidcErrorCode::Known(KnownOidcErrorCode::AccessDenied)
    }
}
