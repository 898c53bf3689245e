use snafu::{ResultExt, Snafu};
use url::Url;

use crate::{AuthorizationEndpoint, LogoutEndpoint, TokenEndpoint};

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum DerivedUrlError {
    #[snafu(display("DerivedUrlError: Could not join '{path}' onto the provider url"))]
    Parsing {
        path: String,
        source: url::ParseError,
    },
}

/// Provider endpoint URLs derived from the configured domain.
///
/// Endpoints include:
/// - **Authorization Endpoint**: For initiating the authorization code flow
/// - **Token Endpoint**: For exchanging authorization codes
/// - **Logout Endpoint**: For ending the hosted UI session
///
/// Computed once while validating the configuration, so a malformed path surfaces at construction
/// time instead of on the first request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_field_names)] // Allow all field names to end with `_endpoint`.
pub struct DerivedUrls {
    pub(crate) authorization_endpoint: AuthorizationEndpoint,
    pub(crate) token_endpoint: TokenEndpoint,
    pub(crate) logout_endpoint: LogoutEndpoint,
}

impl DerivedUrls {
    pub(crate) fn new(
        base: &Url,
        authorize_path: &str,
        token_path: &str,
        logout_path: &str,
    ) -> Result<Self, DerivedUrlError> {
        Ok(Self {
            authorization_endpoint: join(base, authorize_path)?,
            token_endpoint: join(base, token_path)?,
            logout_endpoint: join(base, logout_path)?,
        })
    }

    pub fn authorization_endpoint(&self) -> &AuthorizationEndpoint {
        &self.authorization_endpoint
    }

    pub fn token_endpoint(&self) -> &TokenEndpoint {
        &self.token_endpoint
    }

    pub fn logout_endpoint(&self) -> &LogoutEndpoint {
        &self.logout_endpoint
    }
}

fn join(base: &Url, path: &str) -> Result<Url, DerivedUrlError> {
    let mut url = base.join(path).context(ParsingSnafu { path })?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
