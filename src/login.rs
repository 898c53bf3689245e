use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use url::Url;

use crate::AuthorizationEndpoint;

/// Social identity provider to skip the provider selection of the hosted UI with.
///
/// Rendered as the `identity_provider` query parameter of the authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum IdentityProvider {
    Google,
    Facebook,
    /// Sign in with Apple. Cognito names this provider "SignInWithApple".
    SignInWithApple,
    Microsoft,
    /// Any other provider name configured at the identity provider, e.g. a SAML or OIDC federation.
    Custom(String),
}

impl IdentityProvider {
    pub fn as_str(&self) -> &str {
        match self {
            IdentityProvider::Google => "Google",
            IdentityProvider::Facebook => "Facebook",
            IdentityProvider::SignInWithApple => "SignInWithApple",
            IdentityProvider::Microsoft => "Microsoft",
            IdentityProvider::Custom(name) => name.as_str(),
        }
    }
}

impl Display for IdentityProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for IdentityProvider {
    fn from(value: &str) -> Self {
        match value {
            "Google" => IdentityProvider::Google,
            "Facebook" => IdentityProvider::Facebook,
            "Apple" | "SignInWithApple" => IdentityProvider::SignInWithApple,
            "Microsoft" => IdentityProvider::Microsoft,
            other => IdentityProvider::Custom(other.to_owned()),
        }
    }
}

pub(crate) fn create_login_url(
    authorization_endpoint: &AuthorizationEndpoint,
    client_id: &str,
    response_type: &str,
    scope: &str,
    redirect_uri: &str,
    identity_provider: Option<&IdentityProvider>,
) -> Url {
    let mut login_url: Url = authorization_endpoint.clone();
    login_url
        .query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("response_type", response_type)
        .append_pair("scope", scope)
        .append_pair("redirect_uri", redirect_uri);
    if let Some(identity_provider) = identity_provider {
        login_url
            .query_pairs_mut()
            .append_pair("identity_provider", identity_provider.as_str());
    }
    login_url
}
