use serde::{Deserialize, Serialize};

use crate::response::SuccessTokenResponse;
use crate::{AccessToken, IdToken, RefreshToken};

/// Tokens obtained by redeeming an authorization code.
///
/// Persisted verbatim. A token set is never mutated, only replaced as a whole or cleared.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenSet {
    /// The identity token in JWT compact form. Its payload carries the claims the
    /// [`UserIdentity`](crate::UserIdentity) is derived from.
    /// It is also the bearer credential handed to the downstream submission proxy.
    pub id_token: IdToken,

    /// Access token for the provider's own APIs (e.g. userinfo).
    pub access_token: AccessToken,

    /// Only present when the provider issued one.
    pub refresh_token: Option<RefreshToken>,
}

// Tokens must never end up in logs.
impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("id_token", &"***")
            .field("access_token", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl From<SuccessTokenResponse> for TokenSet {
    fn from(value: SuccessTokenResponse) -> Self {
        Self {
            id_token: value.id_token,
            access_token: value.access_token,
            refresh_token: value.refresh_token.filter(|it| !it.is_empty()),
        }
    }
}
