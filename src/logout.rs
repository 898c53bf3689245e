use url::Url;

use crate::LogoutEndpoint;

/// The hosted UI ends its own session and then redirects to `logout_uri`, which must be registered
/// as a sign-out url of the app client.
pub(crate) fn create_logout_url(
    logout_endpoint: &LogoutEndpoint,
    client_id: &str,
    logout_uri: &str,
) -> Url {
    let mut logout_url: Url = logout_endpoint.clone();
    logout_url
        .query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("logout_uri", logout_uri);
    logout_url
}
