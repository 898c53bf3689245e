use crate::IdToken;

/// HTTP client sending the identity token of the current session as bearer credential.
///
/// This is how the submission proxy learns who submitted a form: it receives the identity token
/// as an opaque `Authorization: Bearer <id token>` header and performs its own credential exchange
/// with the CRM.
///
/// The token is captured when the client is created. Failed requests are never retried.
///
/// Create an instance using [`SessionManager::client()`](crate::SessionManager::client) or
/// [`OAuthSession::client()`](crate::OAuthSession::client).
///
/// # Example
/// ```no_run
/// # use leptos_oauth_session::use_oauth_session;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// if let Some(client) = use_oauth_session().client() {
///     let response = client
///         .post_with("https://api.example.com/leads", |builder| {
///             builder.json(&serde_json::json!({ "email": "a@b.com" }))
///         })
///         .await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthenticatedClient {
    client: reqwest::Client,
    id_token: IdToken,
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("client", &self.client)
            .field("id_token", &"***")
            .finish()
    }
}

impl AuthenticatedClient {
    pub(crate) fn new(client: reqwest::Client, id_token: IdToken) -> Self {
        Self { client, id_token }
    }

    /// Perform a GET request with the bearer credential attached.
    ///
    /// # Errors
    /// Returns an error if the request fails due to network issues, invalid URL, or other `reqwest`
    /// errors. Non-2xx responses are returned as `Ok`.
    pub async fn get(&self, url: impl reqwest::IntoUrl) -> Result<reqwest::Response, reqwest::Error> {
        self.get_with(url, |builder| builder).await
    }

    /// Like [`get`](Self::get), but lets `with` customize the request (query, headers, timeout).
    pub async fn get_with(
        &self,
        url: impl reqwest::IntoUrl,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.request(reqwest::Method::GET, url, with).await
    }

    pub async fn post(&self, url: impl reqwest::IntoUrl) -> Result<reqwest::Response, reqwest::Error> {
        self.post_with(url, |builder| builder).await
    }

    /// Like [`post`](Self::post), but lets `with` customize the request, e.g. to set a JSON body.
    pub async fn post_with(
        &self,
        url: impl reqwest::IntoUrl,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.request(reqwest::Method::POST, url, with).await
    }

    pub async fn put(&self, url: impl reqwest::IntoUrl) -> Result<reqwest::Response, reqwest::Error> {
        self.put_with(url, |builder| builder).await
    }

    pub async fn put_with(
        &self,
        url: impl reqwest::IntoUrl,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.request(reqwest::Method::PUT, url, with).await
    }

    pub async fn delete(
        &self,
        url: impl reqwest::IntoUrl,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.delete_with(url, |builder| builder).await
    }

    pub async fn delete_with(
        &self,
        url: impl reqwest::IntoUrl,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.request(reqwest::Method::DELETE, url, with).await
    }

    /// Performs a request with the identity token set as `AUTHORIZATION` header.
    ///
    /// # Errors
    /// Returns an error if the request fails due to network issues, invalid URL, or other `reqwest`
    /// errors.
    pub async fn request(
        &self,
        method: reqwest::Method,
        url: impl reqwest::IntoUrl,
        with: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let request = with(self.client.request(method, url))
            .bearer_auth(&self.id_token)
            .build()?;
        self.client.execute(request).await
    }
}
