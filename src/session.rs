use snafu::ResultExt;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use url::Url;

use crate::authenticated_client::AuthenticatedClient;
use crate::config::SessionConfig;
use crate::error::{AuthError, MalformedTokenSnafu, ProviderSnafu};
use crate::internal::sync::lock;
use crate::login::{IdentityProvider, create_login_url};
use crate::logout::create_logout_url;
use crate::navigation::{BrowserNavigator, Navigator, without_query_parameters};
use crate::request::exchange_code_for_token;
use crate::response::{CALLBACK_QUERY_PARAMETERS, CallbackResponse, ErrorResponse};
use crate::state::{Session, SessionState};
use crate::storage::{BrowserSessionStorage, SessionStore, TokenStore};
use crate::token_claims::UserIdentity;
use crate::{AccessToken, AuthorizationCode, IdToken};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    on_auth_success: Vec<Listener<UserIdentity>>,
    on_auth_error: Vec<Listener<AuthError>>,
    on_state_change: Vec<Listener<SessionState>>,
}

/// Owns the authentication state of one application instance.
///
/// Call [`SessionManager::initialize`] once per page load. It either redeems the authorization code
/// the identity provider redirected back with, or restores a previously stored session.
/// Results are reported through the registered listeners, never returned or thrown.
pub struct SessionManager<S = BrowserSessionStorage, N = BrowserNavigator> {
    config: SessionConfig,
    client: reqwest::Client,
    store: TokenStore<S>,
    navigator: N,
    state: Mutex<SessionState>,
    consumed_codes: Mutex<HashSet<AuthorizationCode>>,
    listeners: Mutex<Listeners>,
}

impl<S, N> Debug for SessionManager<S, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("state", &lock(&self.state).name())
            .finish_non_exhaustive()
    }
}

impl SessionManager<BrowserSessionStorage, BrowserNavigator> {
    /// A manager persisting to `window.sessionStorage` and navigating the current browser window.
    pub fn in_browser(config: SessionConfig) -> Self {
        Self::new(config, BrowserSessionStorage, BrowserNavigator)
    }
}

impl<S: SessionStore, N: Navigator> SessionManager<S, N> {
    pub fn new(config: SessionConfig, store: S, navigator: N) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            store: TokenStore::new(store),
            navigator,
            state: Mutex::new(SessionState::Unauthenticated),
            consumed_codes: Mutex::new(HashSet::new()),
            listeners: Mutex::new(Listeners::default()),
        }
    }

    /// Use a preconfigured http client for the token exchange and for
    /// [`AuthenticatedClient`]s handed out by this manager.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn token_store(&self) -> &TokenStore<S> {
        &self.store
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        lock(&self.state).clone()
    }

    /// Called once with the identity of every successful exchange or restoration.
    pub fn on_auth_success(&self, listener: impl Fn(&UserIdentity) + Send + Sync + 'static) {
        lock(&self.listeners)
            .on_auth_success
            .push(Arc::new(listener));
    }

    /// Called once for every failed exchange and for errors reported by the identity provider.
    pub fn on_auth_error(&self, listener: impl Fn(&AuthError) + Send + Sync + 'static) {
        lock(&self.listeners).on_auth_error.push(Arc::new(listener));
    }

    /// Called after every state transition, including sign-out and expiry.
    pub fn on_state_change(&self, listener: impl Fn(&SessionState) + Send + Sync + 'static) {
        lock(&self.listeners)
            .on_state_change
            .push(Arc::new(listener));
    }

    /// Handle the current page load.
    ///
    /// - `?code=...`: redeem the code, persist the tokens and report the identity.
    /// - `?error=...`: report the provider error.
    /// - otherwise: restore a stored session, silently staying unauthenticated if there is none
    ///   or if it expired.
    ///
    /// Callback parameters are removed from the visible URL in every case where they were present.
    /// Invoking this again for an already consumed code does nothing.
    pub async fn initialize(&self) {
        let current_url = match self.navigator.current_url() {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(?err, "Could not read current url. Only restoring stored session.");
                self.restore();
                return;
            }
        };

        match CallbackResponse::from_url(&current_url) {
            Some(CallbackResponse::SuccessfulLogin(login)) => {
                tracing::trace!(has_state = login.state.is_some(), "Received authorization code.");
                self.exchange(&current_url, login.code).await;
            }
            Some(CallbackResponse::Error(error_response)) => {
                self.report_provider_error(&current_url, error_response);
            }
            None => self.restore(),
        }
    }

    async fn exchange(&self, current_url: &Url, code: AuthorizationCode) {
        // Consumed before the request is sent, so a concurrent second call cannot submit it again.
        if !lock(&self.consumed_codes).insert(code.clone()) {
            tracing::debug!("Authorization code was already consumed. Ignoring callback.");
            return;
        }

        if lock(&self.state).begin_exchange().is_err() {
            tracing::warn!("Another exchange is in flight. Ignoring authorization code.");
            self.scrub_callback_parameters(current_url);
            return;
        }
        // A new login replaces any stored session, whether or not the exchange succeeds.
        self.store.clear();
        self.notify_state_change();

        tracing::trace!("Exchanging authorization code for tokens.");
        let result = exchange_code_for_token(
            &self.client,
            self.config.urls.token_endpoint(),
            &self.config.client_id,
            self.config.redirect_uri.as_str(),
            &code,
            self.config.exchange_timeout,
        )
        .await
        .and_then(|tokens| Session::from_tokens(tokens).context(MalformedTokenSnafu));

        match result {
            Ok(session) => {
                let identity = session.identity().clone();
                let completed = {
                    let mut state = lock(&self.state);
                    let completed = state.complete_exchange(session).is_ok();
                    if completed {
                        if let Some(tokens) = state.tokens() {
                            self.store.save(tokens);
                        }
                    }
                    completed
                };
                self.scrub_callback_parameters(current_url);
                if !completed {
                    tracing::debug!("Session was signed out during the exchange. Dropping tokens.");
                    return;
                }
                self.notify_state_change();
                tracing::debug!(subject_id = %identity.subject_id, "Login successful.");
                self.notify_success(&identity);
            }
            Err(err) => {
                let failed = lock(&self.state).fail_exchange().is_ok();
                self.scrub_callback_parameters(current_url);
                if failed {
                    self.notify_state_change();
                }
                self.notify_error(&err);
            }
        }
    }

    fn report_provider_error(&self, current_url: &Url, error_response: ErrorResponse) {
        tracing::warn!(error = %error_response.error, "Identity provider reported an error.");
        self.scrub_callback_parameters(current_url);
        self.notify_error(&ProviderSnafu { error_response }.build());
    }

    fn restore(&self) {
        let Some(tokens) = self.store.load() else {
            tracing::trace!("No stored session.");
            return;
        };

        let session = match Session::from_tokens(tokens) {
            Ok(session) => session,
            Err(err) => {
                tracing::debug!(?err, "Stored identity token is malformed. Dropping session.");
                self.store.clear();
                return;
            }
        };

        if session.is_expired_at(OffsetDateTime::now_utc()) {
            tracing::debug!("Stored identity token expired. Dropping session.");
            self.store.clear();
            return;
        }

        let identity = session.identity().clone();
        lock(&self.state).restore(session);
        self.notify_state_change();
        tracing::debug!(subject_id = %identity.subject_id, "Restored session.");
        self.notify_success(&identity);
    }

    /// Drop the live session if its identity token expired since it was established.
    /// Returns whether the session was dropped.
    pub fn check_expiry(&self) -> bool {
        let expired = {
            let mut state = lock(&self.state);
            let expired = state
                .session()
                .is_some_and(|session| session.is_expired_at(OffsetDateTime::now_utc()));
            if expired {
                state.invalidate();
                self.store.clear();
            }
            expired
        };
        if expired {
            tracing::debug!("Identity token expired. Dropping session.");
            self.notify_state_change();
        }
        expired
    }

    /// The url of the hosted UI login page.
    pub fn authorization_url(&self, identity_provider: Option<&IdentityProvider>) -> Url {
        create_login_url(
            self.config.urls.authorization_endpoint(),
            &self.config.client_id,
            &self.config.response_type,
            &self.config.scope,
            self.config.redirect_uri.as_str(),
            identity_provider,
        )
    }

    /// Navigate to the hosted UI login page. Leaves the application.
    pub fn sign_in(&self, identity_provider: Option<&IdentityProvider>) {
        let url = self.authorization_url(identity_provider);
        if let Err(err) = self.navigator.navigate_to(&url) {
            tracing::warn!(?err, "Could not navigate to login page.");
        }
    }

    pub fn logout_url(&self) -> Url {
        create_logout_url(
            self.config.urls.logout_endpoint(),
            &self.config.client_id,
            self.config.redirect_uri.as_str(),
        )
    }

    /// Forget the session locally, then navigate to the hosted UI logout page.
    ///
    /// The local session is gone even if the browser blocks or delays the navigation.
    pub fn sign_out(&self) {
        {
            // Held while clearing, so a completing exchange cannot write its tokens back in between.
            let mut state = lock(&self.state);
            state.invalidate();
            self.store.clear();
        }
        self.notify_state_change();

        if let Err(err) = self.navigator.navigate_to(&self.logout_url()) {
            tracing::warn!(?err, "Could not navigate to logout page.");
        }
    }

    fn live_session(&self) -> Option<Session> {
        lock(&self.state)
            .live_session_at(OffsetDateTime::now_utc())
            .cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.state).is_authenticated_at(OffsetDateTime::now_utc())
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.live_session()
            .map(|session| session.identity().clone())
    }

    pub fn id_token(&self) -> Option<IdToken> {
        self.live_session()
            .map(|session| session.tokens().id_token.clone())
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.live_session()
            .map(|session| session.tokens().access_token.clone())
    }

    /// `Bearer <id token>`, marked sensitive.
    pub fn authorization_header(&self) -> Option<http::HeaderValue> {
        let id_token = self.id_token()?;
        let mut value = http::HeaderValue::try_from(format!("Bearer {id_token}")).ok()?;
        value.set_sensitive(true);
        Some(value)
    }

    /// A client sending the current identity token as bearer credential.
    /// `None` while not authenticated.
    pub fn client(&self) -> Option<AuthenticatedClient> {
        self.id_token()
            .map(|id_token| AuthenticatedClient::new(self.client.clone(), id_token))
    }

    fn scrub_callback_parameters(&self, current_url: &Url) {
        let scrubbed = without_query_parameters(current_url, &CALLBACK_QUERY_PARAMETERS);
        if let Err(err) = self.navigator.replace_url(&scrubbed) {
            tracing::warn!(?err, "Could not remove callback parameters from url.");
        }
    }

    fn notify_success(&self, identity: &UserIdentity) {
        let listeners = lock(&self.listeners).on_auth_success.clone();
        for listener in listeners {
            listener(identity);
        }
    }

    fn notify_error(&self, err: &AuthError) {
        let listeners = lock(&self.listeners).on_auth_error.clone();
        for listener in listeners {
            listener(err);
        }
    }

    fn notify_state_change(&self) {
        let state = self.state();
        let listeners = lock(&self.listeners).on_state_change.clone();
        for listener in listeners {
            listener(&state);
        }
    }
}
