use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;
use leptos_use::{UseIntervalReturn, use_interval};
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

use crate::authenticated_client::AuthenticatedClient;
use crate::config::{ConfigError, SessionConfig, SessionOptions};
use crate::error::AuthError;
use crate::login::IdentityProvider;
use crate::navigation::{BrowserNavigator, NavigationError, Navigator};
use crate::session::SessionManager;
use crate::state::SessionState;
use crate::storage::BrowserSessionStorage;
use crate::token_claims::UserIdentity;
use crate::{AccessToken, IdToken};

/// The session manager used by [`init_oauth_session`].
pub type BrowserSessionManager = SessionManager<BrowserSessionStorage, RouterNavigator>;

/// Navigator for applications using `leptos_router`.
///
/// Leaving the application goes through `window.location`. Replacing the current url is handed to
/// the router, so that the router's location stays in sync with the visible url.
#[derive(Debug, Clone, Copy)]
pub struct RouterNavigator {
    pending_replace: RwSignal<Option<String>>,
}

impl Navigator for RouterNavigator {
    fn current_url(&self) -> Result<Url, NavigationError> {
        BrowserNavigator.current_url()
    }

    fn navigate_to(&self, url: &Url) -> Result<(), NavigationError> {
        BrowserNavigator.navigate_to(url)
    }

    fn replace_url(&self, url: &Url) -> Result<(), NavigationError> {
        self.pending_replace
            .set(Some(url[url::Position::BeforePath..].to_owned()));
        Ok(())
    }
}

/// Reactive handle to the session of this application. Cheap to copy.
///
/// Obtain it with [`init_oauth_session`] once, close to the root of your app and inside the
/// `<Router>`, and with [`use_oauth_session`] everywhere else.
#[derive(Clone, Copy)]
pub struct OAuthSession {
    manager: StoredValue<Arc<BrowserSessionManager>>,

    /// Current session state. Updated on every transition.
    pub state: Signal<SessionState>,

    /// Identity of the signed-in user. `None` once the identity token expired, checked on every read.
    pub identity: Signal<Option<UserIdentity>>,

    /// Checks expiry on every read, like [`SessionManager::is_authenticated`].
    pub is_authenticated: Signal<bool>,

    /// The last failed login. Reset by the next successful one.
    pub last_error: Signal<Option<AuthError>>,
}

impl OAuthSession {
    pub fn manager(&self) -> Arc<BrowserSessionManager> {
        self.manager.get_value()
    }

    pub fn authorization_url(&self, identity_provider: Option<&IdentityProvider>) -> Url {
        self.manager
            .with_value(|manager| manager.authorization_url(identity_provider))
    }

    pub fn sign_in(&self, identity_provider: Option<&IdentityProvider>) {
        self.manager
            .with_value(|manager| manager.sign_in(identity_provider));
    }

    pub fn sign_out(&self) {
        self.manager.with_value(|manager| manager.sign_out());
    }

    /// Not reactive. Read [`OAuthSession::state`] to track changes.
    pub fn id_token(&self) -> Option<IdToken> {
        self.manager.with_value(|manager| manager.id_token())
    }

    /// Not reactive. Read [`OAuthSession::state`] to track changes.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.manager.with_value(|manager| manager.access_token())
    }

    pub fn authorization_header(&self) -> Option<http::HeaderValue> {
        self.manager
            .with_value(|manager| manager.authorization_header())
    }

    pub fn client(&self) -> Option<AuthenticatedClient> {
        self.manager.with_value(|manager| manager.client())
    }
}

/// Creates the session, handles the current page load and provides the session as context.
///
/// Must be called inside a `<Router>`. Fails fast on invalid options, before any request is made.
pub fn init_oauth_session(options: SessionOptions) -> Result<OAuthSession, ConfigError> {
    tracing::trace!("Initializing OAuth session...");

    let config = SessionConfig::new(options)?;
    let expiry_check_interval = config.expiry_check_interval();

    let pending_replace = RwSignal::new(None::<String>);
    let manager = Arc::new(SessionManager::new(
        config,
        BrowserSessionStorage,
        RouterNavigator { pending_replace },
    ));

    let (state, set_state) = signal(SessionState::Unauthenticated);
    let (last_error, set_last_error) = signal(None::<AuthError>);
    manager.on_state_change(move |state| set_state.set(state.clone()));
    manager.on_auth_success(move |_| set_last_error.set(None));
    manager.on_auth_error(move |err| set_last_error.set(Some(err.clone())));

    // Callback parameters are removed through the router, replacing the current history entry.
    Effect::new(move |_| {
        let Some(target) = pending_replace.get() else {
            return;
        };
        let navigate = use_navigate();
        navigate(
            &target,
            NavigateOptions {
                replace: true,
                ..Default::default()
            },
        );
        pending_replace.set(None);
    });

    let UseIntervalReturn { counter, .. } = use_interval::<u64>(
        expiry_check_interval
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX),
    );
    let expiring = Arc::clone(&manager);
    Effect::new(move |_| {
        let _count = counter.get();
        expiring.check_expiry();
    });

    let initializing = Arc::clone(&manager);
    leptos::task::spawn_local(async move {
        initializing.initialize().await;
    });

    let session = OAuthSession {
        manager: StoredValue::new(manager),
        state: state.into(),
        identity: Signal::derive(move || {
            state
                .read()
                .identity_at(OffsetDateTime::now_utc())
                .cloned()
        }),
        is_authenticated: Signal::derive(move || {
            state.read().is_authenticated_at(OffsetDateTime::now_utc())
        }),
        last_error: last_error.into(),
    };

    provide_context(session);

    Ok(session)
}

/// The session provided by [`init_oauth_session`].
///
/// # Panics
/// When called outside the component tree below [`init_oauth_session`].
pub fn use_oauth_session() -> OAuthSession {
    expect_context::<OAuthSession>()
}

pub fn try_use_oauth_session() -> Option<OAuthSession> {
    use_context::<OAuthSession>()
}
