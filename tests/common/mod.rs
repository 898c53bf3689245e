#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use leptos_oauth_session::url::Url;
use leptos_oauth_session::{
    AdvancedOptions, AuthError, MemoryStore, NavigationError, Navigator, SessionConfig,
    SessionManager, SessionOptions, SessionState, SessionStore, StorageError, TokenSet,
    UserIdentity,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;

pub const APP_URL: &str = "https://app.example.com/";
pub const CLIENT_ID: &str = "client-1";

pub type TestManager = SessionManager<SharedStore, RecordingNavigator>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// An unsigned token in compact form carrying `payload`.
pub fn jwt(payload: serde_json::Value) -> String {
    format!(
        "eyJhbGciOiJSUzI1NiJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

pub fn unix_in(seconds: i64) -> i64 {
    OffsetDateTime::now_utc().unix_timestamp() + seconds
}

pub fn tokens(id_token: String) -> TokenSet {
    TokenSet {
        id_token,
        access_token: "tok".to_owned(),
        refresh_token: Some("r".to_owned()),
    }
}

pub fn config(identity_provider_domain: &str, exchange_timeout: Duration) -> SessionConfig {
    SessionConfig::new(SessionOptions {
        identity_provider_domain: identity_provider_domain.to_owned(),
        client_id: CLIENT_ID.to_owned(),
        redirect_uri: Url::parse(APP_URL).unwrap(),
        scope: vec!["openid".to_owned(), "email".to_owned()],
        advanced: AdvancedOptions {
            exchange_timeout,
            ..AdvancedOptions::default()
        },
    })
    .unwrap()
}

/// A manager talking to `identity_provider_domain`, currently showing `current_url`.
pub fn manager(
    identity_provider_domain: &str,
    current_url: &str,
) -> (TestManager, SharedStore, RecordingNavigator, Recorder) {
    let store = SharedStore::default();
    let navigator = RecordingNavigator::new(current_url);
    let manager = SessionManager::new(
        config(identity_provider_domain, Duration::from_secs(5)),
        store.clone(),
        navigator.clone(),
    );
    let recorder = Recorder::attach(&manager);
    (manager, store, navigator, recorder)
}

/// A `MemoryStore` the test keeps a handle to after moving it into the manager.
#[derive(Debug, Default, Clone)]
pub struct SharedStore(pub Arc<MemoryStore>);

impl SharedStore {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SessionStore for SharedStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.0.remove_item(key)
    }
}

/// Storage that refuses everything, like a browser in strict private mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable {
            reason: "disabled".to_owned(),
        })
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable {
            reason: "disabled".to_owned(),
        })
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable {
            reason: "disabled".to_owned(),
        })
    }
}

type NavigationHook = Box<dyn Fn(&Url) + Send + Sync>;

#[derive(Default)]
struct Recorded {
    current: Mutex<Option<Url>>,
    navigations: Mutex<Vec<Url>>,
    replacements: Mutex<Vec<Url>>,
    on_navigate: Mutex<Option<NavigationHook>>,
}

/// Simulated browser location. Replacements change the current url, navigations are only recorded.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    inner: Arc<Recorded>,
}

impl RecordingNavigator {
    pub fn new(current_url: &str) -> Self {
        let navigator = Self::default();
        *navigator.inner.current.lock().unwrap() = Some(Url::parse(current_url).unwrap());
        navigator
    }

    pub fn current(&self) -> Url {
        self.inner.current.lock().unwrap().clone().unwrap()
    }

    pub fn navigations(&self) -> Vec<Url> {
        self.inner.navigations.lock().unwrap().clone()
    }

    pub fn replacements(&self) -> Vec<Url> {
        self.inner.replacements.lock().unwrap().clone()
    }

    /// Run `hook` at the moment a full navigation is requested.
    pub fn on_navigate(&self, hook: impl Fn(&Url) + Send + Sync + 'static) {
        *self.inner.on_navigate.lock().unwrap() = Some(Box::new(hook));
    }
}

impl Navigator for RecordingNavigator {
    fn current_url(&self) -> Result<Url, NavigationError> {
        self.inner
            .current
            .lock()
            .unwrap()
            .clone()
            .ok_or(NavigationError::NoWindow)
    }

    fn navigate_to(&self, url: &Url) -> Result<(), NavigationError> {
        if let Some(hook) = self.inner.on_navigate.lock().unwrap().as_ref() {
            hook(url);
        }
        self.inner.navigations.lock().unwrap().push(url.clone());
        Ok(())
    }

    fn replace_url(&self, url: &Url) -> Result<(), NavigationError> {
        self.inner.replacements.lock().unwrap().push(url.clone());
        *self.inner.current.lock().unwrap() = Some(url.clone());
        Ok(())
    }
}

/// Collects everything the listeners of a manager report.
#[derive(Clone, Default)]
pub struct Recorder {
    pub successes: Arc<Mutex<Vec<UserIdentity>>>,
    pub errors: Arc<Mutex<Vec<AuthError>>>,
    pub states: Arc<Mutex<Vec<SessionState>>>,
}

impl Recorder {
    pub fn attach<S: SessionStore, N: Navigator>(manager: &SessionManager<S, N>) -> Self {
        let recorder = Self::default();
        let successes = recorder.successes.clone();
        manager.on_auth_success(move |identity| successes.lock().unwrap().push(identity.clone()));
        let errors = recorder.errors.clone();
        manager.on_auth_error(move |err| errors.lock().unwrap().push(err.clone()));
        let states = recorder.states.clone();
        manager.on_state_change(move |state| states.lock().unwrap().push(state.clone()));
        recorder
    }

    pub fn successes(&self) -> Vec<UserIdentity> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<AuthError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn state_names(&self) -> Vec<&'static str> {
        self.states
            .lock()
            .unwrap()
            .iter()
            .map(SessionState::name)
            .collect()
    }
}
