use snafu::Snafu;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::internal::sync::lock;
use crate::token::TokenSet;

const ID_TOKEN_KEY: &str = "oauth_session__id_token";
const ACCESS_TOKEN_KEY: &str = "oauth_session__access_token";
const REFRESH_TOKEN_KEY: &str = "oauth_session__refresh_token";

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    #[snafu(display("StorageError: Storage is not available: {reason}"))]
    Unavailable { reason: String },

    #[snafu(display("StorageError: Could not access '{key}': {reason}"))]
    Operation { key: String, reason: String },
}

/// A string key-value store with the semantics of the browser's Web Storage API.
///
/// Implementations must treat removing an absent key as success.
pub trait SessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Purely in-memory store. Useful for server-side rendering and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.items).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.items).remove(key);
        Ok(())
    }
}

/// The tab-scoped `window.sessionStorage`. Survives reloads, but not closing the tab.
///
/// Every call looks the storage up again, so this type is free to share between threads.
/// Fails with [`StorageError::Unavailable`] when the page has no window or storage is disabled.
/// Only usable on `wasm32` targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserSessionStorage;

impl BrowserSessionStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable {
            reason: "no window".to_owned(),
        })?;
        match window.session_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => UnavailableSnafu {
                reason: "window.sessionStorage is null",
            }
            .fail(),
            Err(err) => UnavailableSnafu {
                reason: format!("{err:?}"),
            }
            .fail(),
        }
    }
}

impl SessionStore for BrowserSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?.get_item(key).map_err(|err| StorageError::Operation {
            key: key.to_owned(),
            reason: format!("{err:?}"),
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|err| StorageError::Operation {
                key: key.to_owned(),
                reason: format!("{err:?}"),
            })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|err| StorageError::Operation {
                key: key.to_owned(),
                reason: format!("{err:?}"),
            })
    }
}

/// Persists the current [`TokenSet`] in a [`SessionStore`].
///
/// When the store fails (private browsing, storage quota, no browser at all), the tokens are kept
/// in memory for the lifetime of this value instead. Authentication keeps working for the current
/// page, it just does not survive a reload.
#[derive(Debug)]
pub struct TokenStore<S> {
    store: S,
    fallback: Mutex<Option<TokenSet>>,
}

impl<S: SessionStore> TokenStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            fallback: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Replace all slots. Readers never observe a mix of old and new tokens: a failed write
    /// removes whatever was already written before falling back to memory.
    pub fn save(&self, tokens: &TokenSet) {
        match self.write(tokens) {
            Ok(()) => {
                *lock(&self.fallback) = None;
            }
            Err(err) => {
                tracing::warn!(
                    ?err,
                    "Could not persist tokens. Keeping the session in memory for this page only."
                );
                self.remove_all();
                *lock(&self.fallback) = Some(tokens.clone());
            }
        }
    }

    /// Returns `None` unless both the identity and the access token are present.
    pub fn load(&self) -> Option<TokenSet> {
        if let Some(tokens) = lock(&self.fallback).clone() {
            return Some(tokens);
        }
        match self.read() {
            Ok(tokens) => tokens,
            Err(err) => {
                tracing::warn!(?err, "Could not read tokens from storage.");
                None
            }
        }
    }

    /// Never fails, also not when nothing is stored.
    pub fn clear(&self) {
        *lock(&self.fallback) = None;
        self.remove_all();
    }

    fn write(&self, tokens: &TokenSet) -> Result<(), StorageError> {
        self.store.set_item(ID_TOKEN_KEY, &tokens.id_token)?;
        self.store.set_item(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        match &tokens.refresh_token {
            Some(refresh_token) => self.store.set_item(REFRESH_TOKEN_KEY, refresh_token),
            None => self.store.remove_item(REFRESH_TOKEN_KEY),
        }
    }

    fn read(&self) -> Result<Option<TokenSet>, StorageError> {
        let id_token = self.store.get_item(ID_TOKEN_KEY)?;
        let access_token = self.store.get_item(ACCESS_TOKEN_KEY)?;
        let (Some(id_token), Some(access_token)) = (id_token, access_token) else {
            return Ok(None);
        };
        let refresh_token = self.store.get_item(REFRESH_TOKEN_KEY)?;
        Ok(Some(TokenSet {
            id_token,
            access_token,
            refresh_token,
        }))
    }

    fn remove_all(&self) {
        for key in [ID_TOKEN_KEY, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.store.remove_item(key) {
                tracing::warn!(?err, key, "Could not remove token from storage.");
            }
        }
    }
}
