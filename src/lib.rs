//! OAuth2 authorization-code sessions for Leptos applications signing users in through a hosted
//! identity provider UI, such as an Amazon Cognito user pool domain with social login.
//!
//! On every page load the session either redeems the `?code=...` the provider redirected back
//! with, or restores the tokens persisted in `window.sessionStorage`. The decoded identity and the
//! identity token (as bearer credential for your backend) are then available to your components.
//!
//! ```no_run
//! use leptos::prelude::*;
//! use leptos_router::components::Router;
//! use leptos_oauth_session::components::{Authenticated, Unauthenticated};
//! use leptos_oauth_session::url::Url;
//! use leptos_oauth_session::{init_oauth_session, IdentityProvider, SessionOptions};
//!
//! #[component]
//! pub fn App() -> impl IntoView {
//!     view! {
//!         <Router>
//!             <LeadForm/>
//!         </Router>
//!     }
//! }
//!
//! #[component]
//! pub fn LeadForm() -> impl IntoView {
//!     // Note: These values should be served from environment variables.
//!     // Note: The redirect uri must be registered as callback url of the app client.
//!     let session = init_oauth_session(SessionOptions {
//!         identity_provider_domain: "my-pool.auth.eu-central-1.amazoncognito.com".to_owned(),
//!         client_id: "my-client".to_owned(),
//!         redirect_uri: Url::parse("http://127.0.0.1:3000/").unwrap(),
//!         scope: vec!["openid".to_owned(), "email".to_owned(), "profile".to_owned()],
//!         advanced: Default::default(),
//!     })
//!     .unwrap();
//!
//!     view! {
//!         <Unauthenticated children=move || view! {
//!             <button on:click=move |_| session.sign_in(Some(&IdentityProvider::Google))>
//!                 "Continue with Google"
//!             </button>
//!         }/>
//!         <Authenticated children=move |user| view! {
//!             <p>"Hello, " { user.name }</p>
//!             <button on:click=move |_| session.sign_out()>"Sign out"</button>
//!         }/>
//!     }
//! }
//! ```
//!
//! Outside a browser, use [`SessionManager`] directly with your own [`SessionStore`] and
//! [`Navigator`].

mod authenticated_client;
pub mod components;
mod config;
mod error;
mod hooks;
mod internal;
mod login;
mod logout;
mod navigation;
mod request;
mod response;
mod session;
mod state;
mod storage;
mod token;
mod token_claims;

// Library exports (additional to pub modules).
pub use authenticated_client::*;
pub use config::*;
pub use error::AuthError;
pub use hooks::*;
pub use internal::derived_urls::{DerivedUrlError, DerivedUrls};
pub use login::IdentityProvider;
pub use navigation::{BrowserNavigator, NavigationError, Navigator};
pub use response::{ErrorResponse, KnownOidcErrorCode, OidcErrorCode};
pub use session::SessionManager;
pub use state::{Session, SessionState};
pub use storage::{BrowserSessionStorage, MemoryStore, SessionStore, StorageError, TokenStore};
pub use token::TokenSet;
pub use token_claims::{IdTokenClaims, TokenDecodeError, UserIdentity, decode, decode_claims, is_expired};
pub mod url {
    pub use url::Url;
}
pub mod reqwest {
    pub use reqwest::*;
}

type AuthorizationEndpoint = url::Url;
type TokenEndpoint = url::Url;
type LogoutEndpoint = url::Url;

type AuthorizationCode = String;
type IdToken = String;
type AccessToken = String;
type RefreshToken = String;
