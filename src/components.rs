use leptos::prelude::*;

use crate::hooks::use_oauth_session;
use crate::token_claims::UserIdentity;

/// Show `children` only while a user is signed in, passing the identity to pre-fill forms with.
///
/// Children are rendered again whenever the signed-in identity changes.
///
/// # Example
/// ```no_run
/// use leptos::prelude::*;
/// use leptos_oauth_session::components::Authenticated;
///
/// # #[component]
/// # fn Component() -> impl IntoView {
/// view! {
///     <Authenticated children=move |user| view! {
///         <input name="name" value=user.name />
///         <input name="email" value=user.email />
///     }/>
/// }
/// # }
/// ```
#[component(transparent)]
#[allow(clippy::must_use_candidate)]
pub fn Authenticated<C, V>(children: C) -> impl IntoView
where
    C: Fn(UserIdentity) -> V + 'static + Send,
    V: IntoView + 'static,
{
    let identity = use_oauth_session().identity;

    move || identity.get().map(|identity| children(identity))
}

/// Show `children` only while nobody is signed in, e.g. the social login buttons.
///
/// # Example
/// ```no_run
/// use leptos::prelude::*;
/// use leptos_oauth_session::IdentityProvider;
/// use leptos_oauth_session::components::Unauthenticated;
/// use leptos_oauth_session::use_oauth_session;
///
/// # #[component]
/// # fn Component() -> impl IntoView {
/// let session = use_oauth_session();
/// view! {
///     <Unauthenticated children=move || view! {
///         <button on:click=move |_| session.sign_in(Some(&IdentityProvider::Google))>
///             "Continue with Google"
///         </button>
///     }/>
/// }
/// # }
/// ```
#[component(transparent)]
#[allow(clippy::must_use_candidate)]
pub fn Unauthenticated<C, V>(children: C) -> impl IntoView
where
    C: Fn() -> V + 'static + Send,
    V: IntoView + 'static,
{
    let is_authenticated = use_oauth_session().is_authenticated;

    move || (!is_authenticated.get()).then(|| children())
}
