use snafu::Snafu;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum NavigationError {
    #[snafu(display("NavigationError: No browser window available"))]
    NoWindow,

    #[snafu(display("NavigationError: Could not parse current location '{href}'"))]
    InvalidLocation { href: String },

    #[snafu(display("NavigationError: Browser refused navigation: {reason}"))]
    Refused { reason: String },
}

/// Access to the page location, abstracted so that the session logic runs outside a browser.
pub trait Navigator {
    /// The full url of the current page, including its query.
    fn current_url(&self) -> Result<Url, NavigationError>;

    /// Leave the application: a full page navigation, abandoning all in-memory state.
    fn navigate_to(&self, url: &Url) -> Result<(), NavigationError>;

    /// Replace the current history entry without reloading the page.
    fn replace_url(&self, url: &Url) -> Result<(), NavigationError>;
}

/// Navigation through `window.location` and `window.history`. Only usable on `wasm32` targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

impl BrowserNavigator {
    fn window() -> Result<web_sys::Window, NavigationError> {
        web_sys::window().ok_or(NavigationError::NoWindow)
    }
}

impl Navigator for BrowserNavigator {
    fn current_url(&self) -> Result<Url, NavigationError> {
        let href = Self::window()?
            .location()
            .href()
            .map_err(|err| NavigationError::Refused {
                reason: format!("{err:?}"),
            })?;
        Url::parse(&href).map_err(|_| NavigationError::InvalidLocation { href })
    }

    fn navigate_to(&self, url: &Url) -> Result<(), NavigationError> {
        Self::window()?
            .location()
            .set_href(url.as_str())
            .map_err(|err| NavigationError::Refused {
                reason: format!("{err:?}"),
            })
    }

    fn replace_url(&self, url: &Url) -> Result<(), NavigationError> {
        Self::window()?
            .history()
            .and_then(|history| {
                history.replace_state_with_url(
                    &wasm_bindgen::JsValue::NULL,
                    "",
                    Some(url.as_str()),
                )
            })
            .map_err(|err| NavigationError::Refused {
                reason: format!("{err:?}"),
            })
    }
}

/// `url` without the given query parameters. Drops the `?` entirely when nothing remains.
pub(crate) fn without_query_parameters(url: &Url, parameters: &[&str]) -> Url {
    let remaining = url
        .query_pairs()
        .filter(|(key, _)| !parameters.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();

    let mut stripped = url.clone();
    match remaining.is_empty() {
        true => stripped.set_query(None),
        false => {
            stripped.query_pairs_mut().clear().extend_pairs(remaining);
        }
    }
    stripped
}
