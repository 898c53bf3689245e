use crate::internal::derived_urls::{DerivedUrlError, DerivedUrls};
use itertools::Itertools;
use snafu::{ResultExt, Snafu, ensure};
use std::time::Duration;
use url::Url;

/// Parameters required to talk to a hosted-UI identity provider, e.g. an Amazon Cognito user
/// pool domain. Validated into a [`SessionConfig`] before any session manager can be created.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Domain of the identity provider, e.g. "my-pool.auth.us-east-1.amazoncognito.com".
    /// A bare host is contacted via https. A value including a scheme, e.g.
    /// "http://127.0.0.1:8080", is used as given.
    pub identity_provider_domain: String,

    /// The id of this app client as configured at the identity provider.
    pub client_id: String,

    /// Url the identity provider redirects to after login and logout.
    /// Must exactly match one of the callback urls registered for the app client.
    pub redirect_uri: Url,

    /// Requested scopes, e.g. `["openid", "email", "profile"]`. Defaults to "openid" when empty.
    pub scope: Vec<String>,

    pub advanced: AdvancedOptions,
}

#[derive(Debug, Clone)]
pub struct AdvancedOptions {
    /// Only the authorization-code flow is supported.
    /// Defaults to "code".
    pub response_type: String,

    /// Defaults to "/oauth2/authorize".
    pub authorize_endpoint_path: String,

    /// Defaults to "/oauth2/token".
    pub token_endpoint_path: String,

    /// Defaults to "/logout".
    pub logout_endpoint_path: String,

    /// Deadline for the code-to-token exchange. Exceeding it reports `AuthError::Timeout`.
    /// Defaults to `Duration::from_secs(10)`.
    pub exchange_timeout: Duration,

    /// Interval after which the identity token of a live session is checked for expiry.
    /// Defaults to `Duration::from_secs(1)`.
    pub expiry_check_interval: Duration,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            response_type: "code".to_owned(),
            authorize_endpoint_path: "/oauth2/authorize".to_owned(),
            token_endpoint_path: "/oauth2/token".to_owned(),
            logout_endpoint_path: "/logout".to_owned(),
            exchange_timeout: Duration::from_secs(10),
            expiry_check_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum ConfigError {
    #[snafu(display("ConfigError: identity_provider_domain must not be empty"))]
    EmptyDomain,

    #[snafu(display("ConfigError: client_id must not be empty"))]
    EmptyClientId,

    #[snafu(display("ConfigError: Could not parse identity provider url '{input}'"))]
    InvalidDomain {
        input: String,
        source: url::ParseError,
    },

    #[snafu(display("ConfigError: redirect_uri '{redirect_uri}' cannot be used as a base url"))]
    InvalidRedirectUri { redirect_uri: Url },

    #[snafu(display(
        "ConfigError: Unsupported response_type '{response_type}', only 'code' is supported"
    ))]
    UnsupportedResponseType { response_type: String },

    #[snafu(display("ConfigError: Could not derive provider endpoints"))]
    Endpoints { source: DerivedUrlError },
}

/// Validated, immutable configuration of a [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub(crate) client_id: String,
    pub(crate) redirect_uri: Url,
    pub(crate) response_type: String,
    pub(crate) scope: String,
    pub(crate) exchange_timeout: Duration,
    pub(crate) expiry_check_interval: Duration,
    pub(crate) urls: DerivedUrls,
}

impl SessionConfig {
    pub fn new(options: SessionOptions) -> Result<Self, ConfigError> {
        let domain = options.identity_provider_domain.trim();
        ensure!(!domain.is_empty(), EmptyDomainSnafu);

        let client_id = options.client_id.trim();
        ensure!(!client_id.is_empty(), EmptyClientIdSnafu);

        ensure!(
            !options.redirect_uri.cannot_be_a_base(),
            InvalidRedirectUriSnafu {
                redirect_uri: options.redirect_uri.clone()
            }
        );

        let response_type = options.advanced.response_type.trim();
        ensure!(
            response_type == "code",
            UnsupportedResponseTypeSnafu { response_type }
        );

        let base = match domain.contains("://") {
            true => domain.to_owned(),
            false => format!("https://{domain}"),
        };
        let base = Url::parse(&base).context(InvalidDomainSnafu { input: domain })?;

        let urls = DerivedUrls::new(
            &base,
            &options.advanced.authorize_endpoint_path,
            &options.advanced.token_endpoint_path,
            &options.advanced.logout_endpoint_path,
        )
        .context(EndpointsSnafu)?;

        Ok(Self {
            client_id: client_id.to_owned(),
            redirect_uri: options.redirect_uri,
            response_type: response_type.to_owned(),
            scope: join_scope(&options.scope),
            exchange_timeout: options.advanced.exchange_timeout,
            expiry_check_interval: options.advanced.expiry_check_interval,
            urls,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Space separated scope string, as sent to the provider.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }

    pub fn expiry_check_interval(&self) -> Duration {
        self.expiry_check_interval
    }

    pub fn derived_urls(&self) -> &DerivedUrls {
        &self.urls
    }
}

fn join_scope(scope: &[String]) -> String {
    let joined = scope
        .iter()
        .map(|it| it.trim())
        .filter(|it| !it.is_empty())
        .unique()
        .join(" ");
    match joined.is_empty() {
        true => "openid".to_owned(),
        false => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    fn options() -> SessionOptions {
        SessionOptions {
            identity_provider_domain: "my-pool.auth.us-east-1.amazoncognito.com".to_owned(),
            client_id: "client-1".to_owned(),
            redirect_uri: Url::parse("https://app.example.com/").unwrap(),
            scope: vec!["openid".to_owned(), "email".to_owned(), "profile".to_owned()],
            advanced: AdvancedOptions::default(),
        }
    }

    #[test]
    fn bare_domain_uses_https() {
        let config = SessionConfig::new(options()).unwrap();
        assert_that(config.derived_urls().token_endpoint().as_str()).is_equal_to(
            "https://my-pool.auth.us-east-1.amazoncognito.com/oauth2/token",
        );
        assert_that(config.scope()).is_equal_to("openid email profile");
    }

    #[test]
    fn domain_with_scheme_is_used_as_given() {
        let mut options = options();
        options.identity_provider_domain = "http://127.0.0.1:8080".to_owned();
        let config = SessionConfig::new(options).unwrap();
        assert_that(config.derived_urls().authorization_endpoint().as_str())
            .is_equal_to("http://127.0.0.1:8080/oauth2/authorize");
    }

    #[test]
    fn empty_scope_defaults_to_openid() {
        let mut options = options();
        options.scope = vec![" ".to_owned()];
        assert_that(SessionConfig::new(options).unwrap().scope()).is_equal_to("openid");
    }

    #[test]
    fn duplicate_scopes_are_sent_once() {
        let mut options = options();
        options.scope = vec!["openid".to_owned(), " email ".to_owned(), "openid".to_owned()];
        assert_that(SessionConfig::new(options).unwrap().scope()).is_equal_to("openid email");
    }

    #[test]
    fn missing_fields_fail_fast() {
        let mut no_domain = options();
        no_domain.identity_provider_domain = "  ".to_owned();
        assert_that(SessionConfig::new(no_domain).err()).is_equal_to(Some(ConfigError::EmptyDomain));

        let mut no_client = options();
        no_client.client_id = String::new();
        assert_that(SessionConfig::new(no_client).err())
            .is_equal_to(Some(ConfigError::EmptyClientId));
    }

    #[test]
    fn implicit_flow_is_rejected() {
        let mut options = options();
        options.advanced.response_type = "token".to_owned();
        assert_that(SessionConfig::new(options).err()).is_equal_to(Some(
            ConfigError::UnsupportedResponseType {
                response_type: "token".to_owned(),
            },
        ));
    }

    #[test]
    fn non_base_redirect_uri_is_rejected() {
        let mut options = options();
        options.redirect_uri = Url::parse("mailto:someone@example.com").unwrap();
        assert_that(matches!(
            SessionConfig::new(options),
            Err(ConfigError::InvalidRedirectUri { .. })
        ))
        .is_true();
    }

    #[test]
    fn unparsable_domain_is_rejected() {
        let mut options = options();
        options.identity_provider_domain = "http://exa mple.com".to_owned();
        assert_that(matches!(
            SessionConfig::new(options),
            Err(ConfigError::InvalidDomain { .. })
        ))
        .is_true();
    }
}
