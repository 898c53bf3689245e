use std::sync::Arc;
use std::time::Duration;

use crate::error::{AuthError, ExchangeFailedSnafu, TimeoutSnafu};
use crate::response::{ErrorResponse, SuccessTokenResponse};
use crate::token::TokenSet;
use crate::TokenEndpoint;

/// Redeem an authorization code at the token endpoint.
///
/// Single attempt. Codes are single-use, so a failed exchange must be reported, never repeated.
pub(crate) async fn exchange_code_for_token(
    client: &reqwest::Client,
    token_endpoint: &TokenEndpoint,
    client_id: &str,
    redirect_uri: &str,
    code: &str,
    timeout: Duration,
) -> Result<TokenSet, AuthError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("client_id", client_id),
        ("code", code),
        ("redirect_uri", redirect_uri),
    ];

    let response = client
        .post(token_endpoint.clone())
        .form(&params)
        .timeout(timeout)
        .send()
        .await
        .map_err(|err| classify(err, timeout))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| classify(err, timeout))?;

    if !status.is_success() {
        let error_response = serde_json::from_str::<ErrorResponse>(&body).ok();
        tracing::error!(%status, ?error_response, "Token endpoint rejected the authorization code.");
        return ExchangeFailedSnafu {
            status,
            body,
            error_response,
        }
        .fail();
    }

    match serde_json::from_str::<SuccessTokenResponse>(&body) {
        Ok(success) => {
            tracing::trace!(
                expires_in = ?success.expires_in,
                token_type = ?success.token_type,
                has_refresh_token = success.refresh_token.is_some(),
                "Received tokens."
            );
            Ok(success.into())
        }
        Err(err) => {
            tracing::error!(%status, ?err, "Token endpoint answered with an unexpected body.");
            ExchangeFailedSnafu {
                status,
                body,
                error_response: None,
            }
            .fail()
        }
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> AuthError {
    if err.is_timeout() {
        tracing::error!(?timeout, "Token endpoint did not answer in time.");
        return TimeoutSnafu { timeout }.build();
    }
    tracing::error!(?err, "Could not reach token endpoint.");
    AuthError::Send {
        source: Arc::new(err),
    }
}
