use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Deserializer, Serialize};
use snafu::{ResultExt, Snafu};
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;

/// JWT segments are base64url without padding, but some issuers pad them anyway.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Fallback for payloads encoded with the standard alphabet.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Snafu)]
pub enum TokenDecodeError {
    #[snafu(display("TokenDecodeError: Expected 3 dot-separated segments, found {found}"))]
    Segments { found: usize },

    #[snafu(display("TokenDecodeError: Payload is not valid base64"))]
    Base64 { source: base64::DecodeError },

    #[snafu(display("TokenDecodeError: Payload is not valid JSON"))]
    Json {
        #[snafu(source(from(serde_json::Error, Arc::new)))]
        source: Arc<serde_json::Error>,
    },
}

impl PartialEq for TokenDecodeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Segments { found: a }, Self::Segments { found: b }) => a == b,
            (Self::Base64 { source: a }, Self::Base64 { source: b }) => a == b,
            (Self::Json { source: a }, Self::Json { source: b }) => {
                Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}

/// Claims read from the payload of an identity token.
///
/// The signature is not verified. Only use the claims to display and pre-fill user information,
/// never to make authorization decisions.
///
/// See: <https://openid.net/specs/openid-connect-core-1_0.html#IDToken>
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IdTokenClaims {
    /// (sub) Subject Identifier. Locally unique and never reassigned identifier of the user.
    pub sub: Option<String>,

    pub email: Option<String>,

    /// Full name. Social providers usually fill this, plain user pools may not.
    pub name: Option<String>,

    /// (exp) Expiration time as seconds since the epoch. Absent means the token never expires.
    /// Fractional values are truncated to whole seconds.
    #[serde(default, deserialize_with = "numeric_date")]
    pub exp: Option<i64>,

    #[serde(flatten)]
    pub remaining: HashMap<String, serde_json::Value>,
}

/// A JSON number of seconds, integral or not.
fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(number.and_then(|number| {
        number
            .as_i64()
            .or_else(|| number.as_f64().map(|seconds| seconds.floor() as i64))
    }))
}

impl IdTokenClaims {
    /// Whether the `exp` claim is present and strictly before `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.exp.is_some_and(|exp| exp < now.unix_timestamp())
    }

    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.exp.and_then(|exp| {
            OffsetDateTime::from_unix_timestamp(exp)
                .inspect_err(|err| {
                    tracing::warn!(?err, "Token contained a non-representable 'exp' value.");
                })
                .ok()
        })
    }
}

/// The signed-in user, as seen by the rest of the application.
///
/// Always derived from the current identity token, never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct UserIdentity {
    pub email: String,

    /// Falls back to `email` when the token carries no `name` claim.
    pub name: String,

    pub subject_id: String,
}

impl From<IdTokenClaims> for UserIdentity {
    fn from(claims: IdTokenClaims) -> Self {
        let email = claims.email.unwrap_or_default();
        let name = claims
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.clone());
        Self {
            email,
            name,
            subject_id: claims.sub.unwrap_or_default(),
        }
    }
}

/// Split a compact token and parse its payload segment.
pub fn decode_claims(id_token: &str) -> Result<IdTokenClaims, TokenDecodeError> {
    let segments = id_token.split('.').collect::<Vec<_>>();
    let [_header, payload, _signature] = segments.as_slice() else {
        return SegmentsSnafu {
            found: segments.len(),
        }
        .fail();
    };

    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .context(Base64Snafu {})?;

    serde_json::from_slice::<IdTokenClaims>(&bytes).context(JsonSnafu {})
}

/// Derive the user identity from an identity token.
pub fn decode(id_token: &str) -> Result<UserIdentity, TokenDecodeError> {
    decode_claims(id_token).map(UserIdentity::from)
}

/// Whether the identity token carries an `exp` claim strictly before `now`.
///
/// A token without `exp` is treated as non-expiring.
pub fn is_expired(id_token: &str, now: OffsetDateTime) -> Result<bool, TokenDecodeError> {
    decode_claims(id_token).map(|claims| claims.is_expired_at(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"k1"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    fn at(unix: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(unix).unwrap()
    }

    #[test]
    fn name_falls_back_to_email() {
        let token = token_with_payload(r#"{"email":"a@b.com","sub":"123"}"#);
        assert_that(decode(&token).unwrap()).is_equal_to(UserIdentity {
            email: "a@b.com".to_owned(),
            name: "a@b.com".to_owned(),
            subject_id: "123".to_owned(),
        });
    }

    #[test]
    fn name_is_taken_when_present() {
        let token =
            token_with_payload(r#"{"email":"a@b.com","name":"Alice","sub":"123","exp":1000}"#);
        assert_that(decode(&token).unwrap().name).is_equal_to("Alice".to_owned());
    }

    #[test]
    fn decode_is_idempotent() {
        let token = token_with_payload(r#"{"email":"a@b.com","name":"Alice","sub":"123"}"#);
        assert_that(decode(&token).unwrap()).is_equal_to(decode(&token).unwrap());
    }

    #[test]
    fn unknown_claims_are_kept() {
        let token = token_with_payload(r#"{"sub":"1","cognito:username":"google_42"}"#);
        let claims = decode_claims(&token).unwrap();
        assert_that(claims.remaining.get("cognito:username").cloned())
            .is_equal_to(Some(serde_json::Value::String("google_42".to_owned())));
    }

    #[test]
    fn padded_and_standard_alphabet_payloads_are_accepted() {
        let payload = r#"{"email":"a@b.com","sub":"123"}"#;
        let padded = format!("h.{}.s", STANDARD.encode(payload));
        assert_that(decode(&padded).unwrap().subject_id).is_equal_to("123".to_owned());
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        assert_that(decode("only.two")).is_equal_to(Err(TokenDecodeError::Segments { found: 2 }));
        assert_that(decode("")).is_equal_to(Err(TokenDecodeError::Segments { found: 1 }));
        assert_that(decode("a.b.c.d")).is_equal_to(Err(TokenDecodeError::Segments { found: 4 }));
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let result = decode("header.%%%.signature");
        assert_that(matches!(result, Err(TokenDecodeError::Base64 { .. }))).is_true();
    }

    #[test]
    fn invalid_json_is_malformed() {
        let token = token_with_payload("not json");
        assert_that(matches!(decode(&token), Err(TokenDecodeError::Json { .. }))).is_true();
    }

    #[test]
    fn expiry_is_strictly_before_now() {
        let token = token_with_payload(r#"{"exp":1000}"#);
        assert_that(is_expired(&token, at(1001)).unwrap()).is_true();
        assert_that(is_expired(&token, at(1000)).unwrap()).is_false();
        assert_that(is_expired(&token, at(999)).unwrap()).is_false();
    }

    #[test]
    fn fractional_exp_is_accepted() {
        let token = token_with_payload(r#"{"sub":"1","exp":1000.5}"#);
        assert_that(decode_claims(&token).unwrap().exp).is_equal_to(Some(1000));
        assert_that(is_expired(&token, at(1001)).unwrap()).is_true();
        assert_that(is_expired(&token, at(1000)).unwrap()).is_false();
    }

    #[test]
    fn non_numeric_exp_is_malformed() {
        let token = token_with_payload(r#"{"sub":"1","exp":"tomorrow"}"#);
        assert_that(matches!(decode(&token), Err(TokenDecodeError::Json { .. }))).is_true();
    }

    #[test]
    fn missing_exp_never_expires() {
        let token = token_with_payload(r#"{"sub":"1"}"#);
        for now in [0, 1_000, 4_102_444_800] {
            assert_that(is_expired(&token, at(now)).unwrap()).is_false();
        }
    }

    #[test]
    fn expiry_is_monotonic_in_now() {
        let token = token_with_payload(r#"{"exp":1000}"#);
        let mut seen_expired = false;
        for now in 900..1100 {
            let expired = is_expired(&token, at(now)).unwrap();
            if seen_expired {
                assert_that(expired).is_true();
            }
            seen_expired |= expired;
        }
        assert_that(seen_expired).is_true();
    }

    #[test]
    fn expires_at_converts_exp() {
        let claims = decode_claims(&token_with_payload(r#"{"exp":1000}"#)).unwrap();
        assert_that(claims.expires_at()).is_equal_to(Some(at(1000)));
    }
}
