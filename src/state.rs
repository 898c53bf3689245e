use time::OffsetDateTime;

use crate::token::TokenSet;
use crate::token_claims::{self, IdTokenClaims, TokenDecodeError, UserIdentity};

/// A usable session: tokens together with the identity decoded from them.
///
/// Can only be created by successfully decoding the identity token, so "authenticated without
/// identity" cannot be expressed.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    identity: UserIdentity,
    claims: IdTokenClaims,
    tokens: TokenSet,
}

impl Session {
    pub fn from_tokens(tokens: TokenSet) -> Result<Self, TokenDecodeError> {
        let claims = token_claims::decode_claims(&tokens.id_token)?;
        Ok(Self {
            identity: UserIdentity::from(claims.clone()),
            claims,
            tokens,
        })
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn claims(&self) -> &IdTokenClaims {
        &self.claims
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.claims.is_expired_at(now)
    }
}

/// The current state of authentication.
///
/// - `Unauthenticated`: no tokens, or the last known tokens were expired, malformed or dropped.
/// - `Exchanging`: an authorization code is being redeemed. Transient, never persisted.
/// - `Authenticated`: a decoded session, which was not expired when it was entered.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Exchanging,
    Authenticated(Session),
}

/// Returned when a second exchange is requested while one is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExchangeInFlight;

/// Returned when an exchange finishes after its state was left, e.g. by signing out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NotExchanging;

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "Unauthenticated",
            SessionState::Exchanging => "Exchanging",
            SessionState::Authenticated(_) => "Authenticated",
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Unauthenticated | SessionState::Exchanging => None,
        }
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.session().map(Session::identity)
    }

    pub fn tokens(&self) -> Option<&TokenSet> {
        self.session().map(Session::tokens)
    }

    /// The session, unless its identity token is expired at `now`.
    pub fn live_session_at(&self, now: OffsetDateTime) -> Option<&Session> {
        self.session().filter(|session| !session.is_expired_at(now))
    }

    pub fn identity_at(&self, now: OffsetDateTime) -> Option<&UserIdentity> {
        self.live_session_at(now).map(Session::identity)
    }

    /// Whether a session exists and its identity token is not expired at `now`.
    pub fn is_authenticated_at(&self, now: OffsetDateTime) -> bool {
        self.live_session_at(now).is_some()
    }

    /// Unauthenticated | Authenticated -> Exchanging.
    /// A new login may replace an existing session, but never a running exchange.
    pub(crate) fn begin_exchange(&mut self) -> Result<(), ExchangeInFlight> {
        match self {
            SessionState::Exchanging => Err(ExchangeInFlight),
            SessionState::Unauthenticated | SessionState::Authenticated(_) => {
                self.transition(SessionState::Exchanging);
                Ok(())
            }
        }
    }

    /// Exchanging -> Authenticated.
    /// Refused if the exchange was abandoned in the meantime.
    pub(crate) fn complete_exchange(&mut self, session: Session) -> Result<(), NotExchanging> {
        match self {
            SessionState::Exchanging => {
                self.transition(SessionState::Authenticated(session));
                Ok(())
            }
            SessionState::Unauthenticated | SessionState::Authenticated(_) => Err(NotExchanging),
        }
    }

    /// Exchanging -> Unauthenticated.
    pub(crate) fn fail_exchange(&mut self) -> Result<(), NotExchanging> {
        match self {
            SessionState::Exchanging => {
                self.transition(SessionState::Unauthenticated);
                Ok(())
            }
            SessionState::Unauthenticated | SessionState::Authenticated(_) => Err(NotExchanging),
        }
    }

    /// Any -> Authenticated, for a session loaded from storage.
    pub(crate) fn restore(&mut self, session: Session) {
        self.transition(SessionState::Authenticated(session));
    }

    /// Any -> Unauthenticated. Used for sign-out and expiry.
    pub(crate) fn invalidate(&mut self) {
        self.transition(SessionState::Unauthenticated);
    }

    fn transition(&mut self, next: SessionState) {
        tracing::trace!(from = self.name(), to = next.name(), "Session state transition");
        *self = next;
    }
}
