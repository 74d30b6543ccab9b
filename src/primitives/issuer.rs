//! Issuers persist bearer tokens and answer lookups for them.
//!
//! Tokens are never deleted. Revocation sets a flag which can not be unset again, so a revoked or
//! expired token fails every use while it remains available for audit.
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use serde_derive::{Deserialize, Serialize};

use super::scope::Scope;
use super::{expiry, PrimitiveError, Time};
use crate::code_grant::request::Request;

/// The kind of bearer token, only `Bearer` is issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    /// RFC 6750 bearer tokens.
    Bearer,
}

impl TokenType {
    /// The name as used in the `token_type` response field.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Bearer => "Bearer",
        }
    }
}

/// Which of the two values of a token pair a lookup refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenTypeHint {
    /// Lookup by the access token.
    AccessToken,
    /// Lookup by the refresh token.
    RefreshToken,
}

impl TokenTypeHint {
    /// Interpret a `token_type_hint` parameter, unknown hints are ignored.
    pub fn from_param(hint: Option<&str>) -> Option<TokenTypeHint> {
        match hint {
            Some("access_token") => Some(TokenTypeHint::AccessToken),
            Some("refresh_token") => Some(TokenTypeHint::RefreshToken),
            _ => None,
        }
    }
}

/// An issued access and refresh token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The client the token was issued to.
    pub client_id: String,

    /// The opaque access token value.
    pub access_token: String,

    /// The opaque refresh token value, absent for non-refreshable grants.
    pub refresh_token: Option<String>,

    /// The scope the token grants.
    pub scope: Scope,

    /// Issuance time.
    pub issued_at: Time,

    /// Lifetime of the access token in seconds.
    pub expires_in: i64,

    /// Lifetime of the refresh token in seconds.
    pub refresh_token_expires_in: i64,

    /// Set once on revocation, never reset.
    pub revoked: bool,

    /// Always `Bearer`.
    pub token_type: TokenType,

    /// The resource owner on whose behalf the token was issued, if any.
    pub user: Option<String>,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Token")
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .field("issued_at", &self.issued_at)
            .field("expires_in", &self.expires_in)
            .field("refresh_token_expires_in", &self.refresh_token_expires_in)
            .field("revoked", &self.revoked)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl Token {
    /// Point in time at which the access token expires.
    pub fn expires_at(&self) -> Time {
        expiry(self.issued_at, self.expires_in)
    }

    /// Point in time at which the refresh token expires.
    pub fn refresh_expires_at(&self) -> Time {
        expiry(self.issued_at, self.refresh_token_expires_in)
    }

    /// Whether the access token is past its lifetime.
    pub fn is_expired(&self, now: Time) -> bool {
        self.expires_at() < now
    }

    /// Whether the refresh token is past its lifetime.
    pub fn refresh_token_expired(&self, now: Time) -> bool {
        self.refresh_expires_at() < now
    }

    /// Whether the access token may still be used at all.
    pub fn is_active(&self, now: Time) -> bool {
        !self.revoked && !self.is_expired(now)
    }
}

/// Issuers create bearer tokens and keep track of them.
///
/// The values themselves are generated by the caller, the issuer only persists them together
/// with the lifetimes configured in the request settings.
#[async_trait]
pub trait Issuer {
    /// Persist a new token pair for the client.
    async fn create_token(
        &self, request: &Request, client_id: &str, scope: &Scope, access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<Token, PrimitiveError>;

    /// Find a token of the client by one of its values.
    ///
    /// Returns the stored record regardless of its revocation or expiry, freshness is checked
    /// by the caller.
    async fn get_token(
        &self, request: &Request, client_id: &str, token_type: TokenTypeHint,
        access_token: Option<&str>, refresh_token: Option<&str>,
    ) -> Result<Option<Token>, PrimitiveError>;

    /// Revoke the token pair with this refresh token.
    ///
    /// Returns whether this call revoked a token that was not revoked before. The refresh grant
    /// consumes its token through this, so the check and the update must happen atomically: of
    /// two concurrent calls at most one may report `true`. Revoking an absent or already revoked
    /// token is not an error.
    async fn revoke_token(
        &self, request: &Request, refresh_token: &str,
    ) -> Result<bool, PrimitiveError>;

    /// Revoke the token pair with this access token, with the same result as `revoke_token`.
    async fn revoke_access_token(
        &self, request: &Request, access_token: &str,
    ) -> Result<bool, PrimitiveError>;
}

/// Keeps issued tokens in memory, in order of issuance.
///
/// A lookup returns the first inserted match. Duplicate values for one client are a violation of
/// the generator's uniqueness and not resolved any further.
#[derive(Debug, Default)]
pub struct TokenMap {
    tokens: Vec<Token>,
}

impl TokenMap {
    /// Create an empty map.
    pub fn new() -> TokenMap {
        TokenMap::default()
    }

    /// Build and store a token from the settings of the request.
    pub fn issue(
        &mut self, request: &Request, client_id: &str, scope: &Scope, access_token: &str,
        refresh_token: Option<&str>,
    ) -> Token {
        let token = Token {
            client_id: client_id.to_string(),
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
            scope: scope.clone(),
            issued_at: Utc::now(),
            expires_in: request.settings.token_expires_in,
            refresh_token_expires_in: request.settings.refresh_token_expires_in,
            revoked: false,
            token_type: TokenType::Bearer,
            user: request.user.clone(),
        };
        self.insert(token.clone());
        token
    }

    /// Store an already constructed token.
    pub fn insert(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// First token of the client matching the value selected by the hint.
    pub fn find(
        &self, client_id: &str, token_type: TokenTypeHint, access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Option<&Token> {
        self.tokens.iter().find(|token| {
            token.client_id == client_id
                && match token_type {
                    TokenTypeHint::AccessToken => {
                        access_token.map_or(false, |access| token.access_token == access)
                    }
                    TokenTypeHint::RefreshToken => {
                        refresh_token.is_some() && token.refresh_token.as_deref() == refresh_token
                    }
                }
        })
    }

    /// Revoke every token with this refresh token.
    ///
    /// Returns whether any of them was still unrevoked.
    pub fn revoke_refresh(&mut self, refresh_token: &str) -> bool {
        self.revoke_where(|token| token.refresh_token.as_deref() == Some(refresh_token))
    }

    /// Revoke every token with this access token.
    ///
    /// Returns whether any of them was still unrevoked.
    pub fn revoke_access(&mut self, access_token: &str) -> bool {
        self.revoke_where(|token| token.access_token == access_token)
    }

    fn revoke_where(&mut self, matches: impl Fn(&Token) -> bool) -> bool {
        let mut flipped = false;
        for token in self.tokens.iter_mut().filter(|token| matches(token)) {
            flipped |= !token.revoked;
            token.revoked = true;
        }
        flipped
    }

    /// The number of stored tokens, revoked ones included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no token was ever issued.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
