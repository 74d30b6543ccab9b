//! Resource owner authentication and OpenID Connect id tokens.
//!
//! Both are policy of the deployment, the server only asks for a decision or a value.
use std::collections::HashMap;

use async_trait::async_trait;
use subtle::ConstantTimeEq;

use super::grant::ResponseType;
use super::scope::Scope;
use super::PrimitiveError;
use crate::code_grant::request::Request;

/// Checks the resource owner credentials of a password grant.
#[async_trait]
pub trait Authenticator {
    /// Whether the `username` and `password` of the request belong to a resource owner.
    async fn authenticate(&self, request: &Request) -> Result<bool, PrimitiveError>;
}

/// The parameters of an id token request.
#[derive(Clone, Copy, Debug)]
pub struct IdTokenParams<'a> {
    /// The client requesting the token.
    pub client_id: &'a str,
    /// The approved scope.
    pub scope: &'a Scope,
    /// Always `id_token` when called by the server.
    pub response_type: ResponseType,
    /// Validated redirect uri.
    pub redirect_uri: &'a str,
    /// The nonce of the authorization request.
    pub nonce: &'a str,
}

/// Produces OpenID Connect id tokens. The token is opaque to the server.
#[async_trait]
pub trait IdTokenIssuer {
    /// Create the id token for an authorization.
    async fn get_id_token(
        &self, request: &Request, params: IdTokenParams<'_>,
    ) -> Result<String, PrimitiveError>;
}

/// Resource owner credentials held in memory.
#[derive(Clone, Default)]
pub struct PasswordMap {
    users: HashMap<String, Vec<u8>>,
}

impl PasswordMap {
    /// An empty map, rejecting everyone.
    pub fn new() -> PasswordMap {
        PasswordMap::default()
    }

    /// Add or replace the password of a user.
    pub fn register(&mut self, username: &str, password: &str) {
        self.users
            .insert(username.to_string(), password.as_bytes().to_vec());
    }

    /// Check a password without leaking how much of it matched.
    pub fn check(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(stored) => bool::from(stored.as_slice().ct_eq(password.as_bytes())),
            None => false,
        }
    }
}

#[async_trait]
impl Authenticator for PasswordMap {
    async fn authenticate(&self, request: &Request) -> Result<bool, PrimitiveError> {
        let post = &request.post;
        Ok(match (post.username.as_deref(), post.password.as_deref()) {
            (Some(username), Some(password)) => self.check(username, password),
            _ => false,
        })
    }
}
