//! Authorizers keep the authorization codes between the two steps of the code flow.
//!
//! A code binds the decision of the resource owner to the client, its redirect uri and an
//! optional PKCE challenge. The token endpoint later resolves it and checks the exchange request
//! against these bindings.
//!
//! Codes are single use. The token endpoint deletes a code before it issues the token for it and
//! gives up when the deletion reports that the code was already gone.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use serde_derive::{Deserialize, Serialize};

use super::grant::{ResponseType, UnknownType};
use super::scope::Scope;
use super::{expiry, PrimitiveError, Time};
use crate::code_grant::request::Request;

/// The transformation applied to a PKCE code verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    /// The challenge is the verifier itself.
    #[serde(rename = "plain")]
    Plain,
    /// The challenge is the unpadded base64url encoding of the verifier's SHA-256 digest.
    S256,
}

impl CodeChallengeMethod {
    /// The name as used in the `code_challenge_method` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            CodeChallengeMethod::Plain => "plain",
            CodeChallengeMethod::S256 => "S256",
        }
    }
}

impl FromStr for CodeChallengeMethod {
    type Err = UnknownType;

    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method {
            "plain" => Ok(CodeChallengeMethod::Plain),
            "S256" => Ok(CodeChallengeMethod::S256),
            other => Err(UnknownType(other.to_string())),
        }
    }
}

/// A stored authorization decision, to be exchanged once at the token endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// The opaque code value.
    pub code: String,

    /// The client the code was issued to.
    pub client_id: String,

    /// The redirect uri of the authorization request, repeated in the exchange.
    pub redirect_uri: String,

    /// The response type of the authorization request.
    pub response_type: ResponseType,

    /// The scope approved for the code.
    pub scope: Scope,

    /// Time of the authorization.
    pub auth_time: Time,

    /// Lifetime in seconds.
    pub expires_in: i64,

    /// The PKCE challenge, if the client sent one.
    pub code_challenge: Option<String>,

    /// The PKCE transformation, present whenever a challenge is.
    pub code_challenge_method: Option<CodeChallengeMethod>,

    /// The OpenID Connect nonce of the authorization request.
    pub nonce: Option<String>,

    /// The authenticated resource owner.
    pub user: Option<String>,
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AuthorizationCode")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("response_type", &self.response_type)
            .field("scope", &self.scope)
            .field("auth_time", &self.auth_time)
            .field("expires_in", &self.expires_in)
            .field("code_challenge_method", &self.code_challenge_method)
            .finish_non_exhaustive()
    }
}

impl AuthorizationCode {
    /// Point in time at which the code expires.
    pub fn expires_at(&self) -> Time {
        expiry(self.auth_time, self.expires_in)
    }

    /// Whether the code is past its lifetime.
    pub fn is_expired(&self, now: Time) -> bool {
        self.expires_at() < now
    }
}

/// The parameters of a new code, apart from the values taken from the request itself.
#[derive(Clone, Debug)]
pub struct CodeParams<'a> {
    /// The client to issue the code to.
    pub client_id: &'a str,
    /// The approved scope.
    pub scope: &'a Scope,
    /// Response type of the authorization request.
    pub response_type: ResponseType,
    /// Validated redirect uri of the authorization request.
    pub redirect_uri: &'a str,
    /// PKCE transformation, if any.
    pub code_challenge_method: Option<CodeChallengeMethod>,
    /// PKCE challenge, if any.
    pub code_challenge: Option<&'a str>,
    /// The generated code value.
    pub code: &'a str,
}

/// Authorizers create and manage authorization codes.
#[async_trait]
pub trait Authorizer {
    /// Persist a new code.
    async fn create_authorization_code(
        &self, request: &Request, params: CodeParams<'_>,
    ) -> Result<AuthorizationCode, PrimitiveError>;

    /// Find the code of the client, regardless of its expiry.
    async fn get_authorization_code(
        &self, request: &Request, client_id: &str, code: &str,
    ) -> Result<Option<AuthorizationCode>, PrimitiveError>;

    /// Remove the code and return whether it was still present.
    ///
    /// Deleting an absent code is not an error. The token endpoint only issues a token when this
    /// returns `true`, so of two concurrent deletions at most one may do so.
    async fn delete_authorization_code(
        &self, request: &Request, client_id: &str, code: &str,
    ) -> Result<bool, PrimitiveError>;
}

/// An in-memory hash map of codes, keyed by client and code.
#[derive(Debug, Default)]
pub struct AuthMap {
    codes: HashMap<(String, String), AuthorizationCode>,
}

impl AuthMap {
    /// Create an empty map.
    pub fn new() -> AuthMap {
        AuthMap::default()
    }

    /// Build and store a code from the parameters and the request.
    pub fn issue(&mut self, request: &Request, params: CodeParams<'_>) -> AuthorizationCode {
        let code = AuthorizationCode {
            code: params.code.to_string(),
            client_id: params.client_id.to_string(),
            redirect_uri: params.redirect_uri.to_string(),
            response_type: params.response_type,
            scope: params.scope.clone(),
            auth_time: Utc::now(),
            expires_in: request.settings.authorization_code_expires_in,
            code_challenge: params.code_challenge.map(str::to_string),
            code_challenge_method: params.code_challenge_method,
            nonce: request.query.nonce.clone(),
            user: request.user.clone(),
        };
        self.insert(code.clone());
        code
    }

    /// Store an already constructed code, replacing one with the same value.
    pub fn insert(&mut self, code: AuthorizationCode) {
        self.codes
            .insert((code.client_id.clone(), code.code.clone()), code);
    }

    /// The code of the client.
    pub fn get(&self, client_id: &str, code: &str) -> Option<&AuthorizationCode> {
        self.codes.get(&(client_id.to_string(), code.to_string()))
    }

    /// Remove the code, returning it if it was present.
    pub fn remove(&mut self, client_id: &str, code: &str) -> Option<AuthorizationCode> {
        self.codes.remove(&(client_id.to_string(), code.to_string()))
    }
}
