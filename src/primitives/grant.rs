//! Encapsulates the closed sets of grant and response types as well as validated grants.
use std::fmt;
use std::str::FromStr;

use serde_derive::{Deserialize, Serialize};

use super::scope::Scope;

/// The grant types understood by the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Exchange of an authorization code.
    AuthorizationCode,
    /// A confidential client acting on its own behalf.
    ClientCredentials,
    /// Resource owner password credentials.
    Password,
    /// Exchange of a refresh token for a new token pair.
    RefreshToken,
}

/// The response types understood by the authorization endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Authorization code, exchanged at the token endpoint afterwards.
    Code,
    /// Implicit grant, the access token is returned directly.
    Token,
    /// Pure confirmation, no credential is issued.
    None,
    /// An OpenID Connect id token.
    IdToken,
}

/// A grant or response type name that is not part of the known set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownType(pub String);

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown type `{}`", self.0)
    }
}

impl std::error::Error for UnknownType {}

impl GrantType {
    /// All grant types, in the order they are registered by default.
    pub const ALL: [GrantType; 4] = [
        GrantType::AuthorizationCode,
        GrantType::ClientCredentials,
        GrantType::Password,
        GrantType::RefreshToken,
    ];

    /// The name as it appears in the `grant_type` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::Password => "password",
            GrantType::RefreshToken => "refresh_token",
        }
    }
}

impl ResponseType {
    /// All response types, in the order they are registered by default.
    pub const ALL: [ResponseType; 4] = [
        ResponseType::Code,
        ResponseType::Token,
        ResponseType::None,
        ResponseType::IdToken,
    ];

    /// The name as it appears in the `response_type` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Code => "code",
            ResponseType::Token => "token",
            ResponseType::None => "none",
            ResponseType::IdToken => "id_token",
        }
    }

    /// Whether results are delivered in the fragment of the redirect uri instead of the query.
    pub fn uses_fragment(self) -> bool {
        matches!(self, ResponseType::Token | ResponseType::IdToken)
    }
}

impl FromStr for GrantType {
    type Err = UnknownType;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        GrantType::ALL
            .iter()
            .copied()
            .find(|grant| grant.as_str() == name)
            .ok_or_else(|| UnknownType(name.to_string()))
    }
}

impl FromStr for ResponseType {
    type Err = UnknownType;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ResponseType::ALL
            .iter()
            .copied()
            .find(|response| response.as_str() == name)
            .ok_or_else(|| UnknownType(name.to_string()))
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The credential a grant uses up when it is turned into a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Consumed {
    /// The authorization code is deleted.
    AuthorizationCode(String),
    /// The token pair of the refresh token is revoked.
    RefreshToken(String),
}

/// A fully validated grant, ready to be turned into a token.
///
/// Produced by the validation of a grant type handler. Everything in here has already been
/// checked against the client registration and the stored credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    /// The client to which the token will be issued.
    pub client_id: String,

    /// The scope of the issued token.
    pub scope: Scope,

    /// Whether a refresh token is issued alongside the access token.
    pub refresh: bool,

    /// The credential that must be consumed before the token is issued.
    pub consumes: Option<Consumed>,
}
