//! Response type handlers, one per value of the `response_type` parameter of the authorization
//! endpoint.
//!
//! By the time a handler runs the server has resolved the client, checked the redirect uri, the
//! response type and the scope. What remains is specific to the response type: its own request
//! parameters and the credential it hands out.
use async_trait::async_trait;
use url::Url;

use super::error::{Error, OAuthError};
use super::request::Request;
use super::response::AuthorizationResponse;
use crate::primitives::grant::ResponseType;
use crate::primitives::registrar::Client;
use crate::primitives::scope::Scope;
use crate::primitives::storage::Storage;

mod code;
mod id_token;
mod none;
mod token;

pub use self::code::CodeResponse;
pub use self::id_token::IdTokenResponse;
pub use self::none::NoneResponse;
pub use self::token::TokenResponseType;

/// A validated authorization request, waiting for the decision of the resource owner.
#[derive(Clone, Debug)]
pub struct AuthorizationState {
    /// The requesting client.
    pub client: Client,
    /// The requested response type.
    pub response_type: ResponseType,
    /// The scope to approve, the default scope of the client if none was requested.
    pub scope: Scope,
    /// The validated redirect uri, exactly as registered.
    pub redirect_uri: String,
    /// The parsed form of `redirect_uri`, the base of every redirect.
    pub redirect_url: Url,
    /// Opaque state of the client.
    pub state: Option<String>,
}

/// Produces the result of an authorization for one response type.
///
/// Handlers keep no state between calls, a single instance serves all concurrent requests.
#[async_trait]
pub trait ResponseTypeHandler: Send + Sync {
    /// The response type served by this handler.
    fn response_type(&self) -> ResponseType;

    /// Check the parameters only this response type uses.
    fn validate(&self, _request: &Request, _client: &Client) -> Result<(), OAuthError> {
        Ok(())
    }

    /// Issue the credential of an approved authorization.
    async fn respond(
        &self, request: &Request, storage: &dyn Storage, authorization: &AuthorizationState,
    ) -> Result<AuthorizationResponse, Error>;
}

impl ResponseType {
    /// The handler implementing this response type.
    pub fn handler(self) -> Box<dyn ResponseTypeHandler> {
        match self {
            ResponseType::Code => Box::new(CodeResponse),
            ResponseType::Token => Box::new(TokenResponseType),
            ResponseType::None => Box::new(NoneResponse),
            ResponseType::IdToken => Box::new(IdTokenResponse),
        }
    }
}
