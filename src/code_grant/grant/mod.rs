//! Grant type handlers, one per value of the `grant_type` parameter of the token endpoint.
//!
//! The server has already authenticated the client, checked that it may use the grant type and
//! that the requested scope stays within its registration. A handler then checks the credential
//! specific to its grant type and describes the token to issue as a [`Grant`]. Issuing consumes
//! the credential first and only then creates the token, so a crash in between can never leave a
//! code or refresh token usable twice. When the storage reports that the credential was already
//! consumed by a concurrent request, no token is issued.
use async_trait::async_trait;

use super::error::{Error, ErrorType};
use super::request::Request;
use super::response::TokenResponse;
use crate::primitives::generator::RandomGenerator;
use crate::primitives::grant::{Consumed, Grant, GrantType};
use crate::primitives::registrar::Client;
use crate::primitives::scope::Scope;
use crate::primitives::storage::Storage;

mod authorization_code;
mod client_credentials;
mod password;
mod refresh;

pub use self::authorization_code::AuthorizationCodeGrant;
pub use self::client_credentials::ClientCredentialsGrant;
pub use self::password::PasswordGrant;
pub use self::refresh::RefreshTokenGrant;

/// Exchanges one kind of credential for a token.
///
/// Handlers keep no state between calls, a single instance serves all concurrent requests.
#[async_trait]
pub trait GrantTypeHandler: Send + Sync {
    /// The grant type served by this handler.
    fn grant_type(&self) -> GrantType;

    /// Check the grant specific parameters and determine the token to issue.
    ///
    /// `scope` is the requested scope, already known to be within the scope of the client, or
    /// `None` when the request did not name one.
    async fn validate(
        &self, request: &Request, storage: &dyn Storage, client: &Client, scope: Option<Scope>,
    ) -> Result<Grant, Error>;

    /// Consume the credential of the grant and issue the token.
    async fn grant(
        &self, request: &Request, storage: &dyn Storage, grant: Grant,
    ) -> Result<TokenResponse, Error> {
        issue(request, storage, grant).await
    }
}

impl GrantType {
    /// The handler implementing this grant type.
    pub fn handler(self) -> Box<dyn GrantTypeHandler> {
        match self {
            GrantType::AuthorizationCode => Box::new(AuthorizationCodeGrant),
            GrantType::ClientCredentials => Box::new(ClientCredentialsGrant),
            GrantType::Password => Box::new(PasswordGrant),
            GrantType::RefreshToken => Box::new(RefreshTokenGrant),
        }
    }
}

/// Consume the credential of a validated grant, then create the token.
pub async fn issue(
    request: &Request, storage: &dyn Storage, grant: Grant,
) -> Result<TokenResponse, Error> {
    let consumed = match &grant.consumes {
        Some(Consumed::AuthorizationCode(code)) => {
            storage
                .delete_authorization_code(request, &grant.client_id, code)
                .await?
        }
        Some(Consumed::RefreshToken(refresh_token)) => {
            storage.revoke_token(request, refresh_token).await?
        }
        None => true,
    };

    // Another request used the credential since it was validated.
    if !consumed {
        log::debug!("Credential of client {} was consumed concurrently", grant.client_id);
        return Err(Error::invalid(ErrorType::InvalidGrant));
    }

    let generator = RandomGenerator::new(request.settings.token_length);
    let access_token = generator.generate()?;
    let refresh_token = match grant.refresh {
        true => Some(generator.generate()?),
        false => None,
    };

    let token = storage
        .create_token(
            request,
            &grant.client_id,
            &grant.scope,
            &access_token,
            refresh_token.as_deref(),
        )
        .await?;

    Ok(TokenResponse::from(&token))
}
