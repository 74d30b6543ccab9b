use async_trait::async_trait;
use chrono::Utc;

use super::GrantTypeHandler;
use crate::code_grant::error::{Error, ErrorType};
use crate::code_grant::request::Request;
use crate::primitives::grant::{Consumed, Grant, GrantType};
use crate::primitives::issuer::TokenTypeHint;
use crate::primitives::registrar::Client;
use crate::primitives::scope::Scope;
use crate::primitives::storage::Storage;

/// Exchange of a refresh token, [RFC 6749 section 6].
///
/// Refresh tokens rotate: the old pair is revoked and a new refreshable pair is issued. The new
/// scope may equal or narrow the old one, a request for a wider scope is rejected.
///
/// [RFC 6749 section 6]: https://tools.ietf.org/html/rfc6749#section-6
#[derive(Clone, Copy, Debug, Default)]
pub struct RefreshTokenGrant;

#[async_trait]
impl GrantTypeHandler for RefreshTokenGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::RefreshToken
    }

    async fn validate(
        &self, request: &Request, storage: &dyn Storage, client: &Client, scope: Option<Scope>,
    ) -> Result<Grant, Error> {
        let refresh_token = request.post.refresh_token.as_deref().ok_or_else(|| {
            Error::invalid_with(ErrorType::InvalidRequest, "Missing refresh token parameter.")
        })?;

        let token = storage
            .get_token(
                request,
                &client.client_id,
                TokenTypeHint::RefreshToken,
                None,
                Some(refresh_token),
            )
            .await?
            .ok_or_else(|| Error::invalid(ErrorType::InvalidGrant))?;

        if token.revoked || token.refresh_token_expired(Utc::now()) {
            return Err(Error::invalid(ErrorType::InvalidGrant));
        }

        let scope = match scope {
            None => token.scope.clone(),
            Some(scope) if scope <= token.scope => scope,
            Some(_) => {
                return Err(Error::invalid_with(
                    ErrorType::InvalidScope,
                    "Requested scope exceeds the scope of the refreshed token.",
                ))
            }
        };

        Ok(Grant {
            client_id: client.client_id.clone(),
            scope,
            refresh: true,
            consumes: Some(Consumed::RefreshToken(refresh_token.to_string())),
        })
    }
}
