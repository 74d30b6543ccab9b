use async_trait::async_trait;

use super::{AuthorizationState, ResponseTypeHandler};
use crate::code_grant::error::{Error, ErrorType, OAuthError};
use crate::code_grant::request::Request;
use crate::code_grant::response::AuthorizationResponse;
use crate::primitives::authenticator::IdTokenParams;
use crate::primitives::grant::ResponseType;
use crate::primitives::registrar::Client;
use crate::primitives::storage::Storage;

/// An OpenID Connect id token, produced by the storage.
///
/// The `nonce` parameter is mandatory for this response type.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdTokenResponse;

fn missing_nonce() -> OAuthError {
    OAuthError::with_description(
        ErrorType::InvalidRequest,
        "Nonce required for response_type id_token.",
    )
}

#[async_trait]
impl ResponseTypeHandler for IdTokenResponse {
    fn response_type(&self) -> ResponseType {
        ResponseType::IdToken
    }

    fn validate(&self, request: &Request, _: &Client) -> Result<(), OAuthError> {
        match request.query.nonce {
            Some(_) => Ok(()),
            None => Err(missing_nonce()),
        }
    }

    async fn respond(
        &self, request: &Request, storage: &dyn Storage, authorization: &AuthorizationState,
    ) -> Result<AuthorizationResponse, Error> {
        let nonce = request
            .query
            .nonce
            .as_deref()
            .ok_or_else(|| Error::Invalid(missing_nonce()))?;

        let params = IdTokenParams {
            client_id: &authorization.client.client_id,
            scope: &authorization.scope,
            response_type: ResponseType::IdToken,
            redirect_uri: &authorization.redirect_uri,
            nonce,
        };
        let id_token = storage.get_id_token(request, params).await?;

        Ok(AuthorizationResponse::IdToken { id_token })
    }
}
