use async_trait::async_trait;

use super::{AuthorizationState, ResponseTypeHandler};
use crate::code_grant::error::{Error, OAuthError};
use crate::code_grant::pkce;
use crate::code_grant::request::Request;
use crate::code_grant::response::AuthorizationResponse;
use crate::primitives::authorizer::CodeParams;
use crate::primitives::generator::RandomGenerator;
use crate::primitives::grant::ResponseType;
use crate::primitives::registrar::Client;
use crate::primitives::storage::Storage;

/// Issues an authorization code, [RFC 6749 section 4.1.2].
///
/// A PKCE challenge of the request is stored with the code and checked on exchange.
///
/// [RFC 6749 section 4.1.2]: https://tools.ietf.org/html/rfc6749#section-4.1.2
#[derive(Clone, Copy, Debug, Default)]
pub struct CodeResponse;

#[async_trait]
impl ResponseTypeHandler for CodeResponse {
    fn response_type(&self) -> ResponseType {
        ResponseType::Code
    }

    fn validate(&self, request: &Request, _: &Client) -> Result<(), OAuthError> {
        pkce::challenge(
            request.query.code_challenge_method.as_deref(),
            request.query.code_challenge.as_deref(),
        )
        .map(|_| ())
    }

    async fn respond(
        &self, request: &Request, storage: &dyn Storage, authorization: &AuthorizationState,
    ) -> Result<AuthorizationResponse, Error> {
        let challenge = pkce::challenge(
            request.query.code_challenge_method.as_deref(),
            request.query.code_challenge.as_deref(),
        )
        .map_err(Error::Invalid)?;

        let code = RandomGenerator::new(request.settings.code_length).generate()?;
        let params = CodeParams {
            client_id: &authorization.client.client_id,
            scope: &authorization.scope,
            response_type: ResponseType::Code,
            redirect_uri: &authorization.redirect_uri,
            code_challenge_method: challenge.as_ref().map(|challenge| challenge.method),
            code_challenge: challenge.as_ref().map(|challenge| challenge.challenge.as_str()),
            code: &code,
        };

        let stored = storage.create_authorization_code(request, params).await?;

        Ok(AuthorizationResponse::Code {
            code: stored.code,
            scope: stored.scope,
        })
    }
}
