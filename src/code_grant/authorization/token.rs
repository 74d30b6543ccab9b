use async_trait::async_trait;

use super::{AuthorizationState, ResponseTypeHandler};
use crate::code_grant::error::Error;
use crate::code_grant::grant::issue;
use crate::code_grant::request::Request;
use crate::code_grant::response::AuthorizationResponse;
use crate::primitives::grant::{Grant, ResponseType};
use crate::primitives::storage::Storage;

/// The implicit grant, [RFC 6749 section 4.2].
///
/// The access token is issued directly and returned in the fragment. No refresh token is issued
/// since the user agent can not keep one confidential.
///
/// [RFC 6749 section 4.2]: https://tools.ietf.org/html/rfc6749#section-4.2
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenResponseType;

#[async_trait]
impl ResponseTypeHandler for TokenResponseType {
    fn response_type(&self) -> ResponseType {
        ResponseType::Token
    }

    async fn respond(
        &self, request: &Request, storage: &dyn Storage, authorization: &AuthorizationState,
    ) -> Result<AuthorizationResponse, Error> {
        let grant = Grant {
            client_id: authorization.client.client_id.clone(),
            scope: authorization.scope.clone(),
            refresh: false,
            consumes: None,
        };

        let token = issue(request, storage, grant).await?;
        Ok(AuthorizationResponse::Token(token))
    }
}
