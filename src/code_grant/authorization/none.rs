use async_trait::async_trait;

use super::{AuthorizationState, ResponseTypeHandler};
use crate::code_grant::error::Error;
use crate::code_grant::request::Request;
use crate::code_grant::response::AuthorizationResponse;
use crate::primitives::grant::ResponseType;
use crate::primitives::storage::Storage;

/// Confirms the authorization without issuing anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoneResponse;

#[async_trait]
impl ResponseTypeHandler for NoneResponse {
    fn response_type(&self) -> ResponseType {
        ResponseType::None
    }

    async fn respond(
        &self, _: &Request, _: &dyn Storage, _: &AuthorizationState,
    ) -> Result<AuthorizationResponse, Error> {
        Ok(AuthorizationResponse::None)
    }
}
