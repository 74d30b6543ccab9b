use async_trait::async_trait;

use super::GrantTypeHandler;
use crate::code_grant::error::{Error, ErrorType};
use crate::code_grant::request::Request;
use crate::primitives::grant::{Grant, GrantType};
use crate::primitives::registrar::Client;
use crate::primitives::scope::Scope;
use crate::primitives::storage::Storage;

/// Resource owner password credentials, [RFC 6749 section 4.3].
///
/// The storage decides about the `username` and `password`. The token is refreshable.
///
/// [RFC 6749 section 4.3]: https://tools.ietf.org/html/rfc6749#section-4.3
#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordGrant;

#[async_trait]
impl GrantTypeHandler for PasswordGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::Password
    }

    async fn validate(
        &self, request: &Request, storage: &dyn Storage, client: &Client, scope: Option<Scope>,
    ) -> Result<Grant, Error> {
        if request.post.username.is_none() {
            return Err(Error::invalid_with(
                ErrorType::InvalidRequest,
                "Missing username parameter.",
            ));
        }
        if request.post.password.is_none() {
            return Err(Error::invalid_with(
                ErrorType::InvalidRequest,
                "Missing password parameter.",
            ));
        }

        if !storage.authenticate(request).await? {
            return Err(Error::invalid_with(
                ErrorType::InvalidGrant,
                "Invalid credentials given.",
            ));
        }

        Ok(Grant {
            client_id: client.client_id.clone(),
            scope: scope.unwrap_or_else(|| client.scope.clone()),
            refresh: true,
            consumes: None,
        })
    }
}
