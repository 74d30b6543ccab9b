use async_trait::async_trait;

use super::GrantTypeHandler;
use crate::code_grant::error::Error;
use crate::code_grant::request::Request;
use crate::primitives::grant::{Grant, GrantType};
use crate::primitives::registrar::Client;
use crate::primitives::scope::Scope;
use crate::primitives::storage::Storage;

/// The client acts on its own behalf, [RFC 6749 section 4.4].
///
/// Only confidential clients may use it. The token gets the requested scope, or the scope of the
/// client when none was requested, and is never refreshable.
///
/// [RFC 6749 section 4.4]: https://tools.ietf.org/html/rfc6749#section-4.4
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientCredentialsGrant;

#[async_trait]
impl GrantTypeHandler for ClientCredentialsGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::ClientCredentials
    }

    async fn validate(
        &self, _: &Request, _: &dyn Storage, client: &Client, scope: Option<Scope>,
    ) -> Result<Grant, Error> {
        // A public client is only identified, never authenticated.
        if !client.is_confidential() {
            return Err(Error::unauthorized("Invalid credentials given."));
        }

        Ok(Grant {
            client_id: client.client_id.clone(),
            scope: scope.unwrap_or_else(|| client.scope.clone()),
            refresh: false,
            consumes: None,
        })
    }
}
