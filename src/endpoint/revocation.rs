use crate::code_grant::error::Error;
use crate::code_grant::request::Request;
use crate::primitives::issuer::TokenTypeHint;
use crate::primitives::storage::Storage;

use super::introspection::required_token;
use super::{finish_error, into_response, precheck, POST_ONLY};
use super::{AuthorizationServer, Response, ResponseStatus};

impl<S: Storage> AuthorizationServer<S> {
    /// Revoke a token of the authenticated client, [RFC 7009].
    ///
    /// Revoking either value of a pair revokes the whole pair. Tokens of other clients, unknown
    /// tokens and tokens revoked before are silently accepted, so the answer does not reveal
    /// anything about them.
    ///
    /// [RFC 7009]: https://tools.ietf.org/html/rfc7009
    pub async fn revoke(&self, request: &Request) -> Result<(), Error> {
        self.revoke_inner(request)
            .await
            .map_err(|error| finish_error(error, &request.settings))
    }

    /// Revoke a token and answer with the envelope.
    pub async fn create_token_revocation_response(&self, request: &Request) -> Response {
        match self.revoke(request).await {
            Ok(()) => Response::empty(ResponseStatus::Ok),
            Err(error) => into_response(error, POST_ONLY),
        }
    }

    async fn revoke_inner(&self, request: &Request) -> Result<(), Error> {
        precheck(request, POST_ONLY)?;
        let client = self.authenticate_client(request).await?;
        let value = required_token(request)?;

        let (token, kind) = match self.find_token(request, &client.client_id, value).await? {
            Some(found) => found,
            None => {
                log::debug!("Revocation of unknown token by client {}", client.client_id);
                return Ok(());
            }
        };

        let revoked = match (kind, token.refresh_token.as_deref()) {
            (TokenTypeHint::RefreshToken, _) => self.storage.revoke_token(request, value).await?,
            (TokenTypeHint::AccessToken, Some(refresh_token)) => {
                self.storage.revoke_token(request, refresh_token).await?
            }
            (TokenTypeHint::AccessToken, None) => {
                self.storage.revoke_access_token(request, value).await?
            }
        };

        if !revoked {
            log::debug!("Token of client {} was already revoked", client.client_id);
        }

        Ok(())
    }
}
