use crate::code_grant::error::{Error, ErrorType};
use crate::code_grant::request::Request;
use crate::code_grant::response::TokenResponse;
use crate::primitives::storage::Storage;

use super::{finish_error, into_response, precheck, requested_scope, POST_ONLY};
use super::{AuthorizationServer, Response};

impl<S: Storage> AuthorizationServer<S> {
    /// Handle a request to the token endpoint, [RFC 6749 section 3.2].
    ///
    /// After the client was authenticated the handler of the `grant_type` validates the grant
    /// specific parameters, consumes the credential and issues the token.
    ///
    /// [RFC 6749 section 3.2]: https://tools.ietf.org/html/rfc6749#section-3.2
    pub async fn token(&self, request: &Request) -> Result<TokenResponse, Error> {
        self.token_inner(request)
            .await
            .map_err(|error| finish_error(error, &request.settings))
    }

    /// Handle a request to the token endpoint and answer with the json envelope.
    pub async fn create_token_response(&self, request: &Request) -> Response {
        match self.token(request).await {
            Ok(token) => Response::ok(&token),
            Err(error) => into_response(error, POST_ONLY),
        }
    }

    async fn token_inner(&self, request: &Request) -> Result<TokenResponse, Error> {
        precheck(request, POST_ONLY)?;

        let client = self.authenticate_client(request).await?;

        let name = request.post.grant_type.as_deref().ok_or_else(|| {
            Error::invalid_with(ErrorType::InvalidRequest, "Request is missing grant type.")
        })?;

        let handler = self
            .grant_handler(name)
            .ok_or_else(|| Error::invalid(ErrorType::UnsupportedGrantType))?;
        let grant_type = handler.grant_type();

        if !client.check_grant_type(grant_type) {
            return Err(Error::invalid(ErrorType::UnauthorizedClient));
        }

        let scope = requested_scope(request.post.scope.as_deref(), &client)?;

        log::debug!(
            "Dispatching token request of client {} to grant type {}",
            client.client_id,
            grant_type
        );

        let grant = handler
            .validate(request, self.backend(), &client, scope)
            .await?;
        handler.grant(request, self.backend(), grant).await
    }
}
