use chrono::Utc;

use crate::code_grant::error::{Error, ErrorType};
use crate::code_grant::request::Request;
use crate::code_grant::response::IntrospectionResponse;
use crate::primitives::issuer::{Token, TokenTypeHint};
use crate::primitives::storage::Storage;

use super::{finish_error, into_response, precheck, POST_ONLY};
use super::{AuthorizationServer, Response};

impl<S: Storage> AuthorizationServer<S> {
    /// Describe a token of the authenticated client, [RFC 7662].
    ///
    /// Only tokens of the requesting client are ever found. Unknown, revoked and expired tokens
    /// are all reported as inactive without any further detail.
    ///
    /// [RFC 7662]: https://tools.ietf.org/html/rfc7662
    pub async fn introspect(&self, request: &Request) -> Result<IntrospectionResponse, Error> {
        self.introspect_inner(request)
            .await
            .map_err(|error| finish_error(error, &request.settings))
    }

    /// Describe a token and answer with the json envelope.
    pub async fn create_token_introspection_response(&self, request: &Request) -> Response {
        match self.introspect(request).await {
            Ok(introspection) => Response::ok(&introspection),
            Err(error) => into_response(error, POST_ONLY),
        }
    }

    async fn introspect_inner(&self, request: &Request) -> Result<IntrospectionResponse, Error> {
        precheck(request, POST_ONLY)?;
        let client = self.authenticate_client(request).await?;
        let value = required_token(request)?;

        let now = Utc::now();
        let response = match self.find_token(request, &client.client_id, value).await? {
            Some((token, TokenTypeHint::AccessToken)) if token.is_active(now) => {
                IntrospectionResponse::active(&token, token.expires_at().timestamp())
            }
            Some((token, TokenTypeHint::RefreshToken))
                if !token.revoked && !token.refresh_token_expired(now) =>
            {
                IntrospectionResponse::active(&token, token.refresh_expires_at().timestamp())
            }
            _ => IntrospectionResponse::inactive(),
        };

        Ok(response)
    }

    /// Look up a token of the client by either of its values.
    ///
    /// The `token_type_hint` decides which kind is tried first, the other kind is tried when the
    /// first finds nothing.
    pub(super) async fn find_token(
        &self, request: &Request, client_id: &str, value: &str,
    ) -> Result<Option<(Token, TokenTypeHint)>, Error> {
        let hint = TokenTypeHint::from_param(request.post.token_type_hint.as_deref())
            .unwrap_or(TokenTypeHint::AccessToken);
        let order = match hint {
            TokenTypeHint::AccessToken => {
                [TokenTypeHint::AccessToken, TokenTypeHint::RefreshToken]
            }
            TokenTypeHint::RefreshToken => {
                [TokenTypeHint::RefreshToken, TokenTypeHint::AccessToken]
            }
        };

        for kind in order {
            let (access, refresh) = match kind {
                TokenTypeHint::AccessToken => (Some(value), None),
                TokenTypeHint::RefreshToken => (None, Some(value)),
            };
            let found = self
                .storage
                .get_token(request, client_id, kind, access, refresh)
                .await?;
            if let Some(token) = found {
                return Ok(Some((token, kind)));
            }
        }

        Ok(None)
    }
}

pub(super) fn required_token(request: &Request) -> Result<&str, Error> {
    request
        .post
        .token
        .as_deref()
        .ok_or_else(|| Error::invalid_with(ErrorType::InvalidRequest, "Missing token parameter."))
}
