use async_trait::async_trait;
use chrono::Utc;

use super::GrantTypeHandler;
use crate::code_grant::error::{Error, ErrorType};
use crate::code_grant::pkce;
use crate::code_grant::request::Request;
use crate::primitives::grant::{Consumed, Grant, GrantType};
use crate::primitives::registrar::Client;
use crate::primitives::scope::Scope;
use crate::primitives::storage::Storage;

/// Exchange of an authorization code, [RFC 6749 section 4.1.3].
///
/// The code must belong to the client, be unexpired and have been issued for the same redirect
/// uri. When the authorization request carried a PKCE challenge the verifier is required. The
/// token carries the scope of the code, a scope parameter is ignored.
///
/// [RFC 6749 section 4.1.3]: https://tools.ietf.org/html/rfc6749#section-4.1.3
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorizationCodeGrant;

#[async_trait]
impl GrantTypeHandler for AuthorizationCodeGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::AuthorizationCode
    }

    async fn validate(
        &self, request: &Request, storage: &dyn Storage, client: &Client, _: Option<Scope>,
    ) -> Result<Grant, Error> {
        let redirect_uri = request.post.redirect_uri.as_deref().ok_or_else(|| {
            Error::invalid_with(ErrorType::InvalidRequest, "Mismatching redirect URI.")
        })?;
        if !client.check_redirect_uri(redirect_uri) {
            return Err(Error::invalid_with(
                ErrorType::InvalidRequest,
                "Invalid redirect URI.",
            ));
        }

        let code = request
            .post
            .code
            .as_deref()
            .ok_or_else(|| {
                Error::invalid_with(ErrorType::InvalidRequest, "Missing code parameter.")
            })?;

        let stored = storage
            .get_authorization_code(request, &client.client_id, code)
            .await?
            .ok_or_else(|| Error::invalid(ErrorType::InvalidGrant))?;

        if stored.is_expired(Utc::now()) {
            return Err(Error::invalid_with(
                ErrorType::InvalidGrant,
                "Authorization code expired.",
            ));
        }

        if stored.redirect_uri != redirect_uri {
            return Err(Error::invalid_with(
                ErrorType::InvalidGrant,
                "Redirect URI does not match the authorization request.",
            ));
        }

        let pkce = (&stored.code_challenge, stored.code_challenge_method);
        if let (Some(challenge), Some(method)) = pkce {
            let verifier = request.post.code_verifier.as_deref().ok_or_else(|| {
                Error::invalid_with(ErrorType::InvalidRequest, "Code verifier required.")
            })?;
            if !pkce::verify(method, challenge, verifier) {
                return Err(Error::invalid_with(
                    ErrorType::InvalidGrant,
                    "Code verifier does not match the challenge.",
                ));
            }
        }

        Ok(Grant {
            client_id: client.client_id.clone(),
            scope: stored.scope,
            refresh: true,
            consumes: Some(Consumed::AuthorizationCode(stored.code)),
        })
    }
}
