use url::Url;

use crate::code_grant::authorization::AuthorizationState;
use crate::code_grant::error::{Error, ErrorType};
use crate::code_grant::request::Request;
use crate::code_grant::response::AuthorizationResponse;
use crate::primitives::grant::ResponseType;
use crate::primitives::storage::Storage;

use super::{finish_error, into_response, precheck, requested_scope, AUTHORIZE_METHODS};
use super::{AuthorizationServer, Response};

/// A successful authorization.
#[derive(Clone, Debug)]
pub struct Authorized {
    /// What the handler issued.
    pub response: AuthorizationResponse,
    /// The redirect uri carrying the response and the state.
    pub location: Url,
}

impl<S: Storage> AuthorizationServer<S> {
    /// Check an authorization request without issuing anything, [RFC 6749 section 4.1.1].
    ///
    /// A frontend uses the result to ask the resource owner for consent. Until the redirect uri
    /// has been validated errors are answered directly, afterwards they are sent to the client by
    /// redirect.
    ///
    /// [RFC 6749 section 4.1.1]: https://tools.ietf.org/html/rfc6749#section-4.1.1
    pub async fn validate_authorization_request(
        &self, request: &Request,
    ) -> Result<AuthorizationState, Error> {
        self.validate_inner(request)
            .await
            .map_err(|error| finish_error(error, &request.settings))
    }

    /// Run an approved authorization request, issuing the credential of its response type.
    pub async fn authorize(&self, request: &Request) -> Result<Authorized, Error> {
        self.authorize_inner(request)
            .await
            .map_err(|error| finish_error(error, &request.settings))
    }

    /// Run an approved authorization request and answer with the redirect envelope.
    pub async fn create_authorization_response(&self, request: &Request) -> Response {
        match self.authorize(request).await {
            Ok(authorized) => Response::redirect(authorized.location),
            Err(error) => into_response(error, AUTHORIZE_METHODS),
        }
    }

    async fn authorize_inner(&self, request: &Request) -> Result<Authorized, Error> {
        let authorization = self.validate_inner(request).await?;
        let fragment = authorization.response_type.uses_fragment();
        let redirect = |error: Error| {
            error.redirect(&authorization.redirect_url, authorization.state.as_deref(), fragment)
        };

        let handler = self
            .response_types
            .get(&authorization.response_type)
            .ok_or_else(|| redirect(Error::invalid(ErrorType::UnsupportedResponseType)))?;

        log::debug!(
            "Dispatching authorization request of client {} to response type {}",
            authorization.client.client_id,
            authorization.response_type
        );

        let response = handler
            .respond(request, self.backend(), &authorization)
            .await
            .map_err(redirect)?;

        let location = response
            .clone()
            .into_url(authorization.redirect_url.clone(), authorization.state.as_deref());

        Ok(Authorized { response, location })
    }

    async fn validate_inner(&self, request: &Request) -> Result<AuthorizationState, Error> {
        precheck(request, AUTHORIZE_METHODS)?;
        let query = &request.query;

        let client_id = query.client_id.as_deref().ok_or_else(|| {
            Error::invalid_with(ErrorType::InvalidClient, "Missing client_id parameter.")
        })?;

        let client = self
            .storage
            .get_client(request, client_id, None)
            .await?
            .ok_or_else(|| {
                Error::invalid_with(ErrorType::InvalidClient, "Invalid client_id parameter value.")
            })?;

        let redirect_uri = query.redirect_uri.as_deref().ok_or_else(|| {
            Error::invalid_with(ErrorType::InvalidRequest, "Mismatching redirect URI.")
        })?;

        let invalid_redirect =
            || Error::invalid_with(ErrorType::InvalidRequest, "Invalid redirect URI.");
        if !client.check_redirect_uri(redirect_uri) {
            return Err(invalid_redirect());
        }
        let redirect_url = Url::parse(redirect_uri).map_err(|_| invalid_redirect())?;

        // The redirect uri is trusted from here on.
        let response_type = query
            .response_type
            .as_deref()
            .and_then(|name| name.parse::<ResponseType>().ok());
        let fragment = response_type.map_or(false, ResponseType::uses_fragment);
        let state = query.state.as_deref();
        let redirect = |error: Error| error.redirect(&redirect_url, state, fragment);

        let name = query.response_type.as_deref().ok_or_else(|| {
            redirect(Error::invalid_with(
                ErrorType::InvalidRequest,
                "Missing response_type parameter.",
            ))
        })?;

        let handler = self
            .response_handler(name)
            .ok_or_else(|| redirect(Error::invalid(ErrorType::UnsupportedResponseType)))?;
        let response_type = handler.response_type();

        if !client.check_response_type(response_type) {
            return Err(redirect(Error::invalid(ErrorType::UnauthorizedClient)));
        }

        let scope = requested_scope(query.scope.as_deref(), &client)
            .map_err(redirect)?
            .unwrap_or_else(|| client.scope.clone());

        handler
            .validate(request, &client)
            .map_err(|error| redirect(Error::Invalid(error)))?;

        Ok(AuthorizationState {
            client,
            response_type,
            scope,
            redirect_uri: redirect_uri.to_string(),
            redirect_url: redirect_url.clone(),
            state: query.state.clone(),
        })
    }
}
