//! The authorization server, dispatching requests to the grant and response type handlers.
//!
//! An endpoint is concerned with executing the abstract behaviours given by the handlers in terms
//! of http responses. This means translating redirect errors to the correct redirect response,
//! attaching the configured error documentation and sending backend failures to the logger. The
//! frontends, which are the bindings to particular server libraries, only convert their request
//! into a [`Request`] and the returned [`Response`] back.
//!
//! To ensure the adherence to the oauth2 rfc, the control flow shared by all handlers is fixed
//! here: availability, transport security and http method are checked before anything else, then
//! the client is resolved, and only then is a handler selected by the `grant_type` or
//! `response_type` of the request.
//!
//! _WARNING_: Deployments MUST ensure a secure communication layer with confidential clients.
//! This means using TLS for communication over https, `insecure_transport` is for development.
//!
//! The registry of handlers is fixed when the server is constructed. Afterwards the server is
//! only ever borrowed immutably, so one instance can serve any number of concurrent requests.
//!
//! [`Request`]: ../code_grant/request/struct.Request.html
//! [`Response`]: response/struct.Response.html
mod accesstoken;
mod authorization;
mod introspection;
mod revocation;
pub mod response;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::code_grant::authorization::ResponseTypeHandler;
use crate::code_grant::error::{Error, ErrorType};
use crate::code_grant::grant::GrantTypeHandler;
use crate::code_grant::request::{Request, RequestMethod};
use crate::config::Settings;
use crate::primitives::grant::{GrantType, ResponseType};
use crate::primitives::registrar::Client;
use crate::primitives::scope::Scope;
use crate::primitives::storage::Storage;

pub use self::authorization::Authorized;
pub use self::response::{Response, ResponseStatus};

/// Methods accepted by the token, introspection and revocation endpoints.
const POST_ONLY: &[RequestMethod] = &[RequestMethod::Post];

/// Methods accepted by the authorization endpoint.
const AUTHORIZE_METHODS: &[RequestMethod] = &[RequestMethod::Get, RequestMethod::Post];

/// An OAuth2 authorization server over a storage backend.
pub struct AuthorizationServer<S> {
    storage: S,
    grant_types: HashMap<GrantType, Box<dyn GrantTypeHandler>>,
    response_types: HashMap<ResponseType, Box<dyn ResponseTypeHandler>>,
}

impl<S: Storage> AuthorizationServer<S> {
    /// A server supporting every grant and response type.
    pub fn new(storage: S) -> Self {
        AuthorizationServer::with_handlers(
            storage,
            GrantType::ALL.iter().map(|grant| grant.handler()),
            ResponseType::ALL.iter().map(|response| response.handler()),
        )
    }

    /// A server supporting exactly the given handlers.
    ///
    /// A later handler for the same grant or response type replaces an earlier one. Requests for
    /// any other type are answered with `unsupported_grant_type` or `unsupported_response_type`.
    pub fn with_handlers<G, R>(storage: S, grant_types: G, response_types: R) -> Self
    where
        G: IntoIterator<Item = Box<dyn GrantTypeHandler>>,
        R: IntoIterator<Item = Box<dyn ResponseTypeHandler>>,
    {
        AuthorizationServer {
            storage,
            grant_types: grant_types
                .into_iter()
                .map(|handler| (handler.grant_type(), handler))
                .collect(),
            response_types: response_types
                .into_iter()
                .map(|handler| (handler.response_type(), handler))
                .collect(),
        }
    }

    /// The storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether a handler for the grant type is registered.
    pub fn supports_grant_type(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains_key(&grant_type)
    }

    /// Whether a handler for the response type is registered.
    pub fn supports_response_type(&self, response_type: ResponseType) -> bool {
        self.response_types.contains_key(&response_type)
    }

    fn backend(&self) -> &dyn Storage {
        &self.storage
    }

    fn grant_handler(&self, name: &str) -> Option<&dyn GrantTypeHandler> {
        let grant_type = name.parse::<GrantType>().ok()?;
        self.grant_types.get(&grant_type).map(Box::as_ref)
    }

    fn response_handler(&self, name: &str) -> Option<&dyn ResponseTypeHandler> {
        let response_type = name.parse::<ResponseType>().ok()?;
        self.response_types.get(&response_type).map(Box::as_ref)
    }

    /// Resolve and authenticate the client of a token, introspection or revocation request.
    async fn authenticate_client(&self, request: &Request) -> Result<Client, Error> {
        let credentials = request.client_credentials()?;
        let client = self
            .storage
            .get_client(
                request,
                &credentials.client_id,
                credentials.client_secret.as_deref(),
            )
            .await?
            .ok_or_else(|| Error::unauthorized("Invalid client_id parameter value."))?;

        if client.is_confidential() && credentials.client_secret.is_none() {
            return Err(Error::unauthorized("Invalid credentials given."));
        }

        Ok(client)
    }
}

impl<S> fmt::Debug for AuthorizationServer<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AuthorizationServer")
            .field("grant_types", &self.grant_types.keys().collect::<Vec<_>>())
            .field("response_types", &self.response_types.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Checks shared by all endpoints, before any client is looked up.
fn precheck(request: &Request, allowed: &[RequestMethod]) -> Result<(), Error> {
    if !request.settings.available {
        return Err(Error::invalid(ErrorType::TemporarilyUnavailable));
    }

    if !request.settings.insecure_transport && !request.is_secure() {
        return Err(Error::invalid_with(
            ErrorType::InsecureTransport,
            "OAuth 2 MUST utilize https.",
        ));
    }

    if !allowed.contains(&request.method) {
        return Err(Error::invalid(ErrorType::MethodIsNotAllowed));
    }

    Ok(())
}

/// Parse the requested scope and check it against the registration of the client.
///
/// An absent or empty scope is `None`, the handler then picks its default.
fn requested_scope(scope: Option<&str>, client: &Client) -> Result<Option<Scope>, Error> {
    let scope = match scope {
        None => return Ok(None),
        Some(scope) => scope
            .parse::<Scope>()
            .map_err(|err| Error::invalid_with(ErrorType::InvalidScope, err.to_string()))?,
    };

    if scope.is_empty() {
        return Ok(None);
    }

    if !client.check_scope(&scope) {
        return Err(Error::invalid(ErrorType::InvalidScope));
    }

    Ok(Some(scope))
}

/// Attach the error documentation uri and log the outcome.
fn finish_error(mut error: Error, settings: &Settings) -> Error {
    match &error {
        Error::Primitive(err) => log::error!("Storage backend failed: {}", err),
        other => log::debug!("Rejected request: {}", other),
    }

    if settings.has_error_uri() {
        let kind = error.kind();
        match Url::parse(&settings.error_uri).and_then(|base| base.join(kind.as_ref())) {
            Ok(uri) => {
                if let Some(description) = error.description() {
                    description.explain_uri(uri);
                }
            }
            Err(err) => log::debug!("Configured error uri is not a valid url: {}", err),
        }
    }

    error
}

/// Convert the outcome of an endpoint into the response envelope.
fn into_response(error: Error, allowed: &[RequestMethod]) -> Response {
    match error.kind() {
        ErrorType::MethodIsNotAllowed => Response::method_not_allowed(error, allowed),
        _ => Response::from(error),
    }
}
