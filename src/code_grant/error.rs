//! Errors defined in [rfc6749], and the way each of them reaches the client.
//!
//! [rfc6749]: https://tools.ietf.org/html/rfc6749#section-6
use std::borrow::Cow;
use std::fmt;
use std::vec;

use url::Url;

use crate::primitives::PrimitiveError;

/// All error codes the server answers with.
///
/// Details also found in <https://tools.ietf.org/html/rfc6749#section-5.2> and
/// <https://tools.ietf.org/html/rfc6749#section-4.1.2.1>.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorType {
    /// The request is missing a required parameter, includes an unsupported parameter value (other
    /// than grant type), repeats a parameter, includes multiple credentials, utilizes more than one
    /// mechanism for authenticating the client, or is otherwise malformed.
    InvalidRequest,

    /// Client authentication failed (e.g., unknown client, no client authentication included, or
    /// unsupported authentication method).
    InvalidClient,

    /// The provided authorization grant (e.g., authorization code, resource owner credentials) or
    /// refresh token is invalid, expired, revoked, does not match the redirection URI used in the
    /// authorization request, or was issued to another client.
    InvalidGrant,

    /// The client is not authorized to use this grant or response type.
    UnauthorizedClient,

    /// The authorization grant type is not supported by the authorization server.
    UnsupportedGrantType,

    /// The authorization server does not support obtaining a response using this method.
    UnsupportedResponseType,

    /// The requested scope is invalid, unknown, malformed, or exceeds the scope granted by the
    /// resource owner.
    InvalidScope,

    /// The resource owner or authorization server denied the request.
    AccessDenied,

    /// The authorization server encountered an unexpected condition that prevented it from
    /// fulfilling the request.
    ServerError,

    /// The authorization server is currently unable to handle the request due to a temporary
    /// overloading or maintenance of the server.
    TemporarilyUnavailable,

    /// The request did not arrive over TLS while insecure transport is not allowed.
    InsecureTransport,

    /// The endpoint does not accept the http method of the request.
    MethodIsNotAllowed,
}

impl ErrorType {
    fn description(self) -> &'static str {
        match self {
            ErrorType::InvalidRequest => "invalid_request",
            ErrorType::InvalidClient => "invalid_client",
            ErrorType::InvalidGrant => "invalid_grant",
            ErrorType::UnauthorizedClient => "unauthorized_client",
            ErrorType::UnsupportedGrantType => "unsupported_grant_type",
            ErrorType::UnsupportedResponseType => "unsupported_response_type",
            ErrorType::InvalidScope => "invalid_scope",
            ErrorType::AccessDenied => "access_denied",
            ErrorType::ServerError => "server_error",
            ErrorType::TemporarilyUnavailable => "temporarily_unavailable",
            ErrorType::InsecureTransport => "insecure_transport",
            ErrorType::MethodIsNotAllowed => "method_is_not_allowed",
        }
    }
}

impl AsRef<str> for ErrorType {
    fn as_ref(&self) -> &str {
        self.description()
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// Represents the parameters of an error response.
///
/// The same parameters are used by the json body of a token endpoint error and by the query or
/// fragment of an authorization error redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthError {
    error: ErrorType,
    description: Option<Cow<'static, str>>,
    uri: Option<Cow<'static, str>>,
}

impl OAuthError {
    /// An error of the given type without any further information.
    pub fn new(error: ErrorType) -> Self {
        OAuthError {
            error,
            description: None,
            uri: None,
        }
    }

    /// An error of the given type with a short explanation.
    pub fn with_description<D: Into<Cow<'static, str>>>(error: ErrorType, description: D) -> Self {
        let mut this = OAuthError::new(error);
        this.explain(description);
        this
    }

    /// Get the formal kind of error.
    pub fn kind(&self) -> ErrorType {
        self.error
    }

    /// Provide a short text explanation for the error.
    pub fn explain<D: Into<Cow<'static, str>>>(&mut self, description: D) {
        self.description = Some(description.into())
    }

    /// A uri identifying a resource explaining the error in detail.
    pub fn explain_uri(&mut self, uri: Url) {
        self.uri = Some(String::from(uri).into())
    }

    /// The explanation, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The explaining uri, if any.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Iterate over the key value pairs that describe this error.
    ///
    /// These pairs must be added to the detailed description of an error, either in a json body
    /// or as part of the redirect uri.
    pub fn iter(&self) -> <&Self as IntoIterator>::IntoIter {
        self.into_iter()
    }

    /// The json body of an error response.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(value.into_owned())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl Default for OAuthError {
    /// Construct an `OAuthError` with no extra information.
    ///
    /// Will produce a generic `InvalidRequest` error without any description or error uri which
    /// would provide additional information for the client.
    fn default() -> Self {
        OAuthError::new(ErrorType::InvalidRequest)
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {}", self.error, description),
            None => write!(f, "{}", self.error),
        }
    }
}

/// The error as key-value pairs.
impl IntoIterator for OAuthError {
    type Item = (&'static str, Cow<'static, str>);
    type IntoIter = vec::IntoIter<(&'static str, Cow<'static, str>)>;

    fn into_iter(self) -> Self::IntoIter {
        let mut vec = vec![("error", Cow::Borrowed(self.error.description()))];
        if let Some(description) = self.description {
            vec.push(("error_description", description));
        }
        if let Some(uri) = self.uri {
            vec.push(("error_uri", uri));
        }
        vec.into_iter()
    }
}

impl IntoIterator for &'_ OAuthError {
    type Item = (&'static str, Cow<'static, str>);
    type IntoIter = vec::IntoIter<(&'static str, Cow<'static, str>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.clone().into_iter()
    }
}

/// Encapsulates a redirect to a valid redirect_uri with an error response.
///
/// Only constructed once the redirect uri was checked against the registration of the client.
#[derive(Clone, Debug)]
pub struct ErrorUrl {
    base_uri: Url,
    error: OAuthError,
    state: Option<String>,
    fragment: bool,
}

impl ErrorUrl {
    /// Construct a new error, already fixing the state parameter if it exists.
    ///
    /// With `fragment` set the parameters are placed in the fragment instead of the query, as
    /// required for response types delivering their result in the fragment.
    pub fn new(
        redirect_uri: Url, state: Option<String>, fragment: bool, error: OAuthError,
    ) -> Self {
        ErrorUrl {
            base_uri: redirect_uri,
            error,
            state,
            fragment,
        }
    }

    /// Modify the contained error.
    pub fn description(&mut self) -> &mut OAuthError {
        &mut self.error
    }

    /// Get the contained error.
    pub fn error(&self) -> &OAuthError {
        &self.error
    }

    /// Finalize the error url by saving its parameters in the query or fragment part.
    pub fn into_url(self) -> Url {
        let mut pairs = self
            .error
            .into_iter()
            .map(|(key, value)| (key, value.into_owned()))
            .collect::<Vec<_>>();
        if let Some(state) = self.state {
            pairs.push(("state", state));
        }
        super::response::place_parameters(self.base_uri, self.fragment, pairs)
    }
}

/// Defines the kinds of errors the server can answer with.
///
/// Each variant corresponds to a different way of delivering the error, the server maps them to
/// the response envelope in one place.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request was malformed or rejected, answered with a json body.
    #[error("{0}")]
    Invalid(OAuthError),

    /// Client authentication failed, answered with `401` and a challenge of the scheme.
    #[error("{0}")]
    Unauthorized(OAuthError, String),

    /// The error is sent to the validated redirect uri of the client.
    #[error("{}", .0.error())]
    Redirect(ErrorUrl),

    /// A storage backend failed, this is not the fault of the client.
    #[error("{0}")]
    Primitive(#[from] PrimitiveError),
}

impl Error {
    /// A bare error of the given type.
    pub fn invalid(kind: ErrorType) -> Self {
        Error::Invalid(OAuthError::new(kind))
    }

    /// An error of the given type with a short explanation.
    pub fn invalid_with<D: Into<Cow<'static, str>>>(kind: ErrorType, description: D) -> Self {
        Error::Invalid(OAuthError::with_description(kind, description))
    }

    /// A failed client authentication with the `Basic` scheme.
    pub fn unauthorized<D: Into<Cow<'static, str>>>(description: D) -> Self {
        Error::Unauthorized(
            OAuthError::with_description(ErrorType::InvalidClient, description),
            "Basic".to_string(),
        )
    }

    /// The protocol error type, `server_error` for backend failures.
    pub fn kind(&self) -> ErrorType {
        match self {
            Error::Invalid(error) | Error::Unauthorized(error, _) => error.kind(),
            Error::Redirect(url) => url.error().kind(),
            Error::Primitive(_) => ErrorType::ServerError,
        }
    }

    /// Get a handle to the description the client will receive.
    ///
    /// Some types of this error don't return any description which is represented by a `None`
    /// result.
    pub fn description(&mut self) -> Option<&mut OAuthError> {
        match self {
            Error::Invalid(description) => Some(description),
            Error::Unauthorized(description, _) => Some(description),
            Error::Redirect(url) => Some(url.description()),
            Error::Primitive(_) => None,
        }
    }

    /// Turn a rejection into a redirect to the client, backend failures stay as they are.
    pub fn redirect(self, redirect_uri: &Url, state: Option<&str>, fragment: bool) -> Self {
        match self {
            Error::Invalid(error) | Error::Unauthorized(error, _) => Error::Redirect(ErrorUrl::new(
                redirect_uri.clone(),
                state.map(str::to_string),
                fragment,
                error,
            )),
            other => other,
        }
    }
}
