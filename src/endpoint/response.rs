//! The normalized response envelope handed back to the http frontend.
use serde::Serialize;
use url::Url;

use crate::code_grant::error::{Error, ErrorType, OAuthError};
use crate::code_grant::request::{Headers, RequestMethod};

/// The status codes the server answers with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    /// `200 OK`
    Ok,
    /// `302 Found`, a redirect to the client.
    Found,
    /// `400 Bad Request`
    BadRequest,
    /// `401 Unauthorized`
    Unauthorized,
    /// `405 Method Not Allowed`
    MethodNotAllowed,
    /// `500 Internal Server Error`
    InternalServerError,
    /// `503 Service Unavailable`
    ServiceUnavailable,
}

impl ResponseStatus {
    /// The numeric http status code.
    pub fn as_u16(self) -> u16 {
        match self {
            ResponseStatus::Ok => 200,
            ResponseStatus::Found => 302,
            ResponseStatus::BadRequest => 400,
            ResponseStatus::Unauthorized => 401,
            ResponseStatus::MethodNotAllowed => 405,
            ResponseStatus::InternalServerError => 500,
            ResponseStatus::ServiceUnavailable => 503,
        }
    }
}

/// A complete answer to a request.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    /// The http status.
    pub status: ResponseStatus,
    /// Response headers.
    pub headers: Headers,
    /// The json body, if any.
    pub content: Option<serde_json::Value>,
}

/// Headers of every json response, tokens and errors must never be cached.
fn default_headers() -> Headers {
    [
        ("Content-Type", "application/json"),
        ("Cache-Control", "no-store"),
        ("Pragma", "no-cache"),
    ]
    .iter()
    .copied()
    .collect()
}

impl Response {
    /// A json response with the default headers.
    pub fn json(status: ResponseStatus, content: serde_json::Value) -> Self {
        Response {
            status,
            headers: default_headers(),
            content: Some(content),
        }
    }

    /// A response without body.
    pub fn empty(status: ResponseStatus) -> Self {
        let mut headers = Headers::new();
        headers.insert("Cache-Control", "no-store");
        headers.insert("Pragma", "no-cache");
        Response {
            status,
            headers,
            content: None,
        }
    }

    /// A `200` response with the serialized body.
    pub fn ok<T: Serialize>(content: &T) -> Self {
        match serde_json::to_value(content) {
            Ok(content) => Response::json(ResponseStatus::Ok, content),
            Err(err) => {
                log::error!("Failed to serialize response body: {}", err);
                Response::json(
                    ResponseStatus::InternalServerError,
                    OAuthError::new(ErrorType::ServerError).to_json(),
                )
            }
        }
    }

    /// A `302` redirect to the url.
    pub fn redirect(location: Url) -> Self {
        let mut headers = Headers::new();
        headers.insert("Location", location.as_str());
        headers.insert("Cache-Control", "no-store");
        Response {
            status: ResponseStatus::Found,
            headers,
            content: None,
        }
    }

    /// The error response with an `Allow` header listing the accepted methods.
    pub fn method_not_allowed(error: Error, allow: &[RequestMethod]) -> Self {
        let allow = allow
            .iter()
            .map(|method| method.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mut response = Response::from(error);
        response.headers.insert("Allow", &allow);
        response
    }

    /// The target of a redirect.
    pub fn location(&self) -> Option<Url> {
        self.headers.get("location").and_then(|location| location.parse().ok())
    }

    /// The `error` field of an error body.
    pub fn error(&self) -> Option<&str> {
        self.content.as_ref()?.get("error")?.as_str()
    }
}

fn status_of(kind: ErrorType) -> ResponseStatus {
    match kind {
        ErrorType::InvalidClient => ResponseStatus::Unauthorized,
        ErrorType::MethodIsNotAllowed => ResponseStatus::MethodNotAllowed,
        ErrorType::ServerError => ResponseStatus::InternalServerError,
        ErrorType::TemporarilyUnavailable => ResponseStatus::ServiceUnavailable,
        _ => ResponseStatus::BadRequest,
    }
}

impl From<Error> for Response {
    fn from(error: Error) -> Self {
        match error {
            Error::Invalid(description) => {
                Response::json(status_of(description.kind()), description.to_json())
            }
            Error::Unauthorized(description, scheme) => {
                let mut response =
                    Response::json(ResponseStatus::Unauthorized, description.to_json());
                response.headers.insert("WWW-Authenticate", &scheme);
                response
            }
            Error::Redirect(url) => Response::redirect(url.into_url()),
            Error::Primitive(_) => Response::json(
                ResponseStatus::InternalServerError,
                OAuthError::new(ErrorType::ServerError).to_json(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors() {
        let response = Response::from(Error::invalid(ErrorType::InvalidGrant));
        assert_eq!(response.status.as_u16(), 400);
        assert_eq!(response.error(), Some("invalid_grant"));
        assert_eq!(response.headers.get("cache-control"), Some("no-store"));
        assert_eq!(response.headers.get("pragma"), Some("no-cache"));

        let response = Response::from(Error::invalid(ErrorType::TemporarilyUnavailable));
        assert_eq!(response.status, ResponseStatus::ServiceUnavailable);
    }

    #[test]
    fn unauthorized_challenge() {
        let response = Response::from(Error::unauthorized("Invalid client."));
        assert_eq!(response.status, ResponseStatus::Unauthorized);
        assert_eq!(response.headers.get("www-authenticate"), Some("Basic"));
        assert_eq!(response.error(), Some("invalid_client"));
    }

    #[test]
    fn backend_failure() {
        let error = Error::from(crate::primitives::PrimitiveError::Poisoned);
        let response = Response::from(error);
        assert_eq!(response.status.as_u16(), 500);
        assert_eq!(response.error(), Some("server_error"));
    }

    #[test]
    fn method_not_allowed() {
        let error = Error::invalid(ErrorType::MethodIsNotAllowed);
        let response = Response::method_not_allowed(error, &[RequestMethod::Post]);
        assert_eq!(response.status.as_u16(), 405);
        assert_eq!(response.headers.get("allow"), Some("POST"));
        assert_eq!(response.error(), Some("method_is_not_allowed"));
    }
}
