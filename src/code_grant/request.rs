//! The request context handed through every handler call.
//!
//! A request bundles the parsed query and body parameters with the authenticated resource owner
//! and the settings of the server. It is immutable once dispatched, handlers only read from it.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use url::Url;

use super::error::{Error, ErrorType};
use crate::config::Settings;

/// The http method of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl RequestMethod {
    /// The canonical upper case name.
    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Head => "HEAD",
            RequestMethod::Options => "OPTIONS",
        }
    }
}

impl FromStr for RequestMethod {
    type Err = String;

    fn from_str(method: &str) -> Result<Self, Self::Err> {
        Ok(match method.to_ascii_uppercase().as_str() {
            "GET" => RequestMethod::Get,
            "POST" => RequestMethod::Post,
            "PUT" => RequestMethod::Put,
            "PATCH" => RequestMethod::Patch,
            "DELETE" => RequestMethod::Delete,
            "HEAD" => RequestMethod::Head,
            "OPTIONS" => RequestMethod::Options,
            _ => return Err(method.to_string()),
        })
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Http headers with case-insensitive names, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// No headers at all.
    pub fn new() -> Self {
        Headers::default()
    }

    /// Set a header, replacing all previous values of the same name.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.entries.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.entries.push((name.to_string(), value.to_string()));
    }

    /// The first value of a header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over all name value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// The number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is no header.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Headers {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        iter.into_iter()
            .for_each(|(name, value)| headers.insert(name, value));
        headers
    }
}

/// The query parameters of an authorization request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Query {
    /// Requested response type.
    pub response_type: Option<String>,
    /// Identifier of the requesting client.
    pub client_id: Option<String>,
    /// Where the result is sent.
    pub redirect_uri: Option<String>,
    /// Requested scope, space separated.
    pub scope: Option<String>,
    /// Opaque client state, echoed in every redirect.
    pub state: Option<String>,
    /// PKCE challenge.
    pub code_challenge: Option<String>,
    /// PKCE transformation, `plain` when omitted.
    pub code_challenge_method: Option<String>,
    /// OpenID Connect nonce.
    pub nonce: Option<String>,
    /// OpenID Connect prompt.
    ///
    /// The server itself does not act on it. Storage implementations and the frontend see it
    /// through the request, for example to decide on a fresh login before issuing an id token.
    pub prompt: Option<String>,
}

/// The form parameters of a token, introspection or revocation request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Post {
    /// Requested grant type.
    pub grant_type: Option<String>,
    /// Client identifier, when not authenticating with a header.
    pub client_id: Option<String>,
    /// Client secret, when not authenticating with a header.
    pub client_secret: Option<String>,
    /// The redirect uri the code was issued for.
    pub redirect_uri: Option<String>,
    /// Requested scope, space separated.
    pub scope: Option<String>,
    /// Resource owner name.
    pub username: Option<String>,
    /// Resource owner password.
    pub password: Option<String>,
    /// Refresh token to exchange.
    pub refresh_token: Option<String>,
    /// Authorization code to exchange.
    pub code: Option<String>,
    /// PKCE verifier.
    pub code_verifier: Option<String>,
    /// Token to introspect or revoke.
    pub token: Option<String>,
    /// Which kind of token `token` is.
    pub token_type_hint: Option<String>,
}

/// Parse `application/x-www-form-urlencoded` parameters, rejecting repeated ones.
///
/// Each parameter of the protocol must be included at most once, a repeated one makes the whole
/// request invalid. Unknown parameters are ignored.
fn parse_unique<T: DeserializeOwned>(encoded: &str) -> Result<T, Error> {
    let malformed = |err: serde_urlencoded::de::Error| {
        Error::invalid_with(ErrorType::InvalidRequest, err.to_string())
    };

    let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(encoded).map_err(malformed)?;
    let mut seen = HashSet::new();
    for (key, _) in &pairs {
        if !seen.insert(key.as_str()) {
            return Err(Error::invalid_with(
                ErrorType::InvalidRequest,
                format!("Duplicate {} parameter.", key),
            ));
        }
    }

    serde_urlencoded::from_str(encoded).map_err(malformed)
}

impl Query {
    /// Parse a urlencoded query string.
    pub fn parse(encoded: &str) -> Result<Query, Error> {
        parse_unique(encoded)
    }
}

impl Post {
    /// Parse a urlencoded form body.
    pub fn parse(encoded: &str) -> Result<Post, Error> {
        parse_unique(encoded)
    }
}

/// A request to one of the endpoints of the server.
#[derive(Clone, Debug)]
pub struct Request {
    /// The http method.
    pub method: RequestMethod,
    /// The full request url, its scheme decides whether the transport was secure.
    pub url: Url,
    /// Request headers.
    pub headers: Headers,
    /// Query parameters.
    pub query: Query,
    /// Form parameters.
    pub post: Post,
    /// The authenticated resource owner, if the frontend established one.
    pub user: Option<String>,
    /// Settings of the server.
    pub settings: Settings,
}

/// Client credentials offered by a request.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Credentials {
    /// No credentials were offered.
    None,
    /// A client id with its secret.
    Authenticated { client_id: String, secret: String },
    /// Only a client id.
    Unauthenticated { client_id: String },
    /// Secrets were offered in more than one way.
    Duplicate,
    /// Header and body name different clients.
    Mismatch,
}

impl Credentials {
    fn authenticate(&mut self, client_id: String, secret: String) {
        self.add(Credentials::Authenticated { client_id, secret })
    }

    fn unauthenticated(&mut self, client_id: String) {
        self.add(Credentials::Unauthenticated { client_id })
    }

    fn add(&mut self, new: Self) {
        let old = std::mem::replace(self, Credentials::None);
        *self = match (old, new) {
            (Credentials::None, new) => new,
            (
                Credentials::Authenticated { client_id, secret },
                Credentials::Unauthenticated { client_id: other },
            )
            | (
                Credentials::Unauthenticated { client_id: other },
                Credentials::Authenticated { client_id, secret },
            ) => {
                if client_id == other {
                    Credentials::Authenticated { client_id, secret }
                } else {
                    Credentials::Mismatch
                }
            }
            (
                Credentials::Unauthenticated { client_id },
                Credentials::Unauthenticated { client_id: other },
            ) => {
                if client_id == other {
                    Credentials::Unauthenticated { client_id }
                } else {
                    Credentials::Mismatch
                }
            }
            (Credentials::Mismatch, _) => Credentials::Mismatch,
            _ => Credentials::Duplicate,
        };
    }
}

/// The client identification extracted from a request.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// The claimed client id.
    pub client_id: String,
    /// The secret, if any was offered.
    pub client_secret: Option<String>,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Request {
    /// An empty request with default settings.
    pub fn new(method: RequestMethod, url: Url) -> Self {
        Request {
            method,
            url,
            headers: Headers::new(),
            query: Query::default(),
            post: Post::default(),
            user: None,
            settings: Settings::default(),
        }
    }

    /// An empty `GET` request.
    pub fn get(url: Url) -> Self {
        Request::new(RequestMethod::Get, url)
    }

    /// An empty `POST` request.
    pub fn post(url: Url) -> Self {
        Request::new(RequestMethod::Post, url)
    }

    /// Replace the query parameters.
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Replace the form parameters.
    pub fn with_post(mut self, post: Post) -> Self {
        self.post = post;
        self
    }

    /// Set a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach the authenticated resource owner.
    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Authenticate with http basic, as a client would.
    pub fn with_basic_auth(self, client_id: &str, client_secret: &str) -> Self {
        let encoded = STANDARD.encode(format!("{}:{}", client_id, client_secret));
        self.with_header("Authorization", &format!("Basic {}", encoded))
    }

    /// Whether the request arrived over TLS.
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Determine the client credentials of a token, introspection or revocation request.
    ///
    /// Credentials may be given in an http basic `Authorization` header or as the `client_id`
    /// and `client_secret` form parameters. Offering a secret both ways, or naming two different
    /// clients, is an invalid request. A header that can not be decoded fails the client
    /// authentication.
    pub fn client_credentials(&self) -> Result<ClientCredentials, Error> {
        let mut credentials = Credentials::None;

        if let Some(header) = self.headers.get("authorization") {
            let (client_id, secret) = parse_basic(header)?;
            credentials.authenticate(client_id, secret);
        }

        if let Some(client_id) = &self.post.client_id {
            match &self.post.client_secret {
                Some(secret) => credentials.authenticate(client_id.clone(), secret.clone()),
                None => credentials.unauthenticated(client_id.clone()),
            }
        }

        match credentials {
            Credentials::Authenticated { client_id, secret } => Ok(ClientCredentials {
                client_id,
                client_secret: Some(secret),
            }),
            Credentials::Unauthenticated { client_id } => Ok(ClientCredentials {
                client_id,
                client_secret: None,
            }),
            Credentials::None => Err(Error::unauthorized("Missing client_id parameter.")),
            Credentials::Duplicate => Err(Error::invalid_with(
                ErrorType::InvalidRequest,
                "Client credentials given more than once.",
            )),
            Credentials::Mismatch => Err(Error::invalid_with(
                ErrorType::InvalidRequest,
                "Mismatching client_id parameter.",
            )),
        }
    }
}

fn parse_basic(header: &str) -> Result<(String, String), Error> {
    let invalid = || Error::unauthorized("Invalid credentials given.");

    let (scheme, encoded) = header.trim().split_once(' ').ok_or_else(invalid)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(invalid());
    }

    let decoded = STANDARD.decode(encoded.trim()).map_err(|_| invalid())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid())?;
    let (client_id, secret) = decoded.split_once(':').ok_or_else(invalid)?;
    if client_id.is_empty() {
        return Err(invalid());
    }

    Ok((client_id.to_string(), secret.to_string()))
}
