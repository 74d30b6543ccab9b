//! Registrars administer the set of known clients.
//!
//! A client is identified by its `client_id` and bound to the values it registered: the grant
//! and response types it may use, the redirect uris the authorization endpoint may send its user
//! agent to and the scope it may be granted at most. Every request is checked against these
//! before any credential is issued.
use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use subtle::ConstantTimeEq;

use super::grant::{GrantType, ResponseType};
use super::scope::Scope;
use super::PrimitiveError;
use crate::code_grant::request::Request;

/// Registrars provide a way to look up clients.
///
/// The lookup doubles as the authentication of confidential clients: when a secret is given, a
/// client is only returned when the secret matches.
#[async_trait]
pub trait Registrar {
    /// Find the client with the given id and, if provided, the given secret.
    ///
    /// Returns `Ok(None)` when no client matches. Errors are reserved for backend failures.
    async fn get_client(
        &self, request: &Request, client_id: &str, client_secret: Option<&str>,
    ) -> Result<Option<Client>, PrimitiveError>;
}

/// A client as registered with the authorization server.
#[derive(Clone, PartialEq, Eq)]
pub struct Client {
    /// The public identifier.
    pub client_id: String,

    /// The secret of a confidential client, `None` for public clients.
    pub client_secret: Option<String>,

    /// The grant types the client may use at the token endpoint.
    pub grant_types: Vec<GrantType>,

    /// The response types the client may use at the authorization endpoint.
    pub response_types: Vec<ResponseType>,

    /// Registered redirect uris, compared by exact string match.
    pub redirect_uris: Vec<String>,

    /// The default and at the same time the maximum scope of the client.
    pub scope: Scope,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("grant_types", &self.grant_types)
            .field("response_types", &self.response_types)
            .field("redirect_uris", &self.redirect_uris)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Client {
    /// Create a public client, one that can not keep a secret.
    ///
    /// It may use every grant and response type and has an empty scope until configured
    /// otherwise.
    pub fn public(client_id: &str) -> Client {
        Client {
            client_id: client_id.to_string(),
            client_secret: None,
            grant_types: GrantType::ALL.to_vec(),
            response_types: ResponseType::ALL.to_vec(),
            redirect_uris: Vec::new(),
            scope: Scope::empty(),
        }
    }

    /// Create a confidential client which authenticates with a secret.
    pub fn confidential(client_id: &str, client_secret: &str) -> Client {
        Client {
            client_secret: Some(client_secret.to_string()),
            ..Client::public(client_id)
        }
    }

    /// Add a redirect uri to the registered ones.
    pub fn with_redirect_uri(mut self, uri: &str) -> Self {
        self.redirect_uris.push(uri.to_string());
        self
    }

    /// Replace the scope of the client.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Restrict the client to the given grant types.
    pub fn with_grant_types(mut self, grant_types: &[GrantType]) -> Self {
        self.grant_types = grant_types.to_vec();
        self
    }

    /// Restrict the client to the given response types.
    pub fn with_response_types(mut self, response_types: &[ResponseType]) -> Self {
        self.response_types = response_types.to_vec();
        self
    }

    /// Whether the client authenticates with a secret.
    pub fn is_confidential(&self) -> bool {
        self.client_secret.is_some()
    }

    /// Exact match against the registered redirect uris.
    pub fn check_redirect_uri(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }

    /// Whether the client may use the grant type.
    pub fn check_grant_type(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    /// Whether the client may use the response type.
    pub fn check_response_type(&self, response_type: ResponseType) -> bool {
        self.response_types.contains(&response_type)
    }

    /// Whether a requested scope stays within the registered scope.
    pub fn check_scope(&self, scope: &Scope) -> bool {
        self.scope.privileged_to(scope)
    }

    /// Compare the secret without leaking the position of the first difference.
    pub fn check_secret(&self, secret: &str) -> bool {
        match &self.client_secret {
            Some(stored) => bool::from(stored.as_bytes().ct_eq(secret.as_bytes())),
            None => false,
        }
    }
}

/// A very simple, in-memory hash map of client ids to Client entries.
#[derive(Clone, Debug, Default)]
pub struct ClientMap {
    clients: HashMap<String, Client>,
}

impl ClientMap {
    /// Create an empty map without any clients in it.
    pub fn new() -> ClientMap {
        ClientMap::default()
    }

    /// Insert or update the client record.
    pub fn register_client(&mut self, client: Client) {
        self.clients.insert(client.client_id.clone(), client);
    }

    /// Find a client, authenticating it when a secret is given.
    pub fn find(&self, client_id: &str, client_secret: Option<&str>) -> Option<&Client> {
        let client = self.clients.get(client_id)?;
        match client_secret {
            Some(secret) if !client.check_secret(secret) => None,
            _ => Some(client),
        }
    }
}

impl Extend<Client> for ClientMap {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Client>,
    {
        iter.into_iter().for_each(|client| self.register_client(client))
    }
}

impl FromIterator<Client> for ClientMap {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Client>,
    {
        let mut into = ClientMap::new();
        into.extend(iter);
        into
    }
}

#[async_trait]
impl Registrar for ClientMap {
    async fn get_client(
        &self, _: &Request, client_id: &str, client_secret: Option<&str>,
    ) -> Result<Option<Client>, PrimitiveError> {
        Ok(self.find(client_id, client_secret).cloned())
    }
}
