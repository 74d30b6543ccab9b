//! Success payloads of the handlers.
use serde_derive::Serialize;
use url::{form_urlencoded, Url};

use crate::primitives::issuer::Token;
use crate::primitives::scope::Scope;

/// The body of a successful token response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    /// The issued access token.
    pub access_token: String,

    /// Always `Bearer`.
    pub token_type: String,

    /// Lifetime of the access token in seconds.
    pub expires_in: i64,

    /// The issued refresh token, if the grant is refreshable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Lifetime of the refresh token in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_in: Option<i64>,

    /// The granted scope.
    pub scope: Scope,
}

impl From<&Token> for TokenResponse {
    fn from(token: &Token) -> Self {
        TokenResponse {
            access_token: token.access_token.clone(),
            token_type: token.token_type.as_str().to_string(),
            expires_in: token.expires_in,
            refresh_token: token.refresh_token.clone(),
            refresh_token_expires_in: token
                .refresh_token
                .as_ref()
                .map(|_| token.refresh_token_expires_in),
            scope: token.scope.clone(),
        }
    }
}

impl TokenResponse {
    /// The fields as key-value pairs, for placement into a redirect uri.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("access_token", self.access_token.clone()),
            ("token_type", self.token_type.clone()),
            ("expires_in", self.expires_in.to_string()),
        ];
        if let Some(refresh) = &self.refresh_token {
            pairs.push(("refresh_token", refresh.clone()));
        }
        if let Some(expires_in) = self.refresh_token_expires_in {
            pairs.push(("refresh_token_expires_in", expires_in.to_string()));
        }
        pairs.push(("scope", self.scope.to_string()));
        pairs
    }
}

/// The result of a response type handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationResponse {
    /// An authorization code, delivered in the query.
    Code {
        /// The code value.
        code: String,
        /// The approved scope.
        scope: Scope,
    },

    /// An implicitly issued access token, delivered in the fragment.
    Token(TokenResponse),

    /// An OpenID Connect id token, delivered in the fragment.
    IdToken {
        /// The opaque id token.
        id_token: String,
    },

    /// Nothing but the state is returned.
    None,
}

impl AuthorizationResponse {
    /// Whether the parameters go into the fragment of the redirect uri.
    pub fn uses_fragment(&self) -> bool {
        matches!(self, AuthorizationResponse::Token(_) | AuthorizationResponse::IdToken { .. })
    }

    /// The parameters of the redirect, without the state.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            AuthorizationResponse::Code { code, scope } => {
                vec![("code", code.clone()), ("scope", scope.to_string())]
            }
            AuthorizationResponse::Token(token) => token.pairs(),
            AuthorizationResponse::IdToken { id_token } => vec![("id_token", id_token.clone())],
            AuthorizationResponse::None => Vec::new(),
        }
    }

    /// The redirect uri carrying the response and the state.
    pub fn into_url(self, redirect_uri: Url, state: Option<&str>) -> Url {
        let fragment = self.uses_fragment();
        let mut pairs = self.pairs();
        if let Some(state) = state {
            pairs.push(("state", state.to_string()));
        }
        place_parameters(redirect_uri, fragment, pairs)
    }
}

/// The body of an introspection response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntrospectionResponse {
    /// Whether the token may currently be used.
    pub active: bool,

    /// Scope of an active token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    /// Client of an active token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Type of an active token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Expiry of an active token, seconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl IntrospectionResponse {
    /// Nothing is revealed about inactive or unknown tokens.
    pub fn inactive() -> Self {
        IntrospectionResponse {
            active: false,
            scope: None,
            client_id: None,
            token_type: None,
            exp: None,
        }
    }

    /// Describe an active token. `expires_at` is the expiry of the value that was looked up.
    pub fn active(token: &Token, expires_at: i64) -> Self {
        IntrospectionResponse {
            active: true,
            scope: Some(token.scope.clone()),
            client_id: Some(token.client_id.clone()),
            token_type: Some(token.token_type.as_str().to_string()),
            exp: Some(expires_at),
        }
    }
}

/// Append urlencoded parameters to the query, or replace the fragment with them.
pub(crate) fn place_parameters(mut url: Url, fragment: bool, pairs: Vec<(&str, String)>) -> Url {
    if fragment {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        url.set_fragment(Some(&encoded));
    } else if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}
