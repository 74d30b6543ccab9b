use url::Url;

use crate::code_grant::request::{Post, Query, Request, RequestMethod};
use crate::code_grant::response::TokenResponse;
use crate::config::Settings;
use crate::primitives::registrar::Client;
use crate::primitives::storage::MemoryStorage;

use super::AuthorizationServer;

use self::defaults::*;

pub mod defaults {
    pub const EXAMPLE_CLIENT_ID: &str = "ClientId";
    pub const EXAMPLE_PUBLIC_CLIENT_ID: &str = "PublicClientId";
    pub const EXAMPLE_OWNER_ID: &str = "Owner";
    pub const EXAMPLE_PASSPHRASE: &str = "VGhpcyBpcyBhIHZlcnkgc2VjdXJlIHBhc3NwaHJhc2UK";
    pub const EXAMPLE_PASSWORD: &str = "correct horse battery staple";
    pub const EXAMPLE_REDIRECT_URI: &str = "https://client.example/endpoint";
    pub const EXAMPLE_SCOPE: &str = "default example";
    pub const AUTHORIZE_URL: &str = "https://auth.example/authorize";
    pub const TOKEN_URL: &str = "https://auth.example/token";
}

mod access_token;
mod concurrency;
mod introspection;
mod refresh;

/// A server with one confidential and one public client, and one resource owner.
fn server() -> AuthorizationServer<MemoryStorage> {
    let mut storage = MemoryStorage::new();
    storage.clients_mut().register_client(
        Client::confidential(EXAMPLE_CLIENT_ID, EXAMPLE_PASSPHRASE)
            .with_redirect_uri(EXAMPLE_REDIRECT_URI)
            .with_scope(EXAMPLE_SCOPE.parse().unwrap()),
    );
    storage.clients_mut().register_client(
        Client::public(EXAMPLE_PUBLIC_CLIENT_ID)
            .with_redirect_uri(EXAMPLE_REDIRECT_URI)
            .with_scope(EXAMPLE_SCOPE.parse().unwrap()),
    );
    storage
        .passwords_mut()
        .register(EXAMPLE_OWNER_ID, EXAMPLE_PASSWORD);
    AuthorizationServer::new(storage)
}

/// An authorization request of the confidential client, as approved by the owner.
fn authorize_request(query: &str) -> Request {
    Request::get(AUTHORIZE_URL.parse().unwrap())
        .with_query(Query::parse(query).unwrap())
        .with_user(EXAMPLE_OWNER_ID)
}

/// A token request authenticated with http basic.
fn token_request(body: &str) -> Request {
    Request::post(TOKEN_URL.parse().unwrap())
        .with_post(Post::parse(body).unwrap())
        .with_basic_auth(EXAMPLE_CLIENT_ID, EXAMPLE_PASSPHRASE)
}

/// An unauthenticated request to the token endpoint.
fn anonymous_request(body: &str) -> Request {
    Request::post(TOKEN_URL.parse().unwrap()).with_post(Post::parse(body).unwrap())
}

fn code_query() -> String {
    format!(
        "response_type=code&client_id={}&redirect_uri={}&state=xyz",
        EXAMPLE_CLIENT_ID, EXAMPLE_REDIRECT_URI
    )
}

/// Run the authorization step and extract the code from the redirect.
fn obtain_code(server: &AuthorizationServer<MemoryStorage>, query: &str) -> String {
    let authorized = smol::block_on(server.authorize(&authorize_request(query)))
        .expect("Authorization should succeed");
    query_param(&authorized.location, "code").expect("Redirect should carry a code")
}

/// Issue a refreshable token through the password grant.
fn obtain_token(server: &AuthorizationServer<MemoryStorage>) -> TokenResponse {
    let body = format!(
        "grant_type=password&username={}&password={}",
        EXAMPLE_OWNER_ID, EXAMPLE_PASSWORD
    );
    smol::block_on(server.token(&token_request(&body))).expect("Password grant should succeed")
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

fn fragment_param(url: &Url, key: &str) -> Option<String> {
    url::form_urlencoded::parse(url.fragment()?.as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

#[test]
fn unavailable_server() {
    let server = server();
    let settings = Settings {
        available: false,
        ..Settings::default()
    };
    let request = token_request("grant_type=client_credentials").with_settings(settings);
    let error = smol::block_on(server.token(&request)).unwrap_err();
    assert_eq!(error.kind().as_ref(), "temporarily_unavailable");

    let response = smol::block_on(server.create_token_response(&request));
    assert_eq!(response.status.as_u16(), 503);
}

#[test]
fn insecure_transport() {
    let server = server();
    let request = Request::post("http://auth.example/token".parse().unwrap())
        .with_post(Post::parse("grant_type=client_credentials").unwrap())
        .with_basic_auth(EXAMPLE_CLIENT_ID, EXAMPLE_PASSPHRASE);

    let error = smol::block_on(server.token(&request)).unwrap_err();
    assert_eq!(error.kind().as_ref(), "insecure_transport");

    let allowed = request.with_settings(Settings {
        insecure_transport: true,
        ..Settings::default()
    });
    assert!(smol::block_on(server.token(&allowed)).is_ok());
}

#[test]
fn method_not_allowed() {
    let server = server();
    let mut request = token_request("grant_type=client_credentials");
    request.method = RequestMethod::Get;

    let response = smol::block_on(server.create_token_response(&request));
    assert_eq!(response.status.as_u16(), 405);
    assert_eq!(response.error(), Some("method_is_not_allowed"));
    assert_eq!(response.headers.get("allow"), Some("POST"));

    let mut request = authorize_request(&code_query());
    request.method = RequestMethod::Delete;
    let response = smol::block_on(server.create_authorization_response(&request));
    assert_eq!(response.headers.get("allow"), Some("GET, POST"));
}

#[test]
fn error_documentation_uri() {
    let server = server();
    let request = token_request("grant_type=refresh_token").with_settings(Settings {
        error_uri: "https://auth.example/errors/".to_string(),
        ..Settings::default()
    });

    let response = smol::block_on(server.create_token_response(&request));
    let content = response.content.unwrap();
    assert_eq!(
        content.get("error_uri").and_then(|uri| uri.as_str()),
        Some("https://auth.example/errors/invalid_request")
    );
}

#[test]
fn restricted_handlers() {
    use crate::primitives::grant::{GrantType, ResponseType};

    let mut storage = MemoryStorage::new();
    storage.clients_mut().register_client(
        Client::confidential(EXAMPLE_CLIENT_ID, EXAMPLE_PASSPHRASE)
            .with_redirect_uri(EXAMPLE_REDIRECT_URI)
            .with_scope(EXAMPLE_SCOPE.parse().unwrap()),
    );
    let server = AuthorizationServer::with_handlers(
        storage,
        vec![GrantType::ClientCredentials.handler()],
        vec![ResponseType::Code.handler()],
    );
    assert!(server.supports_grant_type(GrantType::ClientCredentials));
    assert!(!server.supports_grant_type(GrantType::Password));
    assert!(!server.supports_response_type(ResponseType::Token));

    let error = smol::block_on(server.token(&token_request("grant_type=password"))).unwrap_err();
    assert_eq!(error.kind().as_ref(), "unsupported_grant_type");
}
