use chrono::{Duration, Utc};

use crate::primitives::authorizer::AuthorizationCode;
use crate::primitives::grant::ResponseType;

use super::defaults::*;
use super::*;

fn exchange_body(code: &str) -> String {
    format!(
        "grant_type=authorization_code&code={}&redirect_uri={}",
        code, EXAMPLE_REDIRECT_URI
    )
}

#[test]
fn code_exchange() {
    let server = server();
    let code = obtain_code(&server, &code_query());

    let request = token_request(&exchange_body(&code));
    let response = smol::block_on(server.create_token_response(&request));
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.headers.get("cache-control"), Some("no-store"));

    let content = response.content.unwrap();
    assert_eq!(content["token_type"], "Bearer");
    assert_eq!(content["scope"], EXAMPLE_SCOPE);
    assert_eq!(content["expires_in"], 86400);
    assert!(content["access_token"].is_string());
    assert!(content["refresh_token"].is_string());
}

#[test]
fn code_usable_once() {
    let server = server();
    let code = obtain_code(&server, &code_query());

    let first = smol::block_on(server.token(&token_request(&exchange_body(&code))));
    assert!(first.is_ok());

    let second = smol::block_on(server.token(&token_request(&exchange_body(&code)))).unwrap_err();
    assert_eq!(second.kind().as_ref(), "invalid_grant");
}

#[test]
fn narrowed_code_scope() {
    let server = server();
    let query = format!("{}&scope=example", code_query());
    let code = obtain_code(&server, &query);

    let token = smol::block_on(server.token(&token_request(&exchange_body(&code)))).unwrap();
    assert_eq!(token.scope, "example".parse().unwrap());
}

#[test]
fn code_of_other_client() {
    let server = server();
    let code = obtain_code(&server, &code_query());

    let request = anonymous_request(&format!(
        "{}&client_id={}",
        exchange_body(&code),
        EXAMPLE_PUBLIC_CLIENT_ID
    ));
    let error = smol::block_on(server.token(&request)).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_grant");
}

#[test]
fn expired_code() {
    let server = server();
    server
        .storage()
        .insert_authorization_code(AuthorizationCode {
            code: "ExpiredCode".to_string(),
            client_id: EXAMPLE_CLIENT_ID.to_string(),
            redirect_uri: EXAMPLE_REDIRECT_URI.to_string(),
            response_type: ResponseType::Code,
            scope: EXAMPLE_SCOPE.parse().unwrap(),
            auth_time: Utc::now() - Duration::seconds(10),
            expires_in: 1,
            code_challenge: None,
            code_challenge_method: None,
            nonce: None,
            user: Some(EXAMPLE_OWNER_ID.to_string()),
        })
        .unwrap();

    let request = token_request(&exchange_body("ExpiredCode"));
    let error = smol::block_on(server.token(&request)).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_grant");
}

#[test]
fn mismatching_redirect_uri() {
    let server = server();
    let code = obtain_code(&server, &code_query());

    let missing = format!("grant_type=authorization_code&code={}", code);
    let error = smol::block_on(server.token(&token_request(&missing))).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_request");

    let other = format!(
        "grant_type=authorization_code&code={}&redirect_uri=https://client.example/other",
        code
    );
    let error = smol::block_on(server.token(&token_request(&other))).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_request");

    // The code survives failed attempts.
    assert!(smol::block_on(server.token(&token_request(&exchange_body(&code)))).is_ok());
}

#[test]
fn missing_code() {
    let server = server();
    let body = format!(
        "grant_type=authorization_code&redirect_uri={}",
        EXAMPLE_REDIRECT_URI
    );
    let error = smol::block_on(server.token(&token_request(&body))).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_request");
}

#[test]
fn client_authentication() {
    let server = server();

    let response = smol::block_on(server.create_token_response(&anonymous_request(
        "grant_type=client_credentials",
    )));
    assert_eq!(response.status.as_u16(), 401);
    assert_eq!(response.headers.get("www-authenticate"), Some("Basic"));
    assert_eq!(response.error(), Some("invalid_client"));

    let wrong_secret = anonymous_request("grant_type=client_credentials")
        .with_basic_auth(EXAMPLE_CLIENT_ID, "not the passphrase");
    let response = smol::block_on(server.create_token_response(&wrong_secret));
    assert_eq!(response.status.as_u16(), 401);

    let missing_secret = anonymous_request(&format!(
        "grant_type=client_credentials&client_id={}",
        EXAMPLE_CLIENT_ID
    ));
    let error = smol::block_on(server.token(&missing_secret)).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_client");

    let in_body = anonymous_request(&format!(
        "grant_type=client_credentials&client_id={}&client_secret={}",
        EXAMPLE_CLIENT_ID, EXAMPLE_PASSPHRASE
    ));
    assert!(smol::block_on(server.token(&in_body)).is_ok());
}

#[test]
fn duplicate_credentials() {
    let server = server();
    let request = token_request(&format!(
        "grant_type=client_credentials&client_id={}&client_secret={}",
        EXAMPLE_CLIENT_ID, EXAMPLE_PASSPHRASE
    ));
    let error = smol::block_on(server.token(&request)).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_request");
}

#[test]
fn missing_grant_type() {
    let server = server();
    let error = smol::block_on(server.token(&token_request("scope=example"))).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_request");

    let error = smol::block_on(server.token(&token_request("grant_type=implicit"))).unwrap_err();
    assert_eq!(error.kind().as_ref(), "unsupported_grant_type");
}

#[test]
fn unauthorized_grant_type() {
    use crate::primitives::grant::GrantType;

    let mut storage = MemoryStorage::new();
    storage.clients_mut().register_client(
        Client::confidential(EXAMPLE_CLIENT_ID, EXAMPLE_PASSPHRASE)
            .with_scope(EXAMPLE_SCOPE.parse().unwrap())
            .with_grant_types(&[GrantType::AuthorizationCode]),
    );
    let server = AuthorizationServer::new(storage);

    let request = token_request("grant_type=client_credentials");
    let error = smol::block_on(server.token(&request)).unwrap_err();
    assert_eq!(error.kind().as_ref(), "unauthorized_client");
}
