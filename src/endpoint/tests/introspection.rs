use chrono::{Duration, Utc};

use crate::primitives::issuer::{Token, TokenType};

use super::defaults::*;
use super::*;

fn introspect(server: &AuthorizationServer<MemoryStorage>, body: &str) -> serde_json::Value {
    let response = smol::block_on(server.create_token_introspection_response(&token_request(body)));
    assert_eq!(response.status.as_u16(), 200);
    response.content.expect("Introspection has a body")
}

#[test]
fn active_access_token() {
    let server = server();
    let issued = obtain_token(&server);

    let content = introspect(&server, &format!("token={}", issued.access_token));
    assert_eq!(content["active"], true);
    assert_eq!(content["client_id"], EXAMPLE_CLIENT_ID);
    assert_eq!(content["scope"], EXAMPLE_SCOPE);
    assert_eq!(content["token_type"], "Bearer");
    assert!(content["exp"].is_i64());
}

#[test]
fn active_refresh_token() {
    let server = server();
    let issued = obtain_token(&server);
    let refresh_token = issued.refresh_token.unwrap();

    let hinted = introspect(
        &server,
        &format!("token={}&token_type_hint=refresh_token", refresh_token),
    );
    assert_eq!(hinted["active"], true);

    // Without a hint the access tokens are searched first.
    let unhinted = introspect(&server, &format!("token={}", refresh_token));
    assert_eq!(unhinted["active"], true);
    assert_eq!(unhinted["exp"], hinted["exp"]);
}

#[test]
fn wrong_hint_still_found() {
    let server = server();
    let issued = obtain_token(&server);

    let content = introspect(
        &server,
        &format!("token={}&token_type_hint=refresh_token", issued.access_token),
    );
    assert_eq!(content["active"], true);
}

#[test]
fn unknown_token_inactive() {
    let server = server();
    let content = introspect(&server, "token=NotAToken");
    assert_eq!(content, serde_json::json!({ "active": false }));
}

#[test]
fn foreign_token_inactive() {
    let server = server();
    let issued = obtain_token(&server);

    let request = anonymous_request(&format!(
        "token={}&client_id={}",
        issued.access_token, EXAMPLE_PUBLIC_CLIENT_ID
    ));
    let introspection = smol::block_on(server.introspect(&request)).unwrap();
    assert!(!introspection.active);
    assert!(introspection.client_id.is_none());
}

#[test]
fn revoked_token_inactive() {
    let server = server();
    let issued = obtain_token(&server);

    let request = token_request(&format!("token={}", issued.access_token));
    smol::block_on(server.revoke(&request)).unwrap();

    let content = introspect(&server, &format!("token={}", issued.access_token));
    assert_eq!(content["active"], false);
}

#[test]
fn expired_access_token() {
    let server = server();
    server
        .storage()
        .insert_token(Token {
            client_id: EXAMPLE_CLIENT_ID.to_string(),
            access_token: "OldAccess".to_string(),
            refresh_token: Some("OldRefresh".to_string()),
            scope: EXAMPLE_SCOPE.parse().unwrap(),
            issued_at: Utc::now() - Duration::hours(2),
            expires_in: 3600,
            refresh_token_expires_in: 86400,
            revoked: false,
            token_type: TokenType::Bearer,
            user: None,
        })
        .unwrap();

    let content = introspect(&server, "token=OldAccess");
    assert_eq!(content["active"], false);

    // The refresh token outlives the access token.
    let content = introspect(&server, "token=OldRefresh");
    assert_eq!(content["active"], true);
}

#[test]
fn missing_token() {
    let server = server();
    let response = smol::block_on(server.create_token_introspection_response(&token_request("")));
    assert_eq!(response.status.as_u16(), 400);
    assert_eq!(response.error(), Some("invalid_request"));
}

#[test]
fn requires_client_authentication() {
    let server = server();
    let issued = obtain_token(&server);

    let request = anonymous_request(&format!("token={}", issued.access_token));
    let response = smol::block_on(server.create_token_introspection_response(&request));
    assert_eq!(response.status.as_u16(), 401);
    assert_eq!(response.error(), Some("invalid_client"));
}
