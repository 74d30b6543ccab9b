use chrono::{Duration, Utc};

use crate::primitives::issuer::{Token, TokenType};

use super::defaults::*;
use super::*;

fn refresh_body(refresh_token: &str, scope: Option<&str>) -> String {
    match scope {
        Some(scope) => format!(
            "grant_type=refresh_token&refresh_token={}&scope={}",
            refresh_token, scope
        ),
        None => format!("grant_type=refresh_token&refresh_token={}", refresh_token),
    }
}

#[test]
fn rotates_refresh_token() {
    let server = server();
    let issued = obtain_token(&server);
    let refresh_token = issued.refresh_token.unwrap();

    let request = token_request(&refresh_body(&refresh_token, None));
    let refreshed = smol::block_on(server.token(&request))
        .expect("Refresh should succeed");
    assert_eq!(refreshed.scope, EXAMPLE_SCOPE.parse().unwrap());
    assert_ne!(refreshed.access_token, issued.access_token);
    let rotated = refreshed.refresh_token.expect("Refresh tokens are rotated");
    assert_ne!(rotated, refresh_token);

    // The old pair is revoked.
    let error = smol::block_on(server.token(&token_request(&refresh_body(&refresh_token, None))))
        .unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_grant");

    assert!(smol::block_on(server.token(&token_request(&refresh_body(&rotated, None)))).is_ok());
}

#[test]
fn narrowing_scope() {
    let server = server();
    let refresh_token = obtain_token(&server).refresh_token.unwrap();

    let refreshed = smol::block_on(server.token(&token_request(&refresh_body(
        &refresh_token,
        Some("example"),
    ))))
    .unwrap();
    assert_eq!(refreshed.scope, "example".parse().unwrap());

    let error = smol::block_on(server.token(&token_request(&refresh_body(&refresh_token, None))))
        .unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_grant");
}

#[test]
fn widening_scope() {
    let server = server();
    let body = format!(
        "grant_type=password&username={}&password={}&scope=example",
        EXAMPLE_OWNER_ID, EXAMPLE_PASSWORD
    );
    let issued = smol::block_on(server.token(&token_request(&body))).unwrap();
    let refresh_token = issued.refresh_token.unwrap();

    // Within the registration of the client, but wider than the token.
    let error = smol::block_on(server.token(&token_request(&refresh_body(
        &refresh_token,
        Some(EXAMPLE_SCOPE),
    ))))
    .unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_scope");

    // A failed refresh leaves the token usable.
    let request = token_request(&refresh_body(&refresh_token, None));
    assert!(smol::block_on(server.token(&request)).is_ok());
}

#[test]
fn unknown_refresh_token() {
    let server = server();
    let error = smol::block_on(server.token(&token_request(&refresh_body("NotAToken", None))))
        .unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_grant");

    let request = token_request("grant_type=refresh_token");
    let error = smol::block_on(server.token(&request)).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_request");
}

#[test]
fn refresh_token_of_other_client() {
    let server = server();
    let refresh_token = obtain_token(&server).refresh_token.unwrap();

    let request = anonymous_request(&format!(
        "{}&client_id={}",
        refresh_body(&refresh_token, None),
        EXAMPLE_PUBLIC_CLIENT_ID
    ));
    let error = smol::block_on(server.token(&request)).unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_grant");
}

#[test]
fn expired_refresh_token() {
    let server = server();
    server
        .storage()
        .insert_token(Token {
            client_id: EXAMPLE_CLIENT_ID.to_string(),
            access_token: "OldAccess".to_string(),
            refresh_token: Some("OldRefresh".to_string()),
            scope: EXAMPLE_SCOPE.parse().unwrap(),
            issued_at: Utc::now() - Duration::days(10),
            expires_in: 3600,
            refresh_token_expires_in: 7200,
            revoked: false,
            token_type: TokenType::Bearer,
            user: Some(EXAMPLE_OWNER_ID.to_string()),
        })
        .unwrap();

    let error = smol::block_on(server.token(&token_request(&refresh_body("OldRefresh", None))))
        .unwrap_err();
    assert_eq!(error.kind().as_ref(), "invalid_grant");
}
