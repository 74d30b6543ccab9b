//! Two requests presenting the same credential at once, interleaved on a single executor.
use async_trait::async_trait;
use smol::future;

use crate::primitives::authenticator::{Authenticator, IdTokenIssuer, IdTokenParams};
use crate::primitives::authorizer::{AuthorizationCode, Authorizer, CodeParams};
use crate::primitives::issuer::{Issuer, Token, TokenTypeHint};
use crate::primitives::registrar::{Client, Registrar};
use crate::primitives::scope::Scope;
use crate::primitives::PrimitiveError;

use super::defaults::*;
use super::*;

/// Suspends every lookup of a code or token once, so a second request can validate the same
/// credential before the first one consumes it.
struct Interleaving(MemoryStorage);

#[async_trait]
impl Registrar for Interleaving {
    async fn get_client(
        &self, request: &Request, client_id: &str, client_secret: Option<&str>,
    ) -> Result<Option<Client>, PrimitiveError> {
        self.0.get_client(request, client_id, client_secret).await
    }
}

#[async_trait]
impl Issuer for Interleaving {
    async fn create_token(
        &self, request: &Request, client_id: &str, scope: &Scope, access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<Token, PrimitiveError> {
        self.0
            .create_token(request, client_id, scope, access_token, refresh_token)
            .await
    }

    async fn get_token(
        &self, request: &Request, client_id: &str, token_type: TokenTypeHint,
        access_token: Option<&str>, refresh_token: Option<&str>,
    ) -> Result<Option<Token>, PrimitiveError> {
        let token = self
            .0
            .get_token(request, client_id, token_type, access_token, refresh_token)
            .await;
        future::yield_now().await;
        token
    }

    async fn revoke_token(
        &self, request: &Request, refresh_token: &str,
    ) -> Result<bool, PrimitiveError> {
        self.0.revoke_token(request, refresh_token).await
    }

    async fn revoke_access_token(
        &self, request: &Request, access_token: &str,
    ) -> Result<bool, PrimitiveError> {
        self.0.revoke_access_token(request, access_token).await
    }
}

#[async_trait]
impl Authorizer for Interleaving {
    async fn create_authorization_code(
        &self, request: &Request, params: CodeParams<'_>,
    ) -> Result<AuthorizationCode, PrimitiveError> {
        self.0.create_authorization_code(request, params).await
    }

    async fn get_authorization_code(
        &self, request: &Request, client_id: &str, code: &str,
    ) -> Result<Option<AuthorizationCode>, PrimitiveError> {
        let code = self.0.get_authorization_code(request, client_id, code).await;
        future::yield_now().await;
        code
    }

    async fn delete_authorization_code(
        &self, request: &Request, client_id: &str, code: &str,
    ) -> Result<bool, PrimitiveError> {
        self.0.delete_authorization_code(request, client_id, code).await
    }
}

#[async_trait]
impl Authenticator for Interleaving {
    async fn authenticate(&self, request: &Request) -> Result<bool, PrimitiveError> {
        self.0.authenticate(request).await
    }
}

#[async_trait]
impl IdTokenIssuer for Interleaving {
    async fn get_id_token(
        &self, request: &Request, params: IdTokenParams<'_>,
    ) -> Result<String, PrimitiveError> {
        self.0.get_id_token(request, params).await
    }
}

fn interleaving_server() -> AuthorizationServer<Interleaving> {
    let mut storage = MemoryStorage::new();
    storage.clients_mut().register_client(
        Client::confidential(EXAMPLE_CLIENT_ID, EXAMPLE_PASSPHRASE)
            .with_redirect_uri(EXAMPLE_REDIRECT_URI)
            .with_scope(EXAMPLE_SCOPE.parse().unwrap()),
    );
    storage
        .passwords_mut()
        .register(EXAMPLE_OWNER_ID, EXAMPLE_PASSWORD);
    AuthorizationServer::new(Interleaving(storage))
}

/// Run both requests together and return how many of them got a token.
fn race(server: &AuthorizationServer<Interleaving>, body: &str) -> usize {
    let first = token_request(body);
    let second = token_request(body);
    let (first, second) = smol::block_on(future::zip(server.token(&first), server.token(&second)));

    let loser = match (&first, &second) {
        (Ok(_), Err(error)) | (Err(error), Ok(_)) => Some(error.kind()),
        _ => None,
    };
    if let Some(kind) = loser {
        assert_eq!(kind.as_ref(), "invalid_grant");
    }
    [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count()
}

#[test]
fn code_exchanged_once() {
    let server = interleaving_server();
    let authorized = smol::block_on(server.authorize(&authorize_request(&code_query())))
        .expect("Authorization should succeed");
    let code = query_param(&authorized.location, "code").unwrap();

    let body = format!(
        "grant_type=authorization_code&code={}&redirect_uri={}",
        code, EXAMPLE_REDIRECT_URI
    );
    assert_eq!(race(&server, &body), 1);
}

#[test]
fn refresh_token_rotated_once() {
    let server = interleaving_server();
    let body = format!(
        "grant_type=password&username={}&password={}",
        EXAMPLE_OWNER_ID, EXAMPLE_PASSWORD
    );
    let issued = smol::block_on(server.token(&token_request(&body))).unwrap();
    let refresh_token = issued.refresh_token.unwrap();

    let body = format!("grant_type=refresh_token&refresh_token={}", refresh_token);
    assert_eq!(race(&server, &body), 1);
}
