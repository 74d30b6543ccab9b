//! The combined persistence contract and its in-memory implementation.
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::authenticator::{Authenticator, IdTokenIssuer, IdTokenParams, PasswordMap};
use super::authorizer::{AuthMap, AuthorizationCode, Authorizer, CodeParams};
use super::generator::RandomGenerator;
use super::issuer::{Issuer, Token, TokenMap, TokenTypeHint};
use super::registrar::{Client, ClientMap, Registrar};
use super::scope::Scope;
use super::PrimitiveError;
use crate::code_grant::request::Request;

/// Everything the server needs from a persistence backend.
///
/// Implemented automatically for any type providing all primitives. Every lookup is scoped by
/// the client id. The server holds no lock of its own. Single-use codes and token rotation rely on
/// `delete_authorization_code` and `revoke_token` reporting atomically whether they consumed
/// anything.
pub trait Storage:
    Registrar + Issuer + Authorizer + Authenticator + IdTokenIssuer + Send + Sync
{
}

impl<T> Storage for T where
    T: Registrar + Issuer + Authorizer + Authenticator + IdTokenIssuer + Send + Sync + ?Sized
{
}

/// Keeps all state in memory, for tests and single process deployments.
///
/// Clients and resource owners are registered up front through mutable access. Codes and tokens
/// are behind locks so the storage can be shared between concurrently running requests.
pub struct MemoryStorage {
    clients: ClientMap,
    passwords: PasswordMap,
    codes: Mutex<AuthMap>,
    tokens: Mutex<TokenMap>,
    id_tokens: RandomGenerator,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        MemoryStorage {
            clients: ClientMap::new(),
            passwords: PasswordMap::new(),
            codes: Mutex::new(AuthMap::new()),
            tokens: Mutex::new(TokenMap::new()),
            id_tokens: RandomGenerator::new(32),
        }
    }

    /// The registered clients.
    pub fn clients_mut(&mut self) -> &mut ClientMap {
        &mut self.clients
    }

    /// The resource owner credentials.
    pub fn passwords_mut(&mut self) -> &mut PasswordMap {
        &mut self.passwords
    }

    /// Store a code directly, for example one whose lifetime has already passed.
    pub fn insert_authorization_code(&self, code: AuthorizationCode) -> Result<(), PrimitiveError> {
        self.codes()?.insert(code);
        Ok(())
    }

    /// Store a token directly.
    pub fn insert_token(&self, token: Token) -> Result<(), PrimitiveError> {
        self.tokens()?.insert(token);
        Ok(())
    }

    fn codes(&self) -> Result<MutexGuard<'_, AuthMap>, PrimitiveError> {
        self.codes.lock().map_err(|_| PrimitiveError::Poisoned)
    }

    fn tokens(&self) -> Result<MutexGuard<'_, TokenMap>, PrimitiveError> {
        self.tokens.lock().map_err(|_| PrimitiveError::Poisoned)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        MemoryStorage::new()
    }
}

#[async_trait]
impl Registrar for MemoryStorage {
    async fn get_client(
        &self, request: &Request, client_id: &str, client_secret: Option<&str>,
    ) -> Result<Option<Client>, PrimitiveError> {
        self.clients
            .get_client(request, client_id, client_secret)
            .await
    }
}

#[async_trait]
impl Issuer for MemoryStorage {
    async fn create_token(
        &self, request: &Request, client_id: &str, scope: &Scope, access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<Token, PrimitiveError> {
        Ok(self
            .tokens()?
            .issue(request, client_id, scope, access_token, refresh_token))
    }

    async fn get_token(
        &self, _: &Request, client_id: &str, token_type: TokenTypeHint,
        access_token: Option<&str>, refresh_token: Option<&str>,
    ) -> Result<Option<Token>, PrimitiveError> {
        Ok(self
            .tokens()?
            .find(client_id, token_type, access_token, refresh_token)
            .cloned())
    }

    async fn revoke_token(&self, _: &Request, refresh_token: &str) -> Result<bool, PrimitiveError> {
        Ok(self.tokens()?.revoke_refresh(refresh_token))
    }

    async fn revoke_access_token(
        &self, _: &Request, access_token: &str,
    ) -> Result<bool, PrimitiveError> {
        Ok(self.tokens()?.revoke_access(access_token))
    }
}

#[async_trait]
impl Authorizer for MemoryStorage {
    async fn create_authorization_code(
        &self, request: &Request, params: CodeParams<'_>,
    ) -> Result<AuthorizationCode, PrimitiveError> {
        Ok(self.codes()?.issue(request, params))
    }

    async fn get_authorization_code(
        &self, _: &Request, client_id: &str, code: &str,
    ) -> Result<Option<AuthorizationCode>, PrimitiveError> {
        Ok(self.codes()?.get(client_id, code).cloned())
    }

    async fn delete_authorization_code(
        &self, _: &Request, client_id: &str, code: &str,
    ) -> Result<bool, PrimitiveError> {
        Ok(self.codes()?.remove(client_id, code).is_some())
    }
}

#[async_trait]
impl Authenticator for MemoryStorage {
    async fn authenticate(&self, request: &Request) -> Result<bool, PrimitiveError> {
        self.passwords.authenticate(request).await
    }
}

#[async_trait]
impl IdTokenIssuer for MemoryStorage {
    async fn get_id_token(
        &self, _: &Request, _: IdTokenParams<'_>,
    ) -> Result<String, PrimitiveError> {
        self.id_tokens.generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::grant::ResponseType;

    fn assert_storage<S: Storage>(_: &S) {}

    #[test]
    fn memory_storage_is_storage() {
        assert_storage(&MemoryStorage::new());
    }

    #[test]
    fn token_lifecycle() {
        let storage = MemoryStorage::new();
        let request = Request::post("https://auth.example/token".parse().unwrap());
        let scope: Scope = "read".parse().unwrap();

        smol::block_on(async {
            let token = storage
                .create_token(&request, "client", &scope, "access", Some("refresh"))
                .await
                .unwrap();
            assert_eq!(token.expires_in, request.settings.token_expires_in);
            assert!(!token.revoked);

            assert!(storage.revoke_token(&request, "refresh").await.unwrap());
            // Idempotent, but only the first call consumed the token.
            assert!(!storage.revoke_token(&request, "refresh").await.unwrap());
            assert!(!storage.revoke_token(&request, "unknown").await.unwrap());

            let stored = storage
                .get_token(&request, "client", TokenTypeHint::RefreshToken, None, Some("refresh"))
                .await
                .unwrap()
                .unwrap();
            assert!(stored.revoked);
        });
    }

    #[test]
    fn code_lifecycle() {
        let storage = MemoryStorage::new();
        let request = Request::get("https://auth.example/authorize".parse().unwrap());
        let scope: Scope = "read".parse().unwrap();
        let params = CodeParams {
            client_id: "client",
            scope: &scope,
            response_type: ResponseType::Code,
            redirect_uri: "https://client.example/endpoint",
            code_challenge_method: None,
            code_challenge: None,
            code: "code",
        };

        smol::block_on(async {
            storage
                .create_authorization_code(&request, params)
                .await
                .unwrap();
            assert!(storage
                .get_authorization_code(&request, "client", "code")
                .await
                .unwrap()
                .is_some());
            assert!(storage
                .delete_authorization_code(&request, "client", "code")
                .await
                .unwrap());
            assert!(storage
                .get_authorization_code(&request, "client", "code")
                .await
                .unwrap()
                .is_none());
            assert!(!storage
                .delete_authorization_code(&request, "client", "code")
                .await
                .unwrap());
        });
    }
}
