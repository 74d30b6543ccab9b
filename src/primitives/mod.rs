//! A collection of primitives shared by the grant and response type handlers.
//!
//! A primitive is the smallest independent unit of policy used by the authorization server. For
//! example, an `authorizer` stores and resolves Authorization Codes while an `issuer` keeps the
//! issued bearer tokens. The handlers only ever talk to these through the traits defined here,
//! which makes it possible to provide a database based implementation without touching any of
//! the protocol logic.
//!
//! The combined contract is [`Storage`], which a backend gets for free by implementing every
//! individual primitive. [`MemoryStorage`] does so with the in-memory maps of each module.
//!
//! ```
//! # use oxide_authserver::primitives::prelude::*;
//! let mut storage = MemoryStorage::new();
//! storage.clients_mut().register_client(
//!     Client::confidential("example", "secret")
//!         .with_redirect_uri("https://client.example/endpoint")
//!         .with_scope("read write".parse().unwrap()));
//! ```
//!
//! [`Storage`]: storage/trait.Storage.html
//! [`MemoryStorage`]: storage/struct.MemoryStorage.html

use chrono::{DateTime, Duration, Utc};

pub mod authenticator;
pub mod authorizer;
pub mod generator;
pub mod grant;
pub mod issuer;
pub mod registrar;
pub mod scope;
pub mod storage;

type Time = DateTime<Utc>;

/// The point in time `seconds` after `start`, clamped to the representable range.
fn expiry(start: Time, seconds: i64) -> Time {
    Duration::try_seconds(seconds)
        .and_then(|lifetime| start.checked_add_signed(lifetime))
        .unwrap_or(if seconds < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

/// A failure of a storage backend, as opposed to a rejection of the request.
///
/// Handlers never interpret these, they are passed through to the server which answers with a
/// `server_error`. Callers can thus retry on these while protocol errors are final.
#[derive(Debug, thiserror::Error)]
pub enum PrimitiveError {
    /// The backend could not be reached or refused to answer.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// A lock protecting in-memory state was poisoned by a panicking thread.
    #[error("storage lock poisoned")]
    Poisoned,

    /// The system random source failed.
    #[error("random generator failed: {0}")]
    Random(#[from] rand::Error),

    /// Any other error of a custom backend.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Commonly used primitives for servers and backends.
pub mod prelude {
    pub use super::authenticator::{Authenticator, IdTokenIssuer, PasswordMap};
    pub use super::authorizer::{AuthMap, AuthorizationCode, Authorizer, CodeChallengeMethod};
    pub use super::generator::RandomGenerator;
    pub use super::grant::{Consumed, Grant, GrantType, ResponseType};
    pub use super::issuer::{Issuer, Token, TokenMap, TokenType, TokenTypeHint};
    pub use super::registrar::{Client, ClientMap, Registrar};
    pub use super::scope::Scope;
    pub use super::storage::{MemoryStorage, Storage};
    pub use super::PrimitiveError;
}
