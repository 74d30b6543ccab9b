//! # oxide-authserver
//!
//! The request dispatch core of an OAuth2 authorization server, with pluggable grant and response
//! type handlers over an asynchronous storage backend.
//!
//! ## About
//!
//! The crate turns already parsed requests into normalized responses for the authorization,
//! token, introspection and revocation endpoints. Parsing http and writing the response back is
//! left to the web framework, which only has to fill a [`Request`] and translate the returned
//! [`Response`]. Everything the server needs to remember goes through a single [`Storage`]
//! contract, so deployments decide themselves how clients, codes and tokens are kept.
//!
//! Supported are the `authorization_code`, `client_credentials`, `password` and `refresh_token`
//! grant types, the `code`, `token`, `none` and `id_token` response types, and PKCE for the code
//! flow.
//!
//! ## Running a server
//!
//! Register the clients with a storage, here the in-memory [`MemoryStorage`], and hand it to the
//! [`AuthorizationServer`]. Each endpoint has a method returning the typed result and a
//! `create_*_response` variant producing the envelope.
//!
//! ```
//! # use oxide_authserver::code_grant::request::{Post, Request};
//! # use oxide_authserver::endpoint::AuthorizationServer;
//! # use oxide_authserver::primitives::registrar::Client;
//! # use oxide_authserver::primitives::storage::MemoryStorage;
//! let mut storage = MemoryStorage::new();
//! storage.clients_mut().register_client(
//!     Client::confidential("LocalClient", "SecretSecret")
//!         .with_scope("read write".parse().unwrap()));
//! let server = AuthorizationServer::new(storage);
//!
//! let request = Request::post("https://auth.example/token".parse().unwrap())
//!     .with_post(Post::parse("grant_type=client_credentials&scope=read").unwrap())
//!     .with_basic_auth("LocalClient", "SecretSecret");
//!
//! let token = smol::block_on(server.token(&request)).unwrap();
//! assert_eq!(token.scope, "read".parse().unwrap());
//! ```
//!
//! _WARNING_: Deployments MUST ensure a secure transportation layer with confidential clients.
//! This means using TLS for communication over https.
//!
//! [`Request`]: code_grant/request/struct.Request.html
//! [`Response`]: endpoint/response/struct.Response.html
//! [`Storage`]: primitives/storage/trait.Storage.html
//! [`MemoryStorage`]: primitives/storage/struct.MemoryStorage.html
//! [`AuthorizationServer`]: endpoint/struct.AuthorizationServer.html
#![warn(missing_docs)]

pub mod code_grant;
pub mod config;
pub mod endpoint;
pub mod primitives;
