//! Available backend algorithms.
//!
//! The backend codifies the requirements from the rfc into types and functions as safely as
//! possible. The request context, the error vocabulary and the success payloads are shared by
//! all endpoints, the grant and response type strategies each get their own module.
pub mod authorization;
pub mod error;
pub mod grant;
pub mod pkce;
pub mod request;
pub mod response;
