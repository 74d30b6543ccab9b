//! Proof Key for Code Exchange by OAuth Public Clients, [RFC 7636].
//!
//! Public clients using the authorization code grant are susceptible to the authorization code
//! interception attack, which PKCE (pronounced "pixy") mitigates.
//!
//! Clients commit to a secret verifier with the challenge of their authorization request and
//! reveal the verifier when exchanging the code. The `S256` method only ever stores the hash of
//! the verifier, the `plain` method stores the verifier itself.
//!
//! [RFC 7636]: https://tools.ietf.org/html/rfc7636
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::error::{ErrorType, OAuthError};
use crate::primitives::authorizer::CodeChallengeMethod;

/// A challenge accepted with an authorization request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    /// The transformation of the verifier.
    pub method: CodeChallengeMethod,
    /// The committed value.
    pub challenge: String,
}

/// Check the PKCE parameters of an authorization request.
///
/// The method defaults to `plain` when only a challenge is given. A method without a challenge,
/// or a method other than `plain` and `S256`, is an invalid request.
pub fn challenge(
    method: Option<&str>, challenge: Option<&str>,
) -> Result<Option<Challenge>, OAuthError> {
    let method = match method {
        None => None,
        Some(method) => Some(method.parse::<CodeChallengeMethod>().map_err(|_| {
            OAuthError::with_description(
                ErrorType::InvalidRequest,
                "Transform algorithm not supported.",
            )
        })?),
    };

    match (method, challenge) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(OAuthError::with_description(
            ErrorType::InvalidRequest,
            "Code challenge required.",
        )),
        (method, Some(challenge)) => Ok(Some(Challenge {
            method: method.unwrap_or(CodeChallengeMethod::Plain),
            challenge: challenge.to_string(),
        })),
    }
}

/// The challenge a verifier commits to under the method.
pub fn transform(method: CodeChallengeMethod, verifier: &str) -> String {
    match method {
        CodeChallengeMethod::Plain => verifier.to_string(),
        CodeChallengeMethod::S256 => {
            let mut hasher = Sha256::new();
            hasher.update(verifier.as_bytes());
            URL_SAFE_NO_PAD.encode(hasher.finalize())
        }
    }
}

/// Verify a verifier against the stored challenge, in constant time.
pub fn verify(method: CodeChallengeMethod, challenge: &str, verifier: &str) -> bool {
    let transformed = transform(method, verifier);
    challenge.as_bytes().ct_eq(transformed.as_bytes()).into()
}
