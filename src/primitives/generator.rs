//! Generators produce the opaque string values of codes and bearer tokens.
//!
//! The values carry no information at all, guessing them is infeasible only because of the
//! entropy they were drawn with. Resolving a value to its grant is left to the storage that
//! persisted it.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::PrimitiveError;

/// Generates tokens from random bytes.
///
/// Each byte is chosen randomly from the operating system's random source, the result is
/// encoded as url-safe base64 without padding so it can be placed in any redirect uri.
#[derive(Clone, Copy, Debug)]
pub struct RandomGenerator {
    len: usize,
}

impl RandomGenerator {
    /// Generates tokens with a specific byte length.
    pub fn new(length: usize) -> RandomGenerator {
        RandomGenerator { len: length }
    }

    /// Draw a fresh value.
    pub fn generate(&self) -> Result<String, PrimitiveError> {
        let mut result = vec![0; self.len];
        OsRng.try_fill_bytes(result.as_mut_slice())?;
        Ok(URL_SAFE_NO_PAD.encode(result))
    }
}
