//! Reversible text encoding applied to message bodies on the wire.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

use crate::error::DecodeError;

/// Turns raw bytes into a queue-safe message body and back.
///
/// Implementations must satisfy `decode(&encode(x)) == x` for every `x`.
pub trait Codec: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> String;

    fn decode(&self, text: &str) -> Result<Vec<u8>, DecodeError>;
}

/// URL-safe base64 with padding. This is the default wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Url;

impl Codec for Base64Url {
    fn encode(&self, bytes: &[u8]) -> String {
        URL_SAFE.encode(bytes)
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>, DecodeError> {
        Ok(URL_SAFE.decode(text)?)
    }
}
