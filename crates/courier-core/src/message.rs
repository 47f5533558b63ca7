use std::collections::HashMap;

use crate::codec::Codec;
use crate::error::DecodeError;
use crate::queue::ReceivedMessage;

/// A received message with its body decoded, as handed to a
/// [`Handler`](crate::Handler).
///
/// Serializes to JSON with the body rendered as (lossy) UTF-8 text.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Message {
    /// Identifier assigned by the queue, if it reported one
    pub message_id: Option<String>,
    /// Identifies this delivery; needed to delete the message
    pub receipt_handle: String,
    /// Decoded payload
    #[serde(serialize_with = "serialize_body")]
    pub body: Vec<u8>,
    /// System and custom attributes returned with the message
    pub attributes: HashMap<String, String>,
}

impl Message {
    /// Decodes the body of `received` with `codec`.
    pub fn decode(received: ReceivedMessage, codec: &dyn Codec) -> Result<Self, DecodeError> {
        let body = codec.decode(&received.body)?;

        Ok(Self {
            message_id: received.message_id,
            receipt_handle: received.receipt_handle,
            body,
            attributes: received.attributes,
        })
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

fn serialize_body<S: serde::Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(body))
}
