//! JSON message codec
//!
//! Reads and writes the decoded message list as a JSON array of `kind`-tagged
//! objects, the form produced by FIT-to-JSON dump tools.

use crate::error::ConvertError;
use crate::types::Message;

use super::MessageCodec;

/// JSON codec
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl MessageCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Message>, ConvertError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ConvertError::CodecError(format!("input is not UTF-8: {e}")))?;
        let messages: Vec<Message> = serde_json::from_str(text)?;
        Ok(messages)
    }

    fn encode(&self, messages: &[Message]) -> Result<Vec<u8>, ConvertError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(messages)?
        } else {
            serde_json::to_vec(messages)?
        };
        Ok(bytes)
    }
}
