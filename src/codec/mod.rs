//! Message codecs
//!
//! The pipeline works on decoded message lists. A codec turns file bytes into
//! that list and back; integrity checks belong to the codec, and its errors are
//! returned to the caller untouched.

mod json;

pub use json::JsonCodec;

use crate::error::ConvertError;
use crate::types::Message;

/// Trait for decode/encode services
pub trait MessageCodec {
    /// Verify and decode raw bytes into messages
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Message>, ConvertError>;

    /// Encode messages into raw bytes, preserving their order
    fn encode(&self, messages: &[Message]) -> Result<Vec<u8>, ConvertError>;
}
