//! Message classification
//!
//! Partitions the decoded input by kind and enforces the shape the rest of the
//! pipeline relies on: one file id, one session, one lap, nothing unvetted.

use crate::config::ConvertOptions;
use crate::error::ConvertError;
use crate::types::{
    FileId, LapSummary, Message, MessageKind, OtherMessage, Record, SessionSummary,
};

/// Input partitioned by kind
#[derive(Debug, Clone)]
pub struct ClassifiedMessages {
    pub file_id: FileId,
    pub session: SessionSummary,
    /// Kept only to prove it existed; its timing is never trusted
    pub source_lap: LapSummary,
    /// Records in input order, not yet consolidated
    pub records: Vec<Record>,
    /// Whitelisted messages, in input order
    pub passthrough: Vec<OtherMessage>,
}

/// Classifier for decoded message lists
pub struct MessageClassifier;

impl MessageClassifier {
    pub fn classify(
        messages: Vec<Message>,
        options: &ConvertOptions,
    ) -> Result<ClassifiedMessages, ConvertError> {
        let mut file_ids = Vec::new();
        let mut sessions = Vec::new();
        let mut laps = Vec::new();
        let mut records = Vec::new();
        let mut passthrough = Vec::new();

        for (index, message) in messages.into_iter().enumerate() {
            match message {
                Message::FileId(file_id) => file_ids.push(file_id),
                Message::Session(session) => sessions.push(session),
                Message::Lap(lap) => laps.push(lap),
                Message::Record(record) => records.push(record),
                Message::Other(other) if options.allows_passthrough(&other.name) => {
                    passthrough.push(other)
                }
                unsupported => {
                    return Err(ConvertError::UnsupportedMessageKind {
                        kind: unsupported.name().to_string(),
                        index,
                    });
                }
            }
        }

        let file_id = exactly_one(file_ids, MessageKind::FileId)?;
        let session = exactly_one(sessions, MessageKind::Session)?;
        let source_lap = exactly_one(laps, MessageKind::Lap)?;

        log::debug!(
            "Classified input: {} records, {} passthrough messages",
            records.len(),
            passthrough.len()
        );

        Ok(ClassifiedMessages {
            file_id,
            session,
            source_lap,
            records,
            passthrough,
        })
    }
}

fn exactly_one<T>(mut items: Vec<T>, kind: MessageKind) -> Result<T, ConvertError> {
    if items.len() != 1 {
        return Err(ConvertError::CardinalityError {
            kind,
            count: items.len(),
        });
    }
    Ok(items.remove(0))
}
