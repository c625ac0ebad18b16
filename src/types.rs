//! Core types for the flowfit pipeline
//!
//! This module defines the decoded messages that enter and leave the pipeline,
//! and the segment structures that flow between its stages.

use crate::error::ConvertError;
use crate::profile::{FieldOrder, RecordField};
use chrono::{DateTime, SubsecRound, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Message timestamps, whole seconds in UTC
pub type Timestamp = DateTime<Utc>;

/// Untyped message fields carried through unchanged
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Whole seconds from `start` to `end`
pub fn seconds_between(start: Timestamp, end: Timestamp) -> i64 {
    (end - start).num_seconds()
}

/// Message kind, used for classification and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    FileId,
    Record,
    Lap,
    Session,
    Activity,
    Event,
    Other,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::FileId => "file_id",
            MessageKind::Record => "record",
            MessageKind::Lap => "lap",
            MessageKind::Session => "session",
            MessageKind::Activity => "activity",
            MessageKind::Event => "event",
            MessageKind::Other => "other",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    FileId(FileId),
    Record(Record),
    Lap(LapSummary),
    Session(SessionSummary),
    Activity(Activity),
    Event(TimerEvent),
    Other(OtherMessage),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::FileId(_) => MessageKind::FileId,
            Message::Record(_) => MessageKind::Record,
            Message::Lap(_) => MessageKind::Lap,
            Message::Session(_) => MessageKind::Session,
            Message::Activity(_) => MessageKind::Activity,
            Message::Event(_) => MessageKind::Event,
            Message::Other(_) => MessageKind::Other,
        }
    }

    /// Kind name, or the profile message name for passthrough messages
    pub fn name(&self) -> &str {
        match self {
            Message::Other(other) => other.name.as_str(),
            _ => self.kind().as_str(),
        }
    }
}

// ============================================================================
// Categorical values
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Generic,
    Running,
    Cycling,
    Walking,
    Hiking,
    EBiking,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubSport {
    Generic,
    Road,
    Mountain,
    Commuting,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTrigger {
    ActivityEnd,
    Manual,
    AutoMultiSport,
    FitnessEquipment,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LapTrigger {
    Manual,
    Time,
    Distance,
    SessionEnd,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Timer,
    Session,
    Lap,
    Activity,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Start,
    Stop,
    StopAll,
    Marker,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerTrigger {
    Manual,
    Auto,
    FitnessEquipment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Manual,
    AutoMultiSport,
}

// ============================================================================
// Message payloads
// ============================================================================

/// File identity, passed through unchanged.
///
/// Decoders disagree on the types of `manufacturer`, `product` and friends, so
/// no field is interpreted and key order is kept as decoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileId {
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl FileId {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// `time_created`, when present and an RFC 3339 timestamp
    pub fn time_created(&self) -> Option<Timestamp> {
        self.get("time_created")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Lap summary. Source laps are only checked for presence; output laps are
/// built from segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LapSummary {
    /// Lap end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    /// Seconds from start to end, pauses included
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_elapsed_time: Option<f64>,
    /// Seconds of active timing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_timer_time: Option<f64>,
    /// Energy expenditure (kcal)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap_trigger: Option<LapTrigger>,
    #[serde(flatten)]
    pub extra: FieldMap,
}

/// Session summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_elapsed_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_timer_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<Sport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_sport: Option<SubSport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<SessionTrigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    /// Lap messages belonging to this session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_laps: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_lap_index: Option<u16>,
    /// Source fields outside the recomputed set (distance, speeds, ...)
    #[serde(flatten)]
    pub extra: FieldMap,
}

/// Activity marker closing the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub timestamp: Timestamp,
    pub num_sessions: u16,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub event: Event,
    pub event_type: EventType,
    pub total_timer_time: f64,
}

/// Timer start/stop marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub timestamp: Timestamp,
    pub event: Event,
    pub event_type: EventType,
    pub timer_trigger: TimerTrigger,
    pub event_group: u8,
}

/// Message of a kind the pipeline does not interpret
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherMessage {
    /// Profile message name (e.g. "device_info")
    pub name: String,
    #[serde(default)]
    pub fields: FieldMap,
}

// ============================================================================
// Records
// ============================================================================

/// One telemetry reading.
///
/// Fields are a sparse list over the [`RecordField`] catalog; a field missing
/// from the list is unset, which is not the same as a stored zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    timestamp: Timestamp,
    fields: Vec<(RecordField, f64)>,
}

impl Record {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(0),
            fields: Vec::new(),
        }
    }

    /// Returns a copy with `field` set to `value`
    pub fn with(mut self, field: RecordField, value: f64) -> Self {
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn get(&self, field: RecordField) -> Option<f64> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| *value)
    }

    pub fn is_set(&self, field: RecordField) -> bool {
        self.get(field).is_some()
    }

    /// Set fields in their current order
    pub fn fields(&self) -> impl Iterator<Item = (RecordField, f64)> + '_ {
        self.fields.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge a later reading of the same instant into this one.
    ///
    /// Only fields unset here are taken from `later`; values already present
    /// are never overwritten.
    pub fn fill_holes(&self, later: &Record) -> Record {
        let mut merged = self.clone();
        for (field, value) in later.fields() {
            if !merged.is_set(field) {
                merged.fields.push((field, value));
            }
        }
        merged
    }

    /// Returns a copy with fields sorted by `order`
    pub fn ordered(&self, order: &FieldOrder) -> Record {
        let mut fields = self.fields.clone();
        fields.sort_by_key(|(field, _)| order.rank(*field));
        Record {
            timestamp: self.timestamp,
            fields,
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        for (field, value) in &self.fields {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a record with a timestamp and catalog fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
        let mut timestamp: Option<Timestamp> = None;
        let mut fields: Vec<(RecordField, f64)> = Vec::new();

        while let Some(key) = map.next_key::<String>()? {
            if key == "timestamp" {
                timestamp = Some(map.next_value()?);
                continue;
            }

            let field = RecordField::from_name(&key).ok_or_else(|| {
                serde::de::Error::custom(format!("unknown record field: {key}"))
            })?;

            // null marks an invalid value, same as an absent field
            let value: Option<f64> = map.next_value()?;
            if let Some(value) = value {
                if !fields.iter().any(|(f, _)| *f == field) {
                    fields.push((field, value));
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| serde::de::Error::missing_field("timestamp"))?;
        Ok(Record {
            timestamp: timestamp.trunc_subsecs(0),
            fields,
        })
    }
}

// ============================================================================
// Pipeline stage types
// ============================================================================

/// A contiguous run of consolidated records with no pause inside
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    index: usize,
    records: Vec<Record>,
}

impl Segment {
    /// Build a segment, enforcing the two-record minimum
    pub fn new(index: usize, records: Vec<Record>) -> Result<Self, ConvertError> {
        match records.len() {
            0 => Err(ConvertError::StructuralError(format!(
                "segment {index} has no records"
            ))),
            1 => Err(ConvertError::StructuralError(format!(
                "segment {index} has a single record at {}; a segment must span at least two instants",
                records[0].timestamp().to_rfc3339()
            ))),
            _ => Ok(Self { index, records }),
        }
    }

    /// Position of this segment in the activity
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn start_time(&self) -> Timestamp {
        self.records[0].timestamp()
    }

    pub fn end_time(&self) -> Timestamp {
        self.records[self.records.len() - 1].timestamp()
    }

    /// Active seconds; a segment holds no pause, so this is also its elapsed time
    pub fn active_secs(&self) -> i64 {
        seconds_between(self.start_time(), self.end_time())
    }
}

/// Segment with its estimated intensity
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSegment {
    pub segment: Segment,
    /// Time-weighted average power, used only to apportion energy
    pub average_intensity: f64,
}

/// Segment with its share of the total energy
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedSegment {
    pub weighted: WeightedSegment,
    /// kcal; `None` when no total energy was supplied
    pub total_energy: Option<f64>,
}

impl AllocatedSegment {
    pub fn segment(&self) -> &Segment {
        &self.weighted.segment
    }
}
