//! Conversion options
//!
//! Options are plain serde data so they can come from a JSON file, the CLI or
//! the FFI layer. Missing keys take their defaults.

use crate::error::ConvertError;
use crate::profile::{FieldOrder, RecordField};
use serde::{Deserialize, Serialize};

/// Gap (seconds) above which two consecutive records are split into separate laps
pub const DEFAULT_PAUSE_THRESHOLD_SECS: u32 = 60;

/// Profile messages forwarded unchanged when present in the input
pub const DEFAULT_PASSTHROUGH_KINDS: &[&str] = &["file_creator", "device_info"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Total energy (kcal) to spread over laps; `None` writes no energy fields
    pub total_energy: Option<f64>,
    pub pause_threshold_secs: u32,
    /// Emit a zero-activity lap for every pause
    pub emit_pause_laps: bool,
    /// Record field used as the intensity proxy
    pub intensity_field: RecordField,
    /// Names of `other` messages that may pass through
    pub passthrough_kinds: Vec<String>,
    /// Explicit record field order; profile order when absent
    pub field_order: Option<Vec<RecordField>>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            total_energy: None,
            pause_threshold_secs: DEFAULT_PAUSE_THRESHOLD_SECS,
            emit_pause_laps: true,
            intensity_field: RecordField::Power,
            passthrough_kinds: DEFAULT_PASSTHROUGH_KINDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            field_order: None,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        let options: ConvertOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_total_energy(mut self, total_energy: Option<f64>) -> Self {
        self.total_energy = total_energy;
        self
    }

    pub fn with_pause_threshold(mut self, secs: u32) -> Self {
        self.pause_threshold_secs = secs;
        self
    }

    pub fn with_pause_laps(mut self, emit: bool) -> Self {
        self.emit_pause_laps = emit;
        self
    }

    pub fn with_intensity_field(mut self, field: RecordField) -> Self {
        self.intensity_field = field;
        self
    }

    pub fn with_field_order(mut self, fields: Vec<RecordField>) -> Self {
        self.field_order = Some(fields);
        self
    }

    /// Check option values before a run
    pub fn validate(&self) -> Result<(), ConvertError> {
        if let Some(energy) = self.total_energy {
            if !energy.is_finite() || energy < 0.0 {
                return Err(ConvertError::InvalidParameter(format!(
                    "total energy must be a non-negative number, got {energy}"
                )));
            }
        }

        if self.pause_threshold_secs == 0 {
            return Err(ConvertError::InvalidParameter(
                "pause threshold must be at least one second".to_string(),
            ));
        }

        self.resolve_field_order()?;
        Ok(())
    }

    /// Ordering table for consolidated records
    pub fn resolve_field_order(&self) -> Result<FieldOrder, ConvertError> {
        match &self.field_order {
            Some(fields) => FieldOrder::from_sequence(fields),
            None => Ok(FieldOrder::by_profile_number()),
        }
    }

    pub fn allows_passthrough(&self, name: &str) -> bool {
        self.passthrough_kinds.iter().any(|k| k == name)
    }
}
