//! Intensity estimation
//!
//! Computes a time-weighted average power per segment. The value only weights
//! the energy split between laps and is never written back into records.

use crate::profile::RecordField;
use crate::types::{Segment, WeightedSegment};

/// Estimates the average intensity of a segment
pub struct IntensityEstimator {
    field: RecordField,
}

impl Default for IntensityEstimator {
    fn default() -> Self {
        Self::new(RecordField::Power)
    }
}

impl IntensityEstimator {
    pub fn new(field: RecordField) -> Self {
        Self { field }
    }

    pub fn weigh(&self, segment: Segment) -> WeightedSegment {
        let average_intensity = self.estimate(&segment);
        if average_intensity == 0.0 {
            log::warn!(
                "Segment {} averages zero {}; it will receive no energy",
                segment.index(),
                self.field
            );
        }
        WeightedSegment {
            segment,
            average_intensity,
        }
    }

    /// Time-weighted average of the intensity field.
    ///
    /// Each sample after the first contributes its value times the seconds
    /// since the previous qualifying sample; the sum is divided by the span
    /// from the first to the last qualifying sample. One qualifying sample
    /// yields its value, none yields zero.
    pub fn estimate(&self, segment: &Segment) -> f64 {
        let samples: Vec<(i64, f64)> = segment
            .records()
            .iter()
            .filter_map(|r| r.get(self.field).map(|v| (r.timestamp().timestamp(), v)))
            .collect();

        match samples.as_slice() {
            [] => 0.0,
            [(_, only)] => *only,
            [(first_ts, _), .., (last_ts, _)] => {
                let weighted: f64 = samples
                    .windows(2)
                    .map(|pair| pair[1].1 * (pair[1].0 - pair[0].0) as f64)
                    .sum();
                let span = last_ts - first_ts;
                if span <= 0 {
                    return 0.0;
                }
                weighted / span as f64
            }
        }
    }
}
