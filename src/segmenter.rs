//! Pause segmentation
//!
//! The source export has no pause markers. A gap between consecutive records
//! longer than the threshold is treated as a stop and starts a new lap.

use crate::config::DEFAULT_PAUSE_THRESHOLD_SECS;
use crate::error::ConvertError;
use crate::types::{seconds_between, Record, Segment};

/// Splits consolidated records into active segments
pub struct PauseSegmenter {
    threshold_secs: i64,
}

impl Default for PauseSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_PAUSE_THRESHOLD_SECS)
    }
}

impl PauseSegmenter {
    pub fn new(threshold_secs: u32) -> Self {
        Self {
            threshold_secs: i64::from(threshold_secs),
        }
    }

    /// Whether the gap between two consecutive records is a pause
    pub fn is_pause(&self, previous: &Record, next: &Record) -> bool {
        seconds_between(previous.timestamp(), next.timestamp()) > self.threshold_secs
    }

    /// Segment time-ordered, timestamp-unique records.
    ///
    /// Fails when there are no records or when any segment would hold a
    /// single record.
    pub fn segment(&self, records: Vec<Record>) -> Result<Vec<Segment>, ConvertError> {
        if records.is_empty() {
            return Err(ConvertError::StructuralError(
                "recording contains no records".to_string(),
            ));
        }

        let mut groups: Vec<Vec<Record>> = vec![Vec::new()];
        for record in records {
            let split = groups
                .last()
                .and_then(|group| group.last())
                .is_some_and(|last| self.is_pause(last, &record));
            if split {
                groups.push(Vec::new());
            }
            if let Some(group) = groups.last_mut() {
                group.push(record);
            }
        }

        let segments = groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| Segment::new(index, group))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Split recording into {} segments (threshold {}s)",
            segments.len(),
            self.threshold_secs
        );

        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;
    use chrono::{TimeZone, Utc};

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn records(times: &[i64]) -> Vec<Record> {
        times.iter().map(|&s| Record::new(ts(s))).collect()
    }

    #[test]
    fn test_no_gap_single_segment() {
        let segments = PauseSegmenter::default().segment(records(&[0, 1, 2])).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].active_secs(), 2);
    }

    #[test]
    fn test_gap_above_threshold_splits() {
        let segments = PauseSegmenter::default()
            .segment(records(&[0, 1, 2, 70, 71, 72]))
            .unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end_time(), ts(2));
        assert_eq!(segments[1].start_time(), ts(70));
        assert_eq!(segments[1].index(), 1);
    }

    #[test]
    fn test_gap_equal_to_threshold_does_not_split() {
        let segments = PauseSegmenter::default()
            .segment(records(&[0, 1, 61, 62]))
            .unwrap();
        assert_eq!(segments.len(), 1);

        let segments = PauseSegmenter::default()
            .segment(records(&[0, 1, 62, 63]))
            .unwrap();
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_segments_cover_all_records() {
        let input = records(&[0, 1, 2, 100, 101, 300, 301, 302, 303]);
        let segments = PauseSegmenter::new(30).segment(input.clone()).unwrap();
        let rejoined: Vec<Record> = segments
            .iter()
            .flat_map(|s| s.records().iter().cloned())
            .collect();
        assert_eq!(rejoined, input);
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_single_record_segment_is_fatal() {
        let err = PauseSegmenter::default()
            .segment(records(&[0, 1, 200, 400, 401]))
            .unwrap_err();
        match err {
            ConvertError::StructuralError(msg) => assert!(msg.contains("segment 1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_two_record_segment_accepted() {
        let segments = PauseSegmenter::default()
            .segment(records(&[0, 1, 200, 201]))
            .unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].records().len(), 2);
    }

    #[test]
    fn test_empty_input_is_fatal() {
        assert!(matches!(
            PauseSegmenter::default().segment(Vec::new()),
            Err(ConvertError::StructuralError(_))
        ));
    }

    #[test]
    fn test_short_threshold() {
        let segments = PauseSegmenter::new(5)
            .segment(records(&[0, 1, 2, 8, 9]))
            .unwrap();
        assert_eq!(segments.len(), 2);
    }
}
