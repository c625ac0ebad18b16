//! Record consolidation
//!
//! The source export writes several partial records for the same second. They
//! are views of one reading, so they are folded into one record per timestamp.

use crate::profile::FieldOrder;
use crate::types::{Record, Timestamp};
use std::collections::HashMap;

/// Folds duplicate-timestamp records into one record per timestamp
pub struct RecordConsolidator {
    field_order: FieldOrder,
}

impl Default for RecordConsolidator {
    fn default() -> Self {
        Self::new(FieldOrder::default())
    }
}

impl RecordConsolidator {
    pub fn new(field_order: FieldOrder) -> Self {
        Self { field_order }
    }

    /// Consolidate records.
    ///
    /// Output is strictly ascending by timestamp. For a repeated timestamp the
    /// first value seen for each field wins; later duplicates only fill fields
    /// still unset.
    pub fn consolidate(&self, records: &[Record]) -> Vec<Record> {
        let mut slots: HashMap<Timestamp, usize> = HashMap::new();
        let mut merged: Vec<Record> = Vec::new();

        for record in records {
            match slots.get(&record.timestamp()) {
                Some(&slot) => merged[slot] = merged[slot].fill_holes(record),
                None => {
                    slots.insert(record.timestamp(), merged.len());
                    merged.push(record.clone());
                }
            }
        }

        let duplicates = records.len() - merged.len();
        if duplicates > 0 {
            log::debug!(
                "Merged {} duplicate records into {} timestamps",
                duplicates,
                merged.len()
            );
        }

        merged.sort_by_key(|r| r.timestamp());
        merged
            .iter()
            .map(|r| r.ordered(&self.field_order))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::RecordField;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_duplicates_are_merged() {
        let records = vec![
            Record::new(ts(5)).with(RecordField::Power, 150.0),
            Record::new(ts(5)).with(RecordField::HeartRate, 140.0),
        ];

        let consolidated = RecordConsolidator::default().consolidate(&records);
        assert_eq!(consolidated.len(), 1);
        assert_eq!(consolidated[0].get(RecordField::Power), Some(150.0));
        assert_eq!(consolidated[0].get(RecordField::HeartRate), Some(140.0));
    }

    #[test]
    fn test_first_writer_wins() {
        let records = vec![
            Record::new(ts(5)).with(RecordField::Power, 150.0),
            Record::new(ts(6)).with(RecordField::Power, 160.0),
            Record::new(ts(5))
                .with(RecordField::Power, 10.0)
                .with(RecordField::Cadence, 85.0),
            Record::new(ts(5)).with(RecordField::Cadence, 1.0),
        ];

        let consolidated = RecordConsolidator::default().consolidate(&records);
        assert_eq!(consolidated.len(), 2);
        assert_eq!(consolidated[0].get(RecordField::Power), Some(150.0));
        assert_eq!(consolidated[0].get(RecordField::Cadence), Some(85.0));
        assert_eq!(consolidated[1].get(RecordField::Power), Some(160.0));
    }

    #[test]
    fn test_output_sorted_and_unique() {
        let records: Vec<Record> = [9, 3, 3, 7, 1, 9, 2]
            .iter()
            .map(|&s| Record::new(ts(s)))
            .collect();

        let consolidated = RecordConsolidator::default().consolidate(&records);
        let times: Vec<i64> = consolidated.iter().map(|r| r.timestamp().timestamp()).collect();
        assert_eq!(times, vec![1, 2, 3, 7, 9]);
    }

    #[test]
    fn test_fields_follow_profile_order() {
        let records = vec![
            Record::new(ts(0)).with(RecordField::Power, 200.0),
            Record::new(ts(0))
                .with(RecordField::Speed, 7.5)
                .with(RecordField::HeartRate, 120.0),
        ];

        let consolidated = RecordConsolidator::default().consolidate(&records);
        let fields: Vec<RecordField> = consolidated[0].fields().map(|(f, _)| f).collect();
        assert_eq!(
            fields,
            vec![RecordField::HeartRate, RecordField::Speed, RecordField::Power]
        );
    }

    #[test]
    fn test_explicit_field_order() {
        let order = FieldOrder::from_sequence(&[RecordField::Power]).unwrap();
        let records = vec![Record::new(ts(0))
            .with(RecordField::HeartRate, 120.0)
            .with(RecordField::Power, 200.0)];

        let consolidated = RecordConsolidator::new(order).consolidate(&records);
        let fields: Vec<RecordField> = consolidated[0].fields().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![RecordField::Power, RecordField::HeartRate]);
    }

    #[test]
    fn test_empty_input() {
        assert!(RecordConsolidator::default().consolidate(&[]).is_empty());
    }
}
