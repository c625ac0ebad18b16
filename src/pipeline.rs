//! Pipeline orchestration
//!
//! This module provides the public API for flowfit.
//! It runs the full repair from a decoded message list to the corrected list.

use crate::assembler::Assembler;
use crate::classifier::MessageClassifier;
use crate::codec::{JsonCodec, MessageCodec};
use crate::config::ConvertOptions;
use crate::consolidator::RecordConsolidator;
use crate::energy::{within_tolerance, EnergyDistributor};
use crate::error::ConvertError;
use crate::intensity::IntensityEstimator;
use crate::segmenter::PauseSegmenter;
use crate::summary::SummaryRewriter;
use crate::types::{Message, Segment, WeightedSegment};

/// Repair a decoded message list with default options.
///
/// # Arguments
/// * `messages` - Decoded messages of one recording
/// * `total_energy` - Total kcal to spread over laps, if known
///
/// # Returns
/// The corrected message list, in emission order
///
/// # Example
/// ```ignore
/// let repaired = convert_messages(decoded, Some(450.0))?;
/// ```
pub fn convert_messages(
    messages: Vec<Message>,
    total_energy: Option<f64>,
) -> Result<Vec<Message>, ConvertError> {
    let options = ConvertOptions::default().with_total_energy(total_energy);
    FlowFitConverter::new(options)?.convert(messages)
}

/// Decode, repair and re-encode a recording.
///
/// Codec errors are returned unchanged.
pub fn convert_bytes(
    codec: &dyn MessageCodec,
    input: &[u8],
    options: ConvertOptions,
) -> Result<Vec<u8>, ConvertError> {
    let converter = FlowFitConverter::new(options)?;
    let messages = codec.decode(input)?;
    let repaired = converter.convert(messages)?;
    codec.encode(&repaired)
}

/// Repair a JSON message list, returning the corrected list as JSON.
pub fn convert_json(json: &str, options: ConvertOptions) -> Result<String, ConvertError> {
    let output = convert_bytes(&JsonCodec::new(), json.as_bytes(), options)?;
    String::from_utf8(output).map_err(|e| ConvertError::CodecError(e.to_string()))
}

/// Repairs recordings with a fixed set of options.
pub struct FlowFitConverter {
    options: ConvertOptions,
    consolidator: RecordConsolidator,
    segmenter: PauseSegmenter,
    estimator: IntensityEstimator,
    rewriter: SummaryRewriter,
}

impl Default for FlowFitConverter {
    fn default() -> Self {
        let options = ConvertOptions::default();
        Self {
            consolidator: RecordConsolidator::default(),
            segmenter: PauseSegmenter::new(options.pause_threshold_secs),
            estimator: IntensityEstimator::new(options.intensity_field),
            rewriter: SummaryRewriter::new(options.emit_pause_laps),
            options,
        }
    }
}

impl FlowFitConverter {
    /// Create a converter, validating `options`
    pub fn new(options: ConvertOptions) -> Result<Self, ConvertError> {
        options.validate()?;
        let field_order = options.resolve_field_order()?;

        Ok(Self {
            consolidator: RecordConsolidator::new(field_order),
            segmenter: PauseSegmenter::new(options.pause_threshold_secs),
            estimator: IntensityEstimator::new(options.intensity_field),
            rewriter: SummaryRewriter::new(options.emit_pause_laps),
            options,
        })
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Run the pipeline.
    ///
    /// Pipeline stages:
    /// 1. MessageClassifier - Partition input, check cardinality
    /// 2. RecordConsolidator - One record per timestamp
    /// 3. PauseSegmenter - Split on pauses
    /// 4. IntensityEstimator - Average power per segment
    /// 5. EnergyDistributor - Spread total energy
    /// 6. SummaryRewriter - Laps, session, activity
    /// 7. Assembler - Timer events and final order
    pub fn convert(&self, messages: Vec<Message>) -> Result<Vec<Message>, ConvertError> {
        let input_count = messages.len();

        // Stage 1: Classify input
        let classified = MessageClassifier::classify(messages, &self.options)?;

        // Stage 2: Consolidate duplicate records
        let records = self.consolidator.consolidate(&classified.records);

        // Stage 3: Split into active segments
        let segments = self.segmenter.segment(records)?;

        // Stage 4: Estimate intensity
        let weighted = self.weigh(segments);

        // Stage 5: Distribute energy
        let allocated = EnergyDistributor::distribute(weighted, self.options.total_energy)?;
        if let Some(total) = self.options.total_energy {
            let sum: f64 = allocated.iter().filter_map(|s| s.total_energy).sum();
            if !within_tolerance(sum, total) {
                log::warn!("Distributed energy {sum} kcal differs from requested {total} kcal");
            }
        }

        // Stage 6: Rewrite summaries
        let summaries =
            self.rewriter
                .rewrite(&allocated, classified.session, self.options.total_energy);

        log::info!(
            "Rebuilt {} laps: elapsed {}s, timer {}s",
            allocated.len(),
            summaries.session.total_elapsed_time.unwrap_or_default(),
            summaries.session.total_timer_time.unwrap_or_default()
        );

        // Stage 7: Assemble output
        let output = Assembler::assemble(
            classified.file_id,
            classified.passthrough,
            &allocated,
            summaries,
        );

        log::debug!("Converted {} messages into {}", input_count, output.len());

        Ok(output)
    }

    /// Weigh segments without rewriting anything.
    ///
    /// Used by inspection tools that only need the segmentation.
    pub fn analyze(&self, messages: Vec<Message>) -> Result<Vec<WeightedSegment>, ConvertError> {
        let classified = MessageClassifier::classify(messages, &self.options)?;
        let records = self.consolidator.consolidate(&classified.records);
        let segments = self.segmenter.segment(records)?;
        Ok(self.weigh(segments))
    }

    fn weigh(&self, segments: Vec<Segment>) -> Vec<WeightedSegment> {
        segments
            .into_iter()
            .map(|segment| self.estimator.weigh(segment))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::ENERGY_RELATIVE_TOLERANCE;
    use crate::profile::RecordField;
    use crate::types::{
        EventType, FileId, LapSummary, MessageKind, Record, SessionSummary, Sport, Timestamp,
    };
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_714_557_600 + secs, 0).unwrap()
    }

    fn recording(records: Vec<Record>) -> Vec<Message> {
        let file_id: FileId = serde_json::from_value(serde_json::json!({
            "type": "activity",
            "time_created": ts(0),
        }))
        .unwrap();
        let mut messages = vec![Message::FileId(file_id)];
        messages.extend(records.into_iter().map(Message::Record));
        // the source summaries copy the file creation time
        messages.push(Message::Lap(LapSummary {
            timestamp: Some(ts(0)),
            start_time: Some(ts(0)),
            ..Default::default()
        }));
        messages.push(Message::Session(SessionSummary {
            timestamp: Some(ts(0)),
            start_time: Some(ts(0)),
            sport: Some(Sport::Cycling),
            ..Default::default()
        }));
        messages
    }

    fn powered(times: &[i64], power: f64) -> Vec<Record> {
        times
            .iter()
            .map(|&t| Record::new(ts(t)).with(RecordField::Power, power))
            .collect()
    }

    fn laps(messages: &[Message]) -> Vec<&LapSummary> {
        messages
            .iter()
            .filter_map(|m| match m {
                Message::Lap(lap) => Some(lap),
                _ => None,
            })
            .collect()
    }

    fn session(messages: &[Message]) -> &SessionSummary {
        messages
            .iter()
            .find_map(|m| match m {
                Message::Session(s) => Some(s),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_scenario_single_segment() {
        let output = convert_messages(recording(powered(&[0, 1, 2], 100.0)), None).unwrap();

        let laps = laps(&output);
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].total_elapsed_time, Some(2.0));
        assert_eq!(laps[0].total_timer_time, Some(2.0));

        let session = session(&output);
        assert_eq!(session.start_time, Some(ts(0)));
        assert_eq!(session.timestamp, Some(ts(2)));
        assert_eq!(session.total_elapsed_time, Some(2.0));
        assert_eq!(session.total_timer_time, Some(2.0));
        assert_eq!(session.total_calories, None);
    }

    #[test]
    fn test_scenario_pause_between_segments() {
        let output =
            convert_messages(recording(powered(&[0, 1, 2, 70, 71, 72], 100.0)), None).unwrap();

        let laps = laps(&output);
        assert_eq!(laps.len(), 3);
        assert_eq!(laps[1].total_elapsed_time, Some(68.0));
        assert_eq!(laps[1].total_timer_time, Some(0.0));

        let session = session(&output);
        assert_eq!(session.total_elapsed_time, Some(72.0));
        assert_eq!(session.total_timer_time, Some(4.0));

        let lap_elapsed: f64 = laps.iter().filter_map(|l| l.total_elapsed_time).sum();
        assert_eq!(Some(lap_elapsed), session.total_elapsed_time);
    }

    #[test]
    fn test_scenario_duplicate_records() {
        let records = vec![
            Record::new(ts(4)).with(RecordField::Power, 140.0),
            Record::new(ts(5)).with(RecordField::Power, 150.0),
            Record::new(ts(5)).with(RecordField::HeartRate, 140.0),
            Record::new(ts(6)).with(RecordField::Power, 160.0),
        ];
        let output = convert_messages(recording(records), None).unwrap();

        let records: Vec<&Record> = output
            .iter()
            .filter_map(|m| match m {
                Message::Record(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].timestamp(), ts(5));
        assert_eq!(records[1].get(RecordField::Power), Some(150.0));
        assert_eq!(records[1].get(RecordField::HeartRate), Some(140.0));
    }

    #[test]
    fn test_scenario_energy_split() {
        let mut records = powered(&[0, 1, 2, 3], 100.0);
        records.extend(powered(&[200, 201, 202, 203], 200.0));
        let output = convert_messages(recording(records), Some(300.0)).unwrap();

        let laps = laps(&output);
        assert_eq!(laps.len(), 3);
        assert!((laps[0].total_calories.unwrap() - 100.0).abs() < 1e-6);
        assert_eq!(laps[1].total_calories, Some(0.0));
        assert!((laps[2].total_calories.unwrap() - 200.0).abs() < 1e-6);

        let lap_energy: f64 = laps.iter().filter_map(|l| l.total_calories).sum();
        assert!(((lap_energy - 300.0) / 300.0).abs() <= ENERGY_RELATIVE_TOLERANCE);
        assert_eq!(session(&output).total_calories, Some(300.0));
    }

    #[test]
    fn test_no_energy_fields_without_total() {
        let mut records = powered(&[0, 1, 2], 100.0);
        records.extend(powered(&[100, 101], 100.0));
        let output = convert_messages(recording(records), None).unwrap();
        assert!(laps(&output).iter().all(|l| l.total_calories.is_none()));
        assert_eq!(session(&output).total_calories, None);
    }

    #[test]
    fn test_energy_without_power_fails() {
        let records = vec![Record::new(ts(0)), Record::new(ts(1))];
        let result = convert_messages(recording(records), Some(250.0));
        assert!(matches!(result, Err(ConvertError::ArithmeticError(_))));
    }

    #[test]
    fn test_energy_not_needed_without_power() {
        let records = vec![Record::new(ts(0)), Record::new(ts(1))];
        assert!(convert_messages(recording(records), None).is_ok());
    }

    #[test]
    fn test_no_records_fails() {
        let result = convert_messages(recording(Vec::new()), None);
        assert!(matches!(result, Err(ConvertError::StructuralError(_))));
    }

    #[test]
    fn test_lone_record_segment_fails() {
        let mut records = powered(&[0, 1, 2], 100.0);
        records.extend(powered(&[500], 100.0));
        let result = convert_messages(recording(records), None);
        assert!(matches!(result, Err(ConvertError::StructuralError(_))));
    }

    #[test]
    fn test_output_shape() {
        let output =
            convert_messages(recording(powered(&[0, 1, 2, 70, 71, 72], 100.0)), None).unwrap();

        assert_eq!(output.first().map(|m| m.kind()), Some(MessageKind::FileId));
        assert_eq!(output.last().map(|m| m.kind()), Some(MessageKind::Activity));

        let events: Vec<(Timestamp, EventType)> = output
            .iter()
            .filter_map(|m| match m {
                Message::Event(e) => Some((e.timestamp, e.event_type)),
                _ => None,
            })
            .collect();
        assert_eq!(
            events,
            vec![
                (ts(0), EventType::Start),
                (ts(3), EventType::StopAll),
                (ts(69), EventType::Start),
                (ts(72), EventType::StopAll),
            ]
        );

        let session = session(&output);
        assert_eq!(session.sport, Some(Sport::EBiking));
    }

    #[test]
    fn test_custom_threshold() {
        let options = ConvertOptions::default().with_pause_threshold(5);
        let converter = FlowFitConverter::new(options).unwrap();
        let output = converter
            .convert(recording(powered(&[0, 1, 2, 10, 11, 12], 100.0)))
            .unwrap();
        let session = session(&output);
        assert_eq!(session.total_elapsed_time, Some(12.0));
        assert_eq!(session.total_timer_time, Some(4.0));
    }

    #[test]
    fn test_analyze_reports_segments() {
        let mut records = powered(&[0, 1, 2], 120.0);
        records.extend(powered(&[100, 102], 80.0));
        let segments = FlowFitConverter::default()
            .analyze(recording(records))
            .unwrap();
        assert_eq!(segments.len(), 2);
        assert!((segments[0].average_intensity - 120.0).abs() < 1e-9);
        assert!((segments[1].average_intensity - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ConvertOptions::default().with_total_energy(Some(-10.0));
        assert!(FlowFitConverter::new(options).is_err());
    }

    #[test]
    fn test_convert_bytes_json() {
        let input = serde_json::to_vec(&recording(powered(&[0, 1, 2], 100.0))).unwrap();
        let output = convert_bytes(
            &JsonCodec::new(),
            &input,
            ConvertOptions::default().with_total_energy(Some(50.0)),
        )
        .unwrap();

        let messages: Vec<Message> = serde_json::from_slice(&output).unwrap();
        assert_eq!(session(&messages).total_calories, Some(50.0));
    }

    #[test]
    fn test_source_session_counts_replaced() {
        let mut messages = recording(powered(&[0, 1, 2, 70, 71, 72], 100.0));
        if let Some(Message::Session(session)) = messages.last_mut() {
            session.num_laps = Some(1);
            session
                .extra
                .insert("total_moving_time".to_string(), serde_json::json!(999));
        }

        let output = convert_messages(messages, None).unwrap();
        let session = session(&output);
        assert_eq!(session.num_laps, Some(laps(&output).len() as u16));
        assert_eq!(session.num_laps, Some(3));
        assert!(!session.extra.contains_key("total_moving_time"));
        assert_eq!(session.total_timer_time, Some(4.0));
    }

    #[test]
    fn test_convert_json_string() {
        let input = serde_json::to_string(&recording(powered(&[0, 1, 2], 100.0))).unwrap();
        let output = convert_json(&input, ConvertOptions::default()).unwrap();
        assert!(output.starts_with('['));
        assert!(output.contains("\"e_biking\""));
        assert!(!output.contains("total_calories"));
    }

    #[test]
    fn test_convert_bytes_surfaces_codec_errors() {
        let result = convert_bytes(&JsonCodec::new(), b"not json", ConvertOptions::default());
        assert!(matches!(result, Err(ConvertError::JsonError(_))));
    }
}
