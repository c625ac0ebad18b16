//! Output assembly
//!
//! Streaming encoders expect a summary to follow the detail it closes, so each
//! lap is written after its records and timer events, and the session and
//! activity come last.

use crate::summary::RewrittenSummaries;
use crate::timer::TimerEventSynthesizer;
use crate::types::{AllocatedSegment, FileId, Message, OtherMessage};

/// Concatenates pipeline outputs into emission order
pub struct Assembler;

impl Assembler {
    pub fn assemble(
        file_id: FileId,
        passthrough: Vec<OtherMessage>,
        segments: &[AllocatedSegment],
        summaries: RewrittenSummaries,
    ) -> Vec<Message> {
        let record_count: usize = segments.iter().map(|s| s.segment().records().len()).sum();
        let mut messages =
            Vec::with_capacity(record_count + passthrough.len() + segments.len() * 4 + 3);

        messages.push(Message::FileId(file_id));
        messages.extend(passthrough.into_iter().map(Message::Other));

        for (allocated, laps) in segments.iter().zip(summaries.laps) {
            let segment = allocated.segment();
            let timers = TimerEventSynthesizer::for_segment(segment, segments.len());

            messages.push(Message::Event(timers.start));
            messages.extend(segment.records().iter().cloned().map(Message::Record));
            messages.push(Message::Event(timers.stop));

            if let Some(pause) = laps.pause {
                messages.push(Message::Lap(pause));
            }
            messages.push(Message::Lap(laps.active));
        }

        messages.push(Message::Session(summaries.session));
        messages.push(Message::Activity(summaries.activity));

        messages
    }
}
