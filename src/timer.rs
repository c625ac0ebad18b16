//! Timer event synthesis
//!
//! The source export records no start/stop events. Each lap gets a start and a
//! stop timer event. Between laps the stop is written one second after the last
//! record and the restart one second before the next record, so no event shares
//! a timestamp with a record.

use crate::types::{Event, EventType, Segment, TimerEvent, TimerTrigger, Timestamp};
use chrono::Duration;

/// Start and stop events bracketing one segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTimers {
    pub start: TimerEvent,
    pub stop: TimerEvent,
}

/// Builds timer events for segments
pub struct TimerEventSynthesizer;

impl TimerEventSynthesizer {
    pub fn start_event(timestamp: Timestamp) -> TimerEvent {
        TimerEvent {
            timestamp,
            event: Event::Timer,
            event_type: EventType::Start,
            timer_trigger: TimerTrigger::Auto,
            event_group: 0,
        }
    }

    pub fn stop_event(timestamp: Timestamp) -> TimerEvent {
        TimerEvent {
            timestamp,
            event: Event::Timer,
            event_type: EventType::StopAll,
            timer_trigger: TimerTrigger::Auto,
            event_group: 0,
        }
    }

    /// Timer events for `segment`, one of `segment_count` segments
    pub fn for_segment(segment: &Segment, segment_count: usize) -> SegmentTimers {
        let one_second = Duration::seconds(1);
        let is_first = segment.index() == 0;
        let is_last = segment.index() + 1 >= segment_count;

        let start = if is_first {
            segment.start_time()
        } else {
            segment.start_time() - one_second
        };
        let stop = if is_last {
            segment.end_time()
        } else {
            segment.end_time() + one_second
        };

        SegmentTimers {
            start: Self::start_event(start),
            stop: Self::stop_event(stop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;
    use chrono::{TimeZone, Utc};

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn segment(index: usize, start: i64, end: i64) -> Segment {
        Segment::new(index, vec![Record::new(ts(start)), Record::new(ts(end))]).unwrap()
    }

    #[test]
    fn test_only_segment_uses_record_times() {
        let timers = TimerEventSynthesizer::for_segment(&segment(0, 0, 2), 1);
        assert_eq!(timers.start.timestamp, ts(0));
        assert_eq!(timers.stop.timestamp, ts(2));
        assert_eq!(timers.start.event_type, EventType::Start);
        assert_eq!(timers.stop.event_type, EventType::StopAll);
    }

    #[test]
    fn test_boundary_offsets() {
        let first = TimerEventSynthesizer::for_segment(&segment(0, 0, 2), 3);
        assert_eq!(first.start.timestamp, ts(0));
        assert_eq!(first.stop.timestamp, ts(3));

        let middle = TimerEventSynthesizer::for_segment(&segment(1, 70, 72), 3);
        assert_eq!(middle.start.timestamp, ts(69));
        assert_eq!(middle.stop.timestamp, ts(73));

        let last = TimerEventSynthesizer::for_segment(&segment(2, 200, 205), 3);
        assert_eq!(last.start.timestamp, ts(199));
        assert_eq!(last.stop.timestamp, ts(205));
    }

    #[test]
    fn test_fixed_tags() {
        let event = TimerEventSynthesizer::start_event(ts(0));
        assert_eq!(event.event, Event::Timer);
        assert_eq!(event.timer_trigger, TimerTrigger::Auto);
        assert_eq!(event.event_group, 0);
    }
}
