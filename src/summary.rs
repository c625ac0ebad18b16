//! Summary rewriting
//!
//! The source lap and session copy the file creation time into both their start
//! and end, and carry no pause accounting. Laps, session and activity are
//! rebuilt from segment data; only the session's non-timing fields survive.

use crate::types::{
    seconds_between, Activity, ActivityType, AllocatedSegment, Event, EventType, LapSummary,
    LapTrigger, SessionSummary, SessionTrigger, Sport, SubSport, Timestamp,
};

/// Session keys describing timing or energy of the source recording
const STALE_SESSION_KEYS: &[&str] = &["total_moving_time", "avg_lap_time", "total_work"];

fn is_stale_session_key(key: &str) -> bool {
    STALE_SESSION_KEYS.contains(&key) || key.starts_with("time_in_") || key.ends_with("_calories")
}

/// Summaries for one segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentLaps {
    /// Zero-activity lap spanning the pause before this segment
    pub pause: Option<LapSummary>,
    pub active: LapSummary,
}

/// All rewritten summary messages
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenSummaries {
    /// One entry per segment, in order
    pub laps: Vec<SegmentLaps>,
    pub session: SessionSummary,
    pub activity: Activity,
}

/// Rebuilds lap, session and activity summaries
pub struct SummaryRewriter {
    emit_pause_laps: bool,
}

impl Default for SummaryRewriter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SummaryRewriter {
    pub fn new(emit_pause_laps: bool) -> Self {
        Self { emit_pause_laps }
    }

    /// Rewrite summaries for non-empty, time-ordered `segments`
    pub fn rewrite(
        &self,
        segments: &[AllocatedSegment],
        source_session: SessionSummary,
        total_energy: Option<f64>,
    ) -> RewrittenSummaries {
        let energy_active = total_energy.is_some();
        let mut laps = Vec::with_capacity(segments.len());
        let mut timer_secs: i64 = 0;

        for (position, allocated) in segments.iter().enumerate() {
            let segment = allocated.segment();
            let is_last = position + 1 == segments.len();

            let pause = match position.checked_sub(1).map(|p| &segments[p]) {
                Some(previous) if self.emit_pause_laps => Some(pause_lap(
                    previous.segment().end_time(),
                    segment.start_time(),
                    energy_active,
                )),
                _ => None,
            };

            let active_secs = segment.active_secs();
            timer_secs += active_secs;

            let active = LapSummary {
                timestamp: Some(segment.end_time()),
                start_time: Some(segment.start_time()),
                total_elapsed_time: Some(active_secs as f64),
                total_timer_time: Some(active_secs as f64),
                total_calories: allocated.total_energy,
                event: Some(Event::Lap),
                event_type: Some(EventType::Stop),
                lap_trigger: Some(if is_last {
                    LapTrigger::SessionEnd
                } else {
                    LapTrigger::Time
                }),
                ..Default::default()
            };

            laps.push(SegmentLaps { pause, active });
        }

        let (start, end) = match (segments.first(), segments.last()) {
            (Some(first), Some(last)) => (
                Some(first.segment().start_time()),
                Some(last.segment().end_time()),
            ),
            _ => (None, None),
        };
        let elapsed_secs = match (start, end) {
            (Some(start), Some(end)) => seconds_between(start, end),
            _ => 0,
        };

        let lap_count: usize = laps
            .iter()
            .map(|l| usize::from(l.pause.is_some()) + 1)
            .sum();

        let mut extra = source_session.extra;
        extra.retain(|key, _| !is_stale_session_key(key));

        let session = SessionSummary {
            timestamp: end,
            start_time: start,
            total_elapsed_time: Some(elapsed_secs as f64),
            total_timer_time: Some(timer_secs as f64),
            total_calories: total_energy,
            sport: Some(Sport::EBiking),
            sub_sport: Some(SubSport::Generic),
            trigger: Some(SessionTrigger::ActivityEnd),
            event: Some(Event::Session),
            event_type: Some(EventType::Stop),
            num_laps: Some(u16::try_from(lap_count).unwrap_or(u16::MAX)),
            first_lap_index: Some(0),
            extra,
        };

        let activity = Activity {
            timestamp: end.unwrap_or_default(),
            num_sessions: 1,
            activity_type: ActivityType::Manual,
            event: Event::Activity,
            event_type: EventType::Stop,
            total_timer_time: timer_secs as f64,
        };

        RewrittenSummaries {
            laps,
            session,
            activity,
        }
    }
}

fn pause_lap(start: Timestamp, end: Timestamp, energy_active: bool) -> LapSummary {
    LapSummary {
        timestamp: Some(end),
        start_time: Some(start),
        total_elapsed_time: Some(seconds_between(start, end) as f64),
        total_timer_time: Some(0.0),
        total_calories: energy_active.then_some(0.0),
        event: Some(Event::Lap),
        event_type: Some(EventType::Stop),
        lap_trigger: Some(LapTrigger::Time),
        ..Default::default()
    }
}
