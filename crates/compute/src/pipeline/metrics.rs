use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Pipeline counters, updated by each tick and theme run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineMetrics {
    pub ticks: u64,
    pub events_scored: u64,
    pub events_rejected: u64,
    /// Analysis time of the last completed tick (`as_of`, not wall clock).
    pub last_tick_at: Option<DateTime<Utc>>,
    /// Duration of the last tick in microseconds.
    pub last_tick_duration_us: u64,
    /// Scored events per second over the last tick.
    pub events_per_second: f64,
    pub theme_runs: u64,
    pub themes_found: u64,

    // Running totals backing the averages (not serialized).
    #[serde(skip)]
    total_tick_us: f64,
}

impl PipelineMetrics {
    /// Record a finished tick.
    pub fn record_tick(&mut self, as_of: DateTime<Utc>, scored: u64, rejected: u64, elapsed: Duration) {
        self.ticks += 1;
        self.events_scored += scored;
        self.events_rejected += rejected;
        self.last_tick_at = Some(as_of);
        self.last_tick_duration_us = elapsed.as_micros() as u64;
        self.total_tick_us += elapsed.as_micros() as f64;

        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.events_per_second = scored as f64 / secs;
        }
    }

    /// Record a finished theme detection run.
    pub fn record_theme_run(&mut self, themes: usize) {
        self.theme_runs += 1;
        self.themes_found += themes as u64;
    }

    /// Mean tick duration in microseconds.
    pub fn avg_tick_us(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.total_tick_us / self.ticks as f64
        }
    }

    /// Start timing a tick.
    pub fn tick_timer(&self) -> TickTimer {
        TickTimer {
            start: Instant::now(),
        }
    }
}

/// A scoped timer for one tick.
pub struct TickTimer {
    start: Instant,
}

impl TickTimer {
    pub fn finish(self, metrics: &mut PipelineMetrics, as_of: DateTime<Utc>, scored: u64, rejected: u64) {
        metrics.record_tick(as_of, scored, rejected, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_metrics_accumulate() {
        let mut m = PipelineMetrics::default();
        let now = Utc::now();
        m.record_tick(now, 100, 2, Duration::from_millis(50));
        m.record_tick(now, 50, 0, Duration::from_millis(150));

        assert_eq!(m.ticks, 2);
        assert_eq!(m.events_scored, 150);
        assert_eq!(m.events_rejected, 2);
        assert_eq!(m.last_tick_at, Some(now));
        assert_eq!(m.last_tick_duration_us, 150_000);
        assert!((m.events_per_second - 50.0 / 0.15).abs() < 1e-6);
        assert!((m.avg_tick_us() - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn theme_runs_counted() {
        let mut m = PipelineMetrics::default();
        m.record_theme_run(3);
        m.record_theme_run(0);
        assert_eq!(m.theme_runs, 2);
        assert_eq!(m.themes_found, 3);
    }

    #[test]
    fn timer_records_tick() {
        let mut m = PipelineMetrics::default();
        let timer = m.tick_timer();
        timer.finish(&mut m, Utc::now(), 1, 0);
        assert_eq!(m.ticks, 1);
        assert!(m.last_tick_at.is_some());
    }

    #[test]
    fn fresh_metrics_serialize_without_internals() {
        let json = serde_json::to_value(PipelineMetrics::default()).unwrap();
        assert_eq!(json["ticks"], 0);
        assert!(json.get("total_tick_us").is_none());
    }
}
