use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use super::run_state::FrameOutcome;

/// Observer for run events: frame progress, per-stage timings and how each
/// frame was handled.
///
/// The controller reports through this trait only, so callers choose where
/// the numbers end up.
pub trait PipelineLogger: Send {
    /// Frame `current` of `total` has been written.
    fn progress(&mut self, current: usize, total: usize);

    /// How long a named stage (`detect`, `segment`, ...) took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point-in-time metric, e.g. detections per frame.
    fn metric(&mut self, name: &str, value: f64);

    fn frame_outcome(&mut self, outcome: FrameOutcome);

    fn info(&mut self, message: &str);

    /// End-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used by tests and embedders with their own
/// reporting.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn frame_outcome(&mut self, _outcome: FrameOutcome) {}
    fn info(&mut self, _message: &str) {}
}

/// Logs through the `log` facade and keeps enough data for a summary.
///
/// Progress lines are throttled to every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    started: Instant,
    frames_seen: usize,
    total_frames: usize,
    timings: BTreeMap<String, StageStats>,
    metrics: BTreeMap<String, Vec<f64>>,
    outcomes: HashMap<FrameOutcome, usize>,
    messages: Vec<String>,
}

/// Durations recorded for one stage.
#[derive(Default)]
struct StageStats {
    samples_ms: Vec<f64>,
}

impl StageStats {
    fn total_ms(&self) -> f64 {
        self.samples_ms.iter().sum()
    }

    fn mean_ms(&self) -> f64 {
        mean(&self.samples_ms)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            started: Instant::now(),
            frames_seen: 0,
            total_frames: 0,
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            outcomes: HashMap::new(),
            messages: Vec::new(),
        }
    }

    /// Formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() && self.outcomes.is_empty() {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Run summary ({}/{} frames, {elapsed_s:.1}s):",
            self.frames_seen, self.total_frames
        )];

        for outcome in [
            FrameOutcome::Annotated,
            FrameOutcome::Fallback,
            FrameOutcome::PassThrough,
        ] {
            if let Some(count) = self.outcomes.get(&outcome) {
                lines.push(format!("  {:12}: {count}", outcome.as_str()));
            }
        }

        for (stage, stats) in &self.timings {
            let share = if elapsed_s > 0.0 {
                stats.total_ms() / (elapsed_s * 10.0)
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: {:5} calls  avg {:6.1}ms  ({share:4.1}% of run)",
                stats.samples_ms.len(),
                stats.mean_ms()
            ));
        }

        for (name, values) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}", mean(values)));
        }

        if self.frames_seen > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} fps",
                self.frames_seen as f64 / elapsed_s
            ));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|s| s.samples_ms.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn outcome_count(&self, outcome: FrameOutcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        self.total_frames = total;
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            log::info!(
                "Frames: {current}/{total} ({:.1}%)",
                current as f64 * 100.0 / total as f64
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .samples_ms
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn frame_outcome(&mut self, outcome: FrameOutcome) {
        *self.outcomes.entry(outcome).or_default() += 1;
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
        self.messages.push(message.to_string());
    }

    fn summary(&self) {
        match self.summary_string() {
            Some(text) => log::info!("\n\n{text}"),
            None => log::debug!("Nothing to summarize"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("detect", 5.0);
        logger.metric("detections", 3.0);
        logger.frame_outcome(FrameOutcome::Annotated);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("render", 5.0);

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect.len(), 2);
        assert!((detect[1] - 30.0).abs() < f64::EPSILON);
        assert_eq!(logger.timings_for("render").unwrap().len(), 1);
        assert!(logger.timings_for("segment").is_none());
    }

    #[test]
    fn test_outcomes_are_counted() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.frame_outcome(FrameOutcome::PassThrough);
        logger.frame_outcome(FrameOutcome::PassThrough);
        logger.frame_outcome(FrameOutcome::Fallback);

        assert_eq!(logger.outcome_count(FrameOutcome::PassThrough), 2);
        assert_eq!(logger.outcome_count(FrameOutcome::Fallback), 1);
        assert_eq!(logger.outcome_count(FrameOutcome::Annotated), 0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("pass-through"));
        assert!(summary.contains("fallback"));
        assert!(!summary.contains("annotated"));
    }

    #[test]
    fn test_summary_includes_timing_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(10, 10);
        logger.timing("detect", 20.0);
        logger.timing("propagate", 5.0);
        logger.metric("detections", 3.0);
        logger.metric("detections", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Run summary (10/10 frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("propagate"));
        assert!(summary.contains("detections: avg 3.5"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_total() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=7 {
            logger.progress(i, 20);
        }
        assert_eq!(logger.frames_seen, 7);
        assert_eq!(logger.total_frames, 20);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.info("hello world");
        assert_eq!(logger.messages, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        assert_eq!(StdoutPipelineLogger::new(0).throttle_frames, 1);
        assert_eq!(StdoutPipelineLogger::default().throttle_frames, 25);
    }
}
