/// Whether sampled frames still go to the detection adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionMode {
    Detecting,
    /// Every remaining frame is written raw. There is no way back.
    PassThrough,
}

/// Lifecycle of a run. Every run ends `Cleanup → Done`, whichever way the
/// frame loop finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Running,
    Completed,
    Stopped,
    Failed,
    Cleanup,
    Done,
}

/// How a run that did not fail ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
}

/// What was written for one enumerated frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameOutcome {
    /// Sampled and rendered by the adapter.
    Annotated,
    /// Sampled, but the adapter produced nothing to draw; written raw.
    Fallback,
    /// Not sampled, or detection was disabled; written raw.
    PassThrough,
}

impl FrameOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotated => "annotated",
            Self::Fallback => "fallback",
            Self::PassThrough => "pass-through",
        }
    }
}

/// Mutable state of one run, owned by the controller.
#[derive(Clone, Debug)]
pub struct RunState {
    run_id: String,
    total_frames: usize,
    detection_mode: DetectionMode,
    phase: RunPhase,
    processed: usize,
    last_progress: Option<u8>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>, total_frames: usize) -> Self {
        Self {
            run_id: run_id.into(),
            total_frames,
            detection_mode: DetectionMode::Detecting,
            phase: RunPhase::Running,
            processed: 0,
            last_progress: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Set once the frames have been enumerated.
    pub fn set_total_frames(&mut self, total_frames: usize) {
        self.total_frames = total_frames;
    }

    pub fn detection_mode(&self) -> DetectionMode {
        self.detection_mode
    }

    pub fn detection_enabled(&self) -> bool {
        self.detection_mode == DetectionMode::Detecting
    }

    /// Returns true if this call switched the mode.
    pub fn disable_detection(&mut self) -> bool {
        let switched = self.detection_enabled();
        self.detection_mode = DetectionMode::PassThrough;
        switched
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Moves to `to` if the lifecycle allows it. Returns whether it did.
    pub fn advance(&mut self, to: RunPhase) -> bool {
        use RunPhase::*;
        let allowed = matches!(
            (self.phase, to),
            (Running, Completed)
                | (Running, Stopped)
                | (Running, Failed)
                | (Completed, Cleanup)
                | (Stopped, Cleanup)
                | (Failed, Cleanup)
                | (Cleanup, Done)
        );
        if allowed {
            self.phase = to;
        } else {
            log::warn!("Run {}: ignoring {:?} -> {:?}", self.run_id, self.phase, to);
        }
        allowed
    }

    /// Frames that made it through the whole adapter.
    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn record_processed(&mut self) {
        self.processed = (self.processed + 1).min(self.total_frames);
    }

    pub fn last_progress(&self) -> Option<u8> {
        self.last_progress
    }

    /// Progress after handling frame `index`: `floor(index * 100 / total)`,
    /// never below a value already returned.
    pub fn advance_progress(&mut self, index: usize) -> u8 {
        self.raise_progress(percent(index, self.total_frames))
    }

    /// Marks the run fully done.
    pub fn complete_progress(&mut self) -> u8 {
        self.raise_progress(100)
    }

    fn raise_progress(&mut self, value: u8) -> u8 {
        let value = self.last_progress.map_or(value, |last| last.max(value));
        self.last_progress = Some(value);
        value
    }
}

fn percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((index as u128 * 100) / total as u128).min(100) as u8
}
