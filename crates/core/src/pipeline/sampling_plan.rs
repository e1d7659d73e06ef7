use super::error::PipelineError;

/// Which enumerated frames get the full detection pipeline.
///
/// Frame `i` is sampled iff `i % final_skip_frames == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingPlan {
    pub skip_frames: usize,
    pub final_skip_frames: usize,
}

impl SamplingPlan {
    /// `skip_frames = max(1, round(total * desired / source))` and
    /// `final_skip_frames = max(1, round(total / skip_frames))`, forced to 1
    /// when the desired rate is at or above the source rate.
    pub fn compute(
        total_frames: usize,
        source_fps: f64,
        desired_fps: f64,
    ) -> Result<Self, PipelineError> {
        if !source_fps.is_finite() || source_fps <= 0.0 {
            return Err(PipelineError::InvalidRequest(format!(
                "source framerate must be positive, got {source_fps}"
            )));
        }
        if !desired_fps.is_finite() || desired_fps <= 0.0 {
            return Err(PipelineError::InvalidRequest(format!(
                "desired framerate must be positive, got {desired_fps}"
            )));
        }

        let total = total_frames as f64;
        let skip_frames = ((total * desired_fps / source_fps).round() as usize).max(1);
        let final_skip_frames = if desired_fps >= source_fps {
            1
        } else {
            ((total / skip_frames as f64).round() as usize).max(1)
        };

        Ok(Self {
            skip_frames,
            final_skip_frames,
        })
    }

    pub fn is_sampled(&self, index: usize) -> bool {
        index % self.final_skip_frames == 0
    }

    /// Position of `index` inside its sampling stride.
    pub fn offset(&self, index: usize) -> usize {
        index % self.final_skip_frames
    }
}
