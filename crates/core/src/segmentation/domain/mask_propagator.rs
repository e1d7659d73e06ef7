use crate::detection::domain::detection::Detection;
use crate::segmentation::domain::mask::Mask;
use crate::shared::frame::Frame;

/// Everything a propagator learns about one sampled frame.
#[derive(Clone, Debug)]
pub struct PropagationRequest<'a> {
    pub run_id: &'a str,
    /// True for the first frame of a run that reaches propagation.
    pub is_first_call: bool,
    /// Distance between sampled frames.
    pub sampling_stride: usize,
    pub frame_index: usize,
    /// Sampled frames annotated so far in this run.
    pub processed_counter: usize,
    /// `frame_index % sampling_stride`.
    pub offset_within_stride: usize,
    pub detections: &'a [Detection],
    /// One mask per detection, same order.
    pub masks: &'a [Mask],
    pub frame: &'a Frame,
}

/// Running state a propagator carries between calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropagationState {
    pub frames_seen: usize,
    /// Objects still tracked, matched or not on this frame.
    pub tracked_objects: usize,
    pub last_frame_index: Option<usize>,
}

/// Masks for the objects visible on the requested frame, keyed by a stable
/// object id. `object_ids[i]` owns `masks[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Propagation {
    pub object_ids: Vec<u32>,
    pub masks: Vec<Mask>,
    pub state: PropagationState,
}

/// Carries object identity and masks across sampled frames.
pub trait MaskPropagator: Send {
    fn propagate(
        &mut self,
        request: PropagationRequest<'_>,
    ) -> Result<Propagation, Box<dyn std::error::Error>>;
}
