use std::collections::BTreeMap;

use crate::segmentation::domain::mask::Mask;
use crate::segmentation::domain::mask_propagator::{
    MaskPropagator, Propagation, PropagationRequest, PropagationState,
};
use crate::segmentation::infrastructure::bytetrack_tracker::ByteTracker;

/// Propagator that keeps object identity with a [`ByteTracker`] and the most
/// recent mask seen for each tracked object.
///
/// State resets when a new run starts or the caller flags a first call.
pub struct TrackingMaskPropagator {
    tracker: ByteTracker,
    latest: BTreeMap<u32, Mask>,
    run_id: Option<String>,
    state: PropagationState,
}

impl TrackingMaskPropagator {
    pub fn new(max_lost: usize) -> Self {
        Self {
            tracker: ByteTracker::new(max_lost),
            latest: BTreeMap::new(),
            run_id: None,
            state: PropagationState::default(),
        }
    }

    /// Latest mask recorded for `object_id`, if it is still tracked.
    pub fn latest_mask(&self, object_id: u32) -> Option<&Mask> {
        self.latest.get(&object_id)
    }

    fn reset(&mut self, run_id: &str) {
        log::debug!("Propagator reset for run {run_id}");
        self.tracker.reset();
        self.latest.clear();
        self.run_id = Some(run_id.to_string());
        self.state = PropagationState::default();
    }
}

impl MaskPropagator for TrackingMaskPropagator {
    fn propagate(
        &mut self,
        request: PropagationRequest<'_>,
    ) -> Result<Propagation, Box<dyn std::error::Error>> {
        if request.sampling_stride == 0 {
            return Err("sampling stride must be at least 1".into());
        }
        if request.masks.len() != request.detections.len() {
            return Err(format!(
                "{} masks for {} detections",
                request.masks.len(),
                request.detections.len()
            )
            .into());
        }
        let (width, height) = (request.frame.width(), request.frame.height());
        for mask in request.masks {
            mask.ensure_size(width, height)?;
        }

        if request.is_first_call || self.run_id.as_deref() != Some(request.run_id) {
            self.reset(request.run_id);
        }

        let mut tracks = self.tracker.update(request.detections);
        tracks.sort_by_key(|t| t.id);

        let mut object_ids = Vec::with_capacity(tracks.len());
        let mut masks = Vec::with_capacity(tracks.len());
        for track in &tracks {
            let mask = request.masks[track.det_index].clone();
            self.latest.insert(track.id, mask.clone());
            object_ids.push(track.id);
            masks.push(mask);
        }

        let held = self.tracker.track_ids();
        self.latest.retain(|id, _| held.contains(id));

        self.state.frames_seen += 1;
        self.state.tracked_objects = self.latest.len();
        self.state.last_frame_index = Some(request.frame_index);

        Ok(Propagation {
            object_ids,
            masks,
            state: self.state.clone(),
        })
    }
}
