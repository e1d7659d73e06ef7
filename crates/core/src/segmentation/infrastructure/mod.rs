pub mod box_mask_segmenter;
pub mod bytetrack_tracker;
pub mod overlay_mask_renderer;
pub mod tracking_mask_propagator;
