pub mod instance_segmenter;
pub mod mask;
pub mod mask_propagator;
pub mod mask_renderer;
