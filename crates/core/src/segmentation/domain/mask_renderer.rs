use crate::segmentation::domain::mask_propagator::Propagation;
use crate::shared::frame::Frame;

/// Draws propagated masks onto a frame.
pub trait MaskRenderer: Send {
    fn render(
        &self,
        frame: &Frame,
        propagation: &Propagation,
    ) -> Result<Frame, Box<dyn std::error::Error>>;
}
