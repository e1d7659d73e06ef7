use std::path::Path;

use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_store::FrameStore;
use crate::video::domain::video_writer::VideoWriter;

use super::error::PipelineError;

/// Encodes every output frame in the store, in index order, into `output`.
///
/// `target` supplies the output geometry and framerate. Returns the number
/// of frames encoded.
pub fn reassemble(
    store: &dyn FrameStore,
    writer: &mut dyn VideoWriter,
    output: &Path,
    target: &VideoMetadata,
) -> Result<usize, PipelineError> {
    let outputs = store
        .outputs()
        .map_err(|e| PipelineError::Reassembly(format!("cannot list output frames: {e}")))?;
    if outputs.is_empty() {
        return Err(PipelineError::Reassembly("no output frames to encode".into()));
    }

    writer
        .open(output, target)
        .map_err(|e| PipelineError::Reassembly(format!("cannot open {}: {e}", output.display())))?;

    let mut encoded = 0usize;
    for (i, path) in outputs.iter().enumerate() {
        let result = store
            .read(path, i)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))
            .and_then(|frame| {
                writer
                    .write(&frame)
                    .map_err(|e| format!("cannot encode frame {i}: {e}"))
            });
        if let Err(message) = result {
            if let Err(e) = writer.close() {
                log::warn!("Closing writer after failure: {e}");
            }
            return Err(PipelineError::Reassembly(message));
        }
        encoded += 1;
    }

    writer
        .close()
        .map_err(|e| PipelineError::Reassembly(format!("cannot finalize output: {e}")))?;
    log::info!(
        "Wrote {encoded} frames to {} ({}x{} @ {:.2} fps)",
        output.display(),
        target.width,
        target.height,
        target.fps
    );
    Ok(encoded)
}
