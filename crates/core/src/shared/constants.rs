/// Extensions the frame store enumerates as frames.
pub const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Extension used for every frame the pipeline writes. Lossless, so a
/// pass-through frame is pixel-identical to its source.
pub const FRAME_EXTENSION: &str = "png";

pub const FRAME_PREFIX: &str = "frame_";

/// Zero-padding width for frame file indices.
pub const FRAME_INDEX_WIDTH: usize = 6;

/// Working directories purged and recreated at the end of every run.
pub const SEGMENTED_FRAMES_DIR: &str = "segmented_frames";
pub const SOURCE_FRAMES_DIR: &str = "data";
pub const BOUNDING_BOX_DIR: &str = "bounding_box";
pub const BBOX_OUTPUT_DIR: &str = "bbox_output";
pub const INSTANCE_SEGMENTATION_DIR: &str = "instance_segmentation";
pub const INFERENCE_FRAMES_DIR: &str = "inference_frames";

pub const WORKSPACE_DIRS: &[&str] = &[
    SEGMENTED_FRAMES_DIR,
    SOURCE_FRAMES_DIR,
    BOUNDING_BOX_DIR,
    BBOX_OUTPUT_DIR,
    INSTANCE_SEGMENTATION_DIR,
    INFERENCE_FRAMES_DIR,
];

pub const INTERRUPT_FILE_PREFIX: &str = "interrupt_";
pub const PROGRESS_FILE_PREFIX: &str = "progress_";

/// Max sampled frames a track can go unmatched before the propagator drops it.
pub const TRACKER_MAX_LOST: usize = 5;

pub const YOLO_MODEL_NAME: &str = "yolo11n.onnx";
