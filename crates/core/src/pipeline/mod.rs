pub mod detection_adapter;
pub mod error;
pub mod pipeline_logger;
pub mod reassembly;
pub mod run_state;
pub mod sampling_plan;
pub mod segment_video_use_case;
pub mod settings;
pub mod workspace;
