use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use maskreel_core::control::domain::interrupt_signal::InterruptSignal;
use maskreel_core::control::infrastructure::file_interrupt_channel::FileInterruptChannel;
use maskreel_core::control::infrastructure::file_progress_reporter::FileProgressReporter;
use maskreel_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use maskreel_core::pipeline::detection_adapter::DetectionAdapter;
use maskreel_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use maskreel_core::pipeline::run_state::RunOutcome;
use maskreel_core::pipeline::segment_video_use_case::{RunRequest, SegmentVideoUseCase};
use maskreel_core::pipeline::settings::PipelineSettings;
use maskreel_core::pipeline::workspace::Workspace;
use maskreel_core::segmentation::infrastructure::box_mask_segmenter::BoxMaskSegmenter;
use maskreel_core::segmentation::infrastructure::overlay_mask_renderer::OverlayMaskRenderer;
use maskreel_core::segmentation::infrastructure::tracking_mask_propagator::TrackingMaskPropagator;
use maskreel_core::shared::constants::YOLO_MODEL_NAME;
use maskreel_core::shared::model_resolver;
use maskreel_core::video::infrastructure::directory_frame_store::DirectoryFrameStore;
use maskreel_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use maskreel_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use maskreel_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Interruptible object segmentation for videos.
#[derive(Parser)]
#[command(name = "maskreel")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Segment the given classes in a video.
    Run(RunArgs),
    /// Ask a running job to stop, or to stop detecting.
    Signal {
        run_id: String,
        #[arg(value_enum)]
        signal: SignalArg,
        /// Settings file (JSON).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the last progress a job reported.
    Progress {
        run_id: String,
        /// Settings file (JSON).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Input video.
    input: PathBuf,

    /// Output video.
    output: PathBuf,

    /// Object classes to segment (comma-separated).
    #[arg(long, value_delimiter = ',', required = true)]
    classes: Vec<String>,

    /// Identifier other commands use to address this job.
    #[arg(long)]
    run_id: String,

    /// Frames per second sent through detection.
    #[arg(long)]
    fps: f64,

    /// Settings file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output resolution relative to the input.
    #[arg(long)]
    scale: Option<f64>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Detection model file (ONNX).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Where to download the model from if it is not cached.
    #[arg(long)]
    model_url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SignalArg {
    Stop,
    DisableDetection,
}

impl From<SignalArg> for InterruptSignal {
    fn from(arg: SignalArg) -> Self {
        match arg {
            SignalArg::Stop => InterruptSignal::StopProcessing,
            SignalArg::DisableDetection => InterruptSignal::DisableDetection,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Run(args) => run_job(args),
        Command::Signal {
            run_id,
            signal,
            config,
        } => {
            let settings = PipelineSettings::load(config.as_deref())?;
            let channel = FileInterruptChannel::new(&settings.interrupt_dir, &run_id);
            channel.send(signal.into())?;
            log::info!("Sent {} to {}", InterruptSignal::from(signal), channel.path().display());
            Ok(())
        }
        Command::Progress { run_id, config } => {
            let settings = PipelineSettings::load(config.as_deref())?;
            match FileProgressReporter::read(&settings.progress_dir, &run_id)? {
                Some(percent) => println!("{percent}"),
                None => println!("no progress recorded for {run_id}"),
            }
            Ok(())
        }
    }
}

fn run_job(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.exists() {
        return Err(format!("Input file not found: {}", args.input.display()).into());
    }
    let settings = apply_overrides(PipelineSettings::load(args.config.as_deref())?, &args);
    settings.validate()?;

    let mut use_case = build_use_case(&settings, &args.run_id)?;
    let report = use_case.run(&RunRequest {
        source: args.input,
        output: args.output.clone(),
        classes: args.classes,
        run_id: args.run_id,
        desired_fps: args.fps,
    })?;

    match report.outcome {
        RunOutcome::Completed => eprintln!(
            "Wrote {} frames to {} ({} annotated)",
            report.frames_written,
            args.output.display(),
            report.annotated
        ),
        RunOutcome::Stopped => eprintln!(
            "Stopped after {} frames; partial output in {}",
            report.frames_written,
            args.output.display()
        ),
    }
    Ok(())
}

fn apply_overrides(mut settings: PipelineSettings, args: &RunArgs) -> PipelineSettings {
    if let Some(scale) = args.scale {
        settings.scale_factor = scale;
    }
    if let Some(confidence) = args.confidence {
        settings.confidence = confidence;
    }
    if let Some(model) = &args.model {
        settings.model_path = Some(model.clone());
    }
    if let Some(url) = &args.model_url {
        settings.model_url = Some(url.clone());
    }
    settings
}

fn build_use_case(
    settings: &PipelineSettings,
    run_id: &str,
) -> Result<SegmentVideoUseCase, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        settings.model_path.as_deref(),
        YOLO_MODEL_NAME,
        settings.model_url.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    let detector = OnnxYoloDetector::new(&model_path, settings.confidence)?;

    let workspace = Workspace::new(&settings.workspace_root);
    let store = DirectoryFrameStore::new(
        workspace.source_frames_dir(),
        workspace.output_frames_dir(),
        Box::new(FfmpegReader::new()),
        Box::new(ImageFileWriter::new()),
    );
    let adapter = DetectionAdapter::new(
        Box::new(detector),
        Box::new(BoxMaskSegmenter::new()),
        Box::new(TrackingMaskPropagator::new(settings.tracker_max_lost)),
        Box::new(OverlayMaskRenderer::new(settings.mask_opacity)),
        Box::new(ImageFileWriter::new()),
        workspace.clone(),
    );

    Ok(SegmentVideoUseCase::new(
        Box::new(store),
        adapter,
        Box::new(FfmpegWriter::new()),
        Box::new(FileInterruptChannel::new(&settings.interrupt_dir, run_id)),
        Box::new(FileProgressReporter::new(&settings.progress_dir, run_id)),
        Box::new(StdoutPipelineLogger::default()),
        workspace,
        settings.scale_factor,
    ))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading detection model... {downloaded} bytes");
    }
}
