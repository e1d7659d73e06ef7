use std::path::{Path, PathBuf};

use crate::control::domain::interrupt_channel::InterruptChannel;
use crate::control::domain::interrupt_signal::InterruptSignal;
use crate::control::domain::progress_reporter::ProgressReporter;
use crate::detection::domain::class_vocabulary::ClassVocabulary;
use crate::shared::frame::Frame;
use crate::video::domain::frame_store::FrameStore;
use crate::video::domain::video_writer::VideoWriter;

use super::detection_adapter::{AnnotationContext, DetectionAdapter};
use super::error::{FrameError, PipelineError};
use super::pipeline_logger::PipelineLogger;
use super::reassembly::reassemble;
use super::run_state::{FrameOutcome, RunOutcome, RunPhase, RunState};
use super::sampling_plan::SamplingPlan;
use super::workspace::Workspace;

/// One job: segment `classes` in `source` and write the result to `output`.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    pub classes: Vec<String>,
    pub run_id: String,
    /// Rate at which frames are sampled for detection.
    pub desired_fps: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub frames_written: usize,
    pub annotated: usize,
    pub fallbacks: usize,
    pub passed_through: usize,
    pub last_progress: u8,
}

/// Which checkpoint of a frame a poll happens at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Checkpoint {
    BeforeFrame,
    AfterDetect,
}

#[derive(Clone, Copy)]
enum FrameStep {
    Written(FrameOutcome),
    /// Frame written raw, then the loop ends.
    WrittenThenStop,
}

/// Drives a run from extraction to cleanup.
///
/// Frames are handled strictly in order. Sampled frames go through the
/// [`DetectionAdapter`]; everything else, and every sampled frame the adapter
/// fails on, is written raw. The interrupt channel is polled before each
/// frame and again after a successful detection. Whatever happens, the
/// workspace is purged and `Ended` is written once the run is over.
pub struct SegmentVideoUseCase {
    store: Box<dyn FrameStore>,
    adapter: DetectionAdapter,
    writer: Box<dyn VideoWriter>,
    interrupts: Box<dyn InterruptChannel>,
    progress: Box<dyn ProgressReporter>,
    logger: Box<dyn PipelineLogger>,
    workspace: Workspace,
    scale_factor: f64,
}

#[derive(Default)]
struct Tally {
    annotated: usize,
    fallbacks: usize,
    passed_through: usize,
}

impl Tally {
    fn record(&mut self, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Annotated => self.annotated += 1,
            FrameOutcome::Fallback => self.fallbacks += 1,
            FrameOutcome::PassThrough => self.passed_through += 1,
        }
    }

    fn written(&self) -> usize {
        self.annotated + self.fallbacks + self.passed_through
    }
}

impl SegmentVideoUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Box<dyn FrameStore>,
        adapter: DetectionAdapter,
        writer: Box<dyn VideoWriter>,
        interrupts: Box<dyn InterruptChannel>,
        progress: Box<dyn ProgressReporter>,
        logger: Box<dyn PipelineLogger>,
        workspace: Workspace,
        scale_factor: f64,
    ) -> Self {
        Self {
            store,
            adapter,
            writer,
            interrupts,
            progress,
            logger,
            workspace,
            scale_factor,
        }
    }

    pub fn run(&mut self, request: &RunRequest) -> Result<RunReport, PipelineError> {
        let classes = validate(request)?;
        self.workspace.prepare()?;
        log::info!(
            "Run {}: {} -> {} [{classes}] at {} fps",
            request.run_id,
            request.source.display(),
            request.output.display(),
            request.desired_fps
        );

        let mut state = RunState::new(request.run_id.clone(), 0);
        let result = self.process(request, &classes, &mut state);

        state.advance(match &result {
            Ok(report) if report.outcome == RunOutcome::Completed => RunPhase::Completed,
            Ok(_) => RunPhase::Stopped,
            Err(_) => RunPhase::Failed,
        });
        state.advance(RunPhase::Cleanup);
        let finished = self.finish();
        state.advance(RunPhase::Done);
        self.logger.summary();

        match (result, finished) {
            (Ok(report), Ok(())) => {
                log::info!("Run {} finished: {:?}", request.run_id, report.outcome);
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), cleanup) => {
                if let Err(cleanup_err) = cleanup {
                    log::warn!("Cleanup after failed run also failed: {cleanup_err}");
                }
                log::error!("Run {} failed: {e}", request.run_id);
                Err(e)
            }
        }
    }

    fn process(
        &mut self,
        request: &RunRequest,
        classes: &ClassVocabulary,
        state: &mut RunState,
    ) -> Result<RunReport, PipelineError> {
        let metadata = self
            .store
            .extract(&request.source)
            .map_err(|e| source_error(&request.source, e))?;
        let plan = SamplingPlan::compute(metadata.total_frames, metadata.fps, request.desired_fps)?;
        let frames = self
            .store
            .list()
            .map_err(|e| source_error(&request.source, e))?;
        state.set_total_frames(frames.len());
        log::info!(
            "{} frames at {:.2} fps; sampling every {} (skip {})",
            frames.len(),
            metadata.fps,
            plan.final_skip_frames,
            plan.skip_frames
        );

        let mut tally = Tally::default();
        let mut outcome = RunOutcome::Completed;
        for (index, path) in frames.iter().enumerate() {
            match self.poll(Checkpoint::BeforeFrame) {
                InterruptSignal::StopProcessing => {
                    log::info!("Stop requested before frame {index}");
                    outcome = RunOutcome::Stopped;
                    break;
                }
                InterruptSignal::DisableDetection => self.disable_detection(state, index),
                InterruptSignal::None | InterruptSignal::Ended => {}
            }

            let frame = self
                .store
                .read(path, index)
                .map_err(|e| source_error(path, e))?;

            let step = self.handle_frame(&frame, &plan, classes, state)?;
            let frame_outcome = match step {
                FrameStep::Written(o) => o,
                FrameStep::WrittenThenStop => FrameOutcome::PassThrough,
            };
            tally.record(frame_outcome);
            self.logger.frame_outcome(frame_outcome);
            self.logger.progress(index + 1, frames.len());
            let percent = state.advance_progress(index);
            self.report_progress(percent);

            if let FrameStep::WrittenThenStop = step {
                log::info!("Stop requested after detecting frame {index}");
                outcome = RunOutcome::Stopped;
                break;
            }
        }

        let target = metadata.scaled(self.scale_factor);
        reassemble(
            self.store.as_ref(),
            self.writer.as_mut(),
            &request.output,
            &target,
        )?;

        if outcome == RunOutcome::Completed {
            let percent = state.complete_progress();
            self.report_progress(percent);
        }

        Ok(RunReport {
            outcome,
            frames_written: tally.written(),
            annotated: tally.annotated,
            fallbacks: tally.fallbacks,
            passed_through: tally.passed_through,
            last_progress: state.last_progress().unwrap_or(0),
        })
    }

    fn handle_frame(
        &mut self,
        frame: &Frame,
        plan: &SamplingPlan,
        classes: &ClassVocabulary,
        state: &mut RunState,
    ) -> Result<FrameStep, PipelineError> {
        let index = frame.index();
        if !plan.is_sampled(index) || !state.detection_enabled() {
            log::debug!("Frame {index}: pass-through");
            self.write_output(frame)?;
            return Ok(FrameStep::Written(FrameOutcome::PassThrough));
        }

        let detected = match self.adapter.detect(frame, classes, self.logger.as_mut()) {
            Ok(detected) => detected,
            Err(e) => return self.fall_back(frame, e),
        };

        match self.poll(Checkpoint::AfterDetect) {
            InterruptSignal::StopProcessing => {
                self.write_output(frame)?;
                return Ok(FrameStep::WrittenThenStop);
            }
            InterruptSignal::DisableDetection => {
                self.disable_detection(state, index);
                self.write_output(frame)?;
                return Ok(FrameStep::Written(FrameOutcome::PassThrough));
            }
            InterruptSignal::None | InterruptSignal::Ended => {}
        }

        let ctx = AnnotationContext {
            run_id: state.run_id(),
            is_first_call: state.processed() == 0,
            sampling_stride: plan.final_skip_frames,
            processed_counter: state.processed(),
            offset_within_stride: plan.offset(index),
        };
        match self
            .adapter
            .annotate(frame, &detected, &ctx, self.logger.as_mut())
        {
            // An empty track set still advanced the tracker, so the counter
            // moves; the frame itself is written raw.
            Ok(annotated) if annotated.object_ids.is_empty() => {
                state.record_processed();
                log::debug!("Frame {index}: tracker kept no objects");
                self.write_output(frame)?;
                Ok(FrameStep::Written(FrameOutcome::Fallback))
            }
            Ok(annotated) => {
                self.write_output(&annotated.frame)?;
                state.record_processed();
                log::debug!(
                    "Frame {index}: annotated {} objects ({} tracked)",
                    annotated.object_ids.len(),
                    annotated.state.tracked_objects
                );
                Ok(FrameStep::Written(FrameOutcome::Annotated))
            }
            Err(e) => self.fall_back(frame, e),
        }
    }

    fn fall_back(&mut self, frame: &Frame, err: FrameError) -> Result<FrameStep, PipelineError> {
        match &err {
            FrameError::NoDetections => log::debug!("Frame {}: no detections", frame.index()),
            FrameError::Adapter { .. } => log::warn!("Frame {}: {err}", frame.index()),
        }
        self.write_output(frame)?;
        Ok(FrameStep::Written(FrameOutcome::Fallback))
    }

    fn write_output(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        let start = std::time::Instant::now();
        self.store.write_output(frame).map_err(|e| {
            PipelineError::Reassembly(format!("cannot write output frame {}: {e}", frame.index()))
        })?;
        self.logger
            .timing("write", start.elapsed().as_secs_f64() * 1000.0);
        Ok(())
    }

    /// A read that fails counts as no signal; the next checkpoint reads again.
    fn poll(&mut self, checkpoint: Checkpoint) -> InterruptSignal {
        let signal = match self.interrupts.read() {
            Ok(signal) => signal,
            Err(e) => {
                log::warn!("Cannot read interrupt channel at {checkpoint:?}: {e}");
                return InterruptSignal::None;
            }
        };
        if signal != InterruptSignal::None {
            log::debug!("Interrupt at {checkpoint:?}: {signal}");
        }
        signal
    }

    fn disable_detection(&mut self, state: &mut RunState, index: usize) {
        if state.disable_detection() {
            self.logger
                .info(&format!("Detection disabled at frame {index}; writing raw frames"));
        }
    }

    fn report_progress(&mut self, percent: u8) {
        if let Err(e) = self.progress.report(percent) {
            log::warn!("Cannot report progress {percent}%: {e}");
        }
    }

    /// Purges the workspace and writes `Ended`. Both are attempted even if
    /// the first fails; the first error is returned.
    fn finish(&mut self) -> Result<(), PipelineError> {
        let purged = self.workspace.purge();
        let ended = self
            .interrupts
            .mark_ended()
            .map_err(|e| PipelineError::Signal(format!("end marker not written: {e}")));
        purged.and(ended)
    }
}

fn validate(request: &RunRequest) -> Result<ClassVocabulary, PipelineError> {
    if request.run_id.trim().is_empty() {
        return Err(PipelineError::InvalidRequest("run id must not be empty".into()));
    }
    if !request.desired_fps.is_finite() || request.desired_fps <= 0.0 {
        return Err(PipelineError::InvalidRequest(format!(
            "desired framerate must be positive, got {}",
            request.desired_fps
        )));
    }
    ClassVocabulary::new(&request.classes)
        .map_err(|e| PipelineError::InvalidRequest(e.to_string()))
}

fn source_error(path: &Path, err: Box<dyn std::error::Error>) -> PipelineError {
    PipelineError::SourceRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
