use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::detection::domain::class_vocabulary::ClassVocabulary;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::segmentation::domain::instance_segmenter::InstanceSegmenter;
use crate::segmentation::domain::mask::Mask;
use crate::segmentation::domain::mask_propagator::{
    MaskPropagator, PropagationRequest, PropagationState,
};
use crate::segmentation::domain::mask_renderer::MaskRenderer;
use crate::shared::frame::Frame;
use crate::video::domain::frame_store::frame_file_name;
use crate::video::domain::image_writer::ImageWriter;

use super::error::{AdapterStage, FrameError};
use super::pipeline_logger::PipelineLogger;
use super::workspace::Workspace;

const BOX_COLOR: [u8; 3] = [0, 255, 0];

/// A sampled frame the detector found something in.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFrame {
    pub index: usize,
    pub detections: Vec<Detection>,
}

/// Rendered output of the full adapter for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub object_ids: Vec<u32>,
    pub state: PropagationState,
}

/// Run-level facts the propagator needs alongside each frame.
#[derive(Clone, Copy, Debug)]
pub struct AnnotationContext<'a> {
    pub run_id: &'a str,
    pub is_first_call: bool,
    pub sampling_stride: usize,
    pub processed_counter: usize,
    pub offset_within_stride: usize,
}

#[derive(Serialize)]
struct DetectionRecord<'a> {
    frame_index: usize,
    classes: &'a [String],
    detections: &'a [Detection],
}

/// Drives the detector, segmenter, propagator and renderer for one sampled
/// frame and turns every collaborator failure into a [`FrameError`].
///
/// Intermediates land in the workspace: box overlays in `bounding_box/`,
/// detections as JSON in `bbox_output/`, union masks in
/// `instance_segmentation/` and rendered frames in `inference_frames/`.
pub struct DetectionAdapter {
    detector: Box<dyn ObjectDetector>,
    segmenter: Box<dyn InstanceSegmenter>,
    propagator: Box<dyn MaskPropagator>,
    renderer: Box<dyn MaskRenderer>,
    image_writer: Box<dyn ImageWriter>,
    workspace: Workspace,
}

impl DetectionAdapter {
    pub fn new(
        detector: Box<dyn ObjectDetector>,
        segmenter: Box<dyn InstanceSegmenter>,
        propagator: Box<dyn MaskPropagator>,
        renderer: Box<dyn MaskRenderer>,
        image_writer: Box<dyn ImageWriter>,
        workspace: Workspace,
    ) -> Self {
        Self {
            detector,
            segmenter,
            propagator,
            renderer,
            image_writer,
            workspace,
        }
    }

    pub fn detect(
        &mut self,
        frame: &Frame,
        classes: &ClassVocabulary,
        logger: &mut dyn PipelineLogger,
    ) -> Result<DetectedFrame, FrameError> {
        let start = Instant::now();
        let detections = self
            .detector
            .detect(frame, classes)
            .map_err(|e| FrameError::adapter(AdapterStage::Detect, e))?;
        logger.timing(AdapterStage::Detect.as_str(), elapsed_ms(start));
        logger.metric("detections", detections.len() as f64);

        if detections.is_empty() {
            return Err(FrameError::NoDetections);
        }

        let start = Instant::now();
        let mut boxed = frame.clone();
        for det in &detections {
            boxed.outline(det.bbox.pixel_span(frame.width(), frame.height()), BOX_COLOR);
        }
        self.write_image(&self.workspace.bounding_box_dir(), &boxed)?;
        self.write_record(frame.index(), classes, &detections)?;
        logger.timing(AdapterStage::Write.as_str(), elapsed_ms(start));

        Ok(DetectedFrame {
            index: frame.index(),
            detections,
        })
    }

    /// Segment, propagate and render. `frame` must be the frame `detected`
    /// came from.
    pub fn annotate(
        &mut self,
        frame: &Frame,
        detected: &DetectedFrame,
        ctx: &AnnotationContext<'_>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<AnnotatedFrame, FrameError> {
        let start = Instant::now();
        let masks = self
            .segmenter
            .segment(frame, &detected.detections)
            .map_err(|e| FrameError::adapter(AdapterStage::Segment, e))?;
        logger.timing(AdapterStage::Segment.as_str(), elapsed_ms(start));

        let union = Mask::union(frame.width(), frame.height(), &masks)
            .map_err(|e| FrameError::adapter(AdapterStage::Segment, e))?;
        self.write_image(
            &self.workspace.instance_segmentation_dir(),
            &union.to_frame(frame.index()),
        )?;

        let start = Instant::now();
        let propagation = self
            .propagator
            .propagate(PropagationRequest {
                run_id: ctx.run_id,
                is_first_call: ctx.is_first_call,
                sampling_stride: ctx.sampling_stride,
                frame_index: frame.index(),
                processed_counter: ctx.processed_counter,
                offset_within_stride: ctx.offset_within_stride,
                detections: &detected.detections,
                masks: &masks,
                frame,
            })
            .map_err(|e| FrameError::adapter(AdapterStage::Propagate, e))?;
        logger.timing(AdapterStage::Propagate.as_str(), elapsed_ms(start));

        let start = Instant::now();
        let rendered = self
            .renderer
            .render(frame, &propagation)
            .map_err(|e| FrameError::adapter(AdapterStage::Render, e))?
            .with_index(frame.index());
        logger.timing(AdapterStage::Render.as_str(), elapsed_ms(start));

        self.write_image(&self.workspace.inference_frames_dir(), &rendered)?;

        Ok(AnnotatedFrame {
            frame: rendered,
            object_ids: propagation.object_ids,
            state: propagation.state,
        })
    }

    fn write_image(&self, dir: &Path, frame: &Frame) -> Result<PathBuf, FrameError> {
        let path = dir.join(frame_file_name(frame.index()));
        self.image_writer
            .write(&path, frame)
            .map_err(|e| FrameError::adapter(AdapterStage::Write, e))?;
        Ok(path)
    }

    fn write_record(
        &self,
        index: usize,
        classes: &ClassVocabulary,
        detections: &[Detection],
    ) -> Result<(), FrameError> {
        let record = DetectionRecord {
            frame_index: index,
            classes: classes.labels(),
            detections,
        };
        let path = self
            .workspace
            .bbox_output_dir()
            .join(frame_file_name(index))
            .with_extension("json");
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| FrameError::adapter(AdapterStage::Write, e))?;
        fs::write(&path, json).map_err(|e| FrameError::adapter(AdapterStage::Write, e))
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
