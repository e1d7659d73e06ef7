/// Simplified ByteTrack multi-object tracker over class-labelled detections.
///
/// High-confidence detections are associated first, then low-confidence ones
/// fill tracks that are still unmatched. Only high-confidence detections open
/// new tracks. A detection can only continue a track of the same class.
use std::collections::HashSet;

use crate::detection::domain::detection::Detection;
use crate::shared::bbox::BoundingBox;

const HIGH_THRESH: f64 = 0.5;
const MATCH_THRESH: f64 = 0.3;

/// A track that was matched on the latest update.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub id: u32,
    pub bbox: BoundingBox,
    pub class_id: usize,
    /// Index into the detections passed to [`ByteTracker::update`].
    pub det_index: usize,
}

#[derive(Clone, Debug)]
struct TrackState {
    id: u32,
    bbox: BoundingBox,
    class_id: usize,
    frames_lost: usize,
    det_index: Option<usize>,
}

pub struct ByteTracker {
    tracks: Vec<TrackState>,
    next_id: u32,
    max_lost: usize,
}

impl ByteTracker {
    pub fn new(max_lost: usize) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            max_lost,
        }
    }

    /// Ids of every held track, including ones unmatched on the latest update.
    pub fn track_ids(&self) -> Vec<u32> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_id = 1;
    }

    pub fn update(&mut self, detections: &[Detection]) -> Vec<Track> {
        for track in &mut self.tracks {
            track.det_index = None;
        }
        let existing = self.tracks.len();

        let (high, low): (Vec<usize>, Vec<usize>) =
            (0..detections.len()).partition(|&i| detections[i].confidence >= HIGH_THRESH);

        let mut used = HashSet::new();
        self.associate(&high, detections, &mut used);
        self.associate(&low, detections, &mut used);

        for &di in &high {
            if used.contains(&di) {
                continue;
            }
            self.tracks.push(TrackState {
                id: self.next_id,
                bbox: detections[di].bbox,
                class_id: detections[di].class_id,
                frames_lost: 0,
                det_index: Some(di),
            });
            self.next_id += 1;
        }

        for track in self.tracks.iter_mut().take(existing) {
            if track.det_index.is_none() {
                track.frames_lost += 1;
            }
        }
        let max_lost = self.max_lost;
        self.tracks.retain(|t| t.frames_lost <= max_lost);

        self.tracks
            .iter()
            .filter_map(|t| {
                t.det_index.map(|det_index| Track {
                    id: t.id,
                    bbox: t.bbox,
                    class_id: t.class_id,
                    det_index,
                })
            })
            .collect()
    }

    /// Greedy IoU matching of `candidates` against tracks that are still
    /// unmatched. Pairs go best IoU first; each side is used at most once.
    fn associate(&mut self, candidates: &[usize], detections: &[Detection], used: &mut HashSet<usize>) {
        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for (ti, track) in self.tracks.iter().enumerate() {
            if track.det_index.is_some() {
                continue;
            }
            for &di in candidates {
                let det = &detections[di];
                if det.class_id != track.class_id {
                    continue;
                }
                let iou = track.bbox.iou(&det.bbox);
                if iou >= MATCH_THRESH {
                    pairs.push((ti, di, iou));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        for (ti, di, _) in pairs {
            if self.tracks[ti].det_index.is_some() || used.contains(&di) {
                continue;
            }
            let track = &mut self.tracks[ti];
            track.bbox = detections[di].bbox;
            track.frames_lost = 0;
            track.det_index = Some(di);
            used.insert(di);
        }
    }
}
