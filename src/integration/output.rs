//! Per-frame assignment outputs and the latest-frame buffer.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::rect::Rect;

/// Resolved global identity for one tracked object in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub track_id: u64,
    pub global_id: u64,
    /// Match score; `1.0` when the identity was created for this track
    pub score: f32,
    /// Whether this frame minted the identity
    pub created: bool,
    pub bbox: Rect,
}

/// Exported shape of one detection within a [`FrameRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// `[x, y, w, h]`
    pub bbox: [f32; 4],
    pub tracklet_id: u64,
    pub global_id: u64,
    pub score: f32,
}

impl From<&Assignment> for DetectionRecord {
    fn from(assignment: &Assignment) -> Self {
        Self {
            bbox: assignment.bbox.to_tlwh(),
            tracklet_id: assignment.track_id,
            global_id: assignment.global_id,
            score: assignment.score,
        }
    }
}

/// All assignments of one camera frame, ready for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub camera_name: String,
    pub frame_number: u64,
    pub detections: Vec<DetectionRecord>,
}

impl FrameRecord {
    pub fn new(camera_name: impl Into<String>, frame_number: u64, assignments: &[Assignment]) -> Self {
        Self {
            camera_name: camera_name.into(),
            frame_number,
            detections: assignments.iter().map(DetectionRecord::from).collect(),
        }
    }
}

/// Thread-safe latest-frame-per-camera buffer.
///
/// Camera workers overwrite their slot every frame; an aggregating loop
/// reads whatever is newest.
#[derive(Debug, Default)]
pub struct AssignmentBuffer {
    frames: RwLock<HashMap<String, FrameRecord>>,
}

impl AssignmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, record: FrameRecord) {
        self.frames
            .write()
            .insert(record.camera_name.clone(), record);
    }

    pub fn get(&self, camera_name: &str) -> Option<FrameRecord> {
        self.frames.read().get(camera_name).cloned()
    }

    /// Latest record of every camera, ordered by camera name.
    pub fn snapshot(&self) -> Vec<FrameRecord> {
        let mut records: Vec<FrameRecord> = self.frames.read().values().cloned().collect();
        records.sort_by(|a, b| a.camera_name.cmp(&b.camera_name));
        records
    }
}
