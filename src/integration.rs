//! Integration module connecting per-camera trackers with the identity store.
//!
//! This module provides the tracker boundary contract, the per-camera
//! assignment policy and a worker loop that drives them for one camera.

mod assigner;
mod output;
mod source;
mod worker;

pub use assigner::CameraAssigner;
pub use output::{Assignment, AssignmentBuffer, DetectionRecord, FrameRecord};
pub use source::{FrameReplay, TrackSource, TrackedObject};
pub use worker::{CameraWorker, WorkerError};
