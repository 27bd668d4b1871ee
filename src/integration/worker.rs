//! Per-camera worker loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, trace};

use crate::error::{ReidError, Result as ReidResult};
use crate::reid::{GlobalIdentityStore, TrackletConfig};

use super::assigner::CameraAssigner;
use super::output::{AssignmentBuffer, FrameRecord};
use super::source::TrackSource;

/// Errors that stop a camera worker.
#[derive(Error, Debug)]
pub enum WorkerError<E> {
    #[error("Track source failed: {0}")]
    Source(#[source] E),

    #[error(transparent)]
    Reid(#[from] ReidError),
}

/// Runs one camera's track -> assign -> publish loop.
///
/// Each camera gets its own worker, typically on its own thread. Workers
/// share the identity store, the output buffer and the shutdown flag.
pub struct CameraWorker<S: TrackSource> {
    source: S,
    assigner: CameraAssigner,
    output: Arc<AssignmentBuffer>,
    shutdown: Arc<AtomicBool>,
    frame_number: u64,
}

impl<S: TrackSource> CameraWorker<S> {
    /// Create a worker for one camera.
    ///
    /// Fails if the tracklet configuration is out of range.
    pub fn new(
        camera_name: impl Into<String>,
        source: S,
        store: Arc<GlobalIdentityStore>,
        config: TrackletConfig,
        output: Arc<AssignmentBuffer>,
        shutdown: Arc<AtomicBool>,
    ) -> ReidResult<Self> {
        Ok(Self {
            source,
            assigner: CameraAssigner::new(camera_name, store, config)?,
            output,
            shutdown,
            frame_number: 0,
        })
    }

    /// Name used to key this camera's output.
    pub fn camera_name(&self) -> &str {
        self.assigner.camera_name()
    }

    /// Frames processed so far.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Pull one frame from the source, assign identities and publish it.
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    pub fn process_frame(&mut self) -> Result<Option<FrameRecord>, WorkerError<S::Error>> {
        let Some(objects) = self.source.next_frame().map_err(WorkerError::Source)? else {
            return Ok(None);
        };

        let assignments = self.assigner.assign_frame(&objects)?;
        self.frame_number += 1;

        let record = FrameRecord::new(self.camera_name(), self.frame_number, &assignments);
        trace!(
            camera = %record.camera_name,
            frame = record.frame_number,
            assigned = record.detections.len(),
            "frame_assigned"
        );
        self.output.update(record.clone());
        Ok(Some(record))
    }

    /// Process frames until the shutdown flag is set or the source ends.
    ///
    /// The flag is checked once per frame. Returns the number of frames processed.
    pub fn run(&mut self) -> Result<u64, WorkerError<S::Error>> {
        info!(camera = %self.camera_name(), "camera_worker_started");
        let started_at = self.frame_number;

        while !self.shutdown.load(Ordering::SeqCst) {
            if self.process_frame()?.is_none() {
                break;
            }
        }

        let processed = self.frame_number - started_at;
        info!(camera = %self.camera_name(), frames = processed, "camera_worker_stopped");
        Ok(processed)
    }

    /// Get a reference to the camera's assigner.
    pub fn assigner(&self) -> &CameraAssigner {
        &self.assigner
    }

    /// Get a reference to the underlying track source.
    pub fn source(&self) -> &S {
        &self.source
    }
}
