//! Boundary contract with the per-camera tracker.

use std::collections::VecDeque;
use std::convert::Infallible;

use crate::rect::Rect;
use crate::reid::Embedding;

/// One object reported by a camera's tracker for one frame.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    /// Tracker-local id, stable while the track lives on this camera
    pub track_id: u64,
    /// Whether the tracker has confirmed the track
    pub confirmed: bool,
    /// Latest appearance embedding, if the tracker produced one this frame
    pub embedding: Option<Embedding>,
    /// Bounding box, passed through untouched
    pub bbox: Rect,
}

impl TrackedObject {
    /// A confirmed track with an embedding.
    pub fn new(track_id: u64, bbox: Rect, embedding: Embedding) -> Self {
        Self {
            track_id,
            confirmed: true,
            embedding: Some(embedding),
            bbox,
        }
    }

    /// A track the tracker has not confirmed yet.
    pub fn tentative(track_id: u64, bbox: Rect) -> Self {
        Self {
            track_id,
            confirmed: false,
            embedding: None,
            bbox,
        }
    }

    /// The embedding to assign with, or `None` for unconfirmed or featureless tracks.
    pub fn assignable_embedding(&self) -> Option<&Embedding> {
        self.embedding.as_ref().filter(|_| self.confirmed)
    }
}

/// Trait for per-camera tracking backends.
///
/// Implement this to feed a camera's tracker output into a
/// [`CameraWorker`](super::CameraWorker). Capture, detection and tracking
/// all happen behind this trait.
///
/// # Example
///
/// ```ignore
/// use reid_rs::{TrackSource, TrackedObject};
///
/// struct MyCamera {
///     // capture + detector + tracker
/// }
///
/// impl TrackSource for MyCamera {
///     type Error = std::io::Error;
///
///     fn next_frame(&mut self) -> Result<Option<Vec<TrackedObject>>, Self::Error> {
///         // Grab a frame, detect, track; Ok(None) once the stream ends
///         Ok(None)
///     }
/// }
/// ```
pub trait TrackSource {
    /// Error type for capture or tracking failures.
    type Error;

    /// Produce the tracked objects of the next frame.
    ///
    /// Returns `Ok(None)` when the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Vec<TrackedObject>>, Self::Error>;
}

/// Replays pre-recorded tracker output, one frame per call.
#[derive(Debug, Clone, Default)]
pub struct FrameReplay {
    frames: VecDeque<Vec<TrackedObject>>,
}

impl FrameReplay {
    pub fn new(frames: impl IntoIterator<Item = Vec<TrackedObject>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Frames not yet replayed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl TrackSource for FrameReplay {
    type Error = Infallible;

    fn next_frame(&mut self) -> Result<Option<Vec<TrackedObject>>, Self::Error> {
        Ok(self.frames.pop_front())
    }
}
