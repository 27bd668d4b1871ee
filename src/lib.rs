//! Cross-camera global identity matching.
//!
//! Each camera runs its own tracker and reports per-track appearance
//! embeddings. The [`reid::GlobalIdentityStore`] is shared by every camera
//! worker and decides whether a track belongs to an identity that is
//! already known or starts a new one.

pub mod error;
pub mod integration;
pub mod rect;
pub mod reid;

pub use error::{ReidError, Result};
pub use integration::{
    Assignment, AssignmentBuffer, CameraAssigner, CameraWorker, DetectionRecord, FrameRecord,
    FrameReplay, TrackSource, TrackedObject, WorkerError,
};
pub use rect::Rect;
pub use reid::{
    Clock, Embedding, GlobalIdentity, GlobalIdentityStore, ManualClock, MatchResult, ReidConfig,
    StoreConfig, SystemClock, TrackletConfig, TrackletState, cosine_similarity,
};
