//! Per-camera binding of local tracks to global identities.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ReidError, Result};
use crate::reid::{Embedding, GlobalIdentityStore, TrackletConfig, TrackletState};

use super::output::Assignment;
use super::source::TrackedObject;

/// Ties one camera's local tracks to global identities.
///
/// Owns the camera's tracklet smoothers and local-to-global bindings; only
/// the [`GlobalIdentityStore`] is shared with other cameras.
pub struct CameraAssigner {
    camera_name: String,
    store: Arc<GlobalIdentityStore>,
    config: TrackletConfig,
    tracklets: HashMap<u64, TrackletState>,
    bindings: HashMap<u64, u64>,
}

impl CameraAssigner {
    /// Create the assigner for one camera.
    ///
    /// Fails if the tracklet configuration is out of range.
    pub fn new(
        camera_name: impl Into<String>,
        store: Arc<GlobalIdentityStore>,
        config: TrackletConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            camera_name: camera_name.into(),
            store,
            config,
            tracklets: HashMap::new(),
            bindings: HashMap::new(),
        })
    }

    /// Name of the camera this assigner serves.
    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    /// Global id bound to a local track, if any.
    pub fn binding(&self, track_id: u64) -> Option<u64> {
        self.bindings.get(&track_id).copied()
    }

    /// Number of local tracks with a live smoother.
    pub fn tracklet_count(&self) -> usize {
        self.tracklets.len()
    }

    /// Resolve global ids for every assignable object of one frame.
    ///
    /// Objects are handled in the order given. A track without a binding is
    /// matched with its smoothed embedding, excluding ids already taken by
    /// earlier tracks of this frame, and gets a new identity when nothing
    /// matches. Every resolved identity is then refreshed with the raw
    /// embedding. State of tracks the tracker no longer reports is dropped.
    ///
    /// A frame holding a non-finite embedding or one of the wrong length is
    /// rejected before any local or shared state changes.
    pub fn assign_frame(&mut self, objects: &[TrackedObject]) -> Result<Vec<Assignment>> {
        self.check_frame(objects)?;

        let mut used: HashSet<u64> = HashSet::new();
        let mut assignments = Vec::with_capacity(objects.len());

        for object in objects {
            let Some(raw) = object.assignable_embedding() else {
                continue;
            };

            // New smoothers are only kept once the store has accepted the track.
            let smoothed: Embedding = match self.tracklets.get_mut(&object.track_id) {
                Some(tracklet) => tracklet.update(raw.view())?.clone(),
                None => raw.clone(),
            };

            let bound = self.bindings.get(&object.track_id).copied();
            let (global_id, score, created) = match bound {
                Some(global_id) => {
                    let score = match self.store.best_similarity(global_id, smoothed.view())? {
                        Some(score) => score,
                        None => {
                            warn!(
                                camera = %self.camera_name,
                                track_id = object.track_id,
                                global_id,
                                "bound_identity_has_no_embeddings"
                            );
                            0.0
                        }
                    };
                    (global_id, score, false)
                }
                None => {
                    let (global_id, score, created) =
                        self.store.match_or_create(smoothed.view(), &used)?;
                    self.bindings.insert(object.track_id, global_id);
                    debug!(
                        camera = %self.camera_name,
                        track_id = object.track_id,
                        global_id,
                        score,
                        created,
                        "track_bound"
                    );
                    (global_id, score, created)
                }
            };

            let alpha = self.config.smoothing_factor;
            self.tracklets
                .entry(object.track_id)
                .or_insert_with(|| TrackletState::new(raw.view(), alpha));

            used.insert(global_id);
            self.store.update_frame_embedding(raw.view(), global_id)?;

            assignments.push(Assignment {
                track_id: object.track_id,
                global_id,
                score,
                created,
                bbox: object.bbox,
            });
        }

        self.drop_lost_tracks(objects);
        Ok(assignments)
    }

    /// Check every assignable embedding against the store's dimensionality,
    /// or against the first one in the frame while the store has none yet.
    fn check_frame(&self, objects: &[TrackedObject]) -> Result<()> {
        let mut expected = self.store.dimension();
        for raw in objects.iter().filter_map(TrackedObject::assignable_embedding) {
            ReidError::check_finite(raw.view())?;
            match expected {
                Some(dim) => ReidError::check_dim(dim, raw.len())?,
                None => expected = Some(raw.len()),
            }
        }
        Ok(())
    }

    fn drop_lost_tracks(&mut self, objects: &[TrackedObject]) {
        let reported: HashSet<u64> = objects.iter().map(|o| o.track_id).collect();
        self.tracklets.retain(|id, _| reported.contains(id));
        self.bindings.retain(|id, _| reported.contains(id));
    }
}
