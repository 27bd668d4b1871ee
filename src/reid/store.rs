//! Shared registry of global identities.
//!
//! Every operation runs inside one exclusive critical section, so a match
//! never observes a half-pruned or half-updated buffer and concurrent
//! creations can never hand out the same id.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use ndarray::ArrayView1;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{ReidError, Result};
use crate::reid::clock::{Clock, SystemClock};
use crate::reid::config::StoreConfig;
use crate::reid::identity::GlobalIdentity;

/// Outcome of matching an embedding against the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Matched identity, or `None` when no candidate was accepted
    pub id: Option<u64>,
    /// Best candidate score, `0.0` when there were no candidates
    pub score: f32,
}

impl MatchResult {
    fn none(score: f32) -> Self {
        Self { id: None, score }
    }

    /// Whether an identity was accepted.
    pub fn is_match(&self) -> bool {
        self.id.is_some()
    }
}

struct StoreState {
    identities: BTreeMap<u64, GlobalIdentity>,
    next_id: u64,
    dim: Option<usize>,
}

impl StoreState {
    /// Reject non-finite vectors, then fix the dimensionality on first use
    /// and reject anything else afterwards.
    fn check_embedding(&mut self, embedding: ArrayView1<'_, f32>) -> Result<()> {
        ReidError::check_finite(embedding)?;
        match self.dim {
            Some(expected) => ReidError::check_dim(expected, embedding.len()),
            None => {
                self.dim = Some(embedding.len());
                Ok(())
            }
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Process-wide registry of cross-camera identities.
///
/// Share it between camera workers with an `Arc`; all methods take `&self`.
pub struct GlobalIdentityStore {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<StoreState>,
}

impl GlobalIdentityStore {
    /// Create a store backed by the monotonic system clock.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a store that reads time from `clock`.
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, clock))
    }

    fn from_parts(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        let dim = config.embedding_dim;
        Self {
            config,
            clock,
            state: Mutex::new(StoreState {
                identities: BTreeMap::new(),
                next_id: 1,
                dim,
            }),
        }
    }

    /// Configuration the store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Embedding dimensionality, once configured or fixed by the first vector.
    pub fn dimension(&self) -> Option<usize> {
        self.state.lock().dim
    }

    /// Match an embedding against live and recently inactive identities.
    ///
    /// Prunes every buffer first, then scores each candidate not in
    /// `exclude` by its best buffered similarity. The top candidate is
    /// rejected when it leads the runner-up by less than `relative_margin`,
    /// even if it clears the threshold. On acceptance the embedding is
    /// blended into the identity with `tracklet_weight`.
    pub fn match_tracklet(
        &self,
        embedding: ArrayView1<'_, f32>,
        exclude: &HashSet<u64>,
    ) -> Result<MatchResult> {
        let mut state = self.state.lock();
        state.check_embedding(embedding)?;
        let now = self.clock.now();
        Ok(self.match_locked(&mut state, embedding, exclude, now))
    }

    /// Register a new identity seeded with `embedding` and return its id.
    pub fn create_new(&self, embedding: ArrayView1<'_, f32>) -> Result<u64> {
        let mut state = self.state.lock();
        state.check_embedding(embedding)?;
        let now = self.clock.now();
        Ok(Self::create_locked(&mut state, embedding, now))
    }

    /// Match, and create a new identity on a non-match, as one atomic step.
    ///
    /// Returns `(id, score, created)`. A freshly created identity reports a
    /// score of `1.0`.
    pub fn match_or_create(
        &self,
        embedding: ArrayView1<'_, f32>,
        exclude: &HashSet<u64>,
    ) -> Result<(u64, f32, bool)> {
        let mut state = self.state.lock();
        state.check_embedding(embedding)?;
        let now = self.clock.now();
        match self.match_locked(&mut state, embedding, exclude, now) {
            MatchResult {
                id: Some(id),
                score,
            } => Ok((id, score, false)),
            MatchResult { id: None, .. } => {
                Ok((Self::create_locked(&mut state, embedding, now), 1.0, true))
            }
        }
    }

    /// Blend a raw per-frame embedding into an identity with `frame_weight`.
    ///
    /// Unknown (for example evicted) ids are ignored.
    pub fn update_frame_embedding(&self, embedding: ArrayView1<'_, f32>, id: u64) -> Result<()> {
        let mut state = self.state.lock();
        state.check_embedding(embedding)?;
        let now = self.clock.now();
        match state.identities.get_mut(&id) {
            Some(identity) => {
                identity.update_embedding(
                    embedding,
                    self.config.frame_weight,
                    now,
                    self.config.max_buffer_len,
                );
                trace!(global_id = id, buffered = identity.buffer_len(), "frame_embedding_updated");
            }
            None => trace!(global_id = id, "frame_embedding_for_unknown_id"),
        }
        Ok(())
    }

    /// Best similarity between `embedding` and the buffer of identity `id`.
    ///
    /// Read-only; used for display scores of already bound tracks. `None`
    /// if the identity is unknown or its buffer is empty.
    pub fn best_similarity(&self, id: u64, embedding: ArrayView1<'_, f32>) -> Result<Option<f32>> {
        ReidError::check_finite(embedding)?;
        let state = self.state.lock();
        if let Some(expected) = state.dim {
            ReidError::check_dim(expected, embedding.len())?;
        }
        Ok(state
            .identities
            .get(&id)
            .and_then(|identity| identity.best_similarity(embedding)))
    }

    /// Prune expired embeddings from every identity, evicting if configured.
    pub fn prune(&self) {
        let mut state = self.state.lock();
        let now = self.clock.now();
        self.prune_locked(&mut state, now);
    }

    /// Snapshot of one identity.
    pub fn identity(&self, id: u64) -> Option<GlobalIdentity> {
        self.state.lock().identities.get(&id).cloned()
    }

    /// Number of resident identities, inactive ones included.
    pub fn len(&self) -> usize {
        self.state.lock().identities.len()
    }

    /// `true` when no identity is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of identities that are not inactive.
    pub fn active_count(&self) -> usize {
        self.state
            .lock()
            .identities
            .values()
            .filter(|identity| !identity.is_inactive())
            .count()
    }

    fn match_locked(
        &self,
        state: &mut StoreState,
        embedding: ArrayView1<'_, f32>,
        exclude: &HashSet<u64>,
        now: f64,
    ) -> MatchResult {
        self.prune_locked(state, now);

        // An identity with an empty buffer has nothing to compare against,
        // so it only counts as a candidate once it holds an embedding again.
        let mut candidates: Vec<(u64, f32)> = state
            .identities
            .values()
            .filter(|identity| !exclude.contains(&identity.id()))
            .filter(|identity| identity.is_matchable(self.config.inactive_age_seconds, now))
            .filter_map(|identity| {
                identity
                    .best_similarity(embedding)
                    .map(|score| (identity.id(), score))
            })
            .collect();

        if candidates.is_empty() {
            return MatchResult::none(0.0);
        }

        // Stable sort keeps lower ids first on ties.
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        let (best_id, best_score) = candidates[0];

        if let Some(&(runner_up, runner_up_score)) = candidates.get(1) {
            if best_score - runner_up_score < self.config.relative_margin {
                debug!(
                    best_id,
                    best_score,
                    runner_up,
                    runner_up_score,
                    "ambiguous_match_rejected"
                );
                return MatchResult::none(best_score);
            }
        }

        // Overflowing inputs can score NaN, which sorts first; never accept it.
        if best_score.is_nan() || best_score < self.config.similarity_threshold {
            return MatchResult::none(best_score);
        }

        if let Some(identity) = state.identities.get_mut(&best_id) {
            identity.update_embedding(
                embedding,
                self.config.tracklet_weight,
                now,
                self.config.max_buffer_len,
            );
        }
        debug!(global_id = best_id, score = best_score, "tracklet_matched");
        MatchResult {
            id: Some(best_id),
            score: best_score,
        }
    }

    fn create_locked(state: &mut StoreState, embedding: ArrayView1<'_, f32>, now: f64) -> u64 {
        let id = state.allocate_id();
        state
            .identities
            .insert(id, GlobalIdentity::new(id, embedding, now));
        debug!(global_id = id, "global_identity_created");
        id
    }

    fn prune_locked(&self, state: &mut StoreState, now: f64) {
        for identity in state.identities.values_mut() {
            identity.prune_old(self.config.max_age_seconds, now);
        }

        if let Some(retention) = self.config.eviction_age_seconds {
            state.identities.retain(|&id, identity| {
                let keep = !identity.is_inactive() || now - identity.last_seen() <= retention;
                if !keep {
                    debug!(global_id = id, last_seen = identity.last_seen(), "global_identity_evicted");
                }
                keep
            });
        }
    }
}

impl Default for GlobalIdentityStore {
    fn default() -> Self {
        Self::from_parts(StoreConfig::default(), Arc::new(SystemClock::new()))
    }
}

impl std::fmt::Debug for GlobalIdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalIdentityStore")
            .field("config", &self.config)
            .field("identities", &self.len())
            .finish()
    }
}
