//! Configuration for the identity store and per-track smoothing.

use serde::{Deserialize, Serialize};

use crate::error::{ReidError, Result};

/// Configuration for the [`GlobalIdentityStore`](super::GlobalIdentityStore).
///
/// Fixed at construction; the store never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Minimum cosine similarity for a match to be accepted
    pub similarity_threshold: f32,
    /// Minimum lead of the best candidate over the runner-up
    pub relative_margin: f32,
    /// Embeddings older than this are pruned from an identity's buffer
    pub max_age_seconds: f64,
    /// How long an identity with an empty buffer stays matchable
    pub inactive_age_seconds: f64,
    /// History weight when a matched tracklet embedding is blended in
    pub tracklet_weight: f32,
    /// History weight when a per-frame embedding is blended in
    pub frame_weight: f32,
    /// Evict inactive identities unseen for longer than this. `None` keeps them forever.
    pub eviction_age_seconds: Option<f64>,
    /// Upper bound on buffered embeddings per identity. `None` is unbounded.
    pub max_buffer_len: Option<usize>,
    /// Embedding dimensionality. `None` adopts the length of the first vector seen.
    pub embedding_dim: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            relative_margin: 0.05,
            max_age_seconds: 60.0,
            inactive_age_seconds: 30.0,
            tracklet_weight: 0.9,
            frame_weight: 0.3,
            eviction_age_seconds: None,
            max_buffer_len: None,
            embedding_dim: None,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ReidError::invalid_config(format!(
                "similarity_threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.relative_margin.is_nan() || self.relative_margin < 0.0 {
            return Err(ReidError::invalid_config(format!(
                "relative_margin must be non-negative, got {}",
                self.relative_margin
            )));
        }
        check_weight("tracklet_weight", self.tracklet_weight)?;
        check_weight("frame_weight", self.frame_weight)?;
        check_age("max_age_seconds", self.max_age_seconds)?;
        check_age("inactive_age_seconds", self.inactive_age_seconds)?;
        if let Some(age) = self.eviction_age_seconds {
            check_age("eviction_age_seconds", age)?;
        }
        if self.max_buffer_len == Some(0) {
            return Err(ReidError::invalid_config("max_buffer_len must be at least 1"));
        }
        if self.embedding_dim == Some(0) {
            return Err(ReidError::invalid_config("embedding_dim must be at least 1"));
        }
        Ok(())
    }
}

/// Configuration for per-camera tracklet smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackletConfig {
    /// EMA weight on the smoothed history (alpha)
    pub smoothing_factor: f32,
}

impl Default for TrackletConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.9,
        }
    }
}

impl TrackletConfig {
    pub fn validate(&self) -> Result<()> {
        check_weight("smoothing_factor", self.smoothing_factor)
    }
}

/// Complete configuration surface, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReidConfig {
    pub store: StoreConfig,
    pub tracklet: TrackletConfig,
}

impl ReidConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.tracklet.validate()
    }
}

fn check_weight(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ReidError::invalid_config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn check_age(name: &str, value: f64) -> Result<()> {
    // NaN fails this comparison as well
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ReidError::invalid_config(format!(
            "{name} must be non-negative, got {value}"
        )))
    }
}
