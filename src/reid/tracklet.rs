//! Per-track exponential smoothing of appearance embeddings.

use ndarray::ArrayView1;

use crate::error::{ReidError, Result};
use crate::reid::similarity::Embedding;

/// Smoothed embedding for one local track on one camera.
///
/// Owned by a single camera worker, so no locking is involved.
#[derive(Debug, Clone)]
pub struct TrackletState {
    smoothed: Embedding,
    alpha: f32,
}

impl TrackletState {
    /// Start a tracklet from its first confirmed observation.
    pub fn new(embedding: ArrayView1<'_, f32>, alpha: f32) -> Self {
        Self {
            smoothed: embedding.to_owned(),
            alpha,
        }
    }

    /// Blend a new raw embedding into the history and return the smoothed vector.
    ///
    /// `smoothed = alpha * smoothed + (1 - alpha) * raw`
    pub fn update(&mut self, embedding: ArrayView1<'_, f32>) -> Result<&Embedding> {
        ReidError::check_dim(self.smoothed.len(), embedding.len())?;
        let alpha = self.alpha;
        self.smoothed
            .zip_mut_with(&embedding, |s, &raw| *s = alpha * *s + (1.0 - alpha) * raw);
        Ok(&self.smoothed)
    }

    /// Current smoothed embedding.
    pub fn smoothed(&self) -> &Embedding {
        &self.smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_first_observation_is_copied() {
        let mut raw = array![1.0_f32, 2.0];
        let state = TrackletState::new(raw.view(), 0.9);
        raw[0] = 100.0;
        assert_eq!(state.smoothed(), &array![1.0_f32, 2.0]);
    }

    #[test]
    fn test_ema_update() {
        let mut state = TrackletState::new(array![1.0_f32, 0.0].view(), 0.9);
        let smoothed = state.update(array![0.0_f32, 1.0].view()).unwrap();
        assert!((smoothed[0] - 0.9).abs() < 1e-6);
        assert!((smoothed[1] - 0.1).abs() < 1e-6);

        let smoothed = state.update(array![0.0_f32, 1.0].view()).unwrap();
        assert!((smoothed[0] - 0.81).abs() < 1e-6);
        assert!((smoothed[1] - 0.19).abs() < 1e-6);
    }

    #[test]
    fn test_zero_alpha_tracks_raw() {
        let mut state = TrackletState::new(array![1.0_f32, 0.0].view(), 0.0);
        let smoothed = state.update(array![0.25_f32, 0.75].view()).unwrap();
        assert_eq!(smoothed, &array![0.25_f32, 0.75]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut state = TrackletState::new(array![1.0_f32, 0.0].view(), 0.9);
        let err = state.update(array![1.0_f32, 0.0, 0.0].view()).unwrap_err();
        assert!(matches!(
            err,
            ReidError::DimensionMismatch {
                expected: 2,
                got: 3
            }
        ));
        assert_eq!(state.smoothed(), &array![1.0_f32, 0.0]);
    }
}
