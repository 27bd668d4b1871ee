//! A single cross-camera identity and its embedding history.

use std::collections::VecDeque;

use ndarray::ArrayView1;

use crate::reid::similarity::{Embedding, cosine_similarity};

/// One cross-camera person as seen by the store.
///
/// Holds a time-ordered buffer of `(embedding, timestamp)` snapshots. The
/// buffer is only appended to at the current time and only trimmed from the
/// front, so timestamps stay non-decreasing.
#[derive(Debug, Clone)]
pub struct GlobalIdentity {
    id: u64,
    buffer: VecDeque<(Embedding, f64)>,
    last_seen: f64,
    inactive: bool,
}

impl GlobalIdentity {
    pub(crate) fn new(id: u64, embedding: ArrayView1<'_, f32>, now: f64) -> Self {
        let mut buffer = VecDeque::new();
        buffer.push_back((embedding.to_owned(), now));
        Self {
            id,
            buffer,
            last_seen: now,
            inactive: false,
        }
    }

    /// Global id, unique for the lifetime of the store.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Timestamp of the most recent successful update.
    pub fn last_seen(&self) -> f64 {
        self.last_seen
    }

    /// `true` once pruning has emptied the buffer.
    pub fn is_inactive(&self) -> bool {
        self.inactive
    }

    /// Number of buffered embedding snapshots.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Buffered embeddings, oldest first.
    pub fn embeddings(&self) -> impl Iterator<Item = (&Embedding, f64)> + '_ {
        self.buffer.iter().map(|(e, t)| (e, *t))
    }

    /// Nearest-neighbour score: best cosine similarity over the buffer.
    ///
    /// Returns `None` for an empty buffer.
    pub fn best_similarity(&self, embedding: ArrayView1<'_, f32>) -> Option<f32> {
        self.buffer
            .iter()
            .map(|(e, _)| cosine_similarity(embedding, e.view()))
            .reduce(f32::max)
    }

    /// Append `weight * last + (1 - weight) * embedding` at time `now`.
    ///
    /// With an empty buffer the embedding is stored as-is. Refreshes
    /// `last_seen` and clears the inactive flag. When `max_len` is set the
    /// oldest entries beyond it are dropped.
    pub(crate) fn update_embedding(
        &mut self,
        embedding: ArrayView1<'_, f32>,
        weight: f32,
        now: f64,
        max_len: Option<usize>,
    ) {
        let blended = match self.buffer.back() {
            Some((prev, _)) => {
                let mut blended = prev * weight;
                blended.scaled_add(1.0 - weight, &embedding);
                blended
            }
            None => embedding.to_owned(),
        };
        self.buffer.push_back((blended, now));
        if let Some(max_len) = max_len {
            while self.buffer.len() > max_len {
                self.buffer.pop_front();
            }
        }
        self.last_seen = now;
        self.inactive = false;
    }

    /// Drop entries older than `max_age` seconds; mark inactive if none remain.
    pub(crate) fn prune_old(&mut self, max_age: f64, now: f64) {
        // Sorted by time, so expired entries are all at the front.
        while self
            .buffer
            .front()
            .is_some_and(|(_, t)| now - *t > max_age)
        {
            self.buffer.pop_front();
        }
        if self.buffer.is_empty() {
            self.inactive = true;
        }
    }

    /// Whether the identity may still take part in matching at `now`.
    pub(crate) fn is_matchable(&self, inactive_age: f64, now: f64) -> bool {
        !self.inactive || now - self.last_seen <= inactive_age
    }
}
