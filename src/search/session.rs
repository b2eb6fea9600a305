use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::Video;

/// Unbiased in-place permutation: walk from the back, swapping each element
/// with a uniformly chosen one at or before it.
pub fn fisher_yates<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// One search's worth of playback state: the term list, the shuffled queue
/// and the current selection. Selection is tracked by video id, so the
/// cursor survives reshuffles and removals; the index is derived on demand.
///
/// Invariant: the selection is `None` exactly when the queue is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSession {
    pub terms: Vec<String>,
    pub videos: Vec<Video>,
    selected_id: Option<String>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session with a fresh result set. The first video becomes
    /// the selection; an empty queue clears it.
    pub fn install(&mut self, terms: Vec<String>, videos: Vec<Video>) {
        self.selected_id = videos.first().map(|v| v.id.clone());
        self.terms = terms;
        self.videos = videos;
    }

    /// Position of the selected video in the queue.
    pub fn cursor(&self) -> Option<usize> {
        let selected_id = self.selected_id.as_deref()?;
        self.videos.iter().position(|v| v.id == selected_id)
    }

    pub fn selected(&self) -> Option<&Video> {
        let index = self.cursor()?;
        self.videos.get(index)
    }

    /// Select a queue member by id. Ids not in the queue are ignored.
    pub fn select(&mut self, video_id: &str) -> bool {
        if self.videos.iter().any(|v| v.id == video_id) {
            self.selected_id = Some(video_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn has_previous(&self) -> bool {
        self.cursor().is_some_and(|index| index > 0)
    }

    pub fn has_next(&self) -> bool {
        self.cursor()
            .is_some_and(|index| index + 1 < self.videos.len())
    }

    /// Move the selection one step back. No wraparound; at the front this
    /// returns `None` and the selection stays put.
    pub fn previous(&mut self) -> Option<&Video> {
        let index = self.cursor()?;
        if index == 0 {
            return None;
        }

        self.selected_id = Some(self.videos[index - 1].id.clone());
        self.videos.get(index - 1)
    }

    /// Move the selection one step forward. No wraparound.
    pub fn next(&mut self) -> Option<&Video> {
        let index = self.cursor()?;
        if index + 1 >= self.videos.len() {
            return None;
        }

        self.selected_id = Some(self.videos[index + 1].id.clone());
        self.videos.get(index + 1)
    }

    /// Re-permute the queue in place. Membership and the selected video are
    /// unchanged; only positions move.
    pub fn reshuffle<R: Rng>(&mut self, rng: &mut R) {
        fisher_yates(&mut self.videos, rng);
    }

    /// Drop the selected video from the queue and re-anchor the cursor:
    /// the element now at the old index, else the new last element, else
    /// nothing.
    pub fn remove_selected(&mut self) -> Option<Video> {
        let index = self.cursor()?;
        let removed = self.videos.remove(index);

        self.selected_id = if index < self.videos.len() {
            Some(self.videos[index].id.clone())
        } else {
            self.videos.last().map(|v| v.id.clone())
        };

        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}
