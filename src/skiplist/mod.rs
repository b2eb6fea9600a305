pub mod backend;
pub mod models;

use chrono::Utc;
use parking_lot::RwLock;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Identity, Video};
use crate::storage::LocalStore;
use backend::{DbSkipListBackend, LocalSkipListBackend, SkipListBackend};
use models::{SkipListSnapshot, SkippedVideo};

/// Permanent per-identity video exclusion set.
///
/// Membership checks and filtering run against in-memory state, which is
/// updated optimistically; the backend write is a detached task. Loads fail
/// soft to the local id cache.
pub struct SkipListManager {
    identity: Identity,
    backend: Arc<dyn SkipListBackend>,
    local: Arc<LocalSkipListBackend>,
    state: RwLock<SkipListSnapshot>,
}

impl SkipListManager {
    pub fn for_account(owner_id: String, pool: Pool<Sqlite>, store: LocalStore) -> Self {
        Self {
            identity: Identity::Account(owner_id.clone()),
            backend: Arc::new(DbSkipListBackend::new(pool, owner_id)),
            local: Arc::new(LocalSkipListBackend::new(store)),
            state: RwLock::new(SkipListSnapshot::default()),
        }
    }

    pub fn for_guest(store: LocalStore) -> Self {
        let local = Arc::new(LocalSkipListBackend::new(store));
        Self {
            identity: Identity::Guest,
            backend: local.clone(),
            local,
            state: RwLock::new(SkipListSnapshot::default()),
        }
    }

    pub async fn load(&self) -> SkipListSnapshot {
        let snapshot = match self.backend.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Failed to load skip list, using local cache: {}", e);
                self.local.load().await.unwrap_or_default()
            }
        };

        *self.state.write() = snapshot.clone();
        snapshot
    }

    /// Add a video to the skip list. Returns false when it was already
    /// present (a no-op, not an error). UI state updates before the
    /// backend write resolves.
    pub fn add(
        &self,
        video_id: &str,
        video_title: Option<String>,
        channel_name: Option<String>,
    ) -> bool {
        {
            let mut state = self.state.write();
            if state.ids.iter().any(|id| id == video_id) {
                return false;
            }

            state.ids.push(video_id.to_string());
            // Provisional entry for display; replaced by the real row on
            // the next load.
            state.entries.insert(
                0,
                SkippedVideo {
                    id: Uuid::new_v4().to_string(),
                    owner_id: self.identity.owner_id().unwrap_or_default().to_string(),
                    video_id: video_id.to_string(),
                    video_title: video_title.clone(),
                    channel_name: channel_name.clone(),
                    created_at: Utc::now().timestamp(),
                },
            );
        }

        let backend = self.backend.clone();
        let video_id = video_id.to_string();
        tokio::spawn(async move {
            match backend
                .add(&video_id, video_title.as_deref(), channel_name.as_deref())
                .await
            {
                Ok(true) => {}
                Ok(false) => log::debug!("Video {} already in skip list", video_id),
                Err(e) => log::warn!("Failed to persist skipped video {}: {}", video_id, e),
            }
        });

        true
    }

    pub fn remove(&self, video_id: &str) {
        {
            let mut state = self.state.write();
            state.ids.retain(|id| id != video_id);
            state.entries.retain(|e| e.video_id != video_id);
        }

        let backend = self.backend.clone();
        let video_id = video_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = backend.remove(&video_id).await {
                log::warn!("Failed to remove skipped video {}: {}", video_id, e);
            }
        });
    }

    pub fn is_skipped(&self, video_id: &str) -> bool {
        self.state.read().ids.iter().any(|id| id == video_id)
    }

    /// Drop every video whose id is on the skip list.
    pub fn filter(&self, videos: Vec<Video>) -> Vec<Video> {
        let state = self.state.read();
        videos
            .into_iter()
            .filter(|v| !state.ids.iter().any(|id| *id == v.id))
            .collect()
    }

    pub fn snapshot(&self) -> SkipListSnapshot {
        self.state.read().clone()
    }
}
