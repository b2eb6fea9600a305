pub mod backend;
pub mod models;

use parking_lot::RwLock;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::Identity;
use crate::storage::LocalStore;
use backend::{DbHistoryBackend, HistoryBackend, LocalHistoryBackend};
use models::{HistorySnapshot, HistoryTier};

/// Cap applied to the in-memory FULL list on record. Reads re-trim to the
/// tier caps on the next load.
const UI_CAP: usize = 10;

/// Two-tier search history with optimistic in-memory state.
///
/// The UI state is mutated synchronously; the backend write runs as a
/// detached task whose failure is logged and never surfaced. Loads fail
/// soft: a broken database degrades to the local cache.
pub struct SearchHistoryManager {
    identity: Identity,
    backend: Arc<dyn HistoryBackend>,
    local: Arc<LocalHistoryBackend>,
    state: RwLock<HistorySnapshot>,
}

impl SearchHistoryManager {
    pub fn for_account(owner_id: String, pool: Pool<Sqlite>, store: LocalStore) -> Self {
        Self {
            identity: Identity::Account(owner_id.clone()),
            backend: Arc::new(DbHistoryBackend::new(pool, owner_id)),
            local: Arc::new(LocalHistoryBackend::new(store)),
            state: RwLock::new(HistorySnapshot::default()),
        }
    }

    pub fn for_guest(store: LocalStore) -> Self {
        let local = Arc::new(LocalHistoryBackend::new(store));
        Self {
            identity: Identity::Guest,
            backend: local.clone(),
            local,
            state: RwLock::new(HistorySnapshot::default()),
        }
    }

    /// Populate UI state from the active backend. Never fails: a backend
    /// error falls back to the local cache and is only logged.
    pub async fn load(&self) -> HistorySnapshot {
        let loaded = self.load_from_backend().await;
        let snapshot = match loaded {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Failed to load search history, using local cache: {}", e);
                HistorySnapshot {
                    full: self.local.load_tier(HistoryTier::Full).await.unwrap_or_default(),
                    single: Vec::new(),
                }
            }
        };

        *self.state.write() = snapshot.clone();
        snapshot
    }

    async fn load_from_backend(&self) -> Result<HistorySnapshot, AppError> {
        Ok(HistorySnapshot {
            full: self.backend.load_tier(HistoryTier::Full).await?,
            single: self.backend.load_tier(HistoryTier::Single).await?,
        })
    }

    /// Record a search. UI state updates immediately; unless `ui_only` is
    /// set, the durable write happens in the background.
    ///
    /// `ui_only` is the search-box path: instant feedback now, with the
    /// aggregator issuing the durable write once final counts are known.
    pub fn record(&self, query_text: &str, terms: &[String], result_count: i64, ui_only: bool) {
        let query_text = query_text.to_string();
        let terms = terms.to_vec();

        {
            let mut state = self.state.write();
            upsert_front(&mut state.full, &query_text, UI_CAP);
            if self.identity.is_account() && terms.len() > 1 {
                for term in &terms {
                    upsert_front(&mut state.single, term, HistoryTier::Single.cap());
                }
            }
        }

        if ui_only {
            return;
        }

        let backend = self.backend.clone();
        let record_singles = self.identity.is_account();
        tokio::spawn(async move {
            if let Err(e) =
                Self::persist(backend, record_singles, &query_text, &terms, result_count).await
            {
                log::warn!("Failed to record search history: {}", e);
            }
        });
    }

    async fn persist(
        backend: Arc<dyn HistoryBackend>,
        record_singles: bool,
        query_text: &str,
        terms: &[String],
        result_count: i64,
    ) -> Result<(), AppError> {
        backend
            .record(query_text, terms, result_count, HistoryTier::Full)
            .await?;

        if record_singles && terms.len() > 1 {
            for term in terms {
                backend
                    .record(term, std::slice::from_ref(term), result_count, HistoryTier::Single)
                    .await?;
            }
        }

        Ok(())
    }

    /// Remove one entry. Persistent removal matches the text exactly.
    pub fn remove(&self, query_text: &str, tier: HistoryTier) {
        {
            let mut state = self.state.write();
            let list = match tier {
                HistoryTier::Full => &mut state.full,
                HistoryTier::Single => &mut state.single,
            };
            list.retain(|q| q != query_text);
        }

        let backend = self.backend.clone();
        let query_text = query_text.to_string();
        tokio::spawn(async move {
            if let Err(e) = backend.remove(&query_text, tier).await {
                log::warn!("Failed to remove search history entry: {}", e);
            }
        });
    }

    pub fn clear(&self) {
        {
            let mut state = self.state.write();
            state.full.clear();
            state.single.clear();
        }

        let backend = self.backend.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.clear().await {
                log::warn!("Failed to clear search history: {}", e);
            }
        });
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        self.state.read().clone()
    }
}

fn upsert_front(list: &mut Vec<String>, value: &str, cap: usize) {
    list.retain(|item| item.to_lowercase() != value.to_lowercase());
    list.insert(0, value.to_string());
    list.truncate(cap);
}
