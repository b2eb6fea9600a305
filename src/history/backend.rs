use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;
use uuid::Uuid;

use super::models::{HistoryTier, SearchHistoryEntry};
use crate::errors::AppError;
use crate::storage::{LocalStore, SEARCH_HISTORY_KEY};

/// Rows fetched per tier before read-side dedupe. Uniqueness is defined on
/// normalized text rather than row identity, so the query over-fetches and
/// collapses duplicates until the tier cap is filled.
const FETCH_LIMIT: i64 = 50;

/// The local cache keeps at most this many queries.
const LOCAL_CAP: usize = 10;

#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Deduplicated queries for one tier, newest first, capped per tier.
    async fn load_tier(&self, tier: HistoryTier) -> Result<Vec<String>, AppError>;

    /// Touch-or-insert: refresh `created_at` when the normalized query
    /// already exists in the tier, insert a fresh row otherwise.
    async fn record(
        &self,
        query_text: &str,
        terms: &[String],
        result_count: i64,
        tier: HistoryTier,
    ) -> Result<(), AppError>;

    /// Remove entries whose `query_text` matches exactly within the tier.
    async fn remove(&self, query_text: &str, tier: HistoryTier) -> Result<(), AppError>;

    async fn clear(&self) -> Result<(), AppError>;
}

pub struct DbHistoryBackend {
    pool: Pool<Sqlite>,
    owner_id: String,
}

impl DbHistoryBackend {
    pub fn new(pool: Pool<Sqlite>, owner_id: String) -> Self {
        Self { pool, owner_id }
    }
}

#[async_trait]
impl HistoryBackend for DbHistoryBackend {
    async fn load_tier(&self, tier: HistoryTier) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query_as::<_, SearchHistoryEntry>(
            "SELECT id, owner_id, query_text, terms, result_count, tier, created_at
             FROM search_history
             WHERE owner_id = ? AND tier = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(&self.owner_id)
        .bind(tier.as_str())
        .bind(FETCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let mut seen = HashSet::new();
        let mut queries = Vec::new();
        for entry in rows {
            if seen.insert(entry.query_text.to_lowercase()) {
                queries.push(entry.query_text);
                if queries.len() >= tier.cap() {
                    break;
                }
            }
        }

        Ok(queries)
    }

    async fn record(
        &self,
        query_text: &str,
        terms: &[String],
        result_count: i64,
        tier: HistoryTier,
    ) -> Result<(), AppError> {
        let now = Utc::now().timestamp();

        let touched = sqlx::query(
            "UPDATE search_history SET created_at = ?
             WHERE owner_id = ? AND tier = ? AND lower(query_text) = lower(?)",
        )
        .bind(now)
        .bind(&self.owner_id)
        .bind(tier.as_str())
        .bind(query_text)
        .execute(&self.pool)
        .await?;

        if touched.rows_affected() == 0 {
            let id = Uuid::new_v4().to_string();
            let terms_json = serde_json::to_string(terms)?;
            sqlx::query(
                "INSERT INTO search_history (id, owner_id, query_text, terms, result_count, tier, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&self.owner_id)
            .bind(query_text)
            .bind(terms_json)
            .bind(result_count)
            .bind(tier.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn remove(&self, query_text: &str, tier: HistoryTier) -> Result<(), AppError> {
        sqlx::query(
            "DELETE FROM search_history WHERE owner_id = ? AND tier = ? AND query_text = ?",
        )
        .bind(&self.owner_id)
        .bind(tier.as_str())
        .bind(query_text)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM search_history WHERE owner_id = ?")
            .bind(&self.owner_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Guest-mode backend: a JSON array of query strings, newest first, FULL
/// tier only. SINGLE-tier calls are accepted and dropped.
pub struct LocalHistoryBackend {
    store: LocalStore,
}

impl LocalHistoryBackend {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    fn read(&self) -> Result<Vec<String>, AppError> {
        Ok(self.store.get(SEARCH_HISTORY_KEY)?.unwrap_or_default())
    }
}

#[async_trait]
impl HistoryBackend for LocalHistoryBackend {
    async fn load_tier(&self, tier: HistoryTier) -> Result<Vec<String>, AppError> {
        match tier {
            HistoryTier::Full => self.read(),
            HistoryTier::Single => Ok(Vec::new()),
        }
    }

    async fn record(
        &self,
        query_text: &str,
        _terms: &[String],
        _result_count: i64,
        tier: HistoryTier,
    ) -> Result<(), AppError> {
        if tier == HistoryTier::Single {
            return Ok(());
        }

        let mut queries = self.read()?;
        queries.retain(|q| q.to_lowercase() != query_text.to_lowercase());
        queries.insert(0, query_text.to_string());
        queries.truncate(LOCAL_CAP);
        self.store.set(SEARCH_HISTORY_KEY, &queries)
    }

    async fn remove(&self, query_text: &str, tier: HistoryTier) -> Result<(), AppError> {
        if tier == HistoryTier::Single {
            return Ok(());
        }

        let mut queries = self.read()?;
        queries.retain(|q| q != query_text);
        self.store.set(SEARCH_HISTORY_KEY, &queries)
    }

    async fn clear(&self) -> Result<(), AppError> {
        self.store.remove(SEARCH_HISTORY_KEY)
    }
}
