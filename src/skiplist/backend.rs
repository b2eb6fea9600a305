use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use super::models::{SkipListSnapshot, SkippedVideo};
use crate::errors::AppError;
use crate::storage::{LocalStore, SKIPPED_VIDEOS_KEY};

#[async_trait]
pub trait SkipListBackend: Send + Sync {
    async fn load(&self) -> Result<SkipListSnapshot, AppError>;

    /// Insert unless the id is already present. Returns false for the
    /// already-present case, which is a no-op rather than an error.
    async fn add(
        &self,
        video_id: &str,
        video_title: Option<&str>,
        channel_name: Option<&str>,
    ) -> Result<bool, AppError>;

    async fn remove(&self, video_id: &str) -> Result<(), AppError>;
}

pub struct DbSkipListBackend {
    pool: Pool<Sqlite>,
    owner_id: String,
}

impl DbSkipListBackend {
    pub fn new(pool: Pool<Sqlite>, owner_id: String) -> Self {
        Self { pool, owner_id }
    }
}

#[async_trait]
impl SkipListBackend for DbSkipListBackend {
    async fn load(&self) -> Result<SkipListSnapshot, AppError> {
        let entries = sqlx::query_as::<_, SkippedVideo>(
            "SELECT id, owner_id, video_id, video_title, channel_name, created_at
             FROM skipped_videos
             WHERE owner_id = ?
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(&self.owner_id)
        .fetch_all(&self.pool)
        .await?;

        let ids = entries.iter().map(|e| e.video_id.clone()).collect();
        Ok(SkipListSnapshot { ids, entries })
    }

    async fn add(
        &self,
        video_id: &str,
        video_title: Option<&str>,
        channel_name: Option<&str>,
    ) -> Result<bool, AppError> {
        let existing = sqlx::query("SELECT 1 FROM skipped_videos WHERE owner_id = ? AND video_id = ?")
            .bind(&self.owner_id)
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;

        if existing.is_some() {
            return Ok(false);
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();

        // OR IGNORE covers a concurrent insert between the check and here;
        // the unique key is (owner_id, video_id).
        sqlx::query(
            "INSERT OR IGNORE INTO skipped_videos (id, owner_id, video_id, video_title, channel_name, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&self.owner_id)
        .bind(video_id)
        .bind(video_title)
        .bind(channel_name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn remove(&self, video_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM skipped_videos WHERE owner_id = ? AND video_id = ?")
            .bind(&self.owner_id)
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Guest-mode backend: a JSON array of video ids in add order. No metadata.
pub struct LocalSkipListBackend {
    store: LocalStore,
}

impl LocalSkipListBackend {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    fn read(&self) -> Result<Vec<String>, AppError> {
        Ok(self.store.get(SKIPPED_VIDEOS_KEY)?.unwrap_or_default())
    }
}

#[async_trait]
impl SkipListBackend for LocalSkipListBackend {
    async fn load(&self) -> Result<SkipListSnapshot, AppError> {
        Ok(SkipListSnapshot {
            ids: self.read()?,
            entries: Vec::new(),
        })
    }

    async fn add(
        &self,
        video_id: &str,
        _video_title: Option<&str>,
        _channel_name: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut ids = self.read()?;
        if ids.iter().any(|id| id == video_id) {
            return Ok(false);
        }

        ids.push(video_id.to_string());
        self.store.set(SKIPPED_VIDEOS_KEY, &ids)?;
        Ok(true)
    }

    async fn remove(&self, video_id: &str) -> Result<(), AppError> {
        let mut ids = self.read()?;
        ids.retain(|id| id != video_id);
        self.store.set(SKIPPED_VIDEOS_KEY, &ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;

    async fn db_backend(dir: &tempfile::TempDir) -> DbSkipListBackend {
        let manager = DatabaseManager::new(&dir.path().join("test.db"))
            .await
            .unwrap();
        DbSkipListBackend::new(manager.pool, "user_1".to_string())
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = db_backend(&dir).await;

        let added = backend
            .add("vid1", Some("A video"), Some("Channel"))
            .await
            .unwrap();
        assert!(added);

        let added_again = backend.add("vid1", None, None).await.unwrap();
        assert!(!added_again);

        let snapshot = backend.load().await.unwrap();
        assert_eq!(snapshot.ids, vec!["vid1"]);
        assert_eq!(snapshot.entries.len(), 1);
        // The first call's metadata is kept.
        assert_eq!(snapshot.entries[0].video_title.as_deref(), Some("A video"));
    }

    #[tokio::test]
    async fn remove_deletes_only_the_given_video() {
        let dir = tempfile::tempdir().unwrap();
        let backend = db_backend(&dir).await;

        backend.add("vid1", None, None).await.unwrap();
        backend.add("vid2", None, None).await.unwrap();

        backend.remove("vid1").await.unwrap();

        let snapshot = backend.load().await.unwrap();
        assert_eq!(snapshot.ids, vec!["vid2"]);
    }

    #[tokio::test]
    async fn rows_are_scoped_to_their_owner() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DatabaseManager::new(&dir.path().join("test.db"))
            .await
            .unwrap();
        let mine = DbSkipListBackend::new(manager.pool.clone(), "user_1".to_string());
        let theirs = DbSkipListBackend::new(manager.pool, "user_2".to_string());

        mine.add("vid1", None, None).await.unwrap();
        theirs.add("vid2", None, None).await.unwrap();

        assert_eq!(mine.load().await.unwrap().ids, vec!["vid1"]);
        assert_eq!(theirs.load().await.unwrap().ids, vec!["vid2"]);
    }

    #[tokio::test]
    async fn local_backend_keeps_bare_ids_in_add_order() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalSkipListBackend::new(LocalStore::new(dir.path()));

        assert!(backend.add("vid1", Some("ignored"), None).await.unwrap());
        assert!(backend.add("vid2", None, None).await.unwrap());
        assert!(!backend.add("vid1", None, None).await.unwrap());

        let snapshot = backend.load().await.unwrap();
        assert_eq!(snapshot.ids, vec!["vid1", "vid2"]);
        assert!(snapshot.entries.is_empty());

        backend.remove("vid1").await.unwrap();
        assert_eq!(backend.load().await.unwrap().ids, vec!["vid2"]);
    }
}
