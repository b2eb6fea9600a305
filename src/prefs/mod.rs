pub mod models;

use chrono::Utc;
use parking_lot::RwLock;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Identity;
use models::{Preferences, PreferencesRow, PreferencesUpdate};

/// Per-owner preferences with merge-upsert semantics. Accounts persist to
/// the database; guests hold session-only defaults, since the original
/// stored preferences for signed-in users exclusively.
pub struct PreferencesManager {
    identity: Identity,
    pool: Option<Pool<Sqlite>>,
    state: RwLock<Preferences>,
}

impl PreferencesManager {
    pub fn for_account(owner_id: String, pool: Pool<Sqlite>) -> Self {
        Self {
            identity: Identity::Account(owner_id),
            pool: Some(pool),
            state: RwLock::new(Preferences::default()),
        }
    }

    pub fn for_guest() -> Self {
        Self {
            identity: Identity::Guest,
            pool: None,
            state: RwLock::new(Preferences::default()),
        }
    }

    pub fn current(&self) -> Preferences {
        *self.state.read()
    }

    /// Populate from the database. A missing row or a read failure both
    /// come back as the documented defaults.
    pub async fn load(&self) -> Preferences {
        let prefs = match self.fetch().await {
            Ok(Some(prefs)) => prefs,
            Ok(None) => Preferences::default(),
            Err(e) => {
                log::warn!("Failed to load preferences, using defaults: {}", e);
                Preferences::default()
            }
        };

        *self.state.write() = prefs;
        prefs
    }

    async fn fetch(&self) -> Result<Option<Preferences>, AppError> {
        let Some(pool) = &self.pool else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, PreferencesRow>(
            "SELECT id, owner_id, theme, language, autoplay, created_at, updated_at
             FROM user_preferences
             WHERE owner_id = ?",
        )
        .bind(self.identity.owner_id().unwrap_or_default())
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| r.to_preferences()))
    }

    /// Apply a partial update: provided fields replace stored ones, absent
    /// fields keep their value. The merged result applies in memory even
    /// when the write fails (which is only logged).
    pub async fn update(&self, update: PreferencesUpdate) -> Preferences {
        let merged = self.state.read().merged(&update);
        *self.state.write() = merged;

        if let Err(e) = self.persist(merged).await {
            log::warn!("Failed to save preferences: {}", e);
        }

        merged
    }

    async fn persist(&self, prefs: Preferences) -> Result<(), AppError> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        let owner_id = self.identity.owner_id().unwrap_or_default();
        let now = Utc::now().timestamp();

        let updated = sqlx::query(
            "UPDATE user_preferences
             SET theme = ?, language = ?, autoplay = ?, updated_at = ?
             WHERE owner_id = ?",
        )
        .bind(prefs.theme.to_string())
        .bind(prefs.language.to_string())
        .bind(prefs.autoplay)
        .bind(now)
        .bind(owner_id)
        .execute(pool)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO user_preferences (id, owner_id, theme, language, autoplay, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(owner_id)
            .bind(prefs.theme.to_string())
            .bind(prefs.language.to_string())
            .bind(prefs.autoplay)
            .bind(now)
            .bind(now)
            .execute(pool)
            .await?;
        }

        Ok(())
    }
}
