use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SkippedVideo {
    pub id: String,
    pub owner_id: String,
    pub video_id: String,
    pub video_title: Option<String>,
    pub channel_name: Option<String>,
    pub created_at: i64,
}

/// One load's worth of skip-list state: the id list used for filtering plus
/// whatever row metadata the backend keeps. The local backend stores bare
/// ids, so `entries` is empty for guests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkipListSnapshot {
    pub ids: Vec<String>,
    pub entries: Vec<SkippedVideo>,
}
