use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which list a history row belongs to. A FULL entry is the query exactly as
/// submitted; SINGLE entries are the individual terms extracted from a
/// multi-term query, stored separately so a reused term surfaces on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryTier {
    Full,
    Single,
}

impl HistoryTier {
    pub fn as_str(&self) -> &str {
        match self {
            HistoryTier::Full => "full",
            HistoryTier::Single => "single",
        }
    }

    /// How many deduplicated entries a read returns for this tier.
    pub fn cap(&self) -> usize {
        match self {
            HistoryTier::Full => 5,
            HistoryTier::Single => 10,
        }
    }
}

impl fmt::Display for HistoryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HistoryTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(HistoryTier::Full),
            "single" => Ok(HistoryTier::Single),
            _ => Err(format!("Invalid history tier: '{}'. Valid: full, single", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchHistoryEntry {
    pub id: String,
    pub owner_id: String,
    pub query_text: String,
    /// JSON-encoded array of the parsed terms.
    pub terms: String,
    pub result_count: i64,
    pub tier: String,
    pub created_at: i64,
}

impl SearchHistoryEntry {
    pub fn parsed_terms(&self) -> Vec<String> {
        serde_json::from_str(&self.terms).unwrap_or_default()
    }
}

/// The in-memory UI state both tiers render from, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub full: Vec<String>,
    pub single: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_round_trips_through_str() {
        assert_eq!("full".parse::<HistoryTier>().unwrap(), HistoryTier::Full);
        assert_eq!("SINGLE".parse::<HistoryTier>().unwrap(), HistoryTier::Single);
        assert!("other".parse::<HistoryTier>().is_err());
        assert_eq!(HistoryTier::Full.to_string(), "full");
    }

    #[test]
    fn caps_per_tier() {
        assert_eq!(HistoryTier::Full.cap(), 5);
        assert_eq!(HistoryTier::Single.cap(), 10);
    }

    #[test]
    fn terms_column_parses_as_json() {
        let entry = SearchHistoryEntry {
            id: "x".to_string(),
            owner_id: "o".to_string(),
            query_text: "a, b".to_string(),
            terms: r#"["a","b"]"#.to_string(),
            result_count: 3,
            tier: "full".to_string(),
            created_at: 0,
        };
        assert_eq!(entry.parsed_terms(), vec!["a".to_string(), "b".to_string()]);

        let broken = SearchHistoryEntry {
            terms: "not json".to_string(),
            ..entry
        };
        assert!(broken.parsed_terms().is_empty());
    }
}
