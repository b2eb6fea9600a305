use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::messages::Lang;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Invalid theme: '{}'. Valid: light, dark", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub language: Lang,
    pub autoplay: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            language: Lang::He,
            autoplay: true,
        }
    }
}

impl Preferences {
    /// Merge semantics: fields absent from the update keep their value.
    pub fn merged(&self, update: &PreferencesUpdate) -> Preferences {
        Preferences {
            theme: update.theme.unwrap_or(self.theme),
            language: update.language.unwrap_or(self.language),
            autoplay: update.autoplay.unwrap_or(self.autoplay),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    pub theme: Option<Theme>,
    pub language: Option<Lang>,
    pub autoplay: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PreferencesRow {
    pub id: String,
    pub owner_id: String,
    pub theme: String,
    pub language: String,
    pub autoplay: i64, // SQLite uses INTEGER for BOOLEAN
    pub created_at: i64,
    pub updated_at: i64,
}

impl PreferencesRow {
    /// Unknown stored values decay to the defaults instead of failing.
    pub fn to_preferences(&self) -> Preferences {
        let defaults = Preferences::default();
        Preferences {
            theme: self.theme.parse().unwrap_or(defaults.theme),
            language: self.language.parse().unwrap_or(defaults.language),
            autoplay: self.autoplay != 0,
        }
    }
}
