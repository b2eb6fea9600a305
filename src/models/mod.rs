use crate::messages::Lang;
use serde::{Deserialize, Serialize};

/// Who the current session belongs to. Picked once at startup from config;
/// every store selects its persistence backend based on this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    Account(String),
    Guest,
}

impl Identity {
    pub fn is_account(&self) -> bool {
        matches!(self, Identity::Account(_))
    }

    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Identity::Account(id) => Some(id),
            Identity::Guest => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub channel_name: String,
    pub channel_id: String,
    /// RFC 3339 timestamp as returned by the provider.
    pub published_at: String,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    /// ISO 8601 duration (e.g. "PT3M12S").
    pub duration: Option<String>,
}

impl Video {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

fn compact_count(num: u64) -> String {
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

pub fn format_view_count(count: Option<u64>, lang: Lang) -> String {
    let compact = compact_count(count.unwrap_or(0));
    match lang {
        Lang::He => format!("{} צפיות", compact),
        Lang::En => format!("{} views", compact),
    }
}

pub fn format_like_count(count: Option<u64>) -> String {
    compact_count(count.unwrap_or(0))
}

/// Render an ISO 8601 duration as "H:MM:SS" or "M:SS".
/// Returns an empty string when the value is missing or unparseable.
pub fn format_duration(duration: Option<&str>) -> String {
    let Some(raw) = duration else {
        return String::new();
    };
    let Some(body) = raw.strip_prefix("PT") else {
        return String::new();
    };

    let (mut hours, mut minutes, mut seconds) = (0u64, 0u64, 0u64);
    let mut digits = String::new();
    for c in body.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: u64 = match digits.parse() {
            Ok(v) => v,
            Err(_) => return String::new(),
        };
        digits.clear();
        match c {
            'H' => hours = value,
            'M' => minutes = value,
            'S' => seconds = value,
            _ => return String::new(),
        }
    }

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

pub fn format_relative_time(published_at: &str, lang: Lang) -> String {
    let Ok(date) = chrono::DateTime::parse_from_rfc3339(published_at) else {
        return String::new();
    };
    let diff = chrono::Utc::now().signed_duration_since(date);
    relative_from_secs(diff.num_seconds(), lang)
}

fn relative_from_secs(diff_secs: i64, lang: Lang) -> String {
    if diff_secs < 60 {
        return match lang {
            Lang::He => "לפני פחות מדקה".to_string(),
            Lang::En => "just now".to_string(),
        };
    }

    let minutes = diff_secs / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let weeks = days / 7;
    let months = days / 30;
    let years = days / 365;

    let (count, he_unit, en_unit) = if minutes < 60 {
        (minutes, "דקות", "minutes")
    } else if hours < 24 {
        (hours, "שעות", "hours")
    } else if days < 7 {
        (days, "ימים", "days")
    } else if weeks < 4 {
        (weeks, "שבועות", "weeks")
    } else if months < 12 {
        (months, "חודשים", "months")
    } else {
        (years, "שנים", "years")
    };

    match lang {
        Lang::He => format!("לפני {} {}", count, he_unit),
        Lang::En => format!("{} {} ago", count, en_unit),
    }
}
