//! User-facing strings. The original UI ships in Hebrew; English is kept as
//! a fallback so the language preference actually switches something.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    He,
    En,
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lang::He => write!(f, "he"),
            Lang::En => write!(f, "en"),
        }
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "he" => Ok(Lang::He),
            "en" => Ok(Lang::En),
            _ => Err(format!("Invalid language: '{}'. Valid: he, en", s)),
        }
    }
}

/// All the fixed UI strings, selected by language.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    lang: Lang,
}

impl Messages {
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn search_failed(&self) -> &'static str {
        match self.lang {
            Lang::He => "שגיאה בחיפוש סרטונים",
            Lang::En => "Error searching videos",
        }
    }

    pub fn search_prompt(&self) -> &'static str {
        match self.lang {
            Lang::He => "חפש סרטונים (הפרד עם פסיק לחיפוש מרובה)...",
            Lang::En => "Search videos (separate with comma for multi-search)...",
        }
    }

    pub fn results_header(&self, count: usize) -> String {
        match self.lang {
            Lang::He => format!("תוצאות חיפוש ({} סרטונים)", count),
            Lang::En => format!("Search results ({} videos)", count),
        }
    }

    pub fn no_results_yet(&self) -> &'static str {
        match self.lang {
            Lang::He => "חפש סרטונים כדי להתחיל",
            Lang::En => "Search for videos to get started",
        }
    }

    pub fn added_to_skip_list(&self, title: &str) -> String {
        match self.lang {
            Lang::He => format!("\"{}\" נוסף לרשימת הדילוג", title),
            Lang::En => format!("\"{}\" added to the skip list", title),
        }
    }

    pub fn recent_searches(&self) -> &'static str {
        match self.lang {
            Lang::He => "חיפושים אחרונים",
            Lang::En => "Recent searches",
        }
    }

    pub fn single_terms(&self) -> &'static str {
        match self.lang {
            Lang::He => "מונחים בודדים",
            Lang::En => "Single terms",
        }
    }

    pub fn clear_all(&self) -> &'static str {
        match self.lang {
            Lang::He => "נקה הכל",
            Lang::En => "Clear all",
        }
    }

    pub fn skip_list_header(&self) -> &'static str {
        match self.lang {
            Lang::He => "רשימת הדילוג",
            Lang::En => "Skip list",
        }
    }

    pub fn reshuffle(&self) -> &'static str {
        match self.lang {
            Lang::He => "ערבב מחדש",
            Lang::En => "Reshuffle",
        }
    }

    pub fn likes(&self, compact: &str) -> String {
        match self.lang {
            Lang::He => format!("{} לייקים", compact),
            Lang::En => format!("{} likes", compact),
        }
    }

    pub fn no_description(&self) -> &'static str {
        match self.lang {
            Lang::He => "אין תיאור זמין",
            Lang::En => "No description available",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_round_trips_through_str() {
        assert_eq!("he".parse::<Lang>().unwrap(), Lang::He);
        assert_eq!("EN".parse::<Lang>().unwrap(), Lang::En);
        assert_eq!(Lang::He.to_string(), "he");
        assert!("fr".parse::<Lang>().is_err());
    }

    #[test]
    fn hebrew_is_the_default_voice() {
        let m = Messages::new(Lang::He);
        assert_eq!(m.search_failed(), "שגיאה בחיפוש סרטונים");
        assert_eq!(m.results_header(3), "תוצאות חיפוש (3 סרטונים)");
    }
}
