//! The interactive shell. Owns the manager stack for one session, parses
//! command lines into actions and routes them to the search engine, the
//! history and skip lists, preferences and the player.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::database::DatabaseManager;
use crate::errors::AppError;
use crate::history::models::HistoryTier;
use crate::history::SearchHistoryManager;
use crate::messages::{Lang, Messages};
use crate::models::{
    format_duration, format_like_count, format_relative_time, format_view_count, Identity, Video,
};
use crate::player::PlayerController;
use crate::prefs::models::{PreferencesUpdate, Theme};
use crate::prefs::PreferencesManager;
use crate::providers::VideoProvider;
use crate::search::SearchEngine;
use crate::skiplist::SkipListManager;
use crate::storage::LocalStore;
use crate::youtube::YouTubeProvider;

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Search { query: String, prefer_new: bool },
    List,
    Play { number: usize },
    Next,
    Previous,
    Reshuffle,
    AlwaysSkip,
    Open,
    History,
    Forget { query: String, tier: HistoryTier },
    ClearHistory,
    Skipped,
    Unskip { video_id: String },
    ShowPrefs,
    Set { key: String, value: String },
    Help,
    Quit,
}

/// Turn one input line into an action. Command words are case-insensitive;
/// arguments keep their case. Errors are usage strings for the user.
pub fn parse_command(line: &str) -> Result<AppAction, String> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_lowercase().as_str() {
        "search" => Ok(AppAction::Search {
            query: rest.to_string(),
            prefer_new: false,
        }),
        "searchnew" => Ok(AppAction::Search {
            query: rest.to_string(),
            prefer_new: true,
        }),
        "list" => Ok(AppAction::List),
        "play" => rest
            .parse::<usize>()
            .map(|number| AppAction::Play { number })
            .map_err(|_| "Usage: play <number>".to_string()),
        "next" => Ok(AppAction::Next),
        "prev" => Ok(AppAction::Previous),
        "shuffle" => Ok(AppAction::Reshuffle),
        "skip" => Ok(AppAction::AlwaysSkip),
        "open" => Ok(AppAction::Open),
        "history" => Ok(AppAction::History),
        "forget" => {
            if rest.is_empty() {
                return Err("Usage: forget [full|single] <query>".to_string());
            }
            // An optional leading tier word; everything else is the query.
            let (tier, query) = match rest.split_once(char::is_whitespace) {
                Some((first, remainder)) => match first.parse::<HistoryTier>() {
                    Ok(tier) => (tier, remainder.trim().to_string()),
                    Err(_) => (HistoryTier::Full, rest.to_string()),
                },
                None => (HistoryTier::Full, rest.to_string()),
            };
            Ok(AppAction::Forget { query, tier })
        }
        "clearhistory" => Ok(AppAction::ClearHistory),
        "skipped" => Ok(AppAction::Skipped),
        "unskip" => {
            if rest.is_empty() {
                Err("Usage: unskip <video id>".to_string())
            } else {
                Ok(AppAction::Unskip {
                    video_id: rest.to_string(),
                })
            }
        }
        "prefs" => Ok(AppAction::ShowPrefs),
        "set" => match rest.split_once(char::is_whitespace) {
            Some((key, value)) if !value.trim().is_empty() => Ok(AppAction::Set {
                key: key.to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err("Usage: set <theme|language|autoplay> <value>".to_string()),
        },
        "help" => Ok(AppAction::Help),
        "quit" | "exit" => Ok(AppAction::Quit),
        other => Err(format!(
            "Unknown command: '{}'. Type 'help' for the command list",
            other
        )),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn truncated(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

fn print_help() {
    println!("Commands:");
    println!("  search <terms>        comma-separated multi-term search");
    println!("  searchnew <terms>     same, biased toward recent uploads");
    println!("  list                  show the current queue");
    println!("  play <number>         jump to a queue entry");
    println!("  next | prev           step through the queue");
    println!("  shuffle               reshuffle the queue");
    println!("  skip                  always-skip the current video");
    println!("  open                  open the current video in the browser");
    println!("  history               show recent searches");
    println!("  forget [full|single] <query>  drop one history entry");
    println!("  clearhistory          clear all search history");
    println!("  skipped               show the skip list");
    println!("  unskip <video id>     remove a video from the skip list");
    println!("  prefs                 show preferences");
    println!("  set <key> <value>     theme light|dark, language he|en, autoplay on|off");
    println!("  help                  this list");
    println!("  quit                  exit");
}

pub struct App {
    identity: Identity,
    engine: Arc<SearchEngine>,
    history: Arc<SearchHistoryManager>,
    skiplist: Arc<SkipListManager>,
    prefs: PreferencesManager,
    player: PlayerController,
    messages: Messages,
}

impl App {
    /// Build the manager stack for the configured identity. A database
    /// failure for an account is not fatal: the session degrades to the
    /// local store, same as a guest.
    pub async fn new(config: &Config, player: PlayerController) -> Result<Self, AppError> {
        let identity = config.identity();
        let store = LocalStore::new(&config.data_dir);

        let (history, skiplist, prefs) = match &identity {
            Identity::Account(owner_id) => {
                match DatabaseManager::new(Path::new(&config.db_path)).await {
                    Ok(db) => (
                        SearchHistoryManager::for_account(
                            owner_id.clone(),
                            db.pool.clone(),
                            store.clone(),
                        ),
                        SkipListManager::for_account(
                            owner_id.clone(),
                            db.pool.clone(),
                            store.clone(),
                        ),
                        PreferencesManager::for_account(owner_id.clone(), db.pool),
                    ),
                    Err(e) => {
                        log::warn!("Database unavailable, using the local store: {}", e);
                        (
                            SearchHistoryManager::for_guest(store.clone()),
                            SkipListManager::for_guest(store.clone()),
                            PreferencesManager::for_guest(),
                        )
                    }
                }
            }
            Identity::Guest => (
                SearchHistoryManager::for_guest(store.clone()),
                SkipListManager::for_guest(store.clone()),
                PreferencesManager::for_guest(),
            ),
        };

        let history = Arc::new(history);
        let skiplist = Arc::new(skiplist);
        let provider: Arc<dyn VideoProvider> =
            Arc::new(YouTubeProvider::new(config.api_key().unwrap_or_default()));
        let engine = Arc::new(SearchEngine::new(provider, history.clone(), skiplist.clone()));

        history.load().await;
        skiplist.load().await;
        let initial = prefs.load().await;

        Ok(Self {
            identity,
            engine,
            history,
            skiplist,
            prefs,
            player,
            messages: Messages::new(initial.language),
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Read commands from stdin until quit or EOF.
    pub async fn run(&mut self) -> Result<(), AppError> {
        match &self.identity {
            Identity::Account(id) => log::info!("Session for account {}", id),
            Identity::Guest => log::info!("Guest session, everything stays on this machine"),
        }
        println!("{}", self.messages.search_prompt());
        println!("Type 'help' for the command list.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_command(line) {
                Ok(action) => {
                    if self.handle_action(action).await {
                        break;
                    }
                }
                Err(message) => println!("{}", message),
            }
        }
        Ok(())
    }

    /// Execute one action. Returns true when the app should exit.
    pub async fn handle_action(&mut self, action: AppAction) -> bool {
        match action {
            AppAction::Search { query, prefer_new } => self.run_search(&query, prefer_new).await,
            AppAction::List => self.print_queue(),
            AppAction::Play { number } => self.play_entry(number),
            AppAction::Next => {
                if let Some(video) = self.engine.next() {
                    self.show_selection(&video);
                }
            }
            AppAction::Previous => {
                if let Some(video) = self.engine.previous() {
                    self.show_selection(&video);
                }
            }
            AppAction::Reshuffle => {
                if self.engine.reshuffle() {
                    println!("{}", self.messages.reshuffle());
                    self.print_queue();
                }
            }
            AppAction::AlwaysSkip => self.skip_current(),
            AppAction::Open => match self.engine.selected() {
                Some(video) => self.player.create(&video),
                None => println!("{}", self.messages.no_results_yet()),
            },
            AppAction::History => self.print_history(),
            AppAction::Forget { query, tier } => self.history.remove(&query, tier),
            AppAction::ClearHistory => {
                self.history.clear();
                println!("{}", self.messages.clear_all());
            }
            AppAction::Skipped => self.print_skip_list(),
            AppAction::Unskip { video_id } => self.skiplist.remove(&video_id),
            AppAction::ShowPrefs => self.print_prefs(),
            AppAction::Set { key, value } => self.apply_set(&key, &value).await,
            AppAction::Help => print_help(),
            AppAction::Quit => {
                self.player.destroy();
                return true;
            }
        }
        false
    }

    async fn run_search(&mut self, query: &str, prefer_new: bool) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        // Instant entry in the history list; the engine follows up with the
        // durable write once the final count is known.
        self.history.record(query, &[], 0, true);

        match self.engine.search(query, prefer_new).await {
            Ok(Some(summary)) => {
                println!("{}", self.messages.results_header(summary.result_count));
                self.print_queue();
                self.maybe_autoplay();
            }
            Ok(None) => {}
            Err(e) => println!("{} ({})", self.messages.search_failed(), e),
        }
    }

    fn play_entry(&mut self, number: usize) {
        let snapshot = self.engine.snapshot();
        let target = number
            .checked_sub(1)
            .and_then(|index| snapshot.videos.get(index))
            .map(|video| video.id.clone());

        match target.and_then(|id| self.engine.select(&id)) {
            Some(video) => self.show_selection(&video),
            None => println!("No queue entry {}", number),
        }
    }

    fn skip_current(&mut self) {
        let Some(outcome) = self.engine.always_skip() else {
            println!("{}", self.messages.no_results_yet());
            return;
        };

        if self.player.current_video_id() == Some(outcome.skipped.id.as_str()) {
            self.player.destroy();
        }
        println!("{}", self.messages.added_to_skip_list(&outcome.skipped.title));

        match outcome.selected {
            Some(video) => self.show_selection(&video),
            None => println!("{}", self.messages.no_results_yet()),
        }
    }

    async fn apply_set(&mut self, key: &str, value: &str) {
        let mut update = PreferencesUpdate::default();
        match key.to_lowercase().as_str() {
            "theme" => match value.parse::<Theme>() {
                Ok(theme) => update.theme = Some(theme),
                Err(message) => return println!("{}", message),
            },
            "language" => match value.parse::<Lang>() {
                Ok(language) => update.language = Some(language),
                Err(message) => return println!("{}", message),
            },
            "autoplay" => match parse_bool(value) {
                Some(autoplay) => update.autoplay = Some(autoplay),
                None => return println!("Invalid autoplay value: '{}'. Valid: on, off", value),
            },
            other => {
                return println!(
                    "Unknown preference: '{}'. Valid: theme, language, autoplay",
                    other
                )
            }
        }

        let merged = self.prefs.update(update).await;
        self.messages = Messages::new(merged.language);
    }

    fn print_queue(&self) {
        let snapshot = self.engine.snapshot();
        if snapshot.is_empty() {
            println!("{}", self.messages.no_results_yet());
            return;
        }
        let cursor = snapshot.cursor();
        for (index, video) in snapshot.videos.iter().enumerate() {
            let marker = if cursor == Some(index) { ">" } else { " " };
            println!("{} {:>2}. {}", marker, index + 1, self.describe(video));
        }
    }

    fn print_history(&self) {
        let snapshot = self.history.snapshot();
        println!("{}", self.messages.recent_searches());
        for query in &snapshot.full {
            println!("  {}", query);
        }
        if !snapshot.single.is_empty() {
            println!("{}", self.messages.single_terms());
            for term in &snapshot.single {
                println!("  {}", term);
            }
        }
    }

    fn print_skip_list(&self) {
        let snapshot = self.skiplist.snapshot();
        println!("{}", self.messages.skip_list_header());
        if snapshot.entries.is_empty() {
            // No metadata rows, only bare ids.
            for id in &snapshot.ids {
                println!("  {}", id);
            }
        } else {
            for entry in &snapshot.entries {
                let title = entry.video_title.as_deref().unwrap_or("-");
                let channel = entry.channel_name.as_deref().unwrap_or("-");
                println!("  {} | {} | {}", entry.video_id, title, channel);
            }
        }
    }

    fn print_prefs(&self) {
        let prefs = self.prefs.current();
        println!("theme = {}", prefs.theme);
        println!("language = {}", prefs.language);
        println!("autoplay = {}", prefs.autoplay);
    }

    /// Print the newly selected video and, when autoplay is on, hand it to
    /// the player.
    fn show_selection(&mut self, video: &Video) {
        println!("> {}", self.describe(video));

        let mut details = Vec::new();
        let published = format_relative_time(&video.published_at, self.messages.lang());
        if !published.is_empty() {
            details.push(published);
        }
        if video.like_count.is_some() {
            details.push(self.messages.likes(&format_like_count(video.like_count)));
        }
        if !details.is_empty() {
            println!("  {}", details.join(" | "));
        }

        let description = video.description.trim();
        if description.is_empty() {
            println!("  {}", self.messages.no_description());
        } else if let Some(line) = description.lines().find(|l| !l.trim().is_empty()) {
            println!("  {}", truncated(line.trim(), 120));
        }

        self.maybe_autoplay();
    }

    fn maybe_autoplay(&mut self) {
        if !self.prefs.current().autoplay {
            return;
        }
        if let Some(video) = self.engine.selected() {
            self.player.create(&video);
        }
    }

    fn describe(&self, video: &Video) -> String {
        let mut line = video.title.clone();
        let duration = format_duration(video.duration.as_deref());
        if !duration.is_empty() {
            line.push_str(&format!(" [{}]", duration));
        }
        line.push_str(&format!(" | {}", video.channel_name));
        if video.view_count.is_some() {
            line.push_str(&format!(
                " | {}",
                format_view_count(video.view_count, self.messages.lang())
            ));
        }
        line
    }
}
