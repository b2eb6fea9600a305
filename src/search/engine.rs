use futures_util::future::try_join_all;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::session::{fisher_yates, SearchSession};
use crate::errors::AppError;
use crate::history::SearchHistoryManager;
use crate::models::Video;
use crate::providers::VideoProvider;
use crate::skiplist::SkipListManager;

/// Soft ceiling on the combined fetch across all terms.
const MAX_TOTAL_RESULTS: u32 = 50;

/// Provider-side page-size ceiling per request.
const MAX_RESULTS_PER_TERM: u32 = 20;

/// Split a raw query on commas into trimmed, non-empty terms.
pub fn parse_terms(query: &str) -> Vec<String> {
    query
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// Results requested per term: an even share of the total budget, never
/// more than the provider's page ceiling.
pub fn per_term_budget(term_count: usize) -> u32 {
    (MAX_TOTAL_RESULTS / term_count as u32).min(MAX_RESULTS_PER_TERM)
}

fn dedupe_by_id(videos: impl IntoIterator<Item = Video>) -> Vec<Video> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for video in videos {
        if seen.insert(video.id.clone()) {
            unique.push(video);
        }
    }
    unique
}

/// What a completed search looked like, for the caller's status line.
#[derive(Debug, Clone)]
pub struct SearchSummary {
    pub terms: Vec<String>,
    pub result_count: usize,
}

/// Result of an always-skip: the video that left the queue and whatever
/// the cursor re-anchored to.
#[derive(Debug, Clone)]
pub struct SkipOutcome {
    pub skipped: Video,
    pub selected: Option<Video>,
}

/// The search aggregator. Fans a multi-term query out to the provider,
/// merges and dedupes the results in term order, drops skip-listed videos,
/// shuffles, and installs the outcome as the current session.
///
/// Each search takes a generation number; a completion (or failure) whose
/// generation is no longer current is discarded so a slow response can
/// never overwrite a newer search's state.
pub struct SearchEngine {
    provider: Arc<dyn VideoProvider>,
    history: Arc<SearchHistoryManager>,
    skiplist: Arc<SkipListManager>,
    session: RwLock<SearchSession>,
    generation: AtomicU64,
}

impl SearchEngine {
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        history: Arc<SearchHistoryManager>,
        skiplist: Arc<SkipListManager>,
    ) -> Self {
        Self {
            provider,
            history,
            skiplist,
            session: RwLock::new(SearchSession::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Run a search. Returns `Ok(None)` when there was nothing to do: an
    /// empty query, or a completion superseded by a newer search.
    ///
    /// Any single term's failure fails the whole search; the session is
    /// cleared and the error propagates so the caller can surface it.
    pub async fn search(
        &self,
        query: &str,
        prefer_new: bool,
    ) -> Result<Option<SearchSummary>, AppError> {
        let query = query.trim();
        let terms = parse_terms(query);
        if terms.is_empty() {
            return Ok(None);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let budget = per_term_budget(terms.len());
        log::info!(
            "Searching {} term(s), {} results per term",
            terms.len(),
            budget
        );

        let lookups = terms
            .iter()
            .map(|term| self.provider.search(term, budget, prefer_new));

        let per_term = match try_join_all(lookups).await {
            Ok(per_term) => per_term,
            Err(e) => {
                let mut session = self.session.write();
                if self.generation.load(Ordering::SeqCst) != generation {
                    log::debug!("Dropping failure of superseded search '{}'", query);
                    return Ok(None);
                }
                session.install(terms, Vec::new());
                return Err(AppError::Provider(e.to_string()));
            }
        };

        // Flatten in term order so the first term wins duplicate ids.
        let merged = dedupe_by_id(per_term.into_iter().flatten());
        let mut videos = self.skiplist.filter(merged);
        fisher_yates(&mut videos, &mut rand::rng());

        let result_count = videos.len();
        {
            let mut session = self.session.write();
            if self.generation.load(Ordering::SeqCst) != generation {
                log::debug!("Dropping results of superseded search '{}'", query);
                return Ok(None);
            }
            session.install(terms.clone(), videos);
        }

        // The durable history write carries the final count. The manager
        // logs and swallows its own failures.
        self.history.record(query, &terms, result_count as i64, false);

        log::info!("Search for '{}' produced {} videos", query, result_count);
        Ok(Some(SearchSummary {
            terms,
            result_count,
        }))
    }

    pub fn snapshot(&self) -> SearchSession {
        self.session.read().clone()
    }

    pub fn selected(&self) -> Option<Video> {
        self.session.read().selected().cloned()
    }

    /// Select a queue member by id. Returns the newly selected video, or
    /// `None` if the id is not in the queue.
    pub fn select(&self, video_id: &str) -> Option<Video> {
        let mut session = self.session.write();
        if session.select(video_id) {
            session.selected().cloned()
        } else {
            None
        }
    }

    pub fn next(&self) -> Option<Video> {
        self.session.write().next().cloned()
    }

    pub fn previous(&self) -> Option<Video> {
        self.session.write().previous().cloned()
    }

    /// Re-permute the current queue, keeping the selection. Returns false
    /// when there is nothing to shuffle.
    pub fn reshuffle(&self) -> bool {
        let mut session = self.session.write();
        if session.is_empty() {
            return false;
        }
        session.reshuffle(&mut rand::rng());
        true
    }

    /// Permanently skip the selected video: add it to the skip list, drop
    /// it from the queue and re-anchor the cursor.
    pub fn always_skip(&self) -> Option<SkipOutcome> {
        let (skipped, selected) = {
            let mut session = self.session.write();
            let skipped = session.remove_selected()?;
            (skipped, session.selected().cloned())
        };

        self.skiplist.add(
            &skipped.id,
            Some(skipped.title.clone()),
            Some(skipped.channel_name.clone()),
        );

        Some(SkipOutcome { skipped, selected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Notify;

    fn video(id: &str, title: &str) -> Video {
        Video {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            thumbnail_url: String::new(),
            channel_name: format!("channel of {}", id),
            channel_id: String::new(),
            published_at: String::new(),
            view_count: None,
            like_count: None,
            duration: None,
        }
    }

    /// Scripted provider: fixed results per term, optional failing terms,
    /// and an optional gate that holds one term's lookup open until the
    /// test releases it.
    #[derive(Default)]
    struct MockProvider {
        results: HashMap<String, Vec<Video>>,
        failing: HashSet<String>,
        gated_term: Option<String>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl MockProvider {
        fn with_results(results: &[(&str, Vec<Video>)]) -> Self {
            Self {
                results: results
                    .iter()
                    .map(|(term, videos)| (term.to_string(), videos.clone()))
                    .collect(),
                ..Self::default()
            }
        }

        fn failing_on(mut self, term: &str) -> Self {
            self.failing.insert(term.to_string());
            self
        }

        fn gated_on(mut self, term: &str) -> Self {
            self.gated_term = Some(term.to_string());
            self
        }
    }

    #[async_trait]
    impl VideoProvider for MockProvider {
        fn id(&self) -> &str {
            "mock"
        }

        fn name(&self) -> &str {
            "Mock"
        }

        async fn search(
            &self,
            term: &str,
            _max_results: u32,
            _prefer_new: bool,
        ) -> anyhow::Result<Vec<Video>> {
            if self.gated_term.as_deref() == Some(term) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            if self.failing.contains(term) {
                anyhow::bail!("provider unavailable for '{}'", term);
            }
            Ok(self.results.get(term).cloned().unwrap_or_default())
        }
    }

    fn guest_engine(dir: &tempfile::TempDir, provider: MockProvider) -> Arc<SearchEngine> {
        let history = Arc::new(SearchHistoryManager::for_guest(LocalStore::new(dir.path())));
        let skiplist = Arc::new(SkipListManager::for_guest(LocalStore::new(dir.path())));
        Arc::new(SearchEngine::new(Arc::new(provider), history, skiplist))
    }

    fn queue_ids(engine: &SearchEngine) -> Vec<String> {
        engine
            .snapshot()
            .videos
            .iter()
            .map(|v| v.id.clone())
            .collect()
    }

    #[test]
    fn parse_terms_trims_and_drops_empties() {
        assert_eq!(parse_terms("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_terms("  solo  "), vec!["solo"]);
        assert!(parse_terms("").is_empty());
        assert!(parse_terms("  ,  , ").is_empty());
    }

    #[test]
    fn budget_shares_fifty_capped_at_twenty() {
        assert_eq!(per_term_budget(1), 20);
        assert_eq!(per_term_budget(2), 20);
        assert_eq!(per_term_budget(3), 16);
        assert_eq!(per_term_budget(5), 10);
        assert_eq!(per_term_budget(10), 5);
        assert_eq!(per_term_budget(50), 1);
    }

    #[test]
    fn dedupe_keeps_first_occurrence_and_is_idempotent() {
        let input = vec![
            video("1", "one"),
            video("2", "two"),
            video("2", "two again"),
            video("3", "three"),
        ];

        let once = dedupe_by_id(input);
        let ids: Vec<&str> = once.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(once[1].title, "two");

        let twice = dedupe_by_id(once.clone());
        let again: Vec<&str> = twice.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(again, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn merges_terms_with_first_seen_attribution() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::with_results(&[
            ("a", vec![video("1", "a1"), video("2", "a2")]),
            ("b", vec![video("2", "b2"), video("3", "b3")]),
        ]);
        let engine = guest_engine(&dir, provider);

        let summary = engine.search("a, b", false).await.unwrap().unwrap();
        assert_eq!(summary.terms, vec!["a", "b"]);
        assert_eq!(summary.result_count, 3);

        let mut ids = queue_ids(&engine);
        ids.sort_unstable();
        assert_eq!(ids, vec!["1", "2", "3"]);

        // Video 2 appears in both result lists; term "a" came first.
        let snapshot = engine.snapshot();
        let duplicate = snapshot.videos.iter().find(|v| v.id == "2").unwrap();
        assert_eq!(duplicate.title, "a2");

        // Something from the queue is selected after install.
        let selected = engine.selected().unwrap();
        assert!(ids.contains(&selected.id));
    }

    #[tokio::test]
    async fn search_records_the_query_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::with_results(&[("cats", vec![video("1", "one")])]);
        let history = Arc::new(SearchHistoryManager::for_guest(LocalStore::new(dir.path())));
        let skiplist = Arc::new(SkipListManager::for_guest(LocalStore::new(dir.path())));
        let engine = SearchEngine::new(Arc::new(provider), history.clone(), skiplist);

        engine.search(" cats ", false).await.unwrap().unwrap();

        assert_eq!(history.snapshot().full, vec!["cats"]);
    }

    #[tokio::test]
    async fn skip_listed_videos_never_enter_the_queue() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::with_results(&[(
            "a",
            vec![video("1", "one"), video("2", "two"), video("3", "three")],
        )]);
        let engine = guest_engine(&dir, provider);
        engine.skiplist.add("2", None, None);

        let summary = engine.search("a", false).await.unwrap().unwrap();
        assert_eq!(summary.result_count, 2);

        let mut ids = queue_ids(&engine);
        ids.sort_unstable();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn empty_query_is_a_silent_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::with_results(&[("a", vec![video("1", "one")])]);
        let engine = guest_engine(&dir, provider);

        engine.search("a", false).await.unwrap().unwrap();

        assert!(engine.search("   ", false).await.unwrap().is_none());
        assert!(engine.search(" , ,", false).await.unwrap().is_none());

        // The previous session is untouched.
        assert_eq!(queue_ids(&engine), vec!["1"]);
        assert_eq!(engine.snapshot().terms, vec!["a"]);
    }

    #[tokio::test]
    async fn one_failing_term_fails_the_whole_search() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::with_results(&[
            ("a", vec![video("1", "one")]),
            ("c", vec![video("3", "three")]),
        ])
        .failing_on("b");
        let engine = guest_engine(&dir, provider);

        // Seed a session to prove the failure clears it.
        engine.search("a", false).await.unwrap().unwrap();

        let err = engine.search("a, b, c", false).await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));

        let snapshot = engine.snapshot();
        assert!(snapshot.videos.is_empty());
        assert!(snapshot.selected().is_none());
        assert_eq!(snapshot.terms, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn stale_results_never_overwrite_a_newer_search() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::with_results(&[
            ("slow", vec![video("old", "stale result")]),
            ("fresh", vec![video("new", "current result")]),
        ])
        .gated_on("slow");
        let entered = provider.entered.clone();
        let release = provider.release.clone();
        let engine = guest_engine(&dir, provider);

        let slow_engine = engine.clone();
        let slow = tokio::spawn(async move { slow_engine.search("slow", false).await });

        // The first search is now parked inside the provider.
        entered.notified().await;

        engine.search("fresh", false).await.unwrap().unwrap();
        release.notify_one();

        let outcome = slow.await.unwrap().unwrap();
        assert!(outcome.is_none());
        assert_eq!(queue_ids(&engine), vec!["new"]);
        assert_eq!(engine.snapshot().terms, vec!["fresh"]);
    }

    #[tokio::test]
    async fn stale_failure_does_not_clear_a_newer_search() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::with_results(&[("fresh", vec![video("new", "current")])])
            .failing_on("doomed")
            .gated_on("doomed");
        let entered = provider.entered.clone();
        let release = provider.release.clone();
        let engine = guest_engine(&dir, provider);

        let doomed_engine = engine.clone();
        let doomed = tokio::spawn(async move { doomed_engine.search("doomed", false).await });

        entered.notified().await;
        engine.search("fresh", false).await.unwrap().unwrap();
        release.notify_one();

        // The superseded failure reports "nothing to do", not an error.
        let outcome = doomed.await.unwrap().unwrap();
        assert!(outcome.is_none());
        assert_eq!(queue_ids(&engine), vec!["new"]);
    }

    #[tokio::test]
    async fn always_skip_on_a_singleton_queue_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::with_results(&[("a", vec![video("x", "only one")])]);
        let engine = guest_engine(&dir, provider);

        engine.search("a", false).await.unwrap().unwrap();

        let outcome = engine.always_skip().unwrap();
        assert_eq!(outcome.skipped.id, "x");
        assert!(outcome.selected.is_none());

        let snapshot = engine.snapshot();
        assert!(snapshot.is_empty());
        assert!(snapshot.selected().is_none());
        assert!(engine.skiplist.is_skipped("x"));

        // Nothing selected, so a second skip is a no-op.
        assert!(engine.always_skip().is_none());
    }

    #[tokio::test]
    async fn always_skip_re_anchors_and_reshuffle_keeps_selection() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::with_results(&[(
            "a",
            vec![
                video("1", "one"),
                video("2", "two"),
                video("3", "three"),
                video("4", "four"),
            ],
        )]);
        let engine = guest_engine(&dir, provider);

        engine.search("a", false).await.unwrap().unwrap();
        let first = engine.selected().unwrap();

        let outcome = engine.always_skip().unwrap();
        assert_eq!(outcome.skipped.id, first.id);
        let reanchored = outcome.selected.unwrap();
        assert_ne!(reanchored.id, first.id);
        assert_eq!(engine.snapshot().len(), 3);

        assert!(engine.reshuffle());
        assert_eq!(engine.selected().unwrap().id, reanchored.id);
        assert_eq!(engine.snapshot().len(), 3);
    }
}
