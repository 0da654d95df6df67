use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use mockito::Matcher;
use wiki_roll::api::{CandidateSource, CategorySource, RandomArticleSource, WikiClient};
use wiki_roll::internal::errors::SourceError;
use wiki_roll::internal::fetch_loop::{DedupFetchLoop, NoopReporter, RetryPolicy};
use wiki_roll::internal::history::HistoryStore;
use wiki_roll::internal::models::{Candidate, FetchOutcome};

/// Plays back a fixed list of responses and counts calls.
struct Scripted {
    responses: Mutex<VecDeque<Candidate>>,
    calls: AtomicU32,
}

impl Scripted {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            responses: Mutex::new(
                pages
                    .iter()
                    .map(|(id, title)| Candidate {
                        title: title.to_string(),
                        url: format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_")),
                        identifier: id.to_string(),
                    })
                    .collect(),
            ),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CandidateSource for Scripted {
    fn fetch_one(&self) -> Result<Candidate, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SourceError::Empty("script exhausted".to_string()))
    }

    fn label(&self) -> String {
        "scripted".to_string()
    }
}

fn client_for(server: &mockito::Server) -> WikiClient {
    WikiClient::new(&server.url(), "TestBot/1.0", Duration::from_secs(5)).unwrap()
}

#[test]
fn scenario_a_empty_history_accepts_first_page() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path());

    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/w/api.php")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"query":{"random":[{"id":42,"ns":0,"title":"Alpha"}]}}"#)
        .create();

    let source = RandomArticleSource::new(client_for(&server));
    let outcome =
        DedupFetchLoop::new(&source, &store, RetryPolicy::immediate(10)).run(&mut NoopReporter);

    mock.assert();
    let candidate = outcome.candidate().expect("expected success");
    assert_eq!(candidate.identifier, "42");
    assert_eq!(candidate.title, "Alpha");
    assert!(store.load().unwrap().contains("42"));
}

#[test]
fn scenario_b_duplicate_then_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path());
    store.append("42").unwrap();

    let source = Scripted::new(&[("42", "Alpha"), ("43", "Beta")]);
    let outcome =
        DedupFetchLoop::new(&source, &store, RetryPolicy::immediate(10)).run(&mut NoopReporter);

    assert_eq!(
        outcome.candidate().map(|c| c.identifier.as_str()),
        Some("43")
    );
    assert_eq!(source.calls(), 2);
    assert_eq!(
        store.load().unwrap(),
        HashSet::from(["42".to_string(), "43".to_string()])
    );
}

#[test]
fn scenario_c_only_duplicates_exhausts_budget() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path());
    store.append("1").unwrap();
    store.append("2").unwrap();
    let before = std::fs::read_to_string(store.path()).unwrap();

    let source = Scripted::new(&[("1", "One"), ("2", "Two"), ("1", "One"), ("2", "Two")]);
    let outcome =
        DedupFetchLoop::new(&source, &store, RetryPolicy::immediate(3)).run(&mut NoopReporter);

    assert_eq!(outcome, FetchOutcome::ExhaustedRetries);
    assert_eq!(source.calls(), 3);
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}

#[test]
fn scenario_d_category_redirect_identifier_is_normalized_title() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path());

    let mut server = mockito::Server::new();
    let _redirect = server
        .mock("GET", "/wiki/Special:RandomInCategory/Natural_sciences")
        .with_status(302)
        .with_header("location", "/wiki/Some_Article")
        .create();
    let _article = server
        .mock("GET", "/wiki/Some_Article")
        .with_status(200)
        .with_body("<html></html>")
        .create();

    let source = CategorySource::new(client_for(&server), "Natural_sciences");
    let outcome =
        DedupFetchLoop::new(&source, &store, RetryPolicy::immediate(5)).run(&mut NoopReporter);

    assert_eq!(
        outcome.candidate().map(|c| c.identifier.as_str()),
        Some("Some Article")
    );
    assert!(store.load().unwrap().contains("Some Article"));
}

#[test]
fn category_page_titles_are_never_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path());

    let mut server = mockito::Server::new();
    let _redirect = server
        .mock("GET", "/wiki/Special:RandomInCategory/Astronomy")
        .with_status(302)
        .with_header("location", "/wiki/Category:Stars")
        .expect(4)
        .create();
    let _category = server
        .mock("GET", "/wiki/Category:Stars")
        .with_status(200)
        .create();

    let source = CategorySource::new(client_for(&server), "Astronomy");
    let outcome =
        DedupFetchLoop::new(&source, &store, RetryPolicy::immediate(4)).run(&mut NoopReporter);

    assert_eq!(outcome, FetchOutcome::ExhaustedRetries);
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn unreachable_source_is_transient_failure_within_budget() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path());

    let client =
        WikiClient::new("http://localhost:1", "TestBot/1.0", Duration::from_secs(2)).unwrap();
    let source = RandomArticleSource::new(client);
    let outcome =
        DedupFetchLoop::new(&source, &store, RetryPolicy::immediate(2)).run(&mut NoopReporter);

    assert!(matches!(outcome, FetchOutcome::TransientFailure(_)));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn accepted_identifiers_never_repeat_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let pages = [
        ("1", "One"),
        ("2", "Two"),
        ("1", "One"),
        ("3", "Three"),
        ("2", "Two"),
        ("3", "Three"),
        ("4", "Four"),
    ];
    let source = Scripted::new(&pages);

    let mut accepted = Vec::new();
    for _ in 0..4 {
        // A fresh store handle per run, as separate processes would have.
        let store = HistoryStore::open(dir.path());
        let before = store.len().unwrap();
        let outcome =
            DedupFetchLoop::new(&source, &store, RetryPolicy::immediate(5)).run(&mut NoopReporter);
        let candidate = outcome.candidate().expect("each run should find a new page");
        accepted.push(candidate.identifier.clone());
        assert_eq!(store.len().unwrap(), before + 1);
    }

    assert_eq!(accepted, vec!["1", "2", "3", "4"]);
    let unique: HashSet<_> = accepted.iter().collect();
    assert_eq!(unique.len(), accepted.len());
}

#[test]
fn budget_bound_holds_for_every_size() {
    for max_attempts in 0..6 {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path());
        store.append("dup").unwrap();
        let pages: Vec<(&str, &str)> = (0..10).map(|_| ("dup", "Dup")).collect();
        let source = Scripted::new(&pages);

        let outcome = DedupFetchLoop::new(&source, &store, RetryPolicy::immediate(max_attempts))
            .run(&mut NoopReporter);

        assert_eq!(outcome, FetchOutcome::ExhaustedRetries);
        assert_eq!(source.calls(), max_attempts);
    }
}
