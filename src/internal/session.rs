use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use super::activity::ActivityLog;
use super::fetch_loop::{DedupFetchLoop, ProgressReporter, RetryPolicy};
use super::history::HistoryStore;
use super::models::FetchOutcome;
use super::stats::Stats;
use crate::api::CandidateSource;
use crate::utils::datetime::today;

/// Opens an address in the user's browser.
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// The platform default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}

/// Stops opening pages once the search it belongs to has been abandoned.
pub struct AbandonableBrowser {
    inner: Arc<dyn BrowserOpener>,
    abandoned: Arc<AtomicBool>,
}

impl AbandonableBrowser {
    pub fn new(inner: Arc<dyn BrowserOpener>, abandoned: Arc<AtomicBool>) -> Self {
        Self { inner, abandoned }
    }
}

impl BrowserOpener for AbandonableBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        if self.abandoned.load(Ordering::SeqCst) {
            info!(url, "Search was abandoned, not opening browser");
            return Ok(());
        }
        self.inner.open(url)
    }
}

/// The two files of a storage root.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
    pub history: HistoryStore,
    pub activity: ActivityLog,
}

impl Storage {
    pub fn open(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            history: HistoryStore::open(dir),
            activity: ActivityLog::open(dir),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stats(&self) -> Stats {
        Stats::collect(&self.history, &self.activity, today())
    }
}

/// One complete run: search for an unseen article, log every step to the
/// activity log and `reporter`, and open the result in the browser.
pub fn roll(
    source: &dyn CandidateSource,
    storage: &Storage,
    policy: RetryPolicy,
    reporter: &mut dyn ProgressReporter,
    browser: &dyn BrowserOpener,
) -> FetchOutcome {
    let mut reporters = (storage.activity.clone(), reporter);
    let outcome = DedupFetchLoop::new(source, &storage.history, policy).run(&mut reporters);

    if let FetchOutcome::Success(candidate) = &outcome {
        match browser.open(&candidate.url) {
            Ok(()) => info!(url = %candidate.url, "Opened browser"),
            Err(e) => warn!(url = %candidate.url, error = %e, "Could not open browser"),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::errors::SourceError;
    use crate::internal::fetch_loop::NoopReporter;
    use crate::internal::models::Candidate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBrowser(Mutex<Vec<String>>);

    impl BrowserOpener for RecordingBrowser {
        fn open(&self, url: &str) -> std::io::Result<()> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct Fixed(Candidate);

    impl CandidateSource for Fixed {
        fn fetch_one(&self) -> Result<Candidate, SourceError> {
            Ok(self.0.clone())
        }

        fn label(&self) -> String {
            "fixed".to_string()
        }
    }

    fn alpha() -> Candidate {
        Candidate {
            title: "Alpha".to_string(),
            url: "https://en.wikipedia.org/wiki/Alpha".to_string(),
            identifier: "42".to_string(),
        }
    }

    #[test]
    fn test_roll_opens_browser_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path());
        let browser = RecordingBrowser::default();

        let outcome = roll(
            &Fixed(alpha()),
            &storage,
            RetryPolicy::immediate(3),
            &mut NoopReporter,
            &browser,
        );

        assert!(outcome.is_success());
        assert_eq!(
            *browser.0.lock().unwrap(),
            vec!["https://en.wikipedia.org/wiki/Alpha".to_string()]
        );
        let tail = storage.activity.tail(10);
        assert!(tail.first().unwrap().ends_with("--- Search: fixed ---"));
        assert!(tail.last().unwrap().ends_with("SUCCESS: Found unique: 'Alpha'"));
        assert_eq!(storage.stats(), Stats { total: 1, today: 1 });
    }

    #[test]
    fn test_abandoned_search_does_not_open_browser() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path());
        let inner = Arc::new(RecordingBrowser::default());
        let abandoned = Arc::new(AtomicBool::new(true));
        let browser = AbandonableBrowser::new(inner.clone(), abandoned);

        let outcome = roll(
            &Fixed(alpha()),
            &storage,
            RetryPolicy::immediate(3),
            &mut NoopReporter,
            &browser,
        );

        // Still recorded, so it will not come up again.
        assert!(outcome.is_success());
        assert!(storage.history.load().unwrap().contains("42"));
        assert!(inner.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_abandonable_browser_opens_while_active() {
        let inner = Arc::new(RecordingBrowser::default());
        let abandoned = Arc::new(AtomicBool::new(false));
        let browser = AbandonableBrowser::new(inner.clone(), abandoned.clone());

        browser.open("https://en.wikipedia.org/wiki/Alpha").unwrap();
        abandoned.store(true, Ordering::SeqCst);
        browser.open("https://en.wikipedia.org/wiki/Beta").unwrap();

        assert_eq!(
            *inner.0.lock().unwrap(),
            vec!["https://en.wikipedia.org/wiki/Alpha".to_string()]
        );
    }

    #[test]
    fn test_second_roll_exhausts_without_opening() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path());
        let browser = RecordingBrowser::default();
        let source = Fixed(alpha());

        roll(&source, &storage, RetryPolicy::immediate(3), &mut NoopReporter, &browser);
        let outcome = roll(&source, &storage, RetryPolicy::immediate(3), &mut NoopReporter, &browser);

        assert_eq!(outcome, FetchOutcome::ExhaustedRetries);
        assert_eq!(browser.0.lock().unwrap().len(), 1);
        assert!(
            storage
                .activity
                .tail(1)
                .last()
                .unwrap()
                .ends_with("FAILURE: Could not find unique article.")
        );
    }
}
