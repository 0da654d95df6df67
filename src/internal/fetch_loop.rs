use std::collections::HashSet;
use std::time::Duration;

use tracing::{info, warn};

use super::history::HistoryStore;
use super::models::{Candidate, FetchOutcome};
use crate::api::{CandidateSource, is_non_article};

/// Attempt budget and pauses for one run of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause after a failed fetch.
    pub error_backoff: Duration,
    /// Courtesy pause after drawing an already seen article.
    pub duplicate_delay: Duration,
}

impl RetryPolicy {
    /// Unattended launcher: small budget, one second back-off.
    pub fn launcher() -> Self {
        Self {
            max_attempts: 10,
            error_backoff: Duration::from_secs(1),
            duplicate_delay: Duration::from_millis(500),
        }
    }

    /// Interactive session: the user is watching, so allow more draws.
    pub fn interactive() -> Self {
        Self {
            max_attempts: 20,
            error_backoff: Duration::from_secs(1),
            duplicate_delay: Duration::from_millis(500),
        }
    }

    /// No pauses at all.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            error_backoff: Duration::ZERO,
            duplicate_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Progress of a run, in the order it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    Started { label: String, max_attempts: u32 },
    Attempt { number: u32, max_attempts: u32 },
    SourceFailed { attempt: u32, error: String },
    Skipped { title: String },
    Duplicate { title: String },
    /// History could not be read (`identifier` is `None`) or an accepted
    /// identifier could not be recorded.
    StorageFailed {
        identifier: Option<String>,
        error: String,
    },
    Accepted { candidate: Candidate },
    Exhausted { attempts: u32 },
}

impl LoopEvent {
    /// Line written to the activity log for this event.
    pub fn message(&self) -> String {
        match self {
            Self::Started { label, .. } => format!("--- Search: {} ---", label),
            Self::Attempt { number, .. } => format!("Attempt {}...", number),
            Self::SourceFailed { error, .. } => format!("Error: {}", error),
            Self::Skipped { title } => format!("Skipped non-article: '{}'", title),
            Self::Duplicate { title } => format!("Duplicate: '{}'. Retrying...", title),
            Self::StorageFailed {
                identifier: Some(id),
                error,
            } => format!("Warning: could not record '{}': {}", id, error),
            Self::StorageFailed {
                identifier: None,
                error,
            } => format!("Warning: could not read history: {}", error),
            Self::Accepted { candidate } => {
                format!("SUCCESS: Found unique: '{}'", candidate.title)
            }
            Self::Exhausted { .. } => "FAILURE: Could not find unique article.".to_string(),
        }
    }
}

/// Receives loop progress. Injected by whoever drives the loop.
pub trait ProgressReporter {
    fn report(&mut self, event: &LoopEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&mut self, _event: &LoopEvent) {}
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for &mut R {
    fn report(&mut self, event: &LoopEvent) {
        (**self).report(event);
    }
}

impl<A: ProgressReporter, B: ProgressReporter> ProgressReporter for (A, B) {
    fn report(&mut self, event: &LoopEvent) {
        self.0.report(event);
        self.1.report(event);
    }
}

#[derive(Debug)]
enum LoopState {
    Searching { attempt: u32 },
    Succeeded(Candidate),
    Exhausted { attempts: u32 },
}

#[derive(Debug, Default)]
struct Tally {
    candidates_seen: u32,
    last_error: Option<String>,
}

/// Turns "fetch a random article" into "fetch an article never shown before".
///
/// Attempts run strictly one after another. The history snapshot is taken
/// once when `run` starts and is not refreshed, so concurrent runs against
/// the same store may both accept the same new article.
pub struct DedupFetchLoop<'a, S: CandidateSource + ?Sized> {
    source: &'a S,
    store: &'a HistoryStore,
    policy: RetryPolicy,
}

impl<'a, S: CandidateSource + ?Sized> DedupFetchLoop<'a, S> {
    pub fn new(source: &'a S, store: &'a HistoryStore, policy: RetryPolicy) -> Self {
        Self {
            source,
            store,
            policy,
        }
    }

    #[tracing::instrument(skip_all, fields(source = %self.source.label(), max_attempts = self.policy.max_attempts))]
    pub fn run(&self, reporter: &mut dyn ProgressReporter) -> FetchOutcome {
        let snapshot = match self.store.load() {
            Ok(seen) => seen,
            Err(e) => {
                warn!(error = %e, "Could not load history, continuing without dedup snapshot");
                reporter.report(&LoopEvent::StorageFailed {
                    identifier: None,
                    error: e.to_string(),
                });
                HashSet::new()
            }
        };

        info!(seen = snapshot.len(), "Starting search");
        reporter.report(&LoopEvent::Started {
            label: self.source.label(),
            max_attempts: self.policy.max_attempts,
        });

        let mut tally = Tally::default();
        let mut state = LoopState::Searching { attempt: 0 };

        loop {
            state = match state {
                LoopState::Searching { attempt } => {
                    self.step(attempt, &snapshot, reporter, &mut tally)
                }
                LoopState::Succeeded(candidate) => {
                    info!(title = %candidate.title, identifier = %candidate.identifier, "Accepted article");
                    return FetchOutcome::Success(candidate);
                }
                LoopState::Exhausted { attempts } => {
                    warn!(attempts, "Attempt budget exhausted");
                    reporter.report(&LoopEvent::Exhausted { attempts });
                    return match (tally.candidates_seen, tally.last_error) {
                        (0, Some(cause)) => FetchOutcome::TransientFailure(cause),
                        _ => FetchOutcome::ExhaustedRetries,
                    };
                }
            };
        }
    }

    fn step(
        &self,
        attempt: u32,
        snapshot: &HashSet<String>,
        reporter: &mut dyn ProgressReporter,
        tally: &mut Tally,
    ) -> LoopState {
        if attempt >= self.policy.max_attempts {
            return LoopState::Exhausted { attempts: attempt };
        }

        reporter.report(&LoopEvent::Attempt {
            number: attempt + 1,
            max_attempts: self.policy.max_attempts,
        });

        let candidate = match self.source.fetch_one() {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(attempt = attempt + 1, error = %e, "Fetch failed");
                reporter.report(&LoopEvent::SourceFailed {
                    attempt: attempt + 1,
                    error: e.to_string(),
                });
                tally.last_error = Some(e.to_string());
                pause(self.policy.error_backoff);
                return LoopState::Searching {
                    attempt: attempt + 1,
                };
            }
        };
        tally.candidates_seen += 1;

        if is_non_article(&candidate.title) {
            info!(title = %candidate.title, "Skipped non-article");
            reporter.report(&LoopEvent::Skipped {
                title: candidate.title,
            });
            return LoopState::Searching {
                attempt: attempt + 1,
            };
        }

        if snapshot.contains(&candidate.identifier) {
            info!(title = %candidate.title, identifier = %candidate.identifier, "Duplicate");
            reporter.report(&LoopEvent::Duplicate {
                title: candidate.title,
            });
            pause(self.policy.duplicate_delay);
            return LoopState::Searching {
                attempt: attempt + 1,
            };
        }

        if let Err(e) = self.store.append(&candidate.identifier) {
            warn!(identifier = %candidate.identifier, error = %e, "Could not record accepted article");
            reporter.report(&LoopEvent::StorageFailed {
                identifier: Some(candidate.identifier.clone()),
                error: e.to_string(),
            });
        }

        reporter.report(&LoopEvent::Accepted {
            candidate: candidate.clone(),
        });
        LoopState::Succeeded(candidate)
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
