use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use jiff::Zoned;
use ratatui::widgets::ListState;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::api::{SourceKind, WikiClient};
use crate::config::AppConfig;
use crate::internal::activity::format_line;
use crate::internal::fetch_loop::{LoopEvent, ProgressReporter};
use crate::internal::models::FetchOutcome;
use crate::internal::notification::Notification;
use crate::internal::session::{AbandonableBrowser, BrowserOpener, Storage, roll};
use crate::internal::stats::Stats;

use super::log_viewer::LogViewer;

/// How many activity lines the dashboard keeps in memory.
const ACTIVITY_CAPACITY: usize = 500;

/// Messages handled by the main loop.
#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    SelectPrevious,
    SelectNext,
    Roll,
    ScrollLogUp,
    ScrollLogDown,
    Progress(LoopEvent),
    RollFinished(FetchOutcome),
}

/// Forwards loop events from the worker thread to the UI.
pub struct ChannelReporter(pub UnboundedSender<Action>);

impl ProgressReporter for ChannelReporter {
    fn report(&mut self, event: &LoopEvent) {
        let _ = self.0.send(Action::Progress(event.clone()));
    }
}

pub struct App {
    pub running: bool,
    pub app_version: String,
    pub config: AppConfig,
    config_path: Option<PathBuf>,
    pub topics: Vec<String>,
    pub topic_state: ListState,
    pub storage: Storage,
    pub stats: Stats,
    /// Set while a search is running on the worker thread.
    pub searching: bool,
    /// (attempt, budget) of the running search.
    pub progress: Option<(u32, u32)>,
    pub log_viewer: LogViewer,
    pub notification: Option<Notification>,
    browser: Arc<dyn BrowserOpener>,
    /// Set on quit; a search still running afterwards must not open a page.
    abandoned: Arc<AtomicBool>,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
}

impl App {
    pub fn new(
        config: AppConfig,
        config_path: Option<PathBuf>,
        storage: Storage,
        browser: Arc<dyn BrowserOpener>,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let topics = config.topics();

        // Start on the topic rolled last time, if it is still offered.
        let selected = config
            .last_category
            .as_ref()
            .and_then(|last| topics.iter().position(|t| t == last))
            .unwrap_or(0);
        let mut topic_state = ListState::default();
        topic_state.select(Some(selected));

        let mut log_viewer = LogViewer::new(ACTIVITY_CAPACITY);
        log_viewer.load(&storage.activity);

        tracing::info!(
            storage = %storage.dir().display(),
            topics = topics.len(),
            "App initialized"
        );

        Self {
            running: true,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            stats: storage.stats(),
            config,
            config_path,
            topics,
            topic_state,
            storage,
            searching: false,
            progress: None,
            log_viewer,
            notification: None,
            browser,
            abandoned: Arc::new(AtomicBool::new(false)),
            action_tx,
            action_rx,
        }
    }

    pub fn selected_topic(&self) -> &str {
        self.topic_state
            .selected()
            .and_then(|i| self.topics.get(i))
            .map(String::as_str)
            .unwrap_or(crate::api::ANY_TOPIC)
    }

    pub async fn run(&mut self, mut tui: crate::tui::Tui) -> Result<()> {
        let mut event_interval = tokio::time::interval(std::time::Duration::from_millis(16));

        loop {
            if let Some(notification) = &self.notification
                && notification.should_dismiss()
            {
                self.notification = None;
            }

            tui.draw(|f| super::view::draw(self, f))?;

            tokio::select! {
                _ = event_interval.tick() => {
                    if event::poll(std::time::Duration::from_millis(0))?
                        && let Event::Key(key) = event::read()?
                            && key.kind == KeyEventKind::Press {
                                self.handle_key_event(key);
                            }
                }
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                }
            }

            if !self.running {
                break;
            }
        }
        Ok(())
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let action = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Up | KeyCode::Char('k') => Action::SelectPrevious,
            KeyCode::Down | KeyCode::Char('j') => Action::SelectNext,
            KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char(' ') => Action::Roll,
            KeyCode::PageUp => Action::ScrollLogUp,
            KeyCode::PageDown => Action::ScrollLogDown,
            _ => return,
        };
        let _ = self.action_tx.send(action);
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.abandoned.store(true, Ordering::SeqCst);
                self.running = false;
            }
            Action::SelectPrevious => {
                let i = self.topic_state.selected().unwrap_or(0);
                let prev = match i {
                    0 => self.topics.len().saturating_sub(1),
                    i => i - 1,
                };
                self.topic_state.select(Some(prev));
            }
            Action::SelectNext => {
                let i = self.topic_state.selected().unwrap_or(0);
                let next = match i + 1 >= self.topics.len() {
                    true => 0,
                    false => i + 1,
                };
                self.topic_state.select(Some(next));
            }
            Action::Roll => self.start_roll(),
            Action::ScrollLogUp => self.log_viewer.scroll_up(),
            Action::ScrollLogDown => self.log_viewer.scroll_down(),
            Action::Progress(event) => {
                if let LoopEvent::Attempt {
                    number,
                    max_attempts,
                } = event
                {
                    self.progress = Some((number, max_attempts));
                }
                self.log_viewer
                    .push(&format_line(&Zoned::now(), &event.message()));
            }
            Action::RollFinished(outcome) => self.finish_roll(outcome),
        }
    }

    fn start_roll(&mut self) {
        if self.searching {
            tracing::debug!("Roll requested while a search is running; ignored");
            return;
        }
        self.searching = true;
        self.progress = None;
        self.log_viewer.scroll_to_bottom();

        let topic = self.selected_topic().to_string();
        self.remember_topic(&topic);

        let kind = SourceKind::from_topic(&topic);
        let config = self.config.clone();
        let storage = self.storage.clone();
        let browser =
            AbandonableBrowser::new(Arc::clone(&self.browser), Arc::clone(&self.abandoned));
        let tx = self.action_tx.clone();

        tracing::info!(topic = %topic, "Starting roll");

        // The loop blocks on network and sleeps between attempts.
        tokio::task::spawn_blocking(move || {
            let client = match WikiClient::new(
                &config.wiki_base_url,
                &config.user_agent,
                config.request_timeout(),
            ) {
                Ok(client) => client,
                Err(e) => {
                    tracing::error!("Failed to build HTTP client: {:#}", e);
                    let _ = tx.send(Action::RollFinished(FetchOutcome::TransientFailure(
                        e.to_string(),
                    )));
                    return;
                }
            };

            let source = kind.build(client);
            let mut reporter = ChannelReporter(tx.clone());
            let outcome = roll(
                source.as_ref(),
                &storage,
                config.interactive.policy(),
                &mut reporter,
                &browser,
            );
            let _ = tx.send(Action::RollFinished(outcome));
        });
    }

    fn finish_roll(&mut self, outcome: FetchOutcome) {
        self.searching = false;
        self.progress = None;
        self.stats = self.storage.stats();
        self.log_viewer.load(&self.storage.activity);

        self.notification = Some(match outcome {
            FetchOutcome::Success(candidate) => {
                Notification::info(format!("Opened '{}'", candidate.title))
            }
            FetchOutcome::ExhaustedRetries => {
                Notification::error("Couldn't find a clean article. Try again!")
            }
            FetchOutcome::TransientFailure(cause) => {
                Notification::error(format!("Wikipedia is unreachable: {}", cause))
            }
        });
    }

    fn remember_topic(&mut self, topic: &str) {
        if self.config.last_category.as_deref() == Some(topic) {
            return;
        }
        self.config.last_category = Some(topic.to_string());
        if let Some(path) = &self.config_path {
            self.config.save_to(path);
        }
    }
}
