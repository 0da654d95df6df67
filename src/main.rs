use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use wiki_roll::api::{SourceKind, WikiClient};
use wiki_roll::config::AppConfig;
use wiki_roll::internal::fetch_loop::NoopReporter;
use wiki_roll::internal::models::FetchOutcome;
use wiki_roll::internal::session::{Storage, SystemBrowser, roll};
use wiki_roll::internal::ui::app::App;
use wiki_roll::tui;
use wiki_roll::utils::logging;

#[derive(Parser)]
#[command(
    name = "wiki-roll",
    version,
    about = "Open a random Wikipedia article you have not seen before"
)]
struct Cli {
    /// Use this config file instead of searching for config.ron
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard (default)
    Ui,
    /// Single unattended run, suitable for a scheduled task
    Launch {
        /// Restrict the draw to a category, e.g. "Astronomy"
        #[arg(long)]
        category: Option<String>,
    },
    /// Print how many articles have been shown
    Stats,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let (config, config_path) = match &cli.config {
        Some(path) => {
            let config = AppConfig::load_from(path)
                .with_context(|| format!("could not load config from {}", path.display()))?;
            (config, Some(path.clone()))
        }
        None => AppConfig::load(),
    };

    // Keep the guard alive until exit so buffered log lines are flushed.
    let _guard = logging::init(&config);
    let storage = Storage::open(&config.storage_dir());
    tracing::info!(
        root = %config.storage_root,
        storage = %storage.dir().display(),
        "Starting wiki-roll"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("could not start async runtime")?;

    let result = runtime.block_on(async move {
        match cli.command.unwrap_or(Command::Ui) {
            Command::Ui => run_ui(config, config_path, storage).await,
            Command::Launch { category } => launch(config, storage, category).await,
            Command::Stats => {
                let stats = storage.stats();
                println!("Total seen: {}", stats.total);
                println!("Today:      {}", stats.today);
                Ok(ExitCode::SUCCESS)
            }
        }
    });

    // A search abandoned by quitting the dashboard may still be blocked on
    // the network; do not wait for it.
    runtime.shutdown_background();
    result
}

async fn run_ui(
    config: AppConfig,
    config_path: Option<PathBuf>,
    storage: Storage,
) -> Result<ExitCode> {
    let terminal = match tui::init() {
        Ok(terminal) => terminal,
        Err(e) => {
            tracing::error!("Failed to initialize terminal: {}", e);
            eprintln!("Failed to initialize TUI: {e:?}");
            return Err(e.into());
        }
    };

    let mut app = App::new(config, config_path, storage, Arc::new(SystemBrowser));
    let res = app.run(terminal).await;

    // Restore the terminal before reporting anything.
    tui::restore()?;

    if let Err(err) = res {
        tracing::error!("UI exited with error: {:#}", err);
        eprintln!("{err:?}");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn launch(config: AppConfig, storage: Storage, category: Option<String>) -> Result<ExitCode> {
    let kind = category
        .as_deref()
        .map(SourceKind::from_topic)
        .unwrap_or(SourceKind::Unrestricted);

    let outcome = tokio::task::spawn_blocking(move || -> Result<FetchOutcome> {
        let client = WikiClient::new(
            &config.wiki_base_url,
            &config.user_agent,
            config.request_timeout(),
        )?;
        let source = kind.build(client);
        Ok(roll(
            source.as_ref(),
            &storage,
            config.launcher.policy(),
            &mut NoopReporter,
            &SystemBrowser,
        ))
    })
    .await
    .context("launcher worker stopped unexpectedly")??;

    match outcome {
        FetchOutcome::Success(candidate) => {
            println!("{}", candidate.url);
            Ok(ExitCode::SUCCESS)
        }
        FetchOutcome::ExhaustedRetries => {
            eprintln!("Failed to find a unique article after multiple attempts.");
            Ok(ExitCode::FAILURE)
        }
        FetchOutcome::TransientFailure(cause) => {
            eprintln!("Wikipedia is unreachable: {}", cause);
            Ok(ExitCode::FAILURE)
        }
    }
}
