use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

pub mod clients;
pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod pipeline;

mod cli;

use cli::{render_event, Cli};
use config::BatchConfiguration;
use error::Error;
use media::{AddOutcome, SelectionQueue, SourceFile};
use pipeline::{ChannelObserver, LifecycleEvent, Orchestrator};

/// Maximum number of files in one batch, and number of pipeline workers.
pub const BATCH_CAP: usize = 10;

const EXIT_CONFIG: u8 = 2;

/// Counts reported once the batch has drained
#[derive(Debug, Default)]
struct BatchSummary {
    completed: usize,
    failed: usize,
    not_scheduled: usize,
}

impl BatchSummary {
    fn all_completed(&self) -> bool {
        self.failed == 0 && self.not_scheduled == 0
    }
}

pub fn run() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_logger(cli.log_level);
    info!("Speechbatch v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(summary) if summary.all_completed() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            match e {
                Error::Config(_) => ExitCode::from(EXIT_CONFIG),
                Error::Runtime(_) | Error::Http(_) => ExitCode::FAILURE,
            }
        }
    }
}

fn run_cli(cli: Cli) -> Result<BatchSummary, Error> {
    let config = Arc::new(BatchConfiguration::load(&cli.config, cli.overrides())?);
    info!(
        "Configuration: {:?} (token length {})",
        config,
        config.token_len()
    );

    let mut queue = SelectionQueue::new();
    let mut not_scheduled = 0;
    for path in &cli.files {
        match queue.add(path) {
            AddOutcome::Added => {}
            AddOutcome::Duplicate => eprintln!("Skipping duplicate: {}", path.display()),
            AddOutcome::Full => {
                not_scheduled += 1;
                eprintln!(
                    "Skipping {}: at most {} files per batch",
                    path.display(),
                    BATCH_CAP
                );
            }
            AddOutcome::Rejected(e) => {
                not_scheduled += 1;
                eprintln!("Skipping {}: {}", path.display(), e);
            }
        }
    }

    if queue.is_empty() {
        warn!("No audio or video files to transcribe");
        return Ok(BatchSummary {
            not_scheduled,
            ..BatchSummary::default()
        });
    }

    // Created and dropped outside the runtime: the HTTP client blocks.
    let orchestrator = Orchestrator::from_config(config)?.with_poll_policy(cli.poll_policy());
    let runtime = tokio::runtime::Runtime::new()?;
    let mut summary = runtime.block_on(process_batch(
        &orchestrator,
        queue.into_sources(),
        cli.json,
    ));
    summary.not_scheduled += not_scheduled;

    info!(
        "Batch finished: {} completed, {} failed, {} not scheduled",
        summary.completed, summary.failed, summary.not_scheduled
    );
    Ok(summary)
}

/// Run one batch and print every event until all runners are done.
async fn process_batch(
    orchestrator: &Orchestrator,
    sources: Vec<SourceFile>,
    json: bool,
) -> BatchSummary {
    let (observer, mut events) = ChannelObserver::channel();

    // The channel closes once every runner has dropped its sink.
    let handle = orchestrator.run_batch(sources, observer);

    let mut summary = BatchSummary {
        not_scheduled: handle.rejected().len(),
        ..BatchSummary::default()
    };
    for source in handle.rejected() {
        eprintln!("Not scheduled: {}", source.path().display());
    }

    while let Some(event) = events.recv().await {
        println!("{}", render_event(&event, json));
        match event.event {
            LifecycleEvent::Completed { .. } => summary.completed += 1,
            LifecycleEvent::Failed { .. } => summary.failed += 1,
            _ => {}
        }
    }

    handle.join().await;
    summary
}
