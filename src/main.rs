use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result, anyhow};
use concord::{
    cli::config_path_from_args,
    config::{Config, EventLogBackend},
    event_log::{EventLog, EventStore, MemoryEventStore, SqliteEventStore},
    logging::init_tracing,
    orchestrator::{OrchestratorSettings, TurnInput, TurnOrchestrator},
    worker::{RuleAssessor, WorkerRegistry},
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_stream::StreamExt;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let logging_guard = init_tracing(&config.logging)?;

    let store = open_store(&config)?;
    let registry = build_registry(&config)?;
    let session_id = config
        .session_id
        .clone()
        .unwrap_or_else(|| Uuid::now_v7().to_string());
    let settings = OrchestratorSettings {
        scheduler: config.scheduler.clone(),
        deliberation: config.deliberation.clone(),
    };

    let mut orchestrator =
        TurnOrchestrator::new(session_id, registry, EventLog::new(store), settings);
    orchestrator.restore()?;
    tracing::info!(
        target: "main",
        run_id = %logging_guard.run_id(),
        session_id = %orchestrator.session_id(),
        workers = config.workers.len(),
        "concord_started"
    );

    let printer = tokio::spawn(print_events(orchestrator.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_turn_at = Instant::now();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: "main", "shutdown_signal_received");
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let elapsed_ms = last_turn_at.elapsed().as_millis().min(u64::MAX as u128) as u64;
        orchestrator.maintenance_tick(elapsed_ms)?;
        orchestrator.run_turn(TurnInput::new(line)).await?;
        last_turn_at = Instant::now();
    }

    // Dropping the orchestrator closes the subscriber channel and ends the printer.
    drop(orchestrator);
    printer
        .await
        .map_err(|err| anyhow!("event printer task failed: {err}"))??;
    tracing::info!(target: "main", "concord_stopped");
    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<dyn EventStore>> {
    Ok(match config.event_log.backend {
        EventLogBackend::Memory => Arc::new(MemoryEventStore::new()),
        EventLogBackend::Sqlite => Arc::new(
            SqliteEventStore::open(&config.event_log.path).with_context(|| {
                format!(
                    "failed to open event store {}",
                    config.event_log.path.display()
                )
            })?,
        ),
    })
}

fn build_registry(config: &Config) -> Result<WorkerRegistry> {
    let mut registry = WorkerRegistry::new();
    for worker in &config.workers {
        let assessor = RuleAssessor::new(worker.rules.clone())
            .with_context(|| format!("invalid rules for worker '{}'", worker.descriptor.id))?;
        registry
            .register(worker.descriptor.clone(), Arc::new(assessor))
            .context("failed to register worker")?;
    }
    Ok(registry)
}

async fn print_events(
    mut events: impl tokio_stream::Stream<Item = concord::event_log::Event> + Unpin,
) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(event) = events.next().await {
        let mut line = serde_json::to_string(&event).context("failed to encode event")?;
        line.push('\n');
        stdout
            .write_all(line.as_bytes())
            .await
            .context("failed to write event to stdout")?;
        stdout.flush().await.context("failed to flush stdout")?;
    }
    Ok(())
}
