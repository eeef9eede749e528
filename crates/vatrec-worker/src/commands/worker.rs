//! Worker command - run the task polling loop.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use serde::Deserialize;
use tracing::info;

use vatrec_core::{
    InMemoryQueue, InMemoryStore, MatchEngine, PlainTextRecognizer, Receipt, ReceiptExtractor,
    TaskKind, TaskQueue, Worker,
};

/// Arguments for the worker command.
#[derive(Args)]
pub struct WorkerArgs {
    /// JSON file seeding receipts and tasks into the in-memory backends
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Exit once the queue is drained instead of polling forever
    #[arg(long)]
    drain: bool,
}

#[derive(Deserialize)]
struct Seed {
    #[serde(default)]
    receipts: Vec<Receipt>,
    #[serde(default)]
    tasks: Vec<SeedTask>,
}

#[derive(Deserialize)]
struct SeedTask {
    #[serde(rename = "type")]
    kind: TaskKind,
    payload: serde_json::Value,
}

pub async fn run(args: WorkerArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let queue = Arc::new(InMemoryQueue::new());
    let store = Arc::new(InMemoryStore::new());

    if let Some(path) = &args.seed {
        let seed: Seed = serde_json::from_str(&fs::read_to_string(path)?)?;
        info!(
            receipts = seed.receipts.len(),
            tasks = seed.tasks.len(),
            "seeding in-memory backends"
        );
        for receipt in seed.receipts {
            store.insert(receipt)?;
        }
        for task in seed.tasks {
            queue.enqueue(&config.worker.queue, task.kind, task.payload)?;
        }
    }

    let worker = Worker::new(
        queue.clone(),
        store,
        PlainTextRecognizer,
        ReceiptExtractor::with_config(&config),
        MatchEngine::new(config.matching.clone()),
        config.worker.clone(),
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, stopping at the next task boundary");
            flag.store(true, Ordering::SeqCst);
        }
    });

    info!(queue = %config.worker.queue, drain = args.drain, "worker started");

    // poll_once already blocks for the dequeue timeout, so the loop runs
    // on the blocking pool and cooperates with shutdown between tasks
    let drain = args.drain;
    let poll_interval = Duration::from_millis(config.worker.poll_interval_ms);
    let flag = shutdown.clone();
    let processed = tokio::task::spawn_blocking(move || -> anyhow::Result<u64> {
        let mut processed = 0;
        while !flag.load(Ordering::SeqCst) {
            if worker.poll_once()? {
                processed += 1;
            } else if drain {
                break;
            } else {
                std::thread::sleep(poll_interval);
            }
        }
        Ok(processed)
    })
    .await??;

    let dead = queue.dead_letters()?;
    println!(
        "{} Processed {} tasks, {} dead-lettered",
        style("✓").green(),
        processed,
        dead.len()
    );
    for task in &dead {
        eprintln!(
            "  {} task {} ({:?}): {}",
            style("✗").red(),
            task.id,
            task.kind,
            task.error.as_deref().unwrap_or("unknown")
        );
    }

    Ok(())
}
