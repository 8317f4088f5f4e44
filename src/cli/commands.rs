//! CLI command definitions for redqueue.
//!
//! A small operator tool for a single queue: push tasks, pop (and optionally
//! acknowledge) them, inspect list lengths, and wipe a queue.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use crate::config::{QueueConfig, DEFAULT_QUEUE_NAME, DEFAULT_REDIS_URL};
use crate::queue::ReliableQueue;
use crate::store::ListStore;

/// Reliable Redis work queue tool.
#[derive(Parser, Debug)]
#[command(name = "redqueue")]
#[command(about = "Push, pop and inspect tasks on a reliable Redis work queue")]
#[command(version)]
#[command(
    long_about = "redqueue drives a reliable work queue stored in two Redis lists: <queue>_main (pending) and <queue>_processing (in flight).\n\nExample usage:\n  redqueue --queue jobs push --json '{\"id\":1}'\n  redqueue --queue jobs pop --ack"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Redis connection URL.
    #[arg(long, env = "REDQUEUE_REDIS_URL", default_value = DEFAULT_REDIS_URL, global = true)]
    pub redis_url: String,

    /// Queue name.
    #[arg(short, long, env = "REDQUEUE_NAME", default_value = DEFAULT_QUEUE_NAME, global = true)]
    pub queue: String,

    /// Timeout for each Redis round-trip, in milliseconds.
    #[arg(long, env = "REDQUEUE_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

impl Cli {
    /// Builds the queue configuration from the global options.
    pub fn queue_config(&self) -> QueueConfig {
        let config = QueueConfig::new(self.queue.clone()).with_redis_url(self.redis_url.clone());
        match self.timeout_ms {
            Some(ms) => config.with_operation_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }
}

/// Available CLI subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Enqueue a task.
    Push(PushArgs),

    /// Dequeue one task and print it.
    ///
    /// Without --ack the task stays in the processing list; nothing moves it
    /// back to pending.
    Pop(PopArgs),

    /// Show pending and processing counts.
    Stats(StatsArgs),

    /// Delete the pending and processing lists.
    Clear(ClearArgs),
}

/// Arguments for `redqueue push`.
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Task payload. Stored as-is unless --json is given.
    pub payload: String,

    /// Parse the payload as JSON and store its canonical encoding.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `redqueue pop`.
#[derive(Parser, Debug)]
pub struct PopArgs {
    /// Acknowledge the task once popped, even if printing it fails.
    #[arg(long)]
    pub ack: bool,

    /// Pretty-print the task as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `redqueue stats`.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Output JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `redqueue clear`.
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Confirm deletion of every task in the queue.
    #[arg(long)]
    pub yes: bool,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For more control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = cli.queue_config();
    let mut queue = ReliableQueue::from_config(&config)
        .await
        .with_context(|| format!("Failed to open queue '{}'", config.queue_name))?;

    let stdout = std::io::stdout();
    let outcome = execute(&mut queue, cli.command, &mut stdout.lock()).await;

    queue.close().await.context("Failed to close queue")?;
    outcome
}

/// Executes one subcommand against `queue`, writing results to `out`.
pub async fn execute<S: ListStore>(
    queue: &mut ReliableQueue<S>,
    command: Commands,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Commands::Push(args) => run_push_command(queue, args).await,
        Commands::Pop(args) => run_pop_command(queue, args, out).await,
        Commands::Stats(args) => run_stats_command(queue, args, out).await,
        Commands::Clear(args) => run_clear_command(queue, args).await,
    }
}

async fn run_push_command<S: ListStore>(
    queue: &ReliableQueue<S>,
    args: PushArgs,
) -> anyhow::Result<()> {
    let size = args.payload.len();

    if args.json {
        let value: serde_json::Value =
            serde_json::from_str(&args.payload).context("Payload is not valid JSON")?;
        queue.enqueue(value).await?;
    } else {
        queue.enqueue(args.payload).await?;
    }

    info!("Enqueued {} byte task on '{}'", size, queue.name());
    Ok(())
}

async fn run_pop_command<S: ListStore>(
    queue: &mut ReliableQueue<S>,
    args: PopArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let task = match queue.dequeue().await {
        Ok(task) => task,
        Err(err) if err.is_empty_queue() => {
            writeln!(out, "Queue '{}' is empty", queue.name())?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let printed = write_task(out, &task, args.json);

    if args.ack {
        queue
            .acknowledge()
            .await
            .context("Failed to acknowledge task")?;
        info!("Acknowledged task on '{}'", queue.name());
    } else if printed.is_err() {
        info!("Task left in '{}'", queue.processing_key());
    }

    printed
}

/// Prints the task bytes as-is, or pretty-printed when `json` is set.
fn write_task(out: &mut impl Write, task: &[u8], json: bool) -> anyhow::Result<()> {
    if json {
        let value: serde_json::Value =
            serde_json::from_slice(task).context("Task is not valid JSON")?;
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        out.write_all(task)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

async fn run_stats_command<S: ListStore>(
    queue: &ReliableQueue<S>,
    args: StatsArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let stats = queue.stats().await?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        writeln!(out, "queue:      {}", stats.queue_name)?;
        writeln!(out, "pending:    {}", stats.pending)?;
        writeln!(out, "processing: {}", stats.processing)?;
        writeln!(out, "total:      {}", stats.total())?;
    }

    Ok(())
}

async fn run_clear_command<S: ListStore>(
    queue: &mut ReliableQueue<S>,
    args: ClearArgs,
) -> anyhow::Result<()> {
    if !args.yes {
        bail!(
            "Refusing to clear queue '{}' without --yes",
            queue.name()
        );
    }

    queue.clear().await?;
    info!("Cleared queue '{}'", queue.name());
    Ok(())
}
