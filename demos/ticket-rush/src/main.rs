//! ticket-rush: release a crowd of buyers on a scarce ticket pool.
//!
//! Spawns `workers` buyer threads that all park at one start gate.  When the
//! gate opens they race to read stock and buy 1–4 tickets at a time until no
//! lot has anything left, logging every attempt.  The run ends with a summary
//! of success rate and write latency.
//!
//! ```text
//! ticket-rush --stock stock.csv --workers 2000 --trigger manual
//! RUST_LOG=tr_agent=debug ticket-rush --config ticket-rush.toml --sink csv --out out/
//! ```

mod trigger;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use tr_agent::{AgentConfig, AgentState, BuyerAgent, RandomSelector};
use tr_core::{EventId, FaultPolicy, LoaderConfig};
use tr_inventory::{InventorySource, MemoryInventory, SeedLot, load_lots_csv};
use tr_output::{CsvLogWriter, LogSink, LogWriter, MemorySink, RunSummary, SharedSink, SummarySink};
use tr_pool::{NoopObserver, PoolError, PoolReport, WorkerPool};

use trigger::{Trigger, TriggerKind};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// Keep entries in memory; print the summary only.
    Memory,
    Csv,
    /// Requires the `sqlite` feature.
    Sqlite,
    /// Requires the `parquet` feature.
    Parquet,
}

#[derive(Parser, Debug)]
#[command(name = "ticket-rush", version, about = "Concurrent ticket purchase load generator")]
struct Args {
    /// TOML run configuration.  Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of concurrent buyers.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Event to buy tickets for.
    #[arg(short, long)]
    event: Option<u32>,

    /// Seed for per-worker lot and quantity draws.
    #[arg(long)]
    seed: Option<u64>,

    /// Halt a worker after this many consecutive failed purchase calls.
    #[arg(long)]
    trip_after: Option<u32>,

    /// Stock CSV (`event_no,gate_no,gate,section,list_price,sold,total`).
    #[arg(short, long)]
    stock: Option<PathBuf>,

    /// SQLite datastore file (`sqlite` feature).  Without it the stock is
    /// held in memory.
    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SinkKind::Memory)]
    sink: SinkKind,

    /// Directory for the purchase log.
    #[arg(short, long, default_value = "output")]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = TriggerKind::Immediate)]
    trigger: TriggerKind,

    /// Seconds to wait with `--trigger delay`.
    #[arg(long, default_value_t = 5)]
    delay_secs: u64,

    /// Give up after this many seconds instead of waiting for sell-out.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

// ── Configuration ─────────────────────────────────────────────────────────────

fn load_config(args: &Args) -> Result<LoaderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<LoaderConfig>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => LoaderConfig::default(),
    };

    if let Some(w) = args.workers {
        config.workers = w;
    }
    if let Some(e) = args.event {
        config.event = EventId(e);
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(n) = args.trip_after {
        config.fault_policy = FaultPolicy::TripAfter(n);
    }

    config.validate()?;
    Ok(config)
}

fn load_seed(args: &Args) -> Result<Vec<SeedLot>> {
    match &args.stock {
        Some(path) => {
            load_lots_csv(path).with_context(|| format!("loading stock {}", path.display()))
        }
        None => Ok(Vec::new()),
    }
}

// ── Inventory ─────────────────────────────────────────────────────────────────

/// The datastore for this run plus a way to read back how much was sold.
struct Backend {
    source:     Arc<dyn InventorySource>,
    units_sold: Box<dyn Fn(EventId) -> Option<i64>>,
}

fn open_inventory(args: &Args, seed: Vec<SeedLot>) -> Result<Backend> {
    if let Some(path) = &args.db {
        return open_sqlite(path, seed);
    }

    if seed.is_empty() {
        tracing::warn!("no stock loaded; every buyer will exhaust immediately");
    }
    let mem = Arc::new(MemoryInventory::from_seed(seed));
    let probe = Arc::clone(&mem);
    Ok(Backend {
        source:     mem,
        units_sold: Box::new(move |event| probe.units_sold(event).ok()),
    })
}

#[cfg(feature = "sqlite")]
fn open_sqlite(path: &Path, seed: Vec<SeedLot>) -> Result<Backend> {
    let db = Arc::new(tr_inventory::SqliteInventory::open(path)?);
    if !seed.is_empty() {
        db.seed(&seed)?;
    }
    let probe = Arc::clone(&db);
    Ok(Backend {
        source:     db,
        units_sold: Box::new(move |event| probe.units_sold(event).ok().flatten()),
    })
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_path: &Path, _seed: Vec<SeedLot>) -> Result<Backend> {
    bail!("--db needs a build with `--features sqlite`")
}

// ── Run ───────────────────────────────────────────────────────────────────────

/// Spawn, trigger, and wait.  `None` means the timeout expired and the pool
/// was shut down.
fn drive<L: LogSink + Clone>(
    args:      &Args,
    config:    &LoaderConfig,
    inventory: &Arc<dyn InventorySource>,
    sink:      L,
) -> Result<(PoolReport, bool)> {
    let agent_config = AgentConfig::from(config);
    let mut pool = WorkerPool::spawn(config, |worker, rng| {
        BuyerAgent::new(worker, agent_config, Arc::clone(inventory), RandomSelector, sink.clone(), rng)
    })?;

    Trigger::new(args.trigger, args.delay_secs).fire(&pool)?;

    match args.timeout_secs {
        None => Ok((pool.wait(&mut NoopObserver), true)),
        Some(secs) => match pool.wait_timeout(Duration::from_secs(secs), &mut NoopObserver) {
            Ok(()) => Ok((pool.wait(&mut NoopObserver), true)),
            Err(PoolError::Stalled { active }) => {
                tracing::warn!(active = active.len(), "timed out; stopping remaining buyers");
                Ok((pool.shutdown(), false))
            }
            Err(e) => Err(e.into()),
        },
    }
}

fn run_with_writer<W: LogWriter + 'static>(
    args:      &Args,
    config:    &LoaderConfig,
    inventory: &Arc<dyn InventorySource>,
    writer:    W,
) -> Result<(PoolReport, bool, RunSummary)> {
    let sink = Arc::new(SummarySink::new(SharedSink::new(writer)));
    let (report, completed) = drive(args, config, inventory, Arc::clone(&sink))?;

    let shared = sink.inner();
    shared.finish()?;
    if let Some(e) = shared.take_error() {
        tracing::error!(error = %e, "purchase log is incomplete");
    }
    Ok((report, completed, sink.summary()))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let seed = load_seed(&args)?;
    let backend = open_inventory(&args, seed)?;
    let inventory = &backend.source;

    println!("=== ticket-rush ===");
    println!("  event    : {}", config.event);
    println!("  workers  : {}", config.workers);
    println!("  sink     : {:?}", args.sink);

    if args.sink != SinkKind::Memory {
        ensure_dir(&args.out)?;
    }

    let (report, completed, summary) = match args.sink {
        SinkKind::Memory => {
            let sink = Arc::new(SummarySink::new(MemorySink::new()));
            let (report, completed) = drive(&args, &config, inventory, Arc::clone(&sink))?;
            (report, completed, sink.summary())
        }
        SinkKind::Csv => run_with_writer(&args, &config, inventory, CsvLogWriter::new(&args.out)?)?,
        #[cfg(feature = "sqlite")]
        SinkKind::Sqlite => {
            run_with_writer(&args, &config, inventory, tr_output::SqliteLogWriter::new(&args.out)?)?
        }
        #[cfg(feature = "parquet")]
        SinkKind::Parquet => {
            run_with_writer(&args, &config, inventory, tr_output::ParquetLogWriter::new(&args.out)?)?
        }
        #[allow(unreachable_patterns)]
        other => bail!("--sink {other:?} needs a build with the matching cargo feature"),
    };

    println!();
    println!("{summary}");
    println!(
        "  agents   : {} exhausted, {} halted  ({:.2}s)",
        report.count(AgentState::Exhausted),
        report.count(AgentState::Halted),
        report.elapsed.as_secs_f64(),
    );
    if let Some(sold) = (backend.units_sold)(config.event) {
        println!("  datastore: {sold} units sold");
        if completed && sold != summary.units_sold as i64 {
            bail!("datastore reports {sold} units sold but the log records {}", summary.units_sold);
        }
    }
    if !completed {
        println!("  run stopped before sell-out");
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
}
