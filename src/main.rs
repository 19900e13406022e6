use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payment_tracker::application::tracker::PaymentTracker;
use payment_tracker::config::TrackerConfig;
use payment_tracker::domain::ports::PaymentRepositoryBox;
use payment_tracker::infrastructure::in_memory::InMemoryPaymentRepository;
use payment_tracker::infrastructure::logging::LoggingEventPublisher;
#[cfg(feature = "storage-rocksdb")]
use payment_tracker::infrastructure::rocksdb::RocksDBPaymentRepository;
use payment_tracker::interfaces::csv::feed_reader::FeedReader;
use payment_tracker::interfaces::csv::payment_writer::PaymentWriter;
use payment_tracker::telemetry;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Recorded chain-watcher feed (CSV)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON file with the confirmation policy. Defaults to the built-in tiers.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[cfg(feature = "storage-rocksdb")]
fn open_repository(db_path: Option<&Path>) -> payment_tracker::error::Result<PaymentRepositoryBox> {
    match db_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using RocksDB payment repository");
            Ok(Box::new(RocksDBPaymentRepository::open(path)?))
        }
        None => Ok(Box::new(InMemoryPaymentRepository::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_repository(db_path: Option<&Path>) -> payment_tracker::error::Result<PaymentRepositoryBox> {
    if let Some(path) = db_path {
        warn!(
            path = %path.display(),
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(Box::new(InMemoryPaymentRepository::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log_level, cli.json_logs).into_diagnostic()?;

    let config = match &cli.config {
        Some(path) => TrackerConfig::from_path(path).into_diagnostic()?,
        None => TrackerConfig::default(),
    };
    let repository = open_repository(cli.db_path.as_deref()).into_diagnostic()?;
    let tracker = PaymentTracker::new(repository, Box::new(LoggingEventPublisher), config.policy);

    // Replay the feed; a bad row is reported and skipped.
    let file = File::open(&cli.input).into_diagnostic()?;
    for (index, update) in FeedReader::new(file).updates().enumerate() {
        let row = index + 1;
        match update {
            Ok(update) => {
                let tx_hash = update.tx_hash().clone();
                if let Err(e) = tracker.process(update).await {
                    warn!(row, %tx_hash, error = %e, "Feed update rejected");
                }
            }
            Err(e) => {
                warn!(row, error = %e, "Error reading feed row");
            }
        }
    }

    let payments = tracker.into_results().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock());
    writer.write_payments(&payments).into_diagnostic()?;

    Ok(())
}
