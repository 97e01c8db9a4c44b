use crate::infrastructure::ledger::LedgerClientConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, from command-line flags or the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Finalizes penalty payments from payment-completion events", long_about = None)]
pub struct Config {
    /// Base URL of the financial ledger API
    #[arg(long, env = "LEDGER_URL")]
    pub ledger_url: String,

    /// Ledger request timeout, in seconds
    #[arg(long, env = "LEDGER_TIMEOUT_SECS", default_value_t = 30)]
    pub ledger_timeout_secs: u64,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Newline-delimited JSON payment events to seed the partition with
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Partition to consume
    #[arg(long, default_value_t = 0)]
    pub partition: i32,

    /// Pause before restarting the consumer after a fault, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub restart_backoff_ms: u64,

    /// Shut down once every seeded event has been handled
    #[arg(long)]
    pub exit_when_drained: bool,
}

impl Config {
    pub fn ledger_client_config(&self) -> LedgerClientConfig {
        LedgerClientConfig {
            base_url: self.ledger_url.clone(),
            timeout: Duration::from_secs(self.ledger_timeout_secs),
        }
    }

    pub fn restart_backoff(&self) -> Duration {
        Duration::from_millis(self.restart_backoff_ms)
    }
}
