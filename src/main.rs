use clap::Parser;
use miette::{IntoDiagnostic, Result};
use penalty_payments::application::consumer::PaymentConsumer;
use penalty_payments::application::handler::PenaltyPaymentHandler;
use penalty_payments::application::supervisor::Supervisor;
use penalty_payments::config::Config;
use penalty_payments::domain::ports::{
    AccountPenaltiesStore, PayableResourceStore, SharedAccountPenaltiesStore, SharedLedger,
    SharedPayableResourceStore, StoreLifecycle,
};
use penalty_payments::infrastructure::in_memory::InMemoryStore;
use penalty_payments::infrastructure::ledger::LedgerClient;
use penalty_payments::interfaces::events::{JsonEventDecoder, MemoryPartition};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// One store handle, seen through each of its capabilities.
struct Stores {
    account_penalties: SharedAccountPenaltiesStore,
    payable_resources: SharedPayableResourceStore,
    lifecycle: Arc<dyn StoreLifecycle>,
}

impl Stores {
    fn from_handle<S>(store: S) -> Self
    where
        S: AccountPenaltiesStore + PayableResourceStore + StoreLifecycle + Clone + 'static,
    {
        Self {
            account_penalties: Arc::new(store.clone()),
            payable_resources: Arc::new(store.clone()),
            lifecycle: Arc::new(store),
        }
    }
}

fn open_stores(config: &Config) -> Result<Stores> {
    if let Some(db_path) = &config.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            use penalty_payments::infrastructure::rocksdb::RocksDBStore;
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            return Ok(Stores::from_handle(store));
        }

        #[cfg(not(feature = "storage-rocksdb"))]
        {
            warn!(
                db_path = %db_path.display(),
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }

    Ok(Stores::from_handle(InMemoryStore::new()))
}

fn seed_partition(partition: &MemoryPartition, path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path).into_diagnostic()?;
    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        partition.publish(line.to_owned());
    }
    info!(events = partition.len(), path = %path.display(), "partition seeded");
    Ok(())
}

/// Cancels `shutdown` once the last message in `partition` has been committed.
async fn cancel_when_drained(partition: MemoryPartition, shutdown: CancellationToken) {
    loop {
        let drained = match partition.len() {
            0 => true,
            len => partition.committed_offset().await == Some(len as u64 - 1),
        };
        if drained {
            info!("partition drained");
            shutdown.cancel();
            return;
        }
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    let ledger: SharedLedger =
        Arc::new(LedgerClient::new(config.ledger_client_config()).into_diagnostic()?);
    let stores = open_stores(&config)?;
    stores.lifecycle.ping().await.into_diagnostic()?;

    let partition = MemoryPartition::new(config.partition);
    if let Some(events) = &config.events {
        seed_partition(&partition, events)?;
    }

    let handler = Arc::new(PenaltyPaymentHandler::new(
        ledger,
        stores.account_penalties.clone(),
        stores.payable_resources.clone(),
    ));
    let consumer = PaymentConsumer::new(
        Arc::new(partition.clone()),
        Arc::new(JsonEventDecoder),
        handler,
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => error!(error = %e, "failed to listen for interrupt"),
            }
        }
    });
    if config.exit_when_drained {
        tokio::spawn(cancel_when_drained(partition, shutdown.clone()));
    }

    let mut supervisor =
        Supervisor::new("payment-consumer", shutdown.clone()).with_backoff(config.restart_backoff());
    supervisor
        .run(|| {
            let consumer = consumer.clone();
            let shutdown = shutdown.clone();
            async move { consumer.run(shutdown).await }
        })
        .await;

    stores.lifecycle.shutdown().await;
    Ok(())
}
