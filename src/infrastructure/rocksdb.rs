use crate::domain::ledger::LedgerAction;
use crate::domain::payable::PayableResource;
use crate::domain::penalties::{AccountPenalties, now_millis};
use crate::domain::ports::{AccountPenaltiesStore, PayableResourceStore, StoreLifecycle};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Column Family for account penalties, keyed by customer and company code.
pub const CF_ACCOUNT_PENALTIES: &str = "account_penalties";
/// Column Family for payable resources, keyed by identifier.
pub const CF_PAYABLE_RESOURCES: &str = "payable_resources";
/// Column Family mapping customer code and payable ref to the identifier of
/// the most recently created resource for that pair.
pub const CF_PAYABLE_REFS: &str = "payable_refs";

const KEY_SEPARATOR: char = '\u{1f}';

fn compound_key(a: &str, b: &str) -> Vec<u8> {
    format!("{a}{KEY_SEPARATOR}{b}").into_bytes()
}

fn column_family<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily> {
    db.cf_handle(name).ok_or_else(|| {
        StoreError::Backend(Box::new(std::io::Error::other(format!(
            "{name} column family not found"
        ))))
    })
}

fn read_json<T: DeserializeOwned>(db: &DB, cf: &str, key: &[u8]) -> Result<Option<T>> {
    let cf = column_family(db, cf)?;
    match db.get_pinned_cf(cf, key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn write_json<T: Serialize>(db: &DB, cf: &str, key: &[u8], value: &T) -> Result<()> {
    let cf = column_family(db, cf)?;
    db.put_cf(cf, key, serde_json::to_vec(value)?)?;
    Ok(())
}

/// A persistent store implementation using RocksDB.
///
/// Each record family lives in its own Column Family. Conditional writes
/// (insert-if-absent, mark-paid) are serialized through a single write lock so
/// their read and write happen as one step.
///
/// Clones share the underlying database handle; `shutdown` closes it for all
/// of them.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<RwLock<Option<Arc<DB>>>>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating
    /// any missing column families.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_ACCOUNT_PENALTIES, CF_PAYABLE_RESOURCES, CF_PAYABLE_REFS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, families)?;
        info!("rocksdb store opened");

        Ok(Self {
            db: Arc::new(RwLock::new(Some(Arc::new(db)))),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    async fn handle(&self) -> Result<Arc<DB>> {
        self.db.read().await.clone().ok_or(StoreError::Disconnected)
    }
}

#[async_trait]
impl AccountPenaltiesStore for RocksDBStore {
    async fn create_account_penalties(&self, record: AccountPenalties) -> Result<()> {
        let db = self.handle().await?;
        let key = compound_key(&record.customer_code, &record.company_code);

        let _guard = self.write_lock.lock().await;
        let cf = column_family(&db, CF_ACCOUNT_PENALTIES)?;
        if db.get_pinned_cf(cf, &key)?.is_some() {
            info!(
                customer_code = %record.customer_code,
                company_code = %record.company_code,
                "account penalties already exist, nothing inserted"
            );
            return Ok(());
        }

        write_json(&db, CF_ACCOUNT_PENALTIES, &key, &record)?;
        info!(
            customer_code = %record.customer_code,
            company_code = %record.company_code,
            "account penalties inserted"
        );
        Ok(())
    }

    async fn get_account_penalties(
        &self,
        customer_code: &str,
        company_code: &str,
    ) -> Result<Option<AccountPenalties>> {
        let db = self.handle().await?;
        read_json(
            &db,
            CF_ACCOUNT_PENALTIES,
            &compound_key(customer_code, company_code),
        )
    }

    async fn update_account_penalty_as_paid(
        &self,
        customer_code: &str,
        company_code: &str,
        transaction_reference: &str,
    ) -> Result<()> {
        let db = self.handle().await?;
        let key = compound_key(customer_code, company_code);

        let _guard = self.write_lock.lock().await;
        let Some(mut doc) = read_json::<AccountPenalties>(&db, CF_ACCOUNT_PENALTIES, &key)? else {
            debug!(customer_code, company_code, "no account penalties to mark paid");
            return Ok(());
        };

        if doc.mark_paid(transaction_reference, now_millis()) {
            write_json(&db, CF_ACCOUNT_PENALTIES, &key, &doc)?;
        } else {
            debug!(
                customer_code,
                company_code, transaction_reference, "no penalty matched, nothing marked paid"
            );
        }
        Ok(())
    }

    async fn delete_account_penalties(
        &self,
        customer_code: &str,
        company_code: &str,
    ) -> Result<()> {
        let db = self.handle().await?;
        let cf = column_family(&db, CF_ACCOUNT_PENALTIES)?;
        db.delete_cf(cf, compound_key(customer_code, company_code))?;
        Ok(())
    }
}

#[async_trait]
impl PayableResourceStore for RocksDBStore {
    async fn create_payable_resource(&self, mut record: PayableResource) -> Result<PayableResource> {
        let db = self.handle().await?;
        record.id = Uuid::new_v4().to_string();

        let resources = column_family(&db, CF_PAYABLE_RESOURCES)?;
        let refs = column_family(&db, CF_PAYABLE_REFS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(resources, record.id.as_bytes(), serde_json::to_vec(&record)?);
        batch.put_cf(
            refs,
            compound_key(&record.customer_code, &record.payable_ref),
            record.id.as_bytes(),
        );
        db.write(batch)?;

        Ok(record)
    }

    async fn get_payable_resource(
        &self,
        customer_code: &str,
        payable_ref: &str,
    ) -> Result<Option<PayableResource>> {
        let db = self.handle().await?;
        let refs = column_family(&db, CF_PAYABLE_REFS)?;
        match db.get_pinned_cf(refs, compound_key(customer_code, payable_ref))? {
            Some(id) => read_json(&db, CF_PAYABLE_RESOURCES, &id),
            None => Ok(None),
        }
    }

    async fn update_payment_details(&self, record: &PayableResource) -> Result<()> {
        let db = self.handle().await?;
        let key = record.id.as_bytes();

        let _guard = self.write_lock.lock().await;
        if let Some(mut existing) = read_json::<PayableResource>(&db, CF_PAYABLE_RESOURCES, key)? {
            existing.data.payment = record.data.payment.clone();
            write_json(&db, CF_PAYABLE_RESOURCES, key, &existing)?;
        }
        Ok(())
    }

    async fn save_e5_error(
        &self,
        customer_code: &str,
        payable_ref: &str,
        action: LedgerAction,
    ) -> Result<()> {
        let Some(resource) = self.get_payable_resource(customer_code, payable_ref).await? else {
            debug!(customer_code, payable_ref, "no payable resource to record e5 error on");
            return Ok(());
        };

        let db = self.handle().await?;
        let key = resource.id.as_bytes();

        let _guard = self.write_lock.lock().await;
        if let Some(mut existing) = read_json::<PayableResource>(&db, CF_PAYABLE_RESOURCES, key)? {
            existing.e5_command_error = Some(action);
            write_json(&db, CF_PAYABLE_RESOURCES, key, &existing)?;
        }
        Ok(())
    }
}

#[async_trait]
impl StoreLifecycle for RocksDBStore {
    async fn ping(&self) -> Result<()> {
        let db = self.handle().await?;
        for name in [CF_ACCOUNT_PENALTIES, CF_PAYABLE_RESOURCES, CF_PAYABLE_REFS] {
            column_family(&db, name)?;
        }
        Ok(())
    }

    async fn shutdown(&self) {
        let Some(db) = self.db.write().await.take() else {
            return;
        };
        if let Err(e) = db.flush() {
            error!(error = %e, "failed to flush rocksdb before shutdown");
        }
        info!("rocksdb store shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::penalties::fixtures::account;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_rocksdb_account_penalties() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let first = account("10000024", "LP", &["A0000001", "U1234567"]);
        store.create_account_penalties(first.clone()).await.unwrap();
        store
            .create_account_penalties(account("10000024", "LP", &["B0000002"]))
            .await
            .unwrap();

        let stored = store
            .get_account_penalties("10000024", "LP")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, first);

        store
            .update_account_penalty_as_paid("10000024", "LP", "U1234567")
            .await
            .unwrap();
        let updated = store
            .get_account_penalties("10000024", "LP")
            .await
            .unwrap()
            .unwrap();
        assert!(updated.item("U1234567").unwrap().is_paid);
        assert!(!updated.item("A0000001").unwrap().is_paid);
        assert!(updated.closed_at.is_some());

        store.delete_account_penalties("10000024", "LP").await.unwrap();
        assert!(
            store
                .get_account_penalties("10000024", "LP")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_rocksdb_payable_resources() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let created = store
            .create_payable_resource(PayableResource::new("10000024", "XYZ", dec!(150)))
            .await
            .unwrap();
        store
            .save_e5_error("10000024", "XYZ", LedgerAction::Confirm)
            .await
            .unwrap();

        let fetched = store
            .get_payable_resource("10000024", "XYZ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.e5_command_error, Some(LedgerAction::Confirm));
    }

    #[tokio::test]
    async fn test_rocksdb_duplicate_payable_ref_resolves_to_latest_insert() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let older = store
            .create_payable_resource(PayableResource::new("10000024", "XYZ", dec!(100)))
            .await
            .unwrap();
        let newer = store
            .create_payable_resource(PayableResource::new("10000024", "XYZ", dec!(150)))
            .await
            .unwrap();

        let fetched = store
            .get_payable_resource("10000024", "XYZ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, newer.id);

        store
            .save_e5_error("10000024", "XYZ", LedgerAction::Confirm)
            .await
            .unwrap();
        let db = store.handle().await.unwrap();
        let newer: PayableResource = read_json(&db, CF_PAYABLE_RESOURCES, newer.id.as_bytes())
            .unwrap()
            .unwrap();
        let older: PayableResource = read_json(&db, CF_PAYABLE_RESOURCES, older.id.as_bytes())
            .unwrap()
            .unwrap();
        assert_eq!(newer.e5_command_error, Some(LedgerAction::Confirm));
        assert_eq!(older.e5_command_error, None);
    }

    #[tokio::test]
    async fn test_rocksdb_shutdown() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        store.shutdown().await;
        store.shutdown().await;

        assert!(matches!(store.ping().await, Err(StoreError::Disconnected)));
    }
}
