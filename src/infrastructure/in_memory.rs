use crate::domain::ledger::LedgerAction;
use crate::domain::payable::PayableResource;
use crate::domain::penalties::{AccountPenalties, now_millis};
use crate::domain::ports::{AccountPenaltiesStore, PayableResourceStore, StoreLifecycle};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

type CompoundKey = (String, String);

fn key(a: &str, b: &str) -> CompoundKey {
    (a.to_string(), b.to_string())
}

/// Payable resources by id, plus the id most recently inserted for each
/// `(customer_code, payable_ref)`.
#[derive(Default)]
struct PayableTable {
    by_id: HashMap<String, PayableResource>,
    by_ref: HashMap<CompoundKey, String>,
}

impl PayableTable {
    fn latest(&self, customer_code: &str, payable_ref: &str) -> Option<&PayableResource> {
        self.by_ref
            .get(&key(customer_code, payable_ref))
            .and_then(|id| self.by_id.get(id))
    }
}

/// A thread-safe in-memory store holding both record families.
///
/// Clones share the same maps and connection state, so one handle can be
/// created at startup and handed to every component.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    penalties: Arc<RwLock<HashMap<CompoundKey, AccountPenalties>>>,
    payables: Arc<RwLock<PayableTable>>,
    shut_down: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new, empty, connected store.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.shut_down.load(Ordering::Acquire) {
            Err(StoreError::Disconnected)
        } else {
            Ok(())
        }
    }

    /// Number of account penalties documents held.
    pub async fn account_penalties_count(&self) -> usize {
        self.penalties.read().await.len()
    }
}

#[async_trait]
impl AccountPenaltiesStore for InMemoryStore {
    async fn create_account_penalties(&self, record: AccountPenalties) -> Result<()> {
        self.ensure_connected()?;
        let mut penalties = self.penalties.write().await;
        let key = key(&record.customer_code, &record.company_code);
        if penalties.contains_key(&key) {
            info!(
                customer_code = %key.0,
                company_code = %key.1,
                "account penalties already exist, nothing inserted"
            );
        } else {
            info!(
                customer_code = %key.0,
                company_code = %key.1,
                "account penalties inserted"
            );
            penalties.insert(key, record);
        }
        Ok(())
    }

    async fn get_account_penalties(
        &self,
        customer_code: &str,
        company_code: &str,
    ) -> Result<Option<AccountPenalties>> {
        self.ensure_connected()?;
        let penalties = self.penalties.read().await;
        Ok(penalties.get(&key(customer_code, company_code)).cloned())
    }

    async fn update_account_penalty_as_paid(
        &self,
        customer_code: &str,
        company_code: &str,
        transaction_reference: &str,
    ) -> Result<()> {
        self.ensure_connected()?;
        let mut penalties = self.penalties.write().await;
        let updated = penalties
            .get_mut(&key(customer_code, company_code))
            .is_some_and(|doc| doc.mark_paid(transaction_reference, now_millis()));
        if !updated {
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
        self.ensure_connected()?;
        let mut penalties = self.penalties.write().await;
        penalties.remove(&key(customer_code, company_code));
        Ok(())
    }
}

#[async_trait]
impl PayableResourceStore for InMemoryStore {
    async fn create_payable_resource(&self, mut record: PayableResource) -> Result<PayableResource> {
        self.ensure_connected()?;
        record.id = Uuid::new_v4().to_string();
        let mut payables = self.payables.write().await;
        payables.by_ref.insert(
            key(&record.customer_code, &record.payable_ref),
            record.id.clone(),
        );
        payables.by_id.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_payable_resource(
        &self,
        customer_code: &str,
        payable_ref: &str,
    ) -> Result<Option<PayableResource>> {
        self.ensure_connected()?;
        let payables = self.payables.read().await;
        Ok(payables.latest(customer_code, payable_ref).cloned())
    }

    async fn update_payment_details(&self, record: &PayableResource) -> Result<()> {
        self.ensure_connected()?;
        let mut payables = self.payables.write().await;
        if let Some(existing) = payables.by_id.get_mut(&record.id) {
            existing.data.payment = record.data.payment.clone();
        }
        Ok(())
    }

    async fn save_e5_error(
        &self,
        customer_code: &str,
        payable_ref: &str,
        action: LedgerAction,
    ) -> Result<()> {
        // Read then write by id, as two separate steps: concurrent callers
        // race and the last write wins.
        let Some(resource) = self.get_payable_resource(customer_code, payable_ref).await? else {
            debug!(customer_code, payable_ref, "no payable resource to record e5 error on");
            return Ok(());
        };

        let mut payables = self.payables.write().await;
        if let Some(existing) = payables.by_id.get_mut(&resource.id) {
            existing.e5_command_error = Some(action);
        }
        Ok(())
    }
}

#[async_trait]
impl StoreLifecycle for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        self.ensure_connected()
    }

    async fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            info!("in-memory store shut down");
        }
    }
}
