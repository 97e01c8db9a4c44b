use crate::domain::ledger::GetTransactionsInput;
use crate::domain::penalties::AccountPenalties;
use crate::domain::ports::{SharedAccountPenaltiesStore, SharedLedger};
use crate::error::PenaltiesError;
use tracing::{debug, info};

/// Answers "is this penalty paid?" from the account penalties cache, going to
/// the ledger only when the cache holds nothing for the account.
#[derive(Clone)]
pub struct AccountPenaltiesService {
    ledger: SharedLedger,
    store: SharedAccountPenaltiesStore,
}

impl AccountPenaltiesService {
    pub fn new(ledger: SharedLedger, store: SharedAccountPenaltiesStore) -> Self {
        Self { ledger, store }
    }

    /// Returns the cached snapshot for an account, building it from the
    /// ledger's transaction history on a cache miss.
    pub async fn get_account_penalties(
        &self,
        customer_code: &str,
        company_code: &str,
    ) -> Result<AccountPenalties, PenaltiesError> {
        if let Some(cached) = self
            .store
            .get_account_penalties(customer_code, company_code)
            .await?
        {
            debug!(customer_code, company_code, "account penalties cache hit");
            return Ok(cached);
        }

        let response = self
            .ledger
            .get_transactions(&GetTransactionsInput {
                customer_code: customer_code.to_string(),
                company_code: company_code.to_string(),
            })
            .await?;
        info!(
            customer_code,
            company_code,
            transactions = response.data.len(),
            "account penalties cache miss, fetched from ledger"
        );

        let snapshot =
            AccountPenalties::from_ledger_transactions(customer_code, company_code, response.data);
        // Insert-if-absent: a concurrent miss may already have stored a
        // snapshot, in which case that one wins.
        self.store.create_account_penalties(snapshot.clone()).await?;

        Ok(self
            .store
            .get_account_penalties(customer_code, company_code)
            .await?
            .unwrap_or(snapshot))
    }

    /// Paid flag of one penalty, or `None` when the account has no penalty
    /// with that reference.
    pub async fn is_penalty_paid(
        &self,
        customer_code: &str,
        company_code: &str,
        transaction_reference: &str,
    ) -> Result<Option<bool>, PenaltiesError> {
        let penalties = self
            .get_account_penalties(customer_code, company_code)
            .await?;
        Ok(penalties
            .item(transaction_reference)
            .map(|item| item.is_paid))
    }
}
