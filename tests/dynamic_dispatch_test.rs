mod common;

use common::account_penalties;
use penalty_payments::domain::payable::PayableResource;
use penalty_payments::domain::ports::{SharedAccountPenaltiesStore, SharedPayableResourceStore};
use penalty_payments::infrastructure::in_memory::InMemoryStore;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let store = InMemoryStore::new();
    let penalties: SharedAccountPenaltiesStore = Arc::new(store.clone());
    let payables: SharedPayableResourceStore = Arc::new(store);

    // Verify Send + Sync by spawning tasks
    let penalties_handle = tokio::spawn({
        let penalties = penalties.clone();
        async move {
            penalties
                .create_account_penalties(account_penalties("10000024", "LP", &["U1234567"]))
                .await
                .unwrap();
            penalties
                .update_account_penalty_as_paid("10000024", "LP", "U1234567")
                .await
                .unwrap();
            penalties
                .get_account_penalties("10000024", "LP")
                .await
                .unwrap()
                .unwrap()
        }
    });

    let payables_handle = tokio::spawn({
        let payables = payables.clone();
        async move {
            payables
                .create_payable_resource(PayableResource::new("10000024", "XYZ", dec!(150)))
                .await
                .unwrap()
        }
    });

    let doc = penalties_handle.await.unwrap();
    assert!(doc.item("U1234567").unwrap().is_paid);

    let created = payables_handle.await.unwrap();
    let fetched = payables
        .get_payable_resource("10000024", "XYZ")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, created);
}
