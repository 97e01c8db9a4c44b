use super::ledger::LedgerAction;
use super::penalties::now_millis;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Cancelled,
}

/// Outcome of the card payment for a payable resource.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct PaymentDetails {
    pub status: PaymentStatus,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct PayableData {
    pub payment: PaymentDetails,
}

/// One payment session and its outcome.
///
/// `e5_command_error` holds the most recent ledger action that failed for
/// this session. Nothing clears it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PayableResource {
    #[serde(rename = "_id")]
    pub id: String,
    pub customer_code: String,
    pub payable_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e5_command_error: Option<LedgerAction>,
    pub created_at: DateTime<Utc>,
    pub data: PayableData,
}

impl PayableResource {
    /// A pending payment session. The identifier is assigned by the store on
    /// insert.
    pub fn new(
        customer_code: impl Into<String>,
        payable_ref: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            id: String::new(),
            customer_code: customer_code.into(),
            payable_ref: payable_ref.into(),
            e5_command_error: None,
            created_at: now_millis(),
            data: PayableData {
                payment: PaymentDetails {
                    amount,
                    ..Default::default()
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_payable_resource_is_pending() {
        let resource = PayableResource::new("10000024", "XYZ", dec!(150));
        assert_eq!(resource.data.payment.status, PaymentStatus::Pending);
        assert_eq!(resource.data.payment.amount, dec!(150));
        assert!(resource.id.is_empty());
        assert!(resource.e5_command_error.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let mut resource = PayableResource::new("10000024", "XYZ", dec!(150));
        resource.id = "abc".to_string();
        resource.e5_command_error = Some(LedgerAction::Confirm);

        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["_id"], "abc");
        assert_eq!(json["e5_command_error"], "confirm");
        assert_eq!(json["data"]["payment"]["status"], "pending");
    }
}
