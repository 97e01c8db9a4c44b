#![allow(dead_code)]

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use penalty_payments::domain::event::{PenaltyPaymentEvent, TransactionPayment};
use penalty_payments::domain::penalties::{AccountPenalties, PenaltyItem};
use penalty_payments::infrastructure::ledger::{LedgerClient, LedgerClientConfig};
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub body: String,
}

struct Responder {
    status: StatusCode,
    body: String,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A throwaway HTTP server standing in for the ledger. Answers every request
/// with the same status and body and records what it received.
pub struct MockLedger {
    pub base_url: String,
    responder: Arc<Responder>,
}

async fn respond(
    State(responder): State<Arc<Responder>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, String) {
    responder.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    (responder.status, responder.body.clone())
}

impl MockLedger {
    pub async fn start(status: u16, body: impl Into<String>) -> Self {
        let responder = Arc::new(Responder {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.into(),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .fallback(respond)
            .with_state(responder.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            responder,
        }
    }

    /// Answers 200 with an empty body.
    pub async fn ok() -> Self {
        Self::start(200, "").await
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.responder.requests.lock().unwrap().clone()
    }

    pub fn client(&self) -> LedgerClient {
        LedgerClient::new(LedgerClientConfig::new(&self.base_url)).unwrap()
    }
}

pub fn error_body(status: u16) -> String {
    serde_json::json!({
        "httpStatusCode": status,
        "status": "ERROR",
        "timestamp": "2024-03-01T10:00:00Z",
        "messageCode": "E5-001",
        "message": "request failed",
        "debugMessage": "details",
        "subErrors": [{
            "object": "payment",
            "field": "paymentId",
            "rejectedValue": "P1",
            "message": "unknown payment"
        }]
    })
    .to_string()
}

pub fn penalty_item(reference: &str) -> PenaltyItem {
    PenaltyItem {
        transaction_reference: reference.to_string(),
        transaction_date: None,
        made_up_date: None,
        is_paid: false,
        amount: dec!(150),
        outstanding_amount: dec!(150),
        transaction_type: "1".to_string(),
        transaction_sub_type: "EH".to_string(),
        description: "Late filing penalty".to_string(),
        due_date: None,
        account_status: "CHS".to_string(),
        dunning_status: "PEN1".to_string(),
    }
}

pub fn account_penalties(customer: &str, company: &str, references: &[&str]) -> AccountPenalties {
    AccountPenalties::new(
        customer,
        company,
        references.iter().map(|r| penalty_item(r)).collect(),
    )
}

pub fn payment_event(customer: &str, payment_id: &str, references: &[&str]) -> PenaltyPaymentEvent {
    PenaltyPaymentEvent {
        attempt: 1,
        company_code: "LP".to_string(),
        customer_code: customer.to_string(),
        payment_id: payment_id.to_string(),
        external_payment_id: format!("ext-{payment_id}"),
        payment_reference: format!("ref-{payment_id}"),
        payment_amount: "150.00".to_string(),
        total_value: dec!(150),
        transaction_payments: references
            .iter()
            .map(|r| TransactionPayment {
                transaction_reference: r.to_string(),
                value: dec!(150),
            })
            .collect(),
        card_type: "Visa".to_string(),
        email: "test@example.com".to_string(),
        payable_ref: "XYZ".to_string(),
    }
}

pub fn encode(event: &PenaltyPaymentEvent) -> String {
    serde_json::to_string(event).unwrap()
}
