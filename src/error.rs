use crate::domain::ledger::ErrorEnvelope;
use std::fmt;
use thiserror::Error;

/// A single failed input rule, e.g. `PaymentID` / `required`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub rule: &'static str,
}

/// Every rule an action input violated, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, rule: &'static str) {
        self.violations.push(FieldViolation {
            field: field.into(),
            rule,
        });
    }

    /// Adds a `required` violation when `value` is blank.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "required");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Names of the violated fields.
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }

    /// `Ok(())` when nothing was violated.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{} is {}", v.field, v.rule))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors returned by the ledger client.
///
/// Validation failures never reach the network. `BodyRead` covers transport
/// failures and bodies that cannot be decoded, and takes precedence over any
/// status-code mapping.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid ledger input: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("ledger rejected the request (400): {0}")]
    BadRequest(ErrorEnvelope),
    #[error("ledger resource not found (404): {0}")]
    NotFound(ErrorEnvelope),
    #[error("ledger internal error (500): {0}")]
    InternalServer(ErrorEnvelope),
    #[error("unexpected ledger status {status}: {envelope}")]
    Unexpected { status: u16, envelope: ErrorEnvelope },
    #[error("failed to read ledger response: {0}")]
    BodyRead(String),
}

impl LedgerError {
    /// The error envelope sent by the ledger, if it sent one.
    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            Self::BadRequest(e) | Self::NotFound(e) | Self::InternalServer(e) => Some(e),
            Self::Unexpected { envelope, .. } => Some(envelope),
            Self::Validation(_) | Self::BodyRead(_) => None,
        }
    }
}

/// Errors building a ledger client.
#[derive(Error, Debug)]
pub enum LedgerClientError {
    #[error("invalid ledger base url: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors returned by the persistence adapters.
///
/// An absent record is never an error: lookups return `Ok(None)`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store connection has been shut down")]
    Disconnected,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Failure to turn a partition message into a `PenaltyPaymentEvent`.
#[derive(Error, Debug)]
#[error("failed to decode penalty payment event: {0}")]
pub struct DecodeError(pub String);

/// Errors returned by the payment handler for a single event.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("ledger {action} action failed: {source}")]
    Ledger {
        action: crate::domain::ledger::LedgerAction,
        #[source]
        source: LedgerError,
    },
    #[error("failed to update account penalties: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the account penalties read path.
#[derive(Error, Debug)]
pub enum PenaltiesError {
    #[error("failed to fetch ledger transactions: {0}")]
    Ledger(#[from] LedgerError),
    #[error("account penalties store failed: {0}")]
    Store(#[from] StoreError),
}

/// Errors that end a consumer run.
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("failed to subscribe to partition {partition}: {reason}")]
    Subscribe { partition: i32, reason: String },
    #[error("failed to receive from partition: {0}")]
    Receive(String),
    #[error("failed to commit offset {offset}: {reason}")]
    Commit { offset: u64, reason: String },
    #[error("partition subscription closed")]
    SubscriptionClosed,
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
