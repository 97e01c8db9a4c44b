//! HTTP adapter for the external financial ledger.

pub mod validation;

use crate::domain::ledger::{
    AuthorisePaymentInput, CreatePaymentInput, ErrorEnvelope, GetTransactionsInput, LedgerAction,
    PaymentActionInput, TransactionsResponse,
};
use crate::domain::ports::Ledger;
use crate::error::{LedgerClientError, LedgerError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use validation::Validate;

/// Query parameter identifying this service to the ledger, sent on every request.
pub const SERVICE_IDENTITY_PARAM: (&str, &str) = ("ADV_userName", "SYSTEM");

/// Transaction history is always requested from this date onwards.
pub const TRANSACTIONS_FROM_DATE: &str = "1990-01-01";

#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl LedgerClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Stateless ledger client. Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: Client,
    base_url: Url,
}

impl LedgerClient {
    /// Creates a new `LedgerClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Base URL of the ledger API and the per-request timeout.
    ///   The base URL may carry a path prefix; endpoint paths are appended to it.
    pub fn new(config: LedgerClientConfig) -> Result<Self, LedgerClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| LedgerClientError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(LedgerClientError::InvalidBaseUrl(config.base_url));
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so the segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send_action<I>(&self, action: LedgerAction, input: &I) -> Result<(), LedgerError>
    where
        I: Serialize + Validate + Sync,
    {
        input.validate()?;

        let url = self.endpoint(action.path().split('/').filter(|s| !s.is_empty()));
        debug!(%action, %url, "sending ledger action");

        let response = self
            .client
            .post(url)
            .query(&[SERVICE_IDENTITY_PARAM])
            .json(input)
            .send()
            .await
            .map_err(|e| LedgerError::BodyRead(e.to_string()))?;

        check_status(response).await.map(|_| ())
    }
}

/// Maps a non-200 response onto the ledger error taxonomy.
///
/// The error envelope must be readable before the status is looked at; a body
/// that cannot be read or parsed is reported as `BodyRead`.
async fn check_status(response: Response) -> Result<Response, LedgerError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| LedgerError::BodyRead(e.to_string()))?;
    let envelope: ErrorEnvelope = serde_json::from_slice(&body).map_err(|e| {
        LedgerError::BodyRead(format!("unreadable error body for status {status}: {e}"))
    })?;

    warn!(
        status = status.as_u16(),
        message = %envelope.message,
        message_code = envelope.message_code.as_deref().unwrap_or_default(),
        "ledger returned an error"
    );

    Err(match status {
        StatusCode::BAD_REQUEST => LedgerError::BadRequest(envelope),
        StatusCode::NOT_FOUND => LedgerError::NotFound(envelope),
        StatusCode::INTERNAL_SERVER_ERROR => LedgerError::InternalServer(envelope),
        other => LedgerError::Unexpected {
            status: other.as_u16(),
            envelope,
        },
    })
}

#[async_trait]
impl Ledger for LedgerClient {
    async fn create_payment(&self, input: &CreatePaymentInput) -> Result<(), LedgerError> {
        self.send_action(LedgerAction::Create, input).await
    }

    async fn authorise_payment(&self, input: &AuthorisePaymentInput) -> Result<(), LedgerError> {
        self.send_action(LedgerAction::Authorise, input).await
    }

    async fn confirm_payment(&self, input: &PaymentActionInput) -> Result<(), LedgerError> {
        self.send_action(LedgerAction::Confirm, input).await
    }

    async fn timeout_payment(&self, input: &PaymentActionInput) -> Result<(), LedgerError> {
        self.send_action(LedgerAction::Timeout, input).await
    }

    async fn reject_payment(&self, input: &PaymentActionInput) -> Result<(), LedgerError> {
        self.send_action(LedgerAction::Reject, input).await
    }

    async fn get_transactions(
        &self,
        input: &GetTransactionsInput,
    ) -> Result<TransactionsResponse, LedgerError> {
        input.validate()?;

        let url = self.endpoint(["arTransactions", input.customer_code.as_str()]);
        debug!(%url, company_code = %input.company_code, "querying ledger transactions");

        let response = self
            .client
            .get(url)
            .query(&[
                ("companyCode", input.company_code.as_str()),
                ("fromDate", TRANSACTIONS_FROM_DATE),
                SERVICE_IDENTITY_PARAM,
            ])
            .send()
            .await
            .map_err(|e| LedgerError::BodyRead(e.to_string()))?;

        let response = check_status(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| LedgerError::BodyRead(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| LedgerError::BodyRead(e.to_string()))
    }
}
