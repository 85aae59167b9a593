//! Collaborator seams implemented by the integrating application.

use async_trait::async_trait;
use bytes::Bytes;
use masking::Secret;
use opayo_core::{
    errors::{CustomResult, ValidationError},
    types::{NotificationPayload, TransactionFields},
};

use crate::errors::{DelegateError, TransportError};

/// HTTP method of an outbound exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
}

/// One outbound HTTP exchange, fully assembled by the client.
#[derive(Clone, Debug)]
pub struct Request {
    /// HTTP method to use.
    pub method: Method,
    /// Absolute URL of the gateway endpoint.
    pub url: String,
    /// Headers to send, including the content type.
    pub headers: Vec<(String, String)>,
    /// Form-encoded request body.
    pub body: String,
}

/// The raw reply to an outbound exchange.
#[derive(Clone, Debug)]
pub struct Response {
    /// HTTP status code.
    pub status_code: u16,
    /// Raw reply body.
    pub body: Bytes,
}

/// Executes outbound HTTP exchanges.
///
/// Timeouts, retries and connection pooling all live behind this seam; the
/// client itself never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the exchange and returns the raw reply.
    async fn send(&self, request: Request) -> CustomResult<Response, TransportError>;
}

/// Validates an outbound field set before anything is built or sent.
pub trait TransactionValidator: Send + Sync {
    /// Checks `fields`, returning the first violation found.
    fn validate(&self, fields: &TransactionFields) -> CustomResult<(), ValidationError>;
}

/// Application-side capabilities notification handling relies on.
///
/// The already-processed check is a read of the caller's idempotency store.
/// The matching write (performed inside [`Self::on_success`] or
/// [`Self::on_failure`]) must be atomic with that read from the caller's
/// side, or two concurrent notifications for one `VPSTxId` can both pass the
/// check. The client only exposes the seam; it does not deduplicate.
#[async_trait]
pub trait NotificationDelegate: Send + Sync {
    /// The security key persisted when `vendor_tx_code` was registered.
    async fn security_key(&self, vendor_tx_code: &str)
        -> CustomResult<Secret<String>, DelegateError>;

    /// Whether `vps_tx_id` has already been fully processed.
    async fn is_processed(&self, vps_tx_id: &str) -> CustomResult<bool, DelegateError>;

    /// Cardholder-facing URL for a completed transaction.
    async fn redirect_url(&self, vendor_tx_code: &str) -> CustomResult<String, DelegateError>;

    /// Called once for a first-seen approved notification.
    async fn on_success(
        &self,
        vendor_tx_code: &str,
        payload: &NotificationPayload,
    ) -> CustomResult<(), DelegateError>;

    /// Called once for a first-seen non-approved notification.
    async fn on_failure(
        &self,
        vendor_tx_code: &str,
        payload: &NotificationPayload,
    ) -> CustomResult<(), DelegateError>;

    /// Called when a notification arrives for an already-processed
    /// transaction.
    async fn on_repeat(&self, vendor_tx_code: &str) -> CustomResult<(), DelegateError>;
}
