//! Error taxonomy for the orchestration layer.

use opayo_core::{
    errors::ValidationError,
    types::{GatewayResponse, TransactionStatus},
};

/// Configuration problems caught when the client is constructed. Fatal by
/// design: a client is never handed out with settings that cannot work.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The vendor account name is empty.
    #[error("Vendor name must not be empty")]
    MissingVendorName,
    /// The encryption key is not exactly 16 bytes.
    #[error("Encryption key must be exactly 16 bytes")]
    InvalidEncryptionKey,
    /// The endpoint override is not a parseable URL.
    #[error("Endpoint override is not a valid URL: {url}")]
    InvalidEndpoint {
        /// The value that failed to parse.
        url: String,
    },
    /// The failure redirect path is empty.
    #[error("Failure redirect URL must not be empty")]
    MissingFailureRedirect,
}

/// Context for failures inside the transport collaborator. The concrete
/// cause (connection refused, timeout, TLS) travels in the report beneath
/// this context.
#[derive(Debug, thiserror::Error)]
#[error("Gateway transport failed")]
pub struct TransportError;

/// Context for failures inside the notification delegate (key store,
/// idempotency store, callbacks).
#[derive(Debug, thiserror::Error)]
#[error("Notification delegate failed")]
pub struct DelegateError;

/// Failures surfaced by [`crate::OpayoClient::register`].
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The outbound field set failed validation. Nothing was sent.
    #[error("Transaction fields failed validation: {0}")]
    Validation(ValidationError),
    /// The registration request could not be assembled.
    #[error("Failed to build the registration request")]
    Build,
    /// The HTTP exchange with the gateway failed; the transport's cause is
    /// preserved in the report.
    #[error("Gateway exchange failed")]
    Network,
    /// The gateway replied, but the body could not be interpreted.
    #[error("Gateway returned an unusable response")]
    InvalidResponse,
    /// The gateway processed the registration and did not accept it.
    #[error("Registration rejected by the gateway: {status_detail}")]
    Rejected {
        /// The classified reply status.
        status: TransactionStatus,
        /// The gateway's human-readable detail, empty when none was sent.
        status_detail: String,
        /// The full reply, for diagnostics and logging.
        response: GatewayResponse,
    },
}
