//! Errors for the protocol core.

/// The shared result type, carrying an [`error_stack::Report`] around the
/// context type.
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Failures inside the crypt cipher and signature primitives.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The encryption key has the wrong length for the cipher.
    #[error("Crypt key must be exactly {expected} bytes, found {found}")]
    InvalidKeyLength {
        /// Length the cipher requires.
        expected: usize,
        /// Length that was supplied.
        found: usize,
    },
    /// Encrypting the field set failed.
    #[error("Failed to encrypt the message")]
    EncodingFailed,
    /// The crypt envelope could not be decrypted.
    #[error("Failed to decrypt the message")]
    DecodingFailed,
    /// The decrypted payload ends in an out-of-range padding byte.
    #[error("Decrypted payload carries invalid padding")]
    InvalidPadding,
    /// The signature could not be computed or compared.
    #[error("Failed to verify the signature")]
    SignatureVerificationFailed,
}

/// Failures while assembling an outbound registration request.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The field set has no `VendorTxCode`; one must be supplied or generated
    /// before the request is built.
    #[error("Missing VendorTxCode in the transaction fields")]
    MissingVendorTxCode,
    /// The field set could not be form-encoded.
    #[error("Failed to encode the transaction fields")]
    RequestEncodingFailed,
    /// The encoded field set could not be encrypted.
    #[error("Failed to encrypt the transaction fields")]
    EncryptionFailed,
}

/// Failures while interpreting a gateway reply body.
#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    /// The reply body was empty.
    #[error("Gateway reply body is empty")]
    EmptyResponse,
    /// The reply body is not a form-encoded key-value set.
    #[error("Gateway reply body is not form-encoded")]
    MalformedResponse,
    /// The reply carries no `Status` field.
    #[error("Gateway reply is missing the Status field")]
    MissingStatus,
}

/// Outbound field validation failures.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was not provided.
    #[error("Missing required field: {field_name}")]
    MissingRequiredField {
        /// Wire name of the absent field.
        field_name: &'static str,
    },
    /// A field was provided with a value the gateway would refuse.
    #[error("Incorrect value provided for field: {field_name}")]
    IncorrectValueProvided {
        /// Wire name of the offending field.
        field_name: &'static str,
    },
    /// A constraint spanning multiple fields was violated.
    #[error("{message}")]
    InvalidValue {
        /// Description of the violated constraint.
        message: String,
    },
}
