//! Outbound request assembly and gateway reply parsing.

use std::collections::HashMap;

use error_stack::{report, ResultExt};
use masking::Secret;
use serde::Serialize;

use crate::{
    consts,
    crypto::CryptPayload,
    errors::{BuildError, CustomResult, ParsingError},
    types::{GatewayResponse, TransactionFields},
};

/// The registration POST sent to the gateway.
///
/// The outer body carries exactly these four fields; every transaction field
/// travels inside the crypt envelope. Adding anything else to the outer body
/// is a protocol violation.
#[derive(Debug, Serialize)]
pub struct RegistrationRequest {
    #[serde(rename = "VPSProtocol")]
    vps_protocol: &'static str,
    #[serde(rename = "TxType")]
    tx_type: &'static str,
    #[serde(rename = "Vendor")]
    vendor: String,
    #[serde(rename = "Crypt")]
    crypt: CryptPayload,
}

impl TryFrom<(&TransactionFields, &str, &Secret<String>)> for RegistrationRequest {
    type Error = error_stack::Report<BuildError>;

    fn try_from(
        (fields, vendor, encryption_key): (&TransactionFields, &str, &Secret<String>),
    ) -> Result<Self, Self::Error> {
        if fields.vendor_tx_code().map_or(true, str::is_empty) {
            return Err(report!(BuildError::MissingVendorTxCode));
        }
        let encoded_fields =
            serde_urlencoded::to_string(fields).change_context(BuildError::RequestEncodingFailed)?;
        let crypt = CryptPayload::from_plaintext(encoded_fields.as_bytes(), encryption_key)
            .change_context(BuildError::EncryptionFailed)?;
        Ok(Self {
            vps_protocol: consts::VPS_PROTOCOL,
            tx_type: consts::TX_TYPE_PAYMENT,
            vendor: vendor.to_owned(),
            crypt,
        })
    }
}

impl RegistrationRequest {
    /// Form-encodes the request into the POST body.
    pub fn to_form_body(&self) -> CustomResult<String, BuildError> {
        serde_urlencoded::to_string(self).change_context(BuildError::RequestEncodingFailed)
    }

    /// The crypt envelope carried in the request.
    pub fn crypt(&self) -> &CryptPayload {
        &self.crypt
    }
}

impl GatewayResponse {
    /// Parses a gateway reply body into a response.
    ///
    /// The gateway replies with form-encoded `key=value` pairs. A reply
    /// without a `Status` field is unusable and rejected outright; everything
    /// else is preserved as received.
    pub fn parse(raw_body: &str) -> CustomResult<Self, ParsingError> {
        if raw_body.trim().is_empty() {
            return Err(report!(ParsingError::EmptyResponse));
        }
        let fields: HashMap<String, String> = serde_urlencoded::from_str(raw_body.trim())
            .change_context(ParsingError::MalformedResponse)?;
        Self::from_fields(fields)
    }
}
