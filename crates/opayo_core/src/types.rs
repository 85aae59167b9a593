//! Wire data model for registrations, replies and notifications.

use std::collections::HashMap;

use error_stack::{report, ResultExt};
use masking::Secret;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    consts::{self, VENDOR_TX_CODE_SUFFIX_LENGTH},
    errors::{CustomResult, ParsingError},
};

/// Generates a `VendorTxCode` from the current unix timestamp and a random
/// alphanumeric suffix, well inside the gateway's 40-character limit.
pub fn generate_vendor_tx_code() -> String {
    format!(
        "{}-{}",
        OffsetDateTime::now_utc().unix_timestamp(),
        nanoid::nanoid!(VENDOR_TX_CODE_SUFFIX_LENGTH, &consts::ALPHABETS)
    )
}

/// The field set for one transaction registration, spelled the way the
/// gateway expects it on the wire.
///
/// Only the protocol envelope fields (`Amount`, `Currency`, `Description`,
/// `VendorTxCode`) are interpreted by the SDK. Everything else, including any
/// entry in [`extra`](Self::extra), is passed through into the crypt envelope
/// untouched.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TransactionFields {
    /// Caller-chosen idempotency token for this registration. Generated on
    /// first use when absent.
    #[serde(rename = "VendorTxCode", skip_serializing_if = "Option::is_none")]
    pub vendor_tx_code: Option<String>,
    /// Transaction amount in major units, e.g. `"10.00"`.
    #[serde(rename = "Amount")]
    pub amount: String,
    /// ISO 4217 currency code, e.g. `"GBP"`.
    #[serde(rename = "Currency")]
    pub currency: String,
    /// Free-text description shown on the gateway's pages.
    #[serde(rename = "Description")]
    pub description: String,
    /// Cardholder email. Note the gateway's `EMail` capitalisation.
    #[serde(rename = "CustomerEMail", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<Secret<String>>,
    /// Billing surname.
    #[serde(rename = "BillingSurname", skip_serializing_if = "Option::is_none")]
    pub billing_surname: Option<Secret<String>>,
    /// Billing first name(s).
    #[serde(rename = "BillingFirstnames", skip_serializing_if = "Option::is_none")]
    pub billing_firstnames: Option<Secret<String>>,
    /// First line of the billing address.
    #[serde(rename = "BillingAddress1", skip_serializing_if = "Option::is_none")]
    pub billing_address1: Option<Secret<String>>,
    /// Billing city.
    #[serde(rename = "BillingCity", skip_serializing_if = "Option::is_none")]
    pub billing_city: Option<Secret<String>>,
    /// Billing postcode.
    #[serde(rename = "BillingPostCode", skip_serializing_if = "Option::is_none")]
    pub billing_post_code: Option<Secret<String>>,
    /// Billing country as an ISO 3166-1 alpha-2 code.
    #[serde(rename = "BillingCountry", skip_serializing_if = "Option::is_none")]
    pub billing_country: Option<String>,
    /// Delivery surname.
    #[serde(rename = "DeliverySurname", skip_serializing_if = "Option::is_none")]
    pub delivery_surname: Option<Secret<String>>,
    /// Delivery first name(s).
    #[serde(rename = "DeliveryFirstnames", skip_serializing_if = "Option::is_none")]
    pub delivery_firstnames: Option<Secret<String>>,
    /// First line of the delivery address.
    #[serde(rename = "DeliveryAddress1", skip_serializing_if = "Option::is_none")]
    pub delivery_address1: Option<Secret<String>>,
    /// Delivery city.
    #[serde(rename = "DeliveryCity", skip_serializing_if = "Option::is_none")]
    pub delivery_city: Option<Secret<String>>,
    /// Delivery postcode.
    #[serde(rename = "DeliveryPostCode", skip_serializing_if = "Option::is_none")]
    pub delivery_post_code: Option<Secret<String>>,
    /// Delivery country as an ISO 3166-1 alpha-2 code.
    #[serde(rename = "DeliveryCountry", skip_serializing_if = "Option::is_none")]
    pub delivery_country: Option<String>,
    /// Additional gateway fields (`ApplyAVSCV2`, `Basket`, ...) forwarded
    /// verbatim under their own names.
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

impl TransactionFields {
    /// Returns the effective `VendorTxCode`, generating and storing one when
    /// the caller supplied none. The value returned here is exactly what a
    /// subsequent request build will embed, which makes it safe to log or
    /// persist before the exchange.
    pub fn ensure_vendor_tx_code(&mut self) -> &str {
        match self.vendor_tx_code.as_deref() {
            Some(code) if !code.is_empty() => {}
            _ => self.vendor_tx_code = Some(generate_vendor_tx_code()),
        }
        self.vendor_tx_code.as_deref().unwrap_or_default()
    }

    /// The caller-supplied or previously generated `VendorTxCode`, if any.
    pub fn vendor_tx_code(&self) -> Option<&str> {
        self.vendor_tx_code.as_deref()
    }
}

/// Transaction status carried in the `Status` field of replies and
/// notifications.
#[derive(Clone, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum TransactionStatus {
    /// Authorised.
    #[strum(serialize = "OK")]
    Ok,
    /// The cardholder must complete 3-D Secure authentication before the
    /// transaction can proceed.
    #[strum(serialize = "3DAUTH")]
    ThreeDAuth,
    /// Declined by the acquiring bank.
    #[strum(serialize = "NOTAUTHED")]
    NotAuthed,
    /// Rejected by the gateway's fraud screening rules.
    #[strum(serialize = "REJECTED")]
    Rejected,
    /// The gateway reported an internal problem.
    #[strum(serialize = "ERROR")]
    Error,
    /// The request was malformed or referenced unknown data.
    #[strum(serialize = "INVALID")]
    Invalid,
    /// The gateway could not parse the request at all.
    #[strum(serialize = "MALFORMED")]
    Malformed,
    /// The cardholder abandoned the payment pages.
    #[strum(serialize = "ABORT")]
    Abort,
    /// Any status token outside the documented set, preserved verbatim.
    #[strum(default, to_string = "{0}")]
    Other(String),
}

impl TransactionStatus {
    /// Authorised outright.
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Terminally failed. This is the protocol's closed failure set; statuses
    /// outside it (including unknown ones) are neither failed nor accepted.
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            Self::NotAuthed | Self::Rejected | Self::Error | Self::Invalid
        )
    }

    /// Waiting on the cardholder's secondary authentication step.
    pub fn requires_secondary_auth(&self) -> bool {
        matches!(self, Self::ThreeDAuth)
    }

    /// Authorised now, or pending only the secondary authentication step.
    pub fn is_accepted(&self) -> bool {
        self.is_successful() || self.requires_secondary_auth()
    }
}

/// A fully parsed gateway reply.
///
/// Every field the gateway returned is preserved and reachable through
/// [`Self::get`]; the named accessors cover the fields the SDK itself
/// interprets. Instances are immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayResponse {
    fields: HashMap<String, String>,
}

impl GatewayResponse {
    pub(crate) fn from_fields(
        fields: HashMap<String, String>,
    ) -> CustomResult<Self, ParsingError> {
        if !fields.contains_key("Status") {
            return Err(report!(ParsingError::MissingStatus));
        }
        Ok(Self { fields })
    }

    /// The reply status, classified.
    pub fn status(&self) -> TransactionStatus {
        self.raw_status()
            .parse()
            .unwrap_or_else(|_| TransactionStatus::Other(self.raw_status().to_owned()))
    }

    /// The reply status exactly as received.
    pub fn raw_status(&self) -> &str {
        self.get("Status").unwrap_or_default()
    }

    /// Human-readable detail accompanying the status.
    pub fn status_detail(&self) -> Option<&str> {
        self.get("StatusDetail")
    }

    /// Gateway-assigned transaction identifier.
    pub fn vps_tx_id(&self) -> Option<&str> {
        self.get("VPSTxId")
    }

    /// Per-transaction secret later needed to verify notifications. Persist
    /// it keyed by `VendorTxCode`.
    pub fn security_key(&self) -> Option<Secret<String>> {
        self.get("SecurityKey").map(|key| Secret::new(key.to_owned()))
    }

    /// URL to send the cardholder to for the secondary authentication step.
    pub fn next_url(&self) -> Option<&str> {
        self.get("NextURL")
    }

    /// Bank authorisation code, present once authorised.
    pub fn tx_auth_no(&self) -> Option<&str> {
        self.get("TxAuthNo")
    }

    /// Any reply field by its wire name.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Shorthand for `self.status().is_successful()`.
    pub fn is_successful(&self) -> bool {
        self.status().is_successful()
    }

    /// Shorthand for `self.status().is_failed()`.
    pub fn is_failed(&self) -> bool {
        self.status().is_failed()
    }

    /// Shorthand for `self.status().requires_secondary_auth()`.
    pub fn requires_secondary_auth(&self) -> bool {
        self.status().requires_secondary_auth()
    }

    /// Shorthand for `self.status().is_accepted()`.
    pub fn is_accepted(&self) -> bool {
        self.status().is_accepted()
    }
}

/// A server notification POST body, fully percent-decoded.
///
/// Absent fields decode to empty strings, which is also how they enter the
/// signature computation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPayload {
    /// Gateway-assigned transaction identifier.
    #[serde(rename = "VPSTxId")]
    pub vps_tx_id: String,
    /// The `VendorTxCode` this notification refers to.
    #[serde(rename = "VendorTxCode")]
    pub vendor_tx_code: String,
    /// Transaction status token.
    #[serde(rename = "Status")]
    pub status: String,
    /// Human-readable detail accompanying the status. Not part of the
    /// signature.
    #[serde(rename = "StatusDetail")]
    pub status_detail: String,
    /// Bank authorisation code.
    #[serde(rename = "TxAuthNo")]
    pub tx_auth_no: String,
    /// Combined address and card-verification result.
    #[serde(rename = "AVSCV2")]
    pub avs_cv2: String,
    /// Address check result.
    #[serde(rename = "AddressResult")]
    pub address_result: String,
    /// Postcode check result.
    #[serde(rename = "PostCodeResult")]
    pub post_code_result: String,
    /// Card verification value check result.
    #[serde(rename = "CV2Result")]
    pub cv2_result: String,
    /// Gift Aid flag.
    #[serde(rename = "GiftAid")]
    pub gift_aid: String,
    /// 3-D Secure check result.
    #[serde(rename = "3DSecureStatus")]
    pub three_d_secure_status: String,
    /// Cardholder authentication verification value.
    #[serde(rename = "CAVV")]
    pub cavv: String,
    /// PayPal address confirmation status.
    #[serde(rename = "AddressStatus")]
    pub address_status: String,
    /// PayPal payer verification status.
    #[serde(rename = "PayerStatus")]
    pub payer_status: String,
    /// Card scheme used for the payment.
    #[serde(rename = "CardType")]
    pub card_type: String,
    /// Last four digits of the card number.
    #[serde(rename = "Last4Digits")]
    pub last_four_digits: String,
    /// Raw decline code from the acquiring bank.
    #[serde(rename = "DeclineCode")]
    pub decline_code: String,
    /// Card expiry date as MMYY.
    #[serde(rename = "ExpiryDate")]
    pub expiry_date: String,
    /// Fraud screening outcome.
    #[serde(rename = "FraudResponse")]
    pub fraud_response: String,
    /// Bank authorisation code for the settlement.
    #[serde(rename = "BankAuthCode")]
    pub bank_auth_code: String,
    /// MD5 signature over the notification fields, as uppercase hex.
    #[serde(rename = "VPSSignature")]
    pub vps_signature: String,
}

impl NotificationPayload {
    /// Parses a notification POST body.
    pub fn from_form_body(body: &str) -> CustomResult<Self, ParsingError> {
        if body.trim().is_empty() {
            return Err(report!(ParsingError::EmptyResponse));
        }
        serde_urlencoded::from_str(body).change_context(ParsingError::MalformedResponse)
    }

    /// The notification status, classified.
    pub fn transaction_status(&self) -> TransactionStatus {
        self.status
            .parse()
            .unwrap_or_else(|_| TransactionStatus::Other(self.status.clone()))
    }

    /// Value of a signature field sourced from this payload. `VendorName` and
    /// `SecurityKey` are not payload fields and resolve to empty here; the
    /// signature builder substitutes them from configuration.
    pub(crate) fn signature_value_of(&self, field: &str) -> &str {
        match field {
            "VPSTxId" => &self.vps_tx_id,
            "VendorTxCode" => &self.vendor_tx_code,
            "Status" => &self.status,
            "TxAuthNo" => &self.tx_auth_no,
            "AVSCV2" => &self.avs_cv2,
            "AddressResult" => &self.address_result,
            "PostCodeResult" => &self.post_code_result,
            "CV2Result" => &self.cv2_result,
            "GiftAid" => &self.gift_aid,
            "3DSecureStatus" => &self.three_d_secure_status,
            "CAVV" => &self.cavv,
            "AddressStatus" => &self.address_status,
            "PayerStatus" => &self.payer_status,
            "CardType" => &self.card_type,
            "Last4Digits" => &self.last_four_digits,
            "DeclineCode" => &self.decline_code,
            "ExpiryDate" => &self.expiry_date,
            "FraudResponse" => &self.fraud_response,
            "BankAuthCode" => &self.bank_auth_code,
            _ => "",
        }
    }
}

/// Terminal outcome of notification handling, rendered back to the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationAck {
    /// The notification was verified and routed.
    Ok {
        /// Detail line echoed to the gateway.
        status_detail: String,
        /// Where the gateway should send the cardholder next.
        redirect_url: String,
    },
    /// The notification failed verification or referred to a transaction that
    /// was not authorised.
    Invalid {
        /// Detail line echoed to the gateway.
        status_detail: String,
        /// Where the gateway should send the cardholder next.
        redirect_url: String,
    },
    /// An internal collaborator failed; the gateway may retry later.
    Error {
        /// Detail line echoed to the gateway.
        status_detail: String,
        /// Where the gateway should send the cardholder next.
        redirect_url: String,
    },
}

impl NotificationAck {
    /// Wire token for the `Status` line.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Ok { .. } => "OK",
            Self::Invalid { .. } => "INVALID",
            Self::Error { .. } => "ERROR",
        }
    }

    /// Detail line echoed to the gateway.
    pub fn status_detail(&self) -> &str {
        match self {
            Self::Ok { status_detail, .. }
            | Self::Invalid { status_detail, .. }
            | Self::Error { status_detail, .. } => status_detail,
        }
    }

    /// Redirect target for the cardholder.
    pub fn redirect_url(&self) -> &str {
        match self {
            Self::Ok { redirect_url, .. }
            | Self::Invalid { redirect_url, .. }
            | Self::Error { redirect_url, .. } => redirect_url,
        }
    }

    /// The exact CRLF-delimited reply body the gateway expects.
    pub fn to_body(&self) -> String {
        format!(
            "Status={}\r\nStatusDetail={}\r\nRedirectURL={}\r\n",
            self.status(),
            self.status_detail(),
            self.redirect_url()
        )
    }
}
