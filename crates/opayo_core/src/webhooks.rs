//! Notification signature construction and verification.

use masking::{PeekInterface, Secret};

use crate::{
    consts,
    crypto::{GenerateDigest, Md5, VerifySignature},
    errors::{CryptoError, CustomResult},
    types::NotificationPayload,
};

/// Builds the exact string the gateway hashed for `VPSSignature`.
///
/// Values are concatenated in [`consts::SIGNATURE_FIELD_ORDER`] with no
/// separators. `VendorName` is the configured vendor account name lowercased
/// and `SecurityKey` is the per-transaction secret; both come from the
/// caller, never from the payload. Every other value is read from the payload
/// already percent-decoded, absent fields contributing an empty string.
pub fn signature_message(
    payload: &NotificationPayload,
    security_key: &Secret<String>,
    vendor_name: &str,
) -> String {
    let vendor_name = vendor_name.to_lowercase();
    let mut message = String::new();
    for field in consts::SIGNATURE_FIELD_ORDER {
        match field {
            "VendorName" => message.push_str(&vendor_name),
            "SecurityKey" => message.push_str(security_key.peek()),
            payload_field => message.push_str(payload.signature_value_of(payload_field)),
        }
    }
    message
}

/// Computes the signature the gateway should have sent for `payload`, as
/// uppercase hex.
pub fn expected_signature(
    payload: &NotificationPayload,
    security_key: &Secret<String>,
    vendor_name: &str,
) -> CustomResult<String, CryptoError> {
    let message = signature_message(payload, security_key, vendor_name);
    let digest = Md5.generate_digest(message.as_bytes())?;
    Ok(hex::encode_upper(digest))
}

/// Verifies the `VPSSignature` carried by `payload`.
///
/// The received hex is accepted in either case; the digest comparison itself
/// runs in constant time. A signature that is not valid hex cannot match and
/// yields `false`, not an error.
pub fn verify_signature(
    payload: &NotificationPayload,
    security_key: &Secret<String>,
    vendor_name: &str,
) -> CustomResult<bool, CryptoError> {
    let message = signature_message(payload, security_key, vendor_name);
    let received = match hex::decode(payload.vps_signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    Md5.verify_signature(&[], &received, message.as_bytes())
}

/// Field-by-field breakdown of one signature computation.
///
/// Development aid for diagnosing mismatches against gateway test systems.
/// The breakdown contains the security key in the clear; never wire this into
/// a production-facing surface.
#[cfg(feature = "signature-debug")]
#[derive(Debug)]
pub struct SignatureTrace {
    /// Each signature field name with the value that entered the message.
    pub fields: Vec<(&'static str, String)>,
    /// The concatenated message that was hashed.
    pub message: String,
    /// The signature computed from the message, as uppercase hex.
    pub computed: String,
    /// The signature the payload carried.
    pub received: String,
}

/// Explains how the signature for `payload` is computed, for comparison
/// against the received value.
#[cfg(feature = "signature-debug")]
pub fn explain_signature(
    payload: &NotificationPayload,
    security_key: &Secret<String>,
    vendor_name: &str,
) -> CustomResult<SignatureTrace, CryptoError> {
    let vendor_name_lower = vendor_name.to_lowercase();
    let fields = consts::SIGNATURE_FIELD_ORDER
        .iter()
        .map(|&field| {
            let value = match field {
                "VendorName" => vendor_name_lower.clone(),
                "SecurityKey" => security_key.peek().clone(),
                payload_field => payload.signature_value_of(payload_field).to_owned(),
            };
            (field, value)
        })
        .collect();
    Ok(SignatureTrace {
        fields,
        message: signature_message(payload, security_key, vendor_name),
        computed: expected_signature(payload, security_key, vendor_name)?,
        received: payload.vps_signature.clone(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    const VENDOR: &str = "testvendor";
    const SECURITY_KEY: &str = "test-security-key";
    const REFERENCE_SIGNATURE: &str = "59F03F6CCE1C1EFCB3C0C563C15AA296";

    fn reference_payload() -> NotificationPayload {
        NotificationPayload {
            vps_tx_id: "{ABCDEF12-3456-7890-ABCD-EF1234567890}".to_string(),
            vendor_tx_code: "demo-1700000000-A1B2C3".to_string(),
            status: "OK".to_string(),
            tx_auth_no: "1234567".to_string(),
            avs_cv2: "ALL MATCH".to_string(),
            address_result: "MATCHED".to_string(),
            post_code_result: "MATCHED".to_string(),
            cv2_result: "MATCHED".to_string(),
            gift_aid: "0".to_string(),
            three_d_secure_status: "OK".to_string(),
            cavv: "AAABBBCCCDDD".to_string(),
            address_status: "CONFIRMED".to_string(),
            payer_status: "VERIFIED".to_string(),
            card_type: "VISA".to_string(),
            last_four_digits: "4242".to_string(),
            decline_code: "00".to_string(),
            expiry_date: "1229".to_string(),
            fraud_response: "ACCEPT".to_string(),
            bank_auth_code: "999777".to_string(),
            vps_signature: REFERENCE_SIGNATURE.to_string(),
            ..Default::default()
        }
    }

    fn security_key() -> Secret<String> {
        Secret::new(SECURITY_KEY.to_string())
    }

    fn set_field(payload: &mut NotificationPayload, field: &str, value: &str) {
        let target = match field {
            "VPSTxId" => &mut payload.vps_tx_id,
            "VendorTxCode" => &mut payload.vendor_tx_code,
            "Status" => &mut payload.status,
            "TxAuthNo" => &mut payload.tx_auth_no,
            "AVSCV2" => &mut payload.avs_cv2,
            "AddressResult" => &mut payload.address_result,
            "PostCodeResult" => &mut payload.post_code_result,
            "CV2Result" => &mut payload.cv2_result,
            "GiftAid" => &mut payload.gift_aid,
            "3DSecureStatus" => &mut payload.three_d_secure_status,
            "CAVV" => &mut payload.cavv,
            "AddressStatus" => &mut payload.address_status,
            "PayerStatus" => &mut payload.payer_status,
            "CardType" => &mut payload.card_type,
            "Last4Digits" => &mut payload.last_four_digits,
            "DeclineCode" => &mut payload.decline_code,
            "ExpiryDate" => &mut payload.expiry_date,
            "FraudResponse" => &mut payload.fraud_response,
            "BankAuthCode" => &mut payload.bank_auth_code,
            other => panic!("not a payload signature field: {other}"),
        };
        *target = value.to_string();
    }

    #[test]
    fn message_concatenates_in_protocol_order() {
        let message = signature_message(&reference_payload(), &security_key(), VENDOR);
        assert_eq!(
            message,
            "{ABCDEF12-3456-7890-ABCD-EF1234567890}demo-1700000000-A1B2C3OK1234567testvendor\
             ALL MATCHtest-security-keyMATCHEDMATCHEDMATCHED0OKAAABBBCCCDDDCONFIRMEDVERIFIED\
             VISA4242001229ACCEPT999777"
        );
    }

    #[test]
    fn computed_signature_matches_reference_digest() {
        let computed =
            expected_signature(&reference_payload(), &security_key(), VENDOR).unwrap();
        assert_eq!(computed, REFERENCE_SIGNATURE);
    }

    #[test]
    fn reference_payload_verifies() {
        assert!(verify_signature(&reference_payload(), &security_key(), VENDOR).unwrap());
    }

    #[test]
    fn vendor_name_is_lowercased_before_hashing() {
        assert!(verify_signature(&reference_payload(), &security_key(), "TestVendor").unwrap());
        let message = signature_message(&reference_payload(), &security_key(), "TESTVENDOR");
        assert!(message.contains("1234567testvendorALL MATCH"));
    }

    #[test]
    fn received_signature_case_is_ignored() {
        let mut payload = reference_payload();
        payload.vps_signature = REFERENCE_SIGNATURE.to_lowercase();
        assert!(verify_signature(&payload, &security_key(), VENDOR).unwrap());
    }

    #[test]
    fn flipping_any_payload_field_breaks_verification() {
        for field in consts::SIGNATURE_FIELD_ORDER {
            if field == "VendorName" || field == "SecurityKey" {
                continue;
            }
            let mut payload = reference_payload();
            let original = payload.signature_value_of(field).to_owned();
            set_field(&mut payload, field, &format!("{original}X"));
            let computed = expected_signature(&payload, &security_key(), VENDOR).unwrap();
            assert_ne!(computed, REFERENCE_SIGNATURE, "digest unchanged for {field}");
            assert!(
                !verify_signature(&payload, &security_key(), VENDOR).unwrap(),
                "tampered {field} still verified"
            );
        }
    }

    #[test]
    fn wrong_security_key_fails_verification() {
        let wrong = Secret::new("another-key-here".to_string());
        assert!(!verify_signature(&reference_payload(), &wrong, VENDOR).unwrap());
    }

    #[test]
    fn non_hex_signature_is_a_mismatch_not_an_error() {
        let mut payload = reference_payload();
        payload.vps_signature = "NOT-VALID-HEX".to_string();
        assert!(!verify_signature(&payload, &security_key(), VENDOR).unwrap());
    }

    #[test]
    fn absent_fields_contribute_empty_strings() {
        let payload = NotificationPayload {
            vendor_tx_code: "order-1".to_string(),
            status: "OK".to_string(),
            ..Default::default()
        };
        let message = signature_message(&payload, &security_key(), VENDOR);
        assert_eq!(message, format!("order-1OKtestvendor{SECURITY_KEY}"));
    }

    #[cfg(feature = "signature-debug")]
    #[test]
    fn trace_reports_every_field_in_order() {
        let trace =
            explain_signature(&reference_payload(), &security_key(), VENDOR).unwrap();
        assert_eq!(trace.fields.len(), 21);
        assert_eq!(trace.fields.first(), Some(&("VPSTxId", reference_payload().vps_tx_id)));
        assert_eq!(
            trace.fields.get(4),
            Some(&("VendorName", VENDOR.to_string()))
        );
        assert_eq!(
            trace.fields.get(6),
            Some(&("SecurityKey", SECURITY_KEY.to_string()))
        );
        assert_eq!(trace.computed, REFERENCE_SIGNATURE);
        assert_eq!(trace.received, REFERENCE_SIGNATURE);
        assert_eq!(
            trace.message,
            signature_message(&reference_payload(), &security_key(), VENDOR)
        );
    }
}
