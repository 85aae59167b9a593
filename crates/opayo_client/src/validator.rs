//! Built-in outbound field validation.

use std::sync::LazyLock;

use error_stack::report;
use opayo_core::{
    consts,
    errors::{CustomResult, ValidationError},
    types::TransactionFields,
};
use regex::Regex;

use crate::interfaces::TransactionValidator;

static AMOUNT_FORMAT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d{1,2})?$").ok());

const DESCRIPTION_MAX_LENGTH: usize = 100;

/// Protocol-shape checks on the outbound field set.
///
/// This validator enforces only what the wire format itself requires; account
/// or business rules (amount limits, allowed currencies) belong in a caller
/// supplied [`TransactionValidator`] replacing this one.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultValidator;

impl TransactionValidator for DefaultValidator {
    fn validate(&self, fields: &TransactionFields) -> CustomResult<(), ValidationError> {
        if fields.amount.is_empty() {
            return Err(report!(ValidationError::MissingRequiredField {
                field_name: "Amount",
            }));
        }
        let amount_format = AMOUNT_FORMAT.as_ref().ok_or_else(|| {
            report!(ValidationError::InvalidValue {
                message: "amount pattern could not be compiled".to_string(),
            })
        })?;
        if !amount_format.is_match(&fields.amount) {
            return Err(report!(ValidationError::IncorrectValueProvided {
                field_name: "Amount",
            }));
        }

        if fields.currency.is_empty() {
            return Err(report!(ValidationError::MissingRequiredField {
                field_name: "Currency",
            }));
        }
        if fields.currency.len() != 3
            || !fields.currency.bytes().all(|byte| byte.is_ascii_uppercase())
        {
            return Err(report!(ValidationError::IncorrectValueProvided {
                field_name: "Currency",
            }));
        }

        if fields.description.is_empty() {
            return Err(report!(ValidationError::MissingRequiredField {
                field_name: "Description",
            }));
        }
        if fields.description.chars().count() > DESCRIPTION_MAX_LENGTH {
            return Err(report!(ValidationError::IncorrectValueProvided {
                field_name: "Description",
            }));
        }

        if let Some(code) = fields.vendor_tx_code() {
            if !code.is_empty() && !is_valid_vendor_tx_code(code) {
                return Err(report!(ValidationError::IncorrectValueProvided {
                    field_name: "VendorTxCode",
                }));
            }
        }

        Ok(())
    }
}

fn is_valid_vendor_tx_code(code: &str) -> bool {
    code.len() <= consts::VENDOR_TX_CODE_MAX_LENGTH
        && code.bytes().all(|byte| {
            byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'{' | b'}')
        })
}
