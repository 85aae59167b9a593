//! Protocol constants.

/// Protocol version sent with every registration request.
pub const VPS_PROTOCOL: &str = "3.00";

/// Transaction type for payment registrations.
pub const TX_TYPE_PAYMENT: &str = "PAYMENT";

/// Marker character prefixed to the hex-encoded crypt envelope.
pub const CRYPT_MARKER: char = '@';

/// AES block size in bytes; also the required length of the encryption key.
pub const CRYPT_BLOCK_SIZE: usize = 16;

/// Upper bound the gateway enforces on `VendorTxCode`.
pub const VENDOR_TX_CODE_MAX_LENGTH: usize = 40;

/// Transaction registration endpoint for the live environment.
pub const REGISTRATION_URL_LIVE: &str =
    "https://live.opayo.eu.elavon.com/gateway/service/vspserver-register.vsp";

/// Transaction registration endpoint for the sandbox environment.
pub const REGISTRATION_URL_SANDBOX: &str =
    "https://sandbox.opayo.eu.elavon.com/gateway/service/vspserver-register.vsp";

/// The fields entering the notification signature, in the exact order the
/// gateway concatenates them before hashing. The order is frozen by the
/// protocol; reordering it breaks every signature check.
///
/// Two entries are not read from the notification body: `VendorName` is the
/// configured vendor account name lowercased, and `SecurityKey` is the secret
/// issued in the registration reply.
pub const SIGNATURE_FIELD_ORDER: [&str; 21] = [
    "VPSTxId",
    "VendorTxCode",
    "Status",
    "TxAuthNo",
    "VendorName",
    "AVSCV2",
    "SecurityKey",
    "AddressResult",
    "PostCodeResult",
    "CV2Result",
    "GiftAid",
    "3DSecureStatus",
    "CAVV",
    "AddressStatus",
    "PayerStatus",
    "CardType",
    "Last4Digits",
    "DeclineCode",
    "ExpiryDate",
    "FraudResponse",
    "BankAuthCode",
];

/// Characters used for generated identifier suffixes.
pub(crate) const ALPHABETS: [char; 62] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l',
    'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4',
    '5', '6', '7', '8', '9',
];

/// Length of the random suffix in generated `VendorTxCode` values.
pub(crate) const VENDOR_TX_CODE_SUFFIX_LENGTH: usize = 10;
