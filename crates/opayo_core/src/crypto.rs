//! Cryptographic primitives mandated by the gateway protocol.
//!
//! Nothing here is general-purpose cryptography. The cipher and digest
//! constructions match the gateway's legacy conventions byte for byte,
//! including the ones a modern design would not choose.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use error_stack::report;
use masking::{PeekInterface, Secret};
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::{
    consts,
    errors::{CryptoError, CustomResult},
};

type Aes128CbcEncryptor = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDecryptor = cbc::Decryptor<aes::Aes128>;

/// Trait for encrypting a message under a symmetric secret.
pub trait EncodeMessage {
    /// Encrypts `message` under `secret`.
    fn encode_message(&self, secret: &[u8], message: &[u8]) -> CustomResult<Vec<u8>, CryptoError>;
}

/// Trait for decrypting a message under a symmetric secret.
pub trait DecodeMessage {
    /// Decrypts `message` under `secret`.
    fn decode_message(&self, secret: &[u8], message: &[u8]) -> CustomResult<Vec<u8>, CryptoError>;
}

/// Trait for computing a message digest.
pub trait GenerateDigest {
    /// Returns the digest of `message`.
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, CryptoError>;
}

/// Trait for verifying a received signature against a message.
pub trait VerifySignature {
    /// Checks that `signature` matches the digest of `message`.
    fn verify_signature(
        &self,
        secret: &[u8],
        signature: &[u8],
        message: &[u8],
    ) -> CustomResult<bool, CryptoError>;
}

/// AES-128-CBC with the gateway's crypt envelope conventions.
///
/// Two deviations from textbook CBC are required for wire compatibility and
/// must be preserved exactly:
///
/// * The initialisation vector is the encryption key itself, not a random
///   value. Identical plaintext prefixes therefore produce identical
///   ciphertext prefixes under the same key. This is a documented weakness of
///   the protocol, inherited here unchanged.
/// * Padding always rounds up to the next block: a block-aligned plaintext
///   still gains a full 16-byte padding block. The pad byte is the pad length.
#[derive(Debug)]
pub struct Aes128CbcKeyIv;

impl Aes128CbcKeyIv {
    fn check_key(secret: &[u8]) -> CustomResult<(), CryptoError> {
        if secret.len() != consts::CRYPT_BLOCK_SIZE {
            return Err(report!(CryptoError::InvalidKeyLength {
                expected: consts::CRYPT_BLOCK_SIZE,
                found: secret.len(),
            }));
        }
        Ok(())
    }
}

impl EncodeMessage for Aes128CbcKeyIv {
    fn encode_message(&self, secret: &[u8], message: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        Self::check_key(secret)?;

        let pad_length = consts::CRYPT_BLOCK_SIZE - message.len() % consts::CRYPT_BLOCK_SIZE;
        let pad_byte =
            u8::try_from(pad_length).map_err(|_| report!(CryptoError::EncodingFailed))?;
        let mut padded = Vec::with_capacity(message.len() + pad_length);
        padded.extend_from_slice(message);
        padded.resize(message.len() + pad_length, pad_byte);

        let cipher = Aes128CbcEncryptor::new_from_slices(secret, secret)
            .map_err(|_| report!(CryptoError::EncodingFailed))?;
        Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(&padded))
    }
}

impl DecodeMessage for Aes128CbcKeyIv {
    fn decode_message(&self, secret: &[u8], message: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        Self::check_key(secret)?;

        if message.is_empty() || message.len() % consts::CRYPT_BLOCK_SIZE != 0 {
            return Err(report!(CryptoError::DecodingFailed)
                .attach_printable("ciphertext length is not a positive multiple of the block size"));
        }

        let cipher = Aes128CbcDecryptor::new_from_slices(secret, secret)
            .map_err(|_| report!(CryptoError::DecodingFailed))?;
        let decrypted = cipher
            .decrypt_padded_vec_mut::<NoPadding>(message)
            .map_err(|_| report!(CryptoError::DecodingFailed))?;

        let pad_length = usize::from(
            *decrypted
                .last()
                .ok_or_else(|| report!(CryptoError::InvalidPadding))?,
        );
        if pad_length == 0 || pad_length > consts::CRYPT_BLOCK_SIZE || pad_length > decrypted.len()
        {
            return Err(report!(CryptoError::InvalidPadding));
        }
        decrypted
            .get(..decrypted.len() - pad_length)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| report!(CryptoError::InvalidPadding))
    }
}

/// MD5 digest, as mandated by the notification signature scheme.
///
/// MD5 is not collision-resistant. It is retained solely because the gateway
/// computes `VPSSignature` with it; nothing else should use it.
#[derive(Debug)]
pub struct Md5;

impl GenerateDigest for Md5 {
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        let digest = md5::compute(message);
        Ok(digest.0.to_vec())
    }
}

impl VerifySignature for Md5 {
    /// The comparison runs in constant time; notification signatures are
    /// attacker-supplied input.
    fn verify_signature(
        &self,
        _secret: &[u8],
        signature: &[u8],
        message: &[u8],
    ) -> CustomResult<bool, CryptoError> {
        let computed = self.generate_digest(message)?;
        Ok(bool::from(computed.ct_eq(signature)))
    }
}

/// The gateway's crypt envelope: an `@` marker followed by the uppercase-hex
/// ciphertext of a form-encoded field set.
///
/// A value of this type always holds a well-formed envelope. Construction
/// goes through [`Self::from_plaintext`] (encrypting) or [`Self::parse`]
/// (validating), never through raw strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CryptPayload(String);

impl CryptPayload {
    /// Encrypts `plaintext` under `key` and wraps it in the envelope.
    pub fn from_plaintext(
        plaintext: &[u8],
        key: &Secret<String>,
    ) -> CustomResult<Self, CryptoError> {
        let ciphertext = Aes128CbcKeyIv.encode_message(key.peek().as_bytes(), plaintext)?;
        let mut envelope = String::with_capacity(1 + ciphertext.len() * 2);
        envelope.push(consts::CRYPT_MARKER);
        envelope.push_str(&hex::encode_upper(ciphertext));
        Ok(Self(envelope))
    }

    /// Validates a received envelope: the marker must be present and the
    /// remainder must be non-empty hex.
    pub fn parse(raw: &str) -> CustomResult<Self, CryptoError> {
        let hex_part = raw
            .strip_prefix(consts::CRYPT_MARKER)
            .ok_or_else(|| report!(CryptoError::DecodingFailed))
            .map_err(|error| error.attach_printable("crypt envelope is missing the marker"))?;
        if hex_part.is_empty() || !hex_part.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(report!(CryptoError::DecodingFailed)
                .attach_printable("crypt envelope is not hex-encoded"));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Decrypts the envelope under `key`, stripping the protocol padding.
    pub fn decrypt(&self, key: &Secret<String>) -> CustomResult<Vec<u8>, CryptoError> {
        let hex_part = self.0.get(1..).unwrap_or_default();
        let ciphertext = hex::decode(hex_part).map_err(|_| report!(CryptoError::DecodingFailed))?;
        Aes128CbcKeyIv.decode_message(key.peek().as_bytes(), &ciphertext)
    }

    /// The envelope in its wire form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
