//! Payload cipher of the FreeAir push protocol.
//!
//! The appliance encrypts every telemetry payload (and expects command
//! payloads back) as AES-128-CBC with a key derived from the device
//! credential and a fixed initialization vector, transported as
//! unpadded base64url. The derivation and padding rules are an external
//! contract with the physical device and must not be changed.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

pub const BLOCK_SIZE: usize = 16;

/// Fixed IV used by every FreeAir payload.
const IV: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
    0x0f,
];

#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("payload is not valid base64url")]
    Encoding,

    #[error("ciphertext length {0} is not a positive multiple of {BLOCK_SIZE}")]
    BlockAlignment(usize),

    #[error("invalid block padding")]
    Padding,
}

/// Key derivation: the credential is right-padded with the character
/// `'0'` to 16 bytes and truncated to 16 bytes.
fn derive_key(credential: &str) -> [u8; 16] {
    let mut key = [b'0'; 16];
    for (slot, byte) in key.iter_mut().zip(credential.bytes()) {
        *slot = byte;
    }
    key
}

/// Decrypts a base64url telemetry payload.
///
/// Corrupt payloads are not transient; callers must drop the payload
/// rather than retry. The credential and plaintext are never logged.
pub fn decrypt(credential: &str, payload: &str) -> Result<Vec<u8>, DecryptError> {
    // Devices in the field emit both padded and unpadded base64.
    let ciphertext = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| DecryptError::Encoding)?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(DecryptError::BlockAlignment(ciphertext.len()));
    }

    let key = derive_key(credential);
    Aes128CbcDec::new(&key.into(), &IV.into())
        .decrypt_padded_vec_mut::<NoPadding>(&ciphertext)
        .map_err(|_| DecryptError::Padding)
}

/// Encrypts a command payload for the device, returning unpadded
/// base64url.
///
/// The appliance's padding rule appends `16 - (len % 16)` zero bytes,
/// i.e. a full zero block when the plaintext is already aligned.
pub fn encrypt(credential: &str, plaintext: &[u8]) -> String {
    let pad = BLOCK_SIZE - plaintext.len() % BLOCK_SIZE;
    let mut padded = Vec::with_capacity(plaintext.len() + pad);
    padded.extend_from_slice(plaintext);
    padded.resize(plaintext.len() + pad, 0);

    let key = derive_key(credential);
    let ciphertext =
        Aes128CbcEnc::new(&key.into(), &IV.into()).encrypt_padded_vec_mut::<NoPadding>(&padded);

    URL_SAFE_NO_PAD.encode(ciphertext)
}
