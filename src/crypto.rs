use crate::error::PaymentError;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hmac::Hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;
/// GCM nonce length in bytes.
pub const IV_LEN: usize = 12;
/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypts `plaintext` with AES-256-GCM, returning ciphertext with the
/// 16-byte authentication tag appended.
///
/// `aad` is authenticated but not encrypted; an empty slice is equivalent to
/// no associated data. Returns `None` when the key is not 32 bytes or the iv
/// is not 12 bytes.
pub fn encrypt_aes_gcm(plaintext: &[u8], key: &[u8], iv: &[u8], aad: &[u8]) -> Option<Vec<u8>> {
    if key.len() != KEY_LEN || iv.len() != IV_LEN {
        return None;
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(iv), Payload { msg: plaintext, aad })
        .ok()
}

/// Decrypts and authenticates ciphertext produced by [`encrypt_aes_gcm`].
///
/// Returns `None` on any failure: wrong key or iv size, input shorter than
/// the tag, or tag verification failure.
pub fn decrypt_aes_gcm(
    ciphertext_with_tag: &[u8],
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
) -> Option<Vec<u8>> {
    if key.len() != KEY_LEN || iv.len() != IV_LEN || ciphertext_with_tag.len() < TAG_LEN {
        return None;
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: ciphertext_with_tag,
                aad,
            },
        )
        .ok()
}

/// Draws `length` bytes from the operating system CSPRNG.
pub fn generate_random_bytes(length: usize) -> Result<Vec<u8>, PaymentError> {
    let mut bytes = vec![0u8; length];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}

/// Derives a key of `key_length` bytes from a password with
/// PBKDF2-HMAC-SHA256.
///
/// Callers protecting long-lived secrets should use at least 100,000
/// iterations.
pub fn derive_key_pbkdf2(
    password: &str,
    salt: &[u8],
    iterations: u32,
    key_length: usize,
) -> Result<Vec<u8>, PaymentError> {
    let mut key = vec![0u8; key_length];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, iterations, &mut key)
        .map_err(|_| PaymentError::KeyDerivation)?;
    Ok(key)
}
