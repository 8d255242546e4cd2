// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload encryption.
//!
//! The hiding pipeline treats the payload as an opaque blob produced by a
//! [`Cipher`]. The default [`AesGcmSivCipher`] derives an AES-256 key from
//! the password and a random salt with Argon2id, encrypts with
//! AES-256-GCM-SIV under a random nonce, and packs everything the decoder
//! needs into the blob:
//!
//! ```text
//! [16 bytes] Argon2 salt
//! [12 bytes] AES-GCM-SIV nonce
//! [N bytes ] ciphertext (plaintext_len + 16 bytes auth tag)
//! ```

use aes_gcm_siv::aead::Aead;
use aes_gcm_siv::{Aes256GcmSiv, KeyInit, Nonce};
use argon2::Argon2;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::stego::error::StegoError;

/// AES-GCM-SIV nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// Argon2 salt length in bytes.
pub const SALT_LEN: usize = 16;
/// AES-GCM-SIV authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Bytes a [`AesGcmSivCipher`] blob adds on top of the plaintext.
pub const CIPHER_OVERHEAD: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Password-based symmetric cipher used around the hiding pipeline.
pub trait Cipher {
    /// Encrypt `plaintext` into a self-contained blob.
    fn encrypt(&self, plaintext: &[u8], password: &str) -> Vec<u8>;

    /// Decrypt a blob produced by [`Cipher::encrypt`].
    ///
    /// # Errors
    /// [`StegoError::DecryptionFailed`] for a wrong password or damaged blob.
    fn decrypt(&self, blob: &[u8], password: &str) -> Result<Vec<u8>, StegoError>;
}

/// AES-256-GCM-SIV with Argon2id key derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmSivCipher;

/// Derive the AES-256 key from password + salt.
pub fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut *key)
        .expect("Argon2 key derivation with a 16-byte salt should not fail");
    key
}

impl Cipher for AesGcmSivCipher {
    fn encrypt(&self, plaintext: &[u8], password: &str) -> Vec<u8> {
        let mut rng = rand::thread_rng();

        let mut salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut salt);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce_bytes);

        let key = derive_key(password, &salt);
        let cipher = Aes256GcmSiv::new_from_slice(&*key).expect("valid key length");
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .expect("AES-GCM-SIV encrypt should not fail");

        let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        blob
    }

    fn decrypt(&self, blob: &[u8], password: &str) -> Result<Vec<u8>, StegoError> {
        if blob.len() < CIPHER_OVERHEAD {
            return Err(StegoError::DecryptionFailed);
        }
        let (salt, rest) = blob.split_at(SALT_LEN);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

        let key = derive_key(password, salt);
        let cipher = Aes256GcmSiv::new_from_slice(&*key).expect("valid key length");
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| StegoError::DecryptionFailed)
    }
}
