//! In-process cryptographic backend
//!
//! Implements the capability traits directly on top of the bundled
//! OpenSSL bindings. The symmetric envelope reproduces the output of
//! `openssl enc -aes-256-cbc -pbkdf2` bit-for-bit so the external-tool
//! backend can decrypt it, and vice versa.

use openssl::encrypt::{Decrypter, Encrypter};
use openssl::hash::MessageDigest;
use openssl::pkcs5::pbkdf2_hmac;
use openssl::rsa::Padding;
use openssl::sign::{Signer, Verifier};
use openssl::symm::{self, Cipher};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::backend::{
    AsymmetricCipher, DigestSigner, KeyFactory, KeyFingerprint, PasswordGenerator, SymmetricCipher,
};
use crate::error::{Result, SealError};
use crate::keys::{spki_fingerprint_hex, PrivateKeyHandle, PublicKeyHandle};

/// Magic prefix of the OpenSSL `enc` salted envelope
const SALTED_MAGIC: &[u8; 8] = b"Salted__";
const SALT_LEN: usize = 8;
const AES_KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
/// PBKDF2 iteration count, matching the `openssl enc -pbkdf2` default
const PBKDF2_ROUNDS: usize = 10_000;

/// The in-process backend. Stateless; safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl NativeBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Derive the AES key and IV from the password and salt.
///
/// The KDF passphrase is the lowercase hex of the raw password bytes so
/// that the same passphrase can travel through the external tool's
/// `-pass file:` channel, which cannot carry NUL or newline bytes.
fn derive_key_iv(password: &[u8], salt: &[u8]) -> Result<(Zeroizing<[u8; AES_KEY_LEN]>, [u8; IV_LEN])> {
    let passphrase = Zeroizing::new(hex::encode(password));
    let mut okm = Zeroizing::new([0u8; AES_KEY_LEN + IV_LEN]);
    pbkdf2_hmac(
        passphrase.as_bytes(),
        salt,
        PBKDF2_ROUNDS,
        MessageDigest::sha256(),
        &mut *okm,
    )
    .map_err(|e| SealError::Encryption(format!("Key derivation failed: {e}")))?;

    let mut key = Zeroizing::new([0u8; AES_KEY_LEN]);
    key.copy_from_slice(&okm[..AES_KEY_LEN]);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&okm[AES_KEY_LEN..]);
    Ok((key, iv))
}

impl PasswordGenerator for NativeBackend {
    fn random_password(&self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        OsRng.fill_bytes(&mut bytes);
        Ok(bytes)
    }
}

impl SymmetricCipher for NativeBackend {
    fn symmetric_encrypt(&self, password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let (key, iv) = derive_key_iv(password, &salt)?;

        let ciphertext = symm::encrypt(Cipher::aes_256_cbc(), &*key, Some(&iv), plaintext)
            .map_err(|e| SealError::Encryption(format!("AES-256-CBC encryption failed: {e}")))?;

        let mut out = Vec::with_capacity(SALTED_MAGIC.len() + SALT_LEN + ciphertext.len());
        out.extend_from_slice(SALTED_MAGIC);
        out.extend_from_slice(&salt);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn symmetric_decrypt(&self, password: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < SALTED_MAGIC.len() + SALT_LEN {
            return Err(SealError::Decryption("truncated ciphertext".to_string()));
        }
        let (header, body) = ciphertext.split_at(SALTED_MAGIC.len() + SALT_LEN);
        if &header[..SALTED_MAGIC.len()] != SALTED_MAGIC {
            return Err(SealError::Decryption(
                "missing salted envelope header".to_string(),
            ));
        }
        let (key, iv) = derive_key_iv(password, &header[SALTED_MAGIC.len()..])?;

        symm::decrypt(Cipher::aes_256_cbc(), &*key, Some(&iv), body)
            .map_err(|e| SealError::Decryption(format!("AES-256-CBC decryption failed: {e}")))
    }
}

impl AsymmetricCipher for NativeBackend {
    fn asymmetric_encrypt(&self, recipient: &PublicKeyHandle, message: &[u8]) -> Result<Vec<u8>> {
        if message.len() > recipient.max_message_size() {
            return Err(SealError::MessageTooLarge {
                len: message.len(),
                max: recipient.max_message_size(),
            });
        }

        let mut encrypter = Encrypter::new(recipient.pkey())
            .map_err(|e| SealError::Encryption(format!("Failed to set up RSA encrypter: {e}")))?;
        encrypter
            .set_rsa_padding(Padding::PKCS1)
            .map_err(|e| SealError::Encryption(format!("Failed to set RSA padding: {e}")))?;

        let buffer_len = encrypter
            .encrypt_len(message)
            .map_err(|e| SealError::Encryption(format!("RSA encryption failed: {e}")))?;
        let mut out = vec![0u8; buffer_len];
        let written = encrypter
            .encrypt(message, &mut out)
            .map_err(|e| SealError::Encryption(format!("RSA encryption failed: {e}")))?;
        out.truncate(written);
        Ok(out)
    }

    fn asymmetric_decrypt(&self, key: &PrivateKeyHandle, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let mut decrypter = Decrypter::new(key.pkey())
            .map_err(|e| SealError::Decryption(format!("Failed to set up RSA decrypter: {e}")))?;
        decrypter
            .set_rsa_padding(Padding::PKCS1)
            .map_err(|e| SealError::Decryption(format!("Failed to set RSA padding: {e}")))?;

        let buffer_len = decrypter
            .decrypt_len(ciphertext)
            .map_err(|e| SealError::Decryption(format!("RSA decryption failed: {e}")))?;
        let mut out = vec![0u8; buffer_len];
        let written = decrypter
            .decrypt(ciphertext, &mut out)
            .map_err(|e| SealError::Decryption(format!("RSA decryption failed: {e}")))?;
        out.truncate(written);
        Ok(out)
    }
}

impl DigestSigner for NativeBackend {
    fn sign(&self, key: &PrivateKeyHandle, data: &[u8]) -> Result<Vec<u8>> {
        let mut signer = Signer::new(MessageDigest::sha256(), key.pkey())
            .map_err(|e| SealError::Signature(format!("Failed to set up signer: {e}")))?;
        signer
            .update(data)
            .map_err(|e| SealError::Signature(format!("Failed to digest data: {e}")))?;
        signer
            .sign_to_vec()
            .map_err(|e| SealError::Signature(format!("Signing failed: {e}")))
    }

    fn verify(&self, key: &PublicKeyHandle, data: &[u8], signature: &[u8]) -> Result<bool> {
        let mut verifier = Verifier::new(MessageDigest::sha256(), key.pkey())
            .map_err(|e| SealError::Signature(format!("Failed to set up verifier: {e}")))?;
        verifier
            .update(data)
            .map_err(|e| SealError::Signature(format!("Failed to digest data: {e}")))?;
        // a structurally invalid signature surfaces as an error stack,
        // which is still a verification failure
        Ok(verifier.verify(signature).unwrap_or(false))
    }
}

impl KeyFingerprint for NativeBackend {
    fn fingerprint(&self, key: &PublicKeyHandle) -> Result<String> {
        Ok(spki_fingerprint_hex(&key.to_der()?))
    }

    fn private_key_fingerprint(&self, key: &PrivateKeyHandle) -> Result<String> {
        Ok(spki_fingerprint_hex(&key.public_key_der()?))
    }

    fn certificate_fingerprint(&self, cert_pem: &[u8]) -> Result<String> {
        let key = PublicKeyHandle::from_certificate_pem(cert_pem)?;
        self.fingerprint(&key)
    }
}

impl KeyFactory for NativeBackend {
    fn generate_private_key(&self) -> Result<PrivateKeyHandle> {
        PrivateKeyHandle::generate()
    }

    fn public_key(&self, key: &PrivateKeyHandle) -> Result<PublicKeyHandle> {
        key.public_key()
    }
}
