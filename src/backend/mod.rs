//! Cryptographic backends
//!
//! The primitives behind the sealing protocol are expressed as small
//! capability traits so a backend is selected once and passed explicitly
//! into the orchestration code. Two implementations exist: an in-process
//! one ([`NativeBackend`]) and one driving an external `openssl` binary
//! ([`OpenSslTool`]). Artifacts produced by either must decrypt and
//! verify under the other.

pub mod native;
pub mod openssl_tool;

pub use native::NativeBackend;
pub use openssl_tool::OpenSslTool;

use crate::error::Result;
use crate::keys::{PrivateKeyHandle, PublicKeyHandle};

/// Random byte generation from a cryptographically secure source
pub trait PasswordGenerator {
    /// Generate `len` random bytes
    fn random_password(&self, len: usize) -> Result<Vec<u8>>;
}

/// Bulk payload encryption under a shared password
///
/// The wire form is the OpenSSL `enc` salted envelope: `"Salted__"`,
/// an 8-byte random salt, then AES-256-CBC ciphertext with the key and
/// IV derived from the password via PBKDF2. The salt is embedded, so
/// decryption needs only the password.
pub trait SymmetricCipher {
    fn symmetric_encrypt(&self, password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;
    fn symmetric_decrypt(&self, password: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// Short-message encryption under an RSA key pair, PKCS#1 v1.5 padded
pub trait AsymmetricCipher {
    /// Fails with [`SealError::MessageTooLarge`](crate::SealError::MessageTooLarge)
    /// when the message exceeds the modulus capacity minus padding overhead.
    fn asymmetric_encrypt(&self, recipient: &PublicKeyHandle, message: &[u8]) -> Result<Vec<u8>>;
    fn asymmetric_decrypt(&self, key: &PrivateKeyHandle, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// RSA signature over the SHA-256 digest of the input
pub trait DigestSigner {
    fn sign(&self, key: &PrivateKeyHandle, data: &[u8]) -> Result<Vec<u8>>;
    fn verify(&self, key: &PublicKeyHandle, data: &[u8], signature: &[u8]) -> Result<bool>;
}

/// Canonical key fingerprints, identical across backends
pub trait KeyFingerprint {
    /// Hex SHA-256 of the key's SubjectPublicKeyInfo DER
    fn fingerprint(&self, key: &PublicKeyHandle) -> Result<String>;
    /// Fingerprint of the public counterpart of a private key
    fn private_key_fingerprint(&self, key: &PrivateKeyHandle) -> Result<String>;
    /// Fingerprint of the subject public key of a PEM certificate
    fn certificate_fingerprint(&self, cert_pem: &[u8]) -> Result<String>;
}

/// RSA key pair generation and public-part derivation
pub trait KeyFactory {
    fn generate_private_key(&self) -> Result<PrivateKeyHandle>;
    fn public_key(&self, key: &PrivateKeyHandle) -> Result<PublicKeyHandle>;
}

/// The full capability bundle a backend provides
pub trait CryptoBackend:
    PasswordGenerator
    + SymmetricCipher
    + AsymmetricCipher
    + DigestSigner
    + KeyFingerprint
    + KeyFactory
    + Send
    + Sync
{
    // capability accessors so a bundled backend can feed the
    // per-capability seams of the orchestrator
    fn as_password_generator(&self) -> &dyn PasswordGenerator;
    fn as_symmetric_cipher(&self) -> &dyn SymmetricCipher;
    fn as_asymmetric_cipher(&self) -> &dyn AsymmetricCipher;
}

impl<T> CryptoBackend for T
where
    T: PasswordGenerator
        + SymmetricCipher
        + AsymmetricCipher
        + DigestSigner
        + KeyFingerprint
        + KeyFactory
        + Send
        + Sync,
{
    fn as_password_generator(&self) -> &dyn PasswordGenerator {
        self
    }

    fn as_symmetric_cipher(&self) -> &dyn SymmetricCipher {
        self
    }

    fn as_asymmetric_cipher(&self) -> &dyn AsymmetricCipher {
        self
    }
}
