//! Contract Seal – hybrid encryption for protected execution contracts
//!
//! Seals a contract payload with a fresh random password, wraps the
//! password under the recipient's RSA public key and carries both in a
//! single `hyper-protect-basic` wire token. The cryptographic
//! primitives are provided by two interchangeable backends — one
//! in-process, one driving an external `openssl` binary — whose
//! artifacts, fingerprints and signatures are bit-for-bit compatible.

pub mod backend;
pub mod environment;
pub mod error;
pub mod keys;
pub mod seal;
pub mod token;

pub use error::{Result, SealError};

pub use backend::openssl_tool::OPENSSL_BIN_ENV;
pub use backend::{
    AsymmetricCipher, CryptoBackend, DigestSigner, KeyFactory, KeyFingerprint, NativeBackend,
    OpenSslTool, PasswordGenerator, SymmetricCipher,
};

pub use environment::EncryptionEnvironment;

pub use keys::{certificate_serial, PrivateKeyHandle, PublicKeyHandle, RSA_KEY_BITS};

pub use seal::{decrypt_basic, encrypt_basic, PASSWORD_LEN};

pub use token::{Token, TOKEN_PREFIX};
