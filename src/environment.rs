//! Backend selection and the resolved capability bundle
//!
//! [`EncryptionEnvironment`] is resolved once and read-only thereafter.
//! Resolution prefers a configured external tool and falls back to the
//! in-process backend when none is usable; within a single call chain
//! there is never a fallback from one backend to the other.

use std::sync::Arc;

use log::{debug, warn};

use crate::backend::{CryptoBackend, NativeBackend, OpenSslTool};
use crate::error::Result;
use crate::keys::{PrivateKeyHandle, PublicKeyHandle};
use crate::seal;
use crate::token::Token;

/// The capability bundle consumed by callers: seal, unseal, sign,
/// verify and fingerprint, all provided by one resolved backend.
#[derive(Clone)]
pub struct EncryptionEnvironment {
    backend: Arc<dyn CryptoBackend>,
}

impl EncryptionEnvironment {
    /// Bundle an explicit backend
    pub fn with_backend(backend: Arc<dyn CryptoBackend>) -> Self {
        Self { backend }
    }

    /// The in-process backend
    pub fn native() -> Self {
        Self::with_backend(Arc::new(NativeBackend::new()))
    }

    /// Resolve the default backend: the external tool named by
    /// `OPENSSL_BIN` (or found on the PATH) when it runs, otherwise the
    /// in-process backend. Resolution never fails; an unusable override
    /// is logged and skipped.
    pub fn resolve() -> Self {
        match OpenSslTool::discover() {
            Ok(tool) => {
                debug!("using external tool backend at {}", tool.binary().display());
                Self::with_backend(Arc::new(tool))
            }
            Err(e) => {
                warn!("no usable external tool, using in-process backend: {e}");
                Self::native()
            }
        }
    }

    pub fn backend(&self) -> &dyn CryptoBackend {
        self.backend.as_ref()
    }

    /// Seal a payload for `recipient`
    pub fn encrypt_basic(&self, recipient: &PublicKeyHandle, plaintext: &[u8]) -> Result<Token> {
        seal::encrypt_basic(
            self.backend.as_password_generator(),
            self.backend.as_asymmetric_cipher(),
            self.backend.as_symmetric_cipher(),
            recipient,
            plaintext,
        )
    }

    /// Unseal a wire token with `key`
    pub fn decrypt_basic(&self, key: &PrivateKeyHandle, token: &str) -> Result<Vec<u8>> {
        seal::decrypt_basic(
            self.backend.as_asymmetric_cipher(),
            self.backend.as_symmetric_cipher(),
            key,
            token,
        )
    }

    pub fn sign(&self, key: &PrivateKeyHandle, data: &[u8]) -> Result<Vec<u8>> {
        self.backend.sign(key, data)
    }

    pub fn verify(&self, key: &PublicKeyHandle, data: &[u8], signature: &[u8]) -> Result<bool> {
        self.backend.verify(key, data, signature)
    }

    pub fn fingerprint(&self, key: &PublicKeyHandle) -> Result<String> {
        self.backend.fingerprint(key)
    }

    pub fn private_key_fingerprint(&self, key: &PrivateKeyHandle) -> Result<String> {
        self.backend.private_key_fingerprint(key)
    }

    pub fn certificate_fingerprint(&self, cert_pem: &[u8]) -> Result<String> {
        self.backend.certificate_fingerprint(cert_pem)
    }

    pub fn generate_private_key(&self) -> Result<PrivateKeyHandle> {
        self.backend.generate_private_key()
    }

    pub fn public_key(&self, key: &PrivateKeyHandle) -> Result<PublicKeyHandle> {
        self.backend.public_key(key)
    }

    pub fn random_password(&self, len: usize) -> Result<Vec<u8>> {
        self.backend.random_password(len)
    }
}

impl std::fmt::Debug for EncryptionEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionEnvironment").finish_non_exhaustive()
    }
}
