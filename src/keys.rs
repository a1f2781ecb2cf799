//! Key and certificate handling
//!
//! Wraps PEM-encoded RSA public keys, X.509 certificates and RSA private
//! keys into handles usable by both cryptographic backends, and provides
//! the canonical fingerprint digest and certificate serial extraction.

use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::Rsa;
use openssl::x509::X509;
use sha2::{Digest, Sha256};
use x509_parser::pem::parse_x509_pem;

use crate::error::{Result, SealError};

/// PKCS#1 v1.5 padding overhead in bytes
pub(crate) const RSA_PKCS1_OVERHEAD: usize = 11;

/// Key size used when generating fresh RSA key pairs
pub const RSA_KEY_BITS: u32 = 4096;

/// An RSA public key extracted from a raw public-key PEM block or from an
/// X.509 certificate. Both sources yield the same canonical encoding for
/// the same underlying key.
#[derive(Debug, Clone)]
pub struct PublicKeyHandle {
    pkey: PKey<Public>,
    modulus_size: usize,
}

impl PublicKeyHandle {
    /// Parse a bare `-----BEGIN PUBLIC KEY-----` PEM block
    pub fn from_public_key_pem(pem: &[u8]) -> Result<Self> {
        let pkey = PKey::public_key_from_pem(pem)
            .map_err(|e| SealError::KeyParse(format!("Failed to parse public key PEM: {e}")))?;
        Self::from_pkey(pkey)
    }

    /// Parse an X.509 certificate PEM block and extract the subject public key
    pub fn from_certificate_pem(pem: &[u8]) -> Result<Self> {
        let cert = X509::from_pem(pem)
            .map_err(|e| SealError::CertificateParse(format!("Failed to parse certificate: {e}")))?;
        let pkey = cert.public_key().map_err(|e| {
            SealError::CertificateParse(format!("Failed to extract certificate public key: {e}"))
        })?;
        Self::from_pkey(pkey)
    }

    /// Parse either a bare public key or a certificate, whichever the PEM
    /// bytes contain
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        match Self::from_public_key_pem(pem) {
            Ok(handle) => Ok(handle),
            // a non-RSA key is a definitive answer, not a reason to retry
            Err(SealError::UnsupportedKeyType(e)) => Err(SealError::UnsupportedKeyType(e)),
            Err(_) => Self::from_certificate_pem(pem),
        }
    }

    pub(crate) fn from_pkey(pkey: PKey<Public>) -> Result<Self> {
        let rsa = pkey.rsa().map_err(|_| {
            SealError::UnsupportedKeyType(format!("expected an RSA key, got {:?}", pkey.id()))
        })?;
        let modulus_size = rsa.size() as usize;
        Ok(Self { pkey, modulus_size })
    }

    /// Canonical SubjectPublicKeyInfo DER encoding
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.pkey
            .public_key_to_der()
            .map_err(|e| SealError::KeyParse(format!("Failed to encode public key DER: {e}")))
    }

    /// PEM export of the public key
    pub fn to_pem(&self) -> Result<Vec<u8>> {
        self.pkey
            .public_key_to_pem()
            .map_err(|e| SealError::KeyParse(format!("Failed to encode public key PEM: {e}")))
    }

    /// RSA modulus size in bytes
    pub fn modulus_size(&self) -> usize {
        self.modulus_size
    }

    /// Largest message the key can wrap under PKCS#1 v1.5 padding
    pub fn max_message_size(&self) -> usize {
        self.modulus_size - RSA_PKCS1_OVERHEAD
    }

    pub(crate) fn pkey(&self) -> &PKey<Public> {
        &self.pkey
    }
}

/// An RSA private key, generated fresh or loaded from PEM bytes
#[derive(Clone)]
pub struct PrivateKeyHandle {
    pkey: PKey<Private>,
    modulus_size: usize,
}

impl PrivateKeyHandle {
    /// Parse a PEM-encoded RSA private key (PKCS#8 or PKCS#1)
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let pkey = PKey::private_key_from_pem(pem)
            .map_err(|e| SealError::KeyParse(format!("Failed to parse private key PEM: {e}")))?;
        Self::from_pkey(pkey)
    }

    /// Generate a fresh RSA key pair
    pub fn generate() -> Result<Self> {
        let rsa = Rsa::generate(RSA_KEY_BITS)
            .map_err(|e| SealError::KeyParse(format!("Failed to generate RSA key: {e}")))?;
        let pkey = PKey::from_rsa(rsa)
            .map_err(|e| SealError::KeyParse(format!("Failed to build private key: {e}")))?;
        Self::from_pkey(pkey)
    }

    pub(crate) fn from_pkey(pkey: PKey<Private>) -> Result<Self> {
        let rsa = pkey.rsa().map_err(|_| {
            SealError::UnsupportedKeyType(format!("expected an RSA key, got {:?}", pkey.id()))
        })?;
        let modulus_size = rsa.size() as usize;
        Ok(Self { pkey, modulus_size })
    }

    /// Derive the corresponding public key handle
    pub fn public_key(&self) -> Result<PublicKeyHandle> {
        let der = self.public_key_der()?;
        let pkey = PKey::public_key_from_der(&der)
            .map_err(|e| SealError::KeyParse(format!("Failed to rebuild public key: {e}")))?;
        PublicKeyHandle::from_pkey(pkey)
    }

    /// SubjectPublicKeyInfo DER of the corresponding public key
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        self.pkey
            .public_key_to_der()
            .map_err(|e| SealError::KeyParse(format!("Failed to encode public key DER: {e}")))
    }

    /// PKCS#8 PEM export of the private key
    pub fn to_pem(&self) -> Result<Vec<u8>> {
        self.pkey
            .private_key_to_pem_pkcs8()
            .map_err(|e| SealError::KeyParse(format!("Failed to encode private key PEM: {e}")))
    }

    /// RSA modulus size in bytes
    pub fn modulus_size(&self) -> usize {
        self.modulus_size
    }

    pub(crate) fn pkey(&self) -> &PKey<Private> {
        &self.pkey
    }
}

impl std::fmt::Debug for PrivateKeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyHandle")
            .field("modulus_size", &self.modulus_size)
            .finish_non_exhaustive()
    }
}

/// Lowercase hex SHA-256 of a key's canonical DER encoding. This is the
/// fingerprint form shared by both backends.
pub(crate) fn spki_fingerprint_hex(spki_der: &[u8]) -> String {
    hex::encode(Sha256::digest(spki_der))
}

/// Extract a certificate's serial number as a decimal string
pub fn certificate_serial(pem: &[u8]) -> Result<String> {
    let (_, doc) = parse_x509_pem(pem)
        .map_err(|e| SealError::CertificateParse(format!("Failed to parse certificate PEM: {e}")))?;
    let cert = doc
        .parse_x509()
        .map_err(|e| SealError::CertificateParse(format!("Failed to parse certificate: {e}")))?;
    Ok(cert.tbs_certificate.serial.to_str_radix(10))
}
