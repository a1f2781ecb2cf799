//! Wire token codec
//!
//! A sealed contract travels as a single string of three '.'-delimited
//! segments: the scheme prefix, the base64 of the wrapped password and
//! the base64 of the encrypted payload. Parsing is strict: anything that
//! deviates from that structure is rejected.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Result, SealError};

/// Fixed literal identifying the scheme and version
pub const TOKEN_PREFIX: &str = "hyper-protect-basic";

/// A parsed (or freshly assembled) three-segment token. Segments are held
/// in their encoded form; decoding happens on access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    enc_password: String,
    enc_payload: String,
}

impl Token {
    /// Assemble a token from the raw encrypted password and payload
    pub fn new(enc_password: &[u8], enc_payload: &[u8]) -> Self {
        Self {
            enc_password: STANDARD.encode(enc_password),
            enc_payload: STANDARD.encode(enc_payload),
        }
    }

    /// Strictly parse the three-segment wire form
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(SealError::TokenFormat(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        }
        if segments[0] != TOKEN_PREFIX {
            return Err(SealError::TokenFormat(format!(
                "expected prefix {TOKEN_PREFIX:?}, got {:?}",
                segments[0]
            )));
        }
        if segments[1].is_empty() || segments[2].is_empty() {
            return Err(SealError::TokenFormat("empty token segment".to_string()));
        }
        Ok(Self {
            enc_password: segments[1].to_string(),
            enc_payload: segments[2].to_string(),
        })
    }

    /// Decode the wrapped-password segment
    pub fn password_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.enc_password)
            .map_err(|e| SealError::Encoding(format!("Invalid base64 in password segment: {e}")))
    }

    /// Decode the encrypted-payload segment
    pub fn payload_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.enc_payload)
            .map_err(|e| SealError::Encoding(format!("Invalid base64 in payload segment: {e}")))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TOKEN_PREFIX}.{}.{}", self.enc_password, self.enc_payload)
    }
}

impl FromStr for Token {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
