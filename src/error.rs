use thiserror::Error;

/// Error types for the contract-seal crate
#[derive(Error, Debug)]
pub enum SealError {
    #[error("Key parse error: {0}")]
    KeyParse(String),

    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("Certificate parse error: {0}")]
    CertificateParse(String),

    #[error("Token format error: {0}")]
    TokenFormat(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Message of {len} bytes exceeds the {max} byte capacity of the key")]
    MessageTooLarge { len: usize, max: usize },

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("External tool error: {0}")]
    ExternalTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for contract-seal operations
pub type Result<T> = std::result::Result<T, SealError>;
