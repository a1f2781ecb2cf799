//! Hybrid seal/unseal orchestration
//!
//! Sealing generates a fresh random password, wraps it under the
//! recipient's RSA public key, encrypts the payload under the raw
//! password and assembles the wire token. The three primitives are
//! injected so the same orchestration runs against either backend, or a
//! mix of both; production use pairs one backend end-to-end.

use zeroize::Zeroizing;

use crate::backend::{AsymmetricCipher, PasswordGenerator, SymmetricCipher};
use crate::error::Result;
use crate::keys::{PrivateKeyHandle, PublicKeyHandle};
use crate::token::Token;

/// Byte length of the per-operation symmetric password
pub const PASSWORD_LEN: usize = 32;

/// Seal `plaintext` for the holder of `recipient`'s private key.
///
/// Short-circuits on the first failing step: password generation,
/// password wrapping, then payload encryption.
pub fn encrypt_basic(
    passwords: &dyn PasswordGenerator,
    asym: &dyn AsymmetricCipher,
    sym: &dyn SymmetricCipher,
    recipient: &PublicKeyHandle,
    plaintext: &[u8],
) -> Result<Token> {
    let password = Zeroizing::new(passwords.random_password(PASSWORD_LEN)?);
    let enc_password = asym.asymmetric_encrypt(recipient, &password)?;
    let enc_payload = sym.symmetric_encrypt(&password, plaintext)?;
    Ok(Token::new(&enc_password, &enc_payload))
}

/// Unseal a wire token with the recipient's private key.
///
/// Parses strictly, decodes both segments, unwraps the password and
/// decrypts the payload, failing on the first error.
pub fn decrypt_basic(
    asym: &dyn AsymmetricCipher,
    sym: &dyn SymmetricCipher,
    key: &PrivateKeyHandle,
    token: &str,
) -> Result<Vec<u8>> {
    let token = Token::parse(token)?;
    let enc_password = token.password_bytes()?;
    let enc_payload = token.payload_bytes()?;
    let password = Zeroizing::new(asym.asymmetric_decrypt(key, &enc_password)?);
    sym.symmetric_decrypt(&password, &enc_payload)
}
