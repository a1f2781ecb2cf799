//! External-tool cryptographic backend
//!
//! Drives a stock `openssl` command-line binary, one subprocess per
//! operation. Inputs stream over stdin and results are read from stdout;
//! secrets that must be files (the passphrase, private keys, detached
//! signatures) go through 0600 temp files that are removed on drop.
//!
//! Operation failures reported by the tool are mapped onto the same
//! error taxonomy as the in-process backend, so callers cannot tell the
//! backends apart by their failure modes either.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use log::debug;
use tempfile::NamedTempFile;

use crate::backend::{
    AsymmetricCipher, DigestSigner, KeyFactory, KeyFingerprint, PasswordGenerator, SymmetricCipher,
};
use crate::error::{Result, SealError};
use crate::keys::{PrivateKeyHandle, PublicKeyHandle, RSA_KEY_BITS};

/// Environment variable naming the tool binary to use
pub const OPENSSL_BIN_ENV: &str = "OPENSSL_BIN";

const DEFAULT_BINARY: &str = "openssl";

/// The external-tool backend. Holds only the resolved binary path; each
/// operation spawns its own process, so concurrent use is safe.
#[derive(Debug, Clone)]
pub struct OpenSslTool {
    binary: PathBuf,
}

struct ToolOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn os_args(parts: &[&str]) -> Vec<OsString> {
    parts.iter().map(OsString::from).collect()
}

/// Write secret bytes to a tempfile (0600, removed on drop)
fn secret_file(bytes: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

fn file_arg(prefix: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(prefix);
    arg.push(path);
    arg
}

impl OpenSslTool {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Resolve the binary from `OPENSSL_BIN` (falling back to `openssl`
    /// on the PATH) and check it actually runs
    pub fn discover() -> Result<Self> {
        let binary = std::env::var_os(OPENSSL_BIN_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY));
        let tool = Self::new(binary);
        tool.probe()?;
        Ok(tool)
    }

    /// Run `<binary> version` to validate the configured tool
    pub fn probe(&self) -> Result<()> {
        let version = self.run(&os_args(&["version"]), &[])?;
        debug!(
            "external tool {} is {}",
            self.binary.display(),
            String::from_utf8_lossy(&version).trim()
        );
        Ok(())
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Spawn the tool, stream `input` to stdin and collect both output
    /// streams. Only spawn and pipe failures error here.
    fn invoke(&self, args: &[OsString], input: &[u8]) -> Result<ToolOutput> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SealError::ExternalTool(format!(
                    "Failed to spawn {}: {e}",
                    self.binary.display()
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SealError::ExternalTool("child stdin unavailable".to_string()))?;

        // feed stdin from a separate thread so a child filling the
        // stdout pipe cannot deadlock against us
        let input = input.to_vec();
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            stdin.write_all(&input)?;
            stdin.flush()
        });

        let output = child.wait_with_output().map_err(|e| {
            SealError::ExternalTool(format!("Failed to collect tool output: {e}"))
        })?;
        let write_result = writer
            .join()
            .map_err(|_| SealError::ExternalTool("stdin writer thread panicked".to_string()))?;
        if output.status.success() {
            // a broken pipe alongside a clean exit still means the tool
            // did not see the full input
            write_result.map_err(|e| {
                SealError::ExternalTool(format!("Failed to write tool stdin: {e}"))
            })?;
        }

        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run to completion; a non-zero exit becomes `exit_err`
    fn run_or(
        &self,
        args: &[OsString],
        input: &[u8],
        exit_err: impl FnOnce(String) -> SealError,
    ) -> Result<Vec<u8>> {
        let out = self.invoke(args, input)?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(exit_err(format!(
                "{} {} exited with {}: {}",
                self.binary.display(),
                args.first().map(|a| a.to_string_lossy()).unwrap_or_default(),
                out.status,
                stderr.trim()
            )));
        }
        Ok(out.stdout)
    }

    fn run(&self, args: &[OsString], input: &[u8]) -> Result<Vec<u8>> {
        self.run_or(args, input, SealError::ExternalTool)
    }

    fn sha256_digest(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.run(&os_args(&["dgst", "-sha256", "-binary"]), data)
    }

    fn spki_der_fingerprint(&self, spki_der: &[u8]) -> Result<String> {
        Ok(hex::encode(self.sha256_digest(spki_der)?))
    }
}

impl PasswordGenerator for OpenSslTool {
    fn random_password(&self, len: usize) -> Result<Vec<u8>> {
        let bytes = self.run(&os_args(&["rand", &len.to_string()]), &[])?;
        if bytes.len() != len {
            return Err(SealError::ExternalTool(format!(
                "rand returned {} bytes, expected {len}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}

impl SymmetricCipher for OpenSslTool {
    fn symmetric_encrypt(&self, password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let pass_file = secret_file(hex::encode(password).as_bytes())?;
        let mut args = os_args(&["enc", "-aes-256-cbc", "-pbkdf2", "-pass"]);
        args.push(file_arg("file:", pass_file.path()));
        self.run(&args, plaintext)
    }

    fn symmetric_decrypt(&self, password: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let pass_file = secret_file(hex::encode(password).as_bytes())?;
        let mut args = os_args(&["enc", "-d", "-aes-256-cbc", "-pbkdf2", "-pass"]);
        args.push(file_arg("file:", pass_file.path()));
        self.run_or(&args, ciphertext, SealError::Decryption)
    }
}

impl AsymmetricCipher for OpenSslTool {
    fn asymmetric_encrypt(&self, recipient: &PublicKeyHandle, message: &[u8]) -> Result<Vec<u8>> {
        if message.len() > recipient.max_message_size() {
            return Err(SealError::MessageTooLarge {
                len: message.len(),
                max: recipient.max_message_size(),
            });
        }

        let key_file = secret_file(&recipient.to_pem()?)?;
        let mut args = os_args(&["pkeyutl", "-encrypt", "-pubin", "-inkey"]);
        args.push(key_file.path().into());
        args.extend(os_args(&["-pkeyopt", "rsa_padding_mode:pkcs1"]));
        self.run(&args, message)
    }

    fn asymmetric_decrypt(&self, key: &PrivateKeyHandle, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let key_file = secret_file(&key.to_pem()?)?;
        let mut args = os_args(&["pkeyutl", "-decrypt", "-inkey"]);
        args.push(key_file.path().into());
        args.extend(os_args(&["-pkeyopt", "rsa_padding_mode:pkcs1"]));
        self.run_or(&args, ciphertext, SealError::Decryption)
    }
}

impl DigestSigner for OpenSslTool {
    fn sign(&self, key: &PrivateKeyHandle, data: &[u8]) -> Result<Vec<u8>> {
        let key_file = secret_file(&key.to_pem()?)?;
        let mut args = os_args(&["dgst", "-sha256", "-sign"]);
        args.push(key_file.path().into());
        self.run(&args, data)
    }

    fn verify(&self, key: &PublicKeyHandle, data: &[u8], signature: &[u8]) -> Result<bool> {
        let key_file = secret_file(&key.to_pem()?)?;
        let sig_file = secret_file(signature)?;
        let mut args = os_args(&["dgst", "-sha256", "-verify"]);
        args.push(key_file.path().into());
        args.push("-signature".into());
        args.push(sig_file.path().into());

        let out = self.invoke(&args, data)?;
        if out.status.success() {
            return Ok(true);
        }
        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);
        if stdout.contains("Verification") || stderr.contains("Verification") {
            return Ok(false);
        }
        Err(SealError::ExternalTool(format!(
            "{} dgst -verify exited with {}: {}",
            self.binary.display(),
            out.status,
            stderr.trim()
        )))
    }
}

impl KeyFingerprint for OpenSslTool {
    fn fingerprint(&self, key: &PublicKeyHandle) -> Result<String> {
        let der = self.run(&os_args(&["pkey", "-pubin", "-outform", "DER"]), &key.to_pem()?)?;
        self.spki_der_fingerprint(&der)
    }

    fn private_key_fingerprint(&self, key: &PrivateKeyHandle) -> Result<String> {
        let der = self.run(&os_args(&["pkey", "-pubout", "-outform", "DER"]), &key.to_pem()?)?;
        self.spki_der_fingerprint(&der)
    }

    fn certificate_fingerprint(&self, cert_pem: &[u8]) -> Result<String> {
        let pub_pem = self.run(&os_args(&["x509", "-pubkey", "-noout"]), cert_pem)?;
        let der = self.run(&os_args(&["pkey", "-pubin", "-outform", "DER"]), &pub_pem)?;
        self.spki_der_fingerprint(&der)
    }
}

impl KeyFactory for OpenSslTool {
    fn generate_private_key(&self) -> Result<PrivateKeyHandle> {
        let bits_opt = format!("rsa_keygen_bits:{RSA_KEY_BITS}");
        let pem = self.run(
            &os_args(&["genpkey", "-algorithm", "RSA", "-pkeyopt", &bits_opt]),
            &[],
        )?;
        PrivateKeyHandle::from_pem(&pem)
    }

    fn public_key(&self, key: &PrivateKeyHandle) -> Result<PublicKeyHandle> {
        let pem = self.run(&os_args(&["pkey", "-pubout"]), &key.to_pem()?)?;
        PublicKeyHandle::from_public_key_pem(&pem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_rejects_missing_binary() {
        let tool = OpenSslTool::new("/nonexistent/path/to/openssl");
        let err = tool.probe().expect_err("probe should fail");
        assert!(matches!(err, SealError::ExternalTool(_)), "{err}");
    }

    #[test]
    fn test_random_password_lengths() {
        let Ok(tool) = OpenSslTool::discover() else {
            eprintln!("no usable openssl binary, skipping");
            return;
        };
        for n in [3333, 1023, 32] {
            assert_eq!(tool.random_password(n).unwrap().len(), n);
        }
    }
}
