// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output encryption — age (scrypt) passphrase encryption of assembled
// documents. The passphrase comes from the encrypt-config file or the saved
// settings; it is wrapped in a `SecretString` so it is zeroised on drop.

use std::io::{Read, Write};

use age::secrecy::SecretString;
use tracing::{debug, instrument};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::settings::EncryptConfig;

/// Passphrase-based document encryption backed by the `age` crate.
///
/// Each encrypt/decrypt call is stateless — the passphrase is held only for
/// the lifetime of the `DocumentEncryptor` value so callers can drop it
/// promptly after the output is written.
pub struct DocumentEncryptor {
    passphrase: SecretString,
}

impl DocumentEncryptor {
    pub fn new(config: &EncryptConfig) -> Self {
        Self {
            passphrase: SecretString::from(config.passphrase.clone()),
        }
    }

    /// Encrypt `plaintext` and return the ciphertext. The output is a
    /// complete age file (header + payload) written directly to disk as the
    /// run's output document.
    #[instrument(skip_all, fields(plaintext_len = plaintext.len()))]
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let encryptor = age::Encryptor::with_user_passphrase(self.passphrase.clone());
        let mut ciphertext = Vec::new();

        let mut writer = encryptor
            .wrap_output(&mut ciphertext)
            .map_err(|e| ScanwerkError::Encryption(e.to_string()))?;

        writer
            .write_all(plaintext)
            .map_err(|e| ScanwerkError::Encryption(e.to_string()))?;

        writer
            .finish()
            .map_err(|e| ScanwerkError::Encryption(e.to_string()))?;

        debug!(ciphertext_len = ciphertext.len(), "encryption complete");
        Ok(ciphertext)
    }

    /// Decrypt a complete age file back to the original document bytes.
    #[instrument(skip_all, fields(ciphertext_len = ciphertext.len()))]
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let decryptor = age::Decryptor::new(ciphertext)
            .map_err(|e| ScanwerkError::Decryption(e.to_string()))?;

        let identity = age::scrypt::Identity::new(self.passphrase.clone());

        let mut reader = decryptor
            .decrypt(std::iter::once(&identity as &dyn age::Identity))
            .map_err(|e| ScanwerkError::Decryption(e.to_string()))?;

        let mut plaintext = Vec::new();
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| ScanwerkError::Decryption(e.to_string()))?;

        debug!(plaintext_len = plaintext.len(), "decryption complete");
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encryptor(passphrase: &str) -> DocumentEncryptor {
        DocumentEncryptor::new(&EncryptConfig {
            passphrase: passphrase.into(),
        })
    }

    #[test]
    fn round_trip() {
        let enc = encryptor("correct-horse-battery-staple");
        let plaintext = b"%PDF-1.5 scanned output";

        let ciphertext = enc.encrypt(plaintext).expect("encrypt failed");
        assert_ne!(
            &ciphertext[..],
            plaintext,
            "ciphertext must differ from plaintext"
        );

        let decrypted = enc.decrypt(&ciphertext).expect("decrypt failed");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn wrong_passphrase_fails() {
        let enc_a = encryptor("passphrase-alpha");
        let enc_b = encryptor("passphrase-beta");

        let ciphertext = enc_a.encrypt(b"secret").expect("encrypt failed");
        assert!(
            enc_b.decrypt(&ciphertext).is_err(),
            "decryption with wrong passphrase must fail"
        );
    }

    #[test]
    fn empty_plaintext() {
        let enc = encryptor("empty-test");
        let ciphertext = enc.encrypt(b"").expect("encrypt failed");
        let decrypted = enc.decrypt(&ciphertext).expect("decrypt failed");
        assert!(decrypted.is_empty());
    }
}
