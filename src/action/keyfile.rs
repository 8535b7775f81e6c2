// ============================================================================
// src/action/keyfile.rs – Forge a vault secret and store it GPG-encrypted
// ============================================================================

use crate::action::{ActionError, Reversible};
use crate::gpg::Encryptor;
use crate::util::atomic::atomic_write_new;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;
use zeroize::Zeroizing;

/// Raw secret length in bytes (256 bits).
pub const SECRET_LEN: usize = 32;
const KEY_FILE_MODE: u32 = 0o600;

/// Generate a fresh secret, hex-encoded as the dataset passphrase.
fn forge_secret() -> Zeroizing<String> {
    let mut raw = Zeroizing::new([0u8; SECRET_LEN]);
    OsRng.fill_bytes(&mut raw[..]);
    Zeroizing::new(hex::encode(&raw[..]))
}

/// Short SHA-256 signet of the stored ciphertext (never of the secret).
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(&Sha256::digest(bytes)[..8])
}

#[derive(Debug, Clone)]
pub struct CreateEncryptedKeyFile {
    key_file: PathBuf,
    recipient: String,
    encryptor: Rc<dyn Encryptor>,
}

impl CreateEncryptedKeyFile {
    pub fn new(key_file: &Path, recipient: &str, encryptor: Rc<dyn Encryptor>) -> Self {
        Self {
            key_file: key_file.to_path_buf(),
            recipient: recipient.to_string(),
            encryptor,
        }
    }
}

impl Reversible for CreateEncryptedKeyFile {
    fn name(&self) -> &'static str {
        "create-encrypted-key-file"
    }

    fn describe(&self) -> String {
        format!(
            "write key file {} for {}",
            self.key_file.display(),
            self.recipient
        )
    }

    fn pre_invoke(&mut self) -> Result<(), ActionError> {
        if fs::symlink_metadata(&self.key_file).is_ok() {
            return Err(ActionError::AlreadyExists(self.key_file.clone()));
        }
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), ActionError> {
        let secret = forge_secret();
        let sealed = self.encryptor.encrypt(secret.as_bytes(), &self.recipient)?;
        atomic_write_new(&self.key_file, &sealed, KEY_FILE_MODE)
            .map_err(|e| ActionError::from_io("write", &self.key_file, e))?;
        info!(
            path = %self.key_file.display(),
            recipient = %self.recipient,
            signet = %fingerprint(&sealed),
            "key file sealed"
        );
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ActionError> {
        fs::remove_file(&self.key_file)
            .map_err(|e| ActionError::from_io("remove", &self.key_file, e))?;
        info!(path = %self.key_file.display(), "key file removed");
        Ok(())
    }
}
