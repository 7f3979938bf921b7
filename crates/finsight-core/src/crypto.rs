//! Field-level encryption for transaction descriptions
//!
//! Descriptions are sealed with AES-256-GCM under a single process-wide key read
//! from a key file. The key file is created once (32 raw bytes) and reused for
//! its lifetime. Stored ciphertext is base64 text:
//!
//! ```text
//! version (1 byte) || nonce (12 bytes) || ciphertext + tag
//! ```
//!
//! A ciphertext produced under a different key fails the GCM tag check and is
//! reported as [`Error::Decryption`]; it never decodes to garbage.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Mutex;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const FORMAT_VERSION: u8 = 1;

/// Serializes key-file creation within the process
static KEY_FILE_LOCK: Mutex<()> = Mutex::new(());

/// Symmetric cipher bound to one key
#[derive(Clone)]
pub struct Cipher {
    aead: Aes256Gcm,
    fingerprint: String,
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl Cipher {
    /// Build a cipher from raw key bytes
    pub fn from_key(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_SIZE {
            return Err(Error::Encryption(format!(
                "Key must be {} bytes, got {}",
                KEY_SIZE,
                key.len()
            )));
        }
        let aead = Aes256Gcm::new_from_slice(key)
            .map_err(|e| Error::Encryption(format!("Failed to create cipher: {}", e)))?;
        Ok(Self {
            aead,
            fingerprint: fingerprint(key),
        })
    }

    /// Cipher over a fresh random key that is never written anywhere
    pub fn ephemeral() -> Result<Self> {
        Self::from_key(&generate_key())
    }

    /// Load the key file, creating it first if it does not exist
    ///
    /// The key is written to a temporary file in the same directory and linked
    /// into place without clobbering, so the key file is never visible with
    /// partial contents. When two processes race, the loser reads the winner's
    /// key. An empty key file left by an interrupted write is replaced.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let _guard = KEY_FILE_LOCK
            .lock()
            .map_err(|_| Error::Encryption("Key file lock poisoned".to_string()))?;

        let stale = match fs::read(path) {
            Ok(bytes) if bytes.is_empty() => {
                warn!(path = %path.display(), "Replacing empty encryption key file");
                true
            }
            Ok(bytes) => {
                let cipher = Self::from_key(&bytes)?;
                debug!(fingerprint = %cipher.fingerprint, "Loaded encryption key");
                return Ok(cipher);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let key = generate_key();
        // NamedTempFile is created with mode 0600 on unix
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&key)?;
        tmp.as_file().sync_all()?;

        let placed = if stale {
            tmp.persist(path).map(|_| ())
        } else {
            tmp.persist_noclobber(path).map(|_| ())
        };

        match placed {
            Ok(()) => {
                let cipher = Self::from_key(&key)?;
                info!(
                    path = %path.display(),
                    fingerprint = %cipher.fingerprint,
                    "Generated new encryption key"
                );
                Ok(cipher)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                let cipher = Self::from_key(&fs::read(path)?)?;
                debug!(fingerprint = %cipher.fingerprint, "Loaded encryption key written concurrently");
                Ok(cipher)
            }
            Err(e) => Err(e.error.into()),
        }
    }

    /// Short SHA-256 fingerprint of the key, safe to log
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Encrypt text to the base64 storage form
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Decrypt the base64 storage form back to text
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let bytes = self.decrypt_bytes(encoded)?;
        String::from_utf8(bytes)
            .map_err(|_| Error::Decryption("Decrypted value is not valid UTF-8".to_string()))
    }

    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .aead
            .encrypt(nonce, plaintext)
            .map_err(|e| Error::Encryption(format!("Encryption failed: {}", e)))?;

        let mut out = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt_bytes(&self, encoded: &str) -> Result<Vec<u8>> {
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|_| Error::Decryption("Ciphertext is not valid base64".to_string()))?;

        if data.len() < 1 + NONCE_SIZE {
            return Err(Error::Decryption(format!(
                "Ciphertext too short: {} bytes",
                data.len()
            )));
        }
        if data[0] != FORMAT_VERSION {
            return Err(Error::Decryption(format!(
                "Unsupported ciphertext version {}",
                data[0]
            )));
        }

        let nonce = Nonce::from_slice(&data[1..1 + NONCE_SIZE]);
        self.aead
            .decrypt(nonce, &data[1 + NONCE_SIZE..])
            .map_err(|_| {
                Error::Decryption("Decryption failed (wrong key or corrupted data)".to_string())
            })
    }
}

/// Generate 32 random key bytes from the OS RNG
pub fn generate_key() -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    key
}

fn fingerprint(key: &[u8]) -> String {
    let digest = Sha256::digest(key);
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_ascii() {
        let cipher = Cipher::ephemeral().unwrap();
        let sealed = cipher.encrypt("STARBUCKS #1234").unwrap();
        assert_ne!(sealed, "STARBUCKS #1234");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "STARBUCKS #1234");
    }

    #[test]
    fn test_round_trip_empty_and_non_ascii() {
        let cipher = Cipher::ephemeral().unwrap();
        for text in ["", "Café Zürich ☕", "東京ラーメン", "emoji 🚕 ride"] {
            let sealed = cipher.encrypt(text).unwrap();
            assert_eq!(cipher.decrypt(&sealed).unwrap(), text);
        }
    }

    #[test]
    fn test_same_plaintext_different_ciphertext() {
        let cipher = Cipher::ephemeral().unwrap();
        let a = cipher.encrypt("RENT PAYMENT").unwrap();
        let b = cipher.encrypt("RENT PAYMENT").unwrap();
        assert_ne!(a, b, "nonces must differ per encryption");
    }

    #[test]
    fn test_wrong_key_fails_loudly() {
        let writer = Cipher::ephemeral().unwrap();
        let reader = Cipher::ephemeral().unwrap();
        let sealed = writer.encrypt("UBER TRIP").unwrap();
        assert!(matches!(reader.decrypt(&sealed), Err(Error::Decryption(_))));
    }

    #[test]
    fn test_garbage_input_is_decryption_error() {
        let cipher = Cipher::ephemeral().unwrap();
        assert!(matches!(
            cipher.decrypt("not base64 at all!"),
            Err(Error::Decryption(_))
        ));
        assert!(matches!(cipher.decrypt("AAAA"), Err(Error::Decryption(_))));
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let cipher = Cipher::ephemeral().unwrap();
        let sealed = cipher.encrypt("NETFLIX.COM").unwrap();
        let mut raw = STANDARD.decode(&sealed).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = STANDARD.encode(raw);
        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(Error::Decryption(_))
        ));
    }

    #[test]
    fn test_load_or_create_reuses_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("secret.key");

        let first = Cipher::load_or_create(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), KEY_SIZE);
        let sealed = first.encrypt("SAFEWAY").unwrap();

        let second = Cipher::load_or_create(&path).unwrap();
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(second.decrypt(&sealed).unwrap(), "SAFEWAY");
    }

    #[test]
    fn test_concurrent_first_use_creates_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.key");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    Cipher::load_or_create(&path)
                        .unwrap()
                        .fingerprint()
                        .to_string()
                })
            })
            .collect();

        let prints: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(prints.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_empty_key_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.key");
        fs::write(&path, b"").unwrap();

        let cipher = Cipher::load_or_create(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), KEY_SIZE);

        let again = Cipher::load_or_create(&path).unwrap();
        assert_eq!(cipher.fingerprint(), again.fingerprint());
    }

    #[test]
    fn test_existing_key_file_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.key");
        fs::write(&path, [9u8; KEY_SIZE]).unwrap();

        let cipher = Cipher::load_or_create(&path).unwrap();
        assert_eq!(
            cipher.fingerprint(),
            Cipher::from_key(&[9u8; KEY_SIZE]).unwrap().fingerprint()
        );
        assert_eq!(fs::read(&path).unwrap(), vec![9u8; KEY_SIZE]);
    }

    #[test]
    fn test_truncated_key_file_fails_without_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.key");
        fs::write(&path, [1u8; 10]).unwrap();

        assert!(matches!(
            Cipher::load_or_create(&path),
            Err(Error::Encryption(_))
        ));
        assert_eq!(fs::read(&path).unwrap().len(), 10);
    }

    #[test]
    fn test_key_creation_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.key");
        Cipher::load_or_create(&path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("secret.key")]);
    }

    #[test]
    fn test_bad_key_length() {
        assert!(matches!(
            Cipher::from_key(&[0u8; 16]),
            Err(Error::Encryption(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let cipher = Cipher::from_key(&[7u8; KEY_SIZE]).unwrap();
        let shown = format!("{:?}", cipher);
        assert!(shown.contains(cipher.fingerprint()));
        assert!(!shown.contains("aead"));
    }
}
