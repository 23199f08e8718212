use crate::types::Session;
use aes_gcm::aead::{Aead, Key, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const STORE_FILE: &str = "session.json";
const KEY_FILE: &str = ".secret_key";
const NONCE_LEN: usize = 12;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredAuth {
    pub session: Option<Session>,
    pub pkce_verifier: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("app", "swayami", "swayami")
            .ok_or_else(|| anyhow!("Could not determine project directories"))?;
        Ok(Self::at(proj_dirs.data_dir()))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self) -> Result<StoredAuth> {
        let path = self.dir.join(STORE_FILE);
        if !path.exists() {
            return Ok(StoredAuth::default());
        }

        let encrypted = fs::read(&path)?;
        let decrypted = self.decrypt(&encrypted)?;
        let stored: StoredAuth = serde_json::from_slice(&decrypted)?;
        Ok(stored)
    }

    pub fn save(&self, stored: &StoredAuth) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec(stored)?;
        let encrypted = self.encrypt(&json)?;
        write_secure_file(&self.dir.join(STORE_FILE), &encrypted)
    }

    pub fn update(&self, f: impl FnOnce(&mut StoredAuth)) -> Result<StoredAuth> {
        let mut stored = self.load()?;
        f(&mut stored);
        self.save(&stored)?;
        Ok(stored)
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.dir.join(STORE_FILE);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn get_or_create_key(&self) -> Result<[u8; 32]> {
        let path = self.dir.join(KEY_FILE);

        if path.exists() {
            let key_bytes = fs::read(&path)?;
            if key_bytes.len() == 32 {
                let mut key = [0u8; 32];
                key.copy_from_slice(&key_bytes);
                return Ok(key);
            }
        }

        fs::create_dir_all(&self.dir)?;
        let mut key = [0u8; 32];
        rand::thread_rng().fill(&mut key);
        write_secure_file(&path, &key)?;
        Ok(key)
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        let key = self.get_or_create_key()?;
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)))
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce);

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| anyhow!("Encryption failed"))?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(anyhow!("Session file is truncated"));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("Session file could not be decrypted"))
    }
}

fn write_secure_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}
