use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use keyring::Entry;
use parking_lot::Mutex;

use crate::config::CredentialBackend;

const SERVICE_NAME: &str = "careline";

/// Well-known name of the single slot holding the raw credential.
pub const CREDENTIAL_SLOT_NAME: &str = "token";

/// Durable storage for the raw credential string.
///
/// Absence of a value means the user is anonymous.
pub trait CredentialSlot: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn store(&self, credential: &str) -> Result<()>;
    /// Remove the credential. Clearing an empty slot succeeds.
    fn clear(&self) -> Result<()>;
}

// Lets a caller keep a handle on the slot it gives to the store
impl<T: CredentialSlot + ?Sized> CredentialSlot for Arc<T> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn store(&self, credential: &str) -> Result<()> {
        (**self).store(credential)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// Build the slot selected in configuration.
pub fn open_slot(backend: CredentialBackend, cache_dir: PathBuf) -> Box<dyn CredentialSlot> {
    match backend {
        CredentialBackend::Keyring => Box::new(KeyringSlot),
        CredentialBackend::File => Box::new(FileSlot::new(cache_dir)),
        CredentialBackend::Memory => Box::new(MemorySlot::default()),
    }
}

/// Slot in the OS keychain.
pub struct KeyringSlot;

impl KeyringSlot {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, CREDENTIAL_SLOT_NAME).context("Failed to create keyring entry")
    }
}

impl CredentialSlot for KeyringSlot {
    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(credential) => Ok(Some(credential)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve credential from keychain"),
        }
    }

    fn store(&self, credential: &str) -> Result<()> {
        Self::entry()?
            .set_password(credential)
            .context("Failed to store credential in keychain")
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

/// Slot backed by a plain file in the cache directory.
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_SLOT_NAME)
    }
}

impl CredentialSlot for FileSlot {
    fn load(&self) -> Result<Option<String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read credential file")?;
        let credential = contents.trim();
        Ok((!credential.is_empty()).then(|| credential.to_string()))
    }

    fn store(&self, credential: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create credential directory")?;
        std::fs::write(self.path(), credential).context("Failed to write credential file")
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove credential file")?;
        }
        Ok(())
    }
}

/// In-process slot, used by tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(credential.into())),
        }
    }
}

impl CredentialSlot for MemorySlot {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value.lock().clone())
    }

    fn store(&self, credential: &str) -> Result<()> {
        *self.value.lock() = Some(credential.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.value.lock() = None;
        Ok(())
    }
}
