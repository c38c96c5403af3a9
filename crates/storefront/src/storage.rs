//! Durable storage slot for the serialized cart.
//!
//! A slot holds exactly one document: the JSON array of line items. It is
//! read once when the store starts and overwritten after every mutation.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rocketshoes_core::{Cart, LineItem};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors from reading or writing a storage slot.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Cart could not be serialized.
    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Slot is unusable (e.g. a poisoned in-memory slot).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A single named location holding the serialized cart.
pub trait StorageSlot: Send + Sync {
    /// Read the raw slot contents, or `None` if the slot has never been written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot exists but cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the slot contents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails. The previous contents must
    /// survive a failed write.
    fn save(&self, contents: &str) -> Result<(), StorageError>;
}

/// Serialize a cart into the slot format.
///
/// # Errors
///
/// Returns `StorageError::Serialize` if serialization fails.
pub fn encode_cart(cart: &Cart) -> Result<String, StorageError> {
    Ok(serde_json::to_string(cart)?)
}

/// Restore a cart from a slot.
///
/// Missing, unreadable or unparseable slots all yield an empty cart; the
/// cause is logged.
pub fn restore_cart(slot: &dyn StorageSlot) -> Cart {
    match slot.load() {
        Ok(Some(raw)) => match serde_json::from_str::<Vec<LineItem>>(&raw) {
            Ok(items) => Cart::from_items(items),
            Err(e) => {
                tracing::warn!(error = %e, "Stored cart is not valid JSON, starting empty");
                Cart::new()
            }
        },
        Ok(None) => Cart::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read stored cart, starting empty");
            Cart::new()
        }
    }
}

// =============================================================================
// FileSlot
// =============================================================================

/// A storage slot backed by a single JSON file.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the slot, so readers see either the old or the new cart.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StorageSlot for FileSlot {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, contents: &str) -> Result<(), StorageError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        tracing::debug!(path = %self.path.display(), bytes = contents.len(), "Cart persisted");
        Ok(())
    }
}

// =============================================================================
// MemorySlot
// =============================================================================

/// An in-memory slot for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySlot {
    contents: Mutex<Option<String>>,
    fail_writes: bool,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-filled with `contents`.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            fail_writes: false,
        }
    }

    /// A slot whose writes always fail, leaving existing contents intact.
    #[must_use]
    pub fn read_only(contents: Option<String>) -> Self {
        Self {
            contents: Mutex::new(contents),
            fail_writes: true,
        }
    }

    /// Current raw contents.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|guard| guard.clone())
    }
}

impl StorageSlot for MemorySlot {
    fn load(&self) -> Result<Option<String>, StorageError> {
        self.contents
            .lock()
            .map(|guard| guard.clone())
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    fn save(&self, contents: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("slot is read-only".to_string()));
        }
        let mut guard = self
            .contents
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        *guard = Some(contents.to_string());
        Ok(())
    }
}
