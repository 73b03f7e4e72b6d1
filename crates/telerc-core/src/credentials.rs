//! Credential artifact storage.
//!
//! The artifact is the opaque certificate/key bundle produced by a
//! successful pairing. It is keyed by client installation, not by
//! device: its mere presence (non-empty) means "a pairing previously
//! completed". The store handle is injected into the engine at
//! construction — no ambient global keystore.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::CoreError;

/// Persistence seam for the credential artifact.
///
/// `store` replaces the artifact all-or-nothing; `delete` is idempotent
/// (absence is success). Only the engine writes through this handle.
pub trait CredentialStore: Send + Sync {
    /// The credential gate: is a non-empty artifact present?
    ///
    /// Never fails — a missing artifact is the expected `false` answer.
    fn exists(&self) -> bool;

    /// Read the artifact, `None` when absent.
    fn load(&self) -> Result<Option<Vec<u8>>, CoreError>;

    /// Replace the artifact atomically.
    fn store(&self, artifact: &[u8]) -> Result<(), CoreError>;

    /// Remove the artifact. Removing a missing artifact is a no-op.
    fn delete(&self) -> Result<(), CoreError>;
}

// ── Filesystem store ─────────────────────────────────────────────────

/// Artifact stored as a single file, replaced via temp-file rename so a
/// crash mid-write never leaves a half-written credential.
pub struct FsCredentialStore {
    path: PathBuf,
}

impl FsCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CredentialStore for FsCredentialStore {
    fn exists(&self) -> bool {
        std::fs::metadata(&self.path).map(|m| m.len() > 0).unwrap_or(false)
    }

    fn load(&self) -> Result<Option<Vec<u8>>, CoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::CredentialStore(format!(
                "read {} failed: {e}",
                self.path.display()
            ))),
        }
    }

    fn store(&self, artifact: &[u8]) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::CredentialStore(format!("create {} failed: {e}", parent.display()))
            })?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, artifact)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                CoreError::CredentialStore(format!("write {} failed: {e}", self.path.display()))
            })?;
        debug!(path = %self.path.display(), bytes = artifact.len(), "credential artifact stored");
        Ok(())
    }

    fn delete(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "credential artifact deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "credential delete failed");
                Err(CoreError::CredentialStore(format!(
                    "delete {} failed: {e}",
                    self.path.display()
                )))
            }
        }
    }
}

// ── In-memory store ──────────────────────────────────────────────────

/// Volatile store for tests and embedded use.
#[derive(Default)]
pub struct MemoryCredentialStore {
    artifact: std::sync::Mutex<Option<Vec<u8>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store with an artifact.
    pub fn with_artifact(artifact: Vec<u8>) -> Self {
        Self {
            artifact: std::sync::Mutex::new(Some(artifact)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Vec<u8>>> {
        self.artifact.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn exists(&self) -> bool {
        self.lock().as_ref().is_some_and(|a| !a.is_empty())
    }

    fn load(&self) -> Result<Option<Vec<u8>>, CoreError> {
        Ok(self.lock().clone().filter(|a| !a.is_empty()))
    }

    fn store(&self, artifact: &[u8]) -> Result<(), CoreError> {
        *self.lock() = Some(artifact.to_vec());
        Ok(())
    }

    fn delete(&self) -> Result<(), CoreError> {
        *self.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_absent_is_false_not_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsCredentialStore::new(dir.path().join("remote.pem"));
        assert!(!store.exists());
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn fs_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsCredentialStore::new(dir.path().join("nested/remote.pem"));
        store.store(b"artifact").expect("store");
        assert!(store.exists());
        assert_eq!(store.load().expect("load").as_deref(), Some(&b"artifact"[..]));
    }

    #[test]
    fn fs_store_empty_file_gates_false() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("remote.pem");
        std::fs::write(&path, b"").expect("touch");
        let store = FsCredentialStore::new(&path);
        assert!(!store.exists());
    }

    #[test]
    fn fs_delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsCredentialStore::new(dir.path().join("remote.pem"));
        store.delete().expect("delete absent");
        store.store(b"artifact").expect("store");
        store.delete().expect("delete present");
        store.delete().expect("delete again");
        assert!(!store.exists());
    }

    #[test]
    fn fs_store_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsCredentialStore::new(dir.path().join("remote.pem"));
        store.store(b"artifact").expect("store");
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("remote.pem")]);
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryCredentialStore::new();
        assert!(!store.exists());
        store.store(b"artifact").expect("store");
        assert!(store.exists());
        store.delete().expect("delete");
        assert!(!store.exists());
        store.delete().expect("idempotent");
    }
}
