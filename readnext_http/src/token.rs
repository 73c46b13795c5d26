use std::sync::{Arc, RwLock};

use log::warn;

use crate::storage::{MemoryStorage, TokenStorage};

pub const ACCESS_TOKEN_KEY: &str = "readnext.access_token";
pub const REFRESH_TOKEN_KEY: &str = "readnext.refresh_token";

/// Owns the access/refresh token pair. Tokens are opaque here; nothing in
/// this crate parses them. Durable-storage failures are logged and degrade to
/// "no token" -- they are never surfaced to callers.
///
/// Cheap to clone; all clones share one pair.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Box<dyn TokenStorage>,
    // In-memory mirrors, seeded from storage at construction and kept in
    // sync for the rest of the session.
    access: RwLock<Option<String>>,
    refresh: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        let access = read_or_warn(storage.as_ref(), ACCESS_TOKEN_KEY);
        let refresh = read_or_warn(storage.as_ref(), REFRESH_TOKEN_KEY);
        Self {
            inner: Arc::new(Inner {
                storage,
                access: RwLock::new(access),
                refresh: RwLock::new(refresh),
            }),
        }
    }

    /// Store backed by process memory only; tokens vanish with the process.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .access
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner
            .refresh
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Persists the access token unconditionally; the refresh token only when
    /// provided. Omitting it preserves the previously stored refresh token.
    pub fn store(&self, access: &str, refresh: Option<&str>) {
        if let Err(err) = self.inner.storage.set(ACCESS_TOKEN_KEY, access) {
            warn!("failed to persist access token: {err}");
        }
        *self.inner.access.write().unwrap_or_else(|e| e.into_inner()) = Some(access.to_string());

        if let Some(refresh) = refresh {
            if let Err(err) = self.inner.storage.set(REFRESH_TOKEN_KEY, refresh) {
                warn!("failed to persist refresh token: {err}");
            }
            *self
                .inner
                .refresh
                .write()
                .unwrap_or_else(|e| e.into_inner()) = Some(refresh.to_string());
        }
    }

    /// Removes both tokens. Used on logout and on unrecoverable
    /// authentication failure.
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.inner.storage.remove(key) {
                warn!("failed to remove {key} from storage: {err}");
            }
        }
        *self.inner.access.write().unwrap_or_else(|e| e.into_inner()) = None;
        *self
            .inner
            .refresh
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }
}

fn read_or_warn(storage: &dyn TokenStorage, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(err) => {
            warn!("token storage read failed for {key}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, StorageError};

    struct FailingStorage;

    fn disabled() -> StorageError {
        std::io::Error::new(std::io::ErrorKind::Other, "storage disabled").into()
    }

    impl TokenStorage for FailingStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(disabled())
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(disabled())
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(disabled())
        }
    }

    #[test]
    fn store_and_read_back() {
        let tokens = TokenStore::in_memory();
        assert!(!tokens.is_authenticated());

        tokens.store("access-1", Some("refresh-1"));
        assert_eq!(tokens.access_token().as_deref(), Some("access-1"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("refresh-1"));
        assert!(tokens.is_authenticated());
    }

    #[test]
    fn omitted_refresh_token_is_preserved() {
        let tokens = TokenStore::in_memory();
        tokens.store("access-1", Some("refresh-1"));
        tokens.store("access-2", None);
        assert_eq!(tokens.access_token().as_deref(), Some("access-2"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn clear_removes_both_tokens() {
        let tokens = TokenStore::in_memory();
        tokens.store("access-1", Some("refresh-1"));
        tokens.clear();
        assert!(tokens.access_token().is_none());
        assert!(tokens.refresh_token().is_none());
        assert!(!tokens.is_authenticated());
    }

    #[test]
    fn tokens_survive_store_reconstruction() {
        let path =
            std::env::temp_dir().join(format!("readnext-tokens-{}.json", uuid::Uuid::new_v4()));
        {
            let tokens = TokenStore::new(Box::new(FileStorage::new(&path)));
            tokens.store("access-1", Some("refresh-1"));
        }
        let tokens = TokenStore::new(Box::new(FileStorage::new(&path)));
        assert_eq!(tokens.access_token().as_deref(), Some("access-1"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("refresh-1"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn broken_storage_degrades_to_no_token() {
        let tokens = TokenStore::new(Box::new(FailingStorage));
        assert!(tokens.access_token().is_none());

        // Persisting fails silently; the in-memory mirror still serves the
        // rest of the session.
        tokens.store("access-1", Some("refresh-1"));
        assert_eq!(tokens.access_token().as_deref(), Some("access-1"));
        tokens.clear();
        assert!(tokens.access_token().is_none());
    }
}
