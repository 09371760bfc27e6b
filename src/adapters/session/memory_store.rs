use std::collections::HashMap;
use std::sync::RwLock;

use crate::ports::session::TokenStore;

/// Tokens that live as long as the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn with_access_token(token: &str) -> Self {
        let store = Self::default();
        store.set(crate::ports::session::ACCESS_TOKEN, token);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key.to_string(), value.to_string());
        } else {
            tracing::error!(key, "Token store lock poisoned, skipping write");
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(key);
        }
    }
}
