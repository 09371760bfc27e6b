use std::time::Duration;

/// Response cache keyed by request. Values are serialized JSON.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str, ttl: Duration);
    fn invalidate(&self, key: &str);
}
