pub const ACCESS_TOKEN: &str = "accessToken";
pub const REFRESH_TOKEN: &str = "refreshToken";

/// Persistent key-value store for auth tokens.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN).filter(|t| !t.is_empty())
    }

    /// Drop both tokens, e.g. after the backend answered 401.
    fn clear_tokens(&self) {
        self.remove(ACCESS_TOKEN);
        self.remove(REFRESH_TOKEN);
    }
}
