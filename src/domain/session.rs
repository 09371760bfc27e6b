use std::sync::Arc;

use super::profile::User;
use crate::ports::session::{ACCESS_TOKEN, TokenStore};

/// Who is using the client, and where their tokens live.
///
/// Passed explicitly to whatever needs it; there is no process-wide auth flag.
#[derive(Clone)]
pub struct Session {
    pub user_id: Option<String>,
    pub full_name: Option<String>,
    tokens: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            user_id: None,
            full_name: None,
            tokens,
        }
    }

    /// Attach the identity returned by the user-details endpoint.
    #[must_use]
    pub fn with_user(mut self, user: &User) -> Self {
        self.identify(user);
        self
    }

    pub fn identify(&mut self, user: &User) {
        self.user_id = Some(user.id.clone()).filter(|id| !id.is_empty());
        self.full_name = Some(user.full_name.clone()).filter(|n| !n.trim().is_empty());
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.access_token().is_some()
    }

    pub fn set_access_token(&self, token: &str) {
        self.tokens.set(ACCESS_TOKEN, token);
    }

    /// Forget tokens and identity.
    pub fn sign_out(&mut self) {
        self.tokens.clear_tokens();
        self.user_id = None;
        self.full_name = None;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("full_name", &self.full_name)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
