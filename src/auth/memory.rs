use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use super::{AuthError, AuthProvider, IdentityState, UserInfo};

/// In-memory identity provider with the same observable contract as the
/// hosted one. Used by the test suite and local runs.
#[derive(Clone)]
pub struct MemoryAuth {
    inner: Arc<MemoryAuthInner>,
}

struct MemoryAuthInner {
    users: Mutex<HashMap<String, StoredUser>>,
    state: watch::Sender<IdentityState>,
}

struct StoredUser {
    password: String,
    info: UserInfo,
}

impl MemoryAuth {
    pub fn new() -> Self {
        let (state, _) = watch::channel(IdentityState::SignedOut);
        Self {
            inner: Arc::new(MemoryAuthInner {
                users: Mutex::new(HashMap::new()),
                state,
            }),
        }
    }

    /// Pre-register a user without signing them in.
    pub fn register(&self, email: &str, password: &str) -> UserInfo {
        let info = UserInfo {
            id: format!("user-{}", email),
            email: email.to_string(),
            display_name: None,
            photo_url: None,
        };
        self.inner.users.lock().unwrap().insert(
            email.to_string(),
            StoredUser {
                password: password.to_string(),
                info: info.clone(),
            },
        );
        info
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProvider for MemoryAuth {
    async fn login(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        self.inner.state.send_replace(IdentityState::Resolving);
        let result = {
            let users = self.inner.users.lock().unwrap();
            match users.get(email) {
                Some(stored) if stored.password == password => Ok(stored.info.clone()),
                _ => Err(AuthError::InvalidCredentials),
            }
        };
        match result {
            Ok(user) => {
                self.inner
                    .state
                    .send_replace(IdentityState::SignedIn(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.inner.state.send_replace(IdentityState::SignedOut);
                Err(e)
            }
        }
    }

    async fn signup(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        self.inner.state.send_replace(IdentityState::Resolving);
        if password.len() < 6 {
            self.inner.state.send_replace(IdentityState::SignedOut);
            return Err(AuthError::WeakPassword(
                "Password should be at least 6 characters".to_string(),
            ));
        }
        if self.inner.users.lock().unwrap().contains_key(email) {
            self.inner.state.send_replace(IdentityState::SignedOut);
            return Err(AuthError::EmailInUse);
        }
        let user = self.register(email, password);
        self.inner
            .state
            .send_replace(IdentityState::SignedIn(user.clone()));
        Ok(user)
    }

    async fn logout(&self) {
        self.inner.state.send_replace(IdentityState::SignedOut);
    }

    fn identity_changes(&self) -> watch::Receiver<IdentityState> {
        self.inner.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_requires_matching_password() {
        let auth = MemoryAuth::new();
        auth.register("mo@example.com", "secret1");

        assert!(matches!(
            auth.login("mo@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        let user = auth.login("mo@example.com", "secret1").await.unwrap();
        assert_eq!(user.email, "mo@example.com");
        assert!(matches!(
            &*auth.identity_changes().borrow(),
            IdentityState::SignedIn(_)
        ));
    }

    #[tokio::test]
    async fn signup_rejects_duplicates_and_weak_passwords() {
        let auth = MemoryAuth::new();
        auth.register("mo@example.com", "secret1");

        assert!(matches!(
            auth.signup("mo@example.com", "secret1").await,
            Err(AuthError::EmailInUse)
        ));
        assert!(matches!(
            auth.signup("new@example.com", "abc").await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(auth.signup("new@example.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn logout_reports_signed_out() {
        let auth = MemoryAuth::new();
        auth.register("mo@example.com", "secret1");
        auth.login("mo@example.com", "secret1").await.unwrap();
        auth.logout().await;
        assert_eq!(*auth.identity_changes().borrow(), IdentityState::SignedOut);
    }
}
