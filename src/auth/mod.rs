pub mod error;
pub mod firebase;
pub mod memory;

use std::future::Future;
use std::sync::{Arc, RwLock};

use tokio::sync::watch;

pub use error::AuthError;

/// The authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl UserInfo {
    /// Name shown in the UI: display name, else the email's local part.
    pub fn display_label(&self) -> String {
        if let Some(name) = self.display_name.as_deref() {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        match self.email.split_once('@') {
            Some((local, _)) if !local.is_empty() => local.to_string(),
            _ => "User".to_string(),
        }
    }
}

/// Identity lifecycle reported through `identity_changes`. `Resolving`
/// is transient while a login or signup is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    #[default]
    SignedOut,
    Resolving,
    SignedIn(UserInfo),
}

impl IdentityState {
    pub fn user(&self) -> Option<&UserInfo> {
        match self {
            Self::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// Shared slot for the signed-in user's bearer token: the identity
/// provider writes it, the document store attaches it to requests.
#[derive(Clone, Default)]
pub struct IdTokenSlot(Arc<RwLock<Option<String>>>);

impl IdTokenSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: String) {
        *self.0.write().unwrap() = Some(token);
    }

    pub fn clear(&self) {
        *self.0.write().unwrap() = None;
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap().clone()
    }
}

/// Login/signup/logout plus a push feed of identity changes.
///
/// Implementations are cheap to clone; clones observe the same identity.
pub trait AuthProvider: Clone + Send + Sync + 'static {
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserInfo, AuthError>> + Send;

    fn signup(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserInfo, AuthError>> + Send;

    fn logout(&self) -> impl Future<Output = ()> + Send;

    /// Watch feed of the identity lifecycle. The current state is
    /// readable immediately via `borrow`.
    fn identity_changes(&self) -> watch::Receiver<IdentityState>;
}
