use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::watch;

use super::{AuthError, AuthProvider, IdTokenSlot, IdentityState, UserInfo};
use crate::config::MotimeConfig;

/// Identity provider backed by the Firebase Identity Toolkit REST API.
///
/// Successful logins publish the ID token into the shared token slot so
/// the document store can authorize its requests as the same user.
#[derive(Clone)]
pub struct FirebaseAuth {
    http: Client,
    endpoint: String,
    api_key: String,
    token: IdTokenSlot,
    state: Arc<watch::Sender<IdentityState>>,
}

impl FirebaseAuth {
    pub fn new(config: &MotimeConfig, token: IdTokenSlot) -> Result<Self, AuthError> {
        let http = Client::builder()
            .build()
            .map_err(|e| AuthError::Network(format!("failed to build HTTP client: {}", e)))?;
        let (state, _) = watch::channel(IdentityState::SignedOut);
        Ok(Self {
            http,
            endpoint: config.auth_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            token,
            state: Arc::new(state),
        })
    }

    async fn credential_call(
        &self,
        operation: &str,
        email: &str,
        password: &str,
    ) -> Result<UserInfo, AuthError> {
        self.state.send_replace(IdentityState::Resolving);
        match self.request_token(operation, email, password).await {
            Ok(resp) => {
                let user = UserInfo {
                    id: resp.local_id,
                    email: resp.email.unwrap_or_else(|| email.to_string()),
                    display_name: non_empty(resp.display_name),
                    photo_url: non_empty(resp.profile_picture),
                };
                self.token.set(resp.id_token);
                log::info!("signed in as {}", user.id);
                self.state.send_replace(IdentityState::SignedIn(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.state.send_replace(IdentityState::SignedOut);
                Err(e)
            }
        }
    }

    async fn request_token(
        &self,
        operation: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, AuthError> {
        let url = format!("{}/{}", self.endpoint, operation);
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("{} request failed: {}", operation, e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Network(format!("failed to read {} response: {}", operation, e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("status {}", status));
            return Err(map_error_message(&message));
        }

        serde_json::from_str(&body)
            .map_err(|e| AuthError::Provider(format!("unexpected {} response: {}", operation, e)))
    }
}

impl AuthProvider for FirebaseAuth {
    async fn login(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        self.credential_call("accounts:signInWithPassword", email, password)
            .await
    }

    async fn signup(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        // Account creation also signs the new user in, same as login.
        self.credential_call("accounts:signUp", email, password).await
    }

    async fn logout(&self) {
        self.token.clear();
        self.state.send_replace(IdentityState::SignedOut);
        log::info!("signed out");
    }

    fn identity_changes(&self) -> watch::Receiver<IdentityState> {
        self.state.subscribe()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "localId")]
    local_id: String,
    email: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "profilePicture")]
    profile_picture: Option<String>,
    #[serde(rename = "idToken")]
    id_token: String,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Map Identity Toolkit error codes onto the local taxonomy. Messages
/// arrive as `CODE` or `CODE : human-readable detail`.
fn map_error_message(message: &str) -> AuthError {
    let code = message.split_whitespace().next().unwrap_or(message);
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "WEAK_PASSWORD" => {
            let detail = message
                .split_once(':')
                .map(|(_, d)| d.trim().to_string())
                .unwrap_or_else(|| "rejected by provider".to_string());
            AuthError::WeakPassword(detail)
        }
        _ => AuthError::Provider(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_credential_errors() {
        assert!(matches!(
            map_error_message("EMAIL_NOT_FOUND"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            map_error_message("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(map_error_message("EMAIL_EXISTS"), AuthError::EmailInUse));
    }

    #[test]
    fn weak_password_keeps_detail() {
        match map_error_message("WEAK_PASSWORD : Password should be at least 6 characters") {
            AuthError::WeakPassword(detail) => {
                assert_eq!(detail, "Password should be at least 6 characters")
            }
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn unknown_codes_fall_through_to_provider() {
        assert!(matches!(
            map_error_message("USER_DISABLED"),
            AuthError::Provider(_)
        ));
    }
}
