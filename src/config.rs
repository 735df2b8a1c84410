use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_auth_endpoint() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_firestore_endpoint() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

/// Backend connection settings. The endpoint overrides exist so tests
/// and self-hosted emulators can point at a local server.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MotimeConfig {
    pub api_key: String,
    pub project_id: String,
    #[serde(default = "default_auth_endpoint")]
    pub auth_endpoint: String,
    #[serde(default = "default_firestore_endpoint")]
    pub firestore_endpoint: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for MotimeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            auth_endpoint: default_auth_endpoint(),
            firestore_endpoint: default_firestore_endpoint(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("motime")
        .join("config.json")
}

impl MotimeConfig {
    /// Load the stored config, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(self).expect("config serializes"))
    }

    /// Root of the project's document tree in the Firestore REST API.
    pub fn firestore_documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.firestore_endpoint.trim_end_matches('/'),
            self.project_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_url_includes_project() {
        let config = MotimeConfig {
            project_id: "motime-dev".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.firestore_documents_url(),
            "https://firestore.googleapis.com/v1/projects/motime-dev/databases/(default)/documents"
        );
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: MotimeConfig =
            serde_json::from_str(r#"{"api_key": "k", "project_id": "p"}"#).unwrap();
        assert_eq!(config.auth_endpoint, default_auth_endpoint());
        assert_eq!(config.poll_interval_secs, 2);
    }
}
