use thiserror::Error;

/// Failures surfaced by the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("permission denied for {0}")]
    PermissionDenied(String),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed document at {path}: {detail}")]
    Malformed { path: String, detail: String },
}

impl StoreError {
    pub(crate) fn malformed(path: &str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_string(),
            detail: detail.into(),
        }
    }
}
