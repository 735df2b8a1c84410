use thiserror::Error;

/// Failures surfaced by the identity provider. `InvalidCredentials` and
/// `EmailInUse` are kept distinct so the presentation layer can show a
/// specific message instead of a generic one.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email is already in use")]
    EmailInUse,

    #[error("password is too weak: {0}")]
    WeakPassword(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("identity provider rejected the request: {0}")]
    Provider(String),
}
