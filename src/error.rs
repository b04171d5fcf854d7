pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid email or password")]
    Authentication,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No user is signed in")]
    NotAuthenticated,

    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("Catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The catalog answered with a non-2xx status.
    #[error("Catalog error ({status}): {body}")]
    Catalog { status: u16, body: String },

    #[error("Request superseded by a newer one")]
    Superseded,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Failures a screen should offer to retry.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Catalog { .. })
    }

    /// Failures a form should render inline.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Authentication | Error::Conflict(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}

impl From<password_hash::Error> for Error {
    fn from(e: password_hash::Error) -> Self {
        Error::Internal(e.to_string())
    }
}
