use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated identity a token pair is issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    /// Chosen at login; decides where the client keeps the pair.
    pub remember_me: bool,
}

impl Principal {
    pub fn new(username: impl Into<String>, remember_me: bool) -> Self {
        Principal {
            username: username.into(),
            remember_me,
        }
    }

    pub fn storage(&self) -> StorageLocation {
        StorageLocation::for_remember_me(self.remember_me)
    }
}

/// Client-side storage used for the token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    /// Survives browser restarts.
    Local,
    /// Dropped with the browser session.
    Session,
}

impl StorageLocation {
    pub fn for_remember_me(remember_me: bool) -> Self {
        if remember_me {
            StorageLocation::Local
        } else {
            StorageLocation::Session
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Local => write!(f, "local"),
            StorageLocation::Session => write!(f, "session"),
        }
    }
}
