//! Fixed login credentials
//!
//! Loaded from a JSON file such as `~/.config/deskview/credentials.json`:
//!
//! ```json
//! { "username": "admin", "password": "change-me" }
//! ```

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Credential loading errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read credentials from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Credentials file {0} has an empty username or password")]
    Empty(PathBuf),
    #[error("Configuration directory not found")]
    NoConfigDir,
}

/// Result type for credential operations
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Deserialize)]
struct CredentialsFile {
    username: String,
    password: String,
}

/// The single username/password pair allowed to log in
///
/// Only SHA-256 digests are kept; comparison examines every byte.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password_digest: [u8; 32],
}

impl Credentials {
    /// Create credentials from a plain username and password
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_digest: digest(password),
        }
    }

    /// Default location of the credentials file
    pub fn default_path() -> AuthResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(AuthError::NoConfigDir)?;
        Ok(config_dir.join("deskview").join("credentials.json"))
    }

    /// Load credentials from a JSON file
    pub fn load(path: &Path) -> AuthResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| AuthError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let file: CredentialsFile =
            serde_json::from_str(&contents).map_err(|source| AuthError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if file.username.is_empty() || file.password.is_empty() {
            return Err(AuthError::Empty(path.to_path_buf()));
        }

        info!("Loaded credentials for user '{}' from {:?}", file.username, path);
        Ok(Self::new(file.username, &file.password))
    }

    /// The configured username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Check a login attempt
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(&digest(username), &digest(&self.username));
        let pass_ok = constant_time_eq(&digest(password), &self.password_digest);
        user_ok & pass_ok
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_authenticate() {
        let credentials = Credentials::new("admin", "hunter2");
        assert!(credentials.authenticate("admin", "hunter2"));
        assert!(!credentials.authenticate("admin", "hunter3"));
        assert!(!credentials.authenticate("Admin", "hunter2"));
        assert!(!credentials.authenticate("", ""));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"username":"viewer","password":"pw"}"#).unwrap();

        let credentials = Credentials::load(&path).unwrap();
        assert_eq!(credentials.username(), "viewer");
        assert!(credentials.authenticate("viewer", "pw"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(Credentials::load(&missing), Err(AuthError::Read { .. })));

        let malformed = dir.path().join("malformed.json");
        std::fs::write(&malformed, r#"{"username":"viewer"}"#).unwrap();
        assert!(matches!(Credentials::load(&malformed), Err(AuthError::Parse { .. })));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{"username":"viewer","password":""}"#).unwrap();
        assert!(matches!(Credentials::load(&empty), Err(AuthError::Empty(_))));
    }

    #[test]
    fn test_debug_hides_password() {
        let credentials = Credentials::new("admin", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}
