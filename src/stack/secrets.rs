//! Project secrets
//!
//! Each project keeps the credentials it hands to its stack in a small JSON
//! file next to the deployment. The file is generated on first use.

use crate::error::Result;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the secrets file inside a project directory
pub const SECRETS_FILE: &str = ".config";

const SECRET_LENGTH: usize = 64;

/// Credentials applied to a project's stack
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSecrets {
    pub jwt_secret: String,
    pub postgres_password: String,
    pub postgres_port: u16,
}

impl fmt::Debug for ProjectSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectSecrets")
            .field("jwt_secret", &"<redacted>")
            .field("postgres_password", &"<redacted>")
            .field("postgres_port", &self.postgres_port)
            .finish()
    }
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Ask the OS for a port that is currently free on localhost
fn free_port() -> Result<u16> {
    let listener = TcpListener::bind(("localhost", 0))?;
    Ok(listener.local_addr()?.port())
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // The mode only applies when the file is created
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

impl ProjectSecrets {
    /// Generate fresh random credentials
    pub fn generate() -> Result<Self> {
        Ok(Self {
            jwt_secret: random_token(SECRET_LENGTH),
            postgres_password: random_token(SECRET_LENGTH),
            postgres_port: free_port()?,
        })
    }

    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(SECRETS_FILE)
    }

    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::path(project_dir);
        let contents = std::fs::read_to_string(&path)?;
        let secrets = serde_json::from_str(&contents)?;
        debug!("Loaded project secrets from {}", path.display());
        Ok(secrets)
    }

    /// Write the secrets file, readable by its owner only on unix
    pub fn save(&self, project_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(project_dir)?;
        let contents = serde_json::to_string(self)?;
        write_private(&Self::path(project_dir), contents.as_bytes())?;
        Ok(())
    }

    /// Load the project's secrets, generating and saving them if missing
    pub fn load_or_create(project_dir: &Path) -> Result<Self> {
        if Self::path(project_dir).exists() {
            return Self::load(project_dir);
        }

        let secrets = Self::generate()?;
        secrets.save(project_dir)?;
        info!(
            "Generated project secrets at {}",
            Self::path(project_dir).display()
        );
        Ok(secrets)
    }
}
