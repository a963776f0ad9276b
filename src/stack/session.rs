//! Configuration session
//!
//! A [`ConfigSession`] owns the in-memory copies of a deployment's `.env` and
//! gateway files. Reads and writes only touch memory; nothing reaches the
//! remote server until [`ConfigSession::save`] is called.

use crate::error::{HservError, Result};
use crate::remote::{join_remote, RemoteServer};
use crate::stack::aliases;
use crate::stack::env_file::EnvFile;
use crate::stack::gateway::GatewayConfig;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub const ENV_FILE: &str = ".env";
pub const ENV_TEMPLATE: &str = ".env.example";
pub const GATEWAY_FILE: &[&str] = &["volumes", "api", "kong.yml"];

/// Remote locations of a deployment's configuration files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub env: String,
    pub gateway: String,
    pub env_template: String,
}

impl ConfigPaths {
    /// Paths relative to a deployment root
    pub fn for_root(root: &str) -> Self {
        Self {
            env: join_remote(root, &[ENV_FILE]),
            gateway: join_remote(root, GATEWAY_FILE),
            env_template: join_remote(root, &[ENV_TEMPLATE]),
        }
    }
}

/// Read/write access to one deployment's configuration
pub struct ConfigSession {
    server: Arc<dyn RemoteServer>,
    paths: ConfigPaths,
    env: EnvFile,
    gateway: GatewayConfig,
}

impl fmt::Debug for ConfigSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSession")
            .field("paths", &self.paths)
            .field("entries", &self.env.len())
            .finish_non_exhaustive()
    }
}

fn read_remote(server: &dyn RemoteServer, path: &str) -> Result<String> {
    let mut buffer = Vec::new();
    server.get(path, &mut buffer).map_err(HservError::remote_io)?;
    String::from_utf8(buffer).map_err(|_| HservError::encoding(path))
}

fn write_remote(server: &dyn RemoteServer, contents: &str, path: &str) -> Result<()> {
    server
        .put(&mut contents.as_bytes(), path)
        .map_err(HservError::remote_io)
}

/// Copy the template into place when the deployment has no `.env` yet
fn ensure_env_file(server: &dyn RemoteServer, paths: &ConfigPaths) -> Result<()> {
    if server.exists(&paths.env).map_err(HservError::remote_io)? {
        return Ok(());
    }

    if server
        .exists(&paths.env_template)
        .map_err(HservError::remote_io)?
    {
        info!("Seeding {} from {}", paths.env, paths.env_template);
        server
            .cp(&paths.env_template, &paths.env)
            .map_err(HservError::remote_io)?;
    }

    Ok(())
}

/// Fetch and parse both files without touching any existing state
fn fetch(server: &dyn RemoteServer, paths: &ConfigPaths) -> Result<(EnvFile, GatewayConfig)> {
    let env_text = read_remote(server, &paths.env)?;
    let gateway_text = read_remote(server, &paths.gateway)?;

    let env = EnvFile::parse(&env_text);
    let gateway = GatewayConfig::from_yaml(&gateway_text)?;
    Ok((env, gateway))
}

impl ConfigSession {
    /// Open the configuration of the deployment at `root`.
    ///
    /// Seeds `.env` from `.env.example` when only the template exists, then
    /// loads both files. Remote errors are returned as they occur.
    pub fn initialize(server: Arc<dyn RemoteServer>, root: &str) -> Result<Self> {
        let paths = ConfigPaths::for_root(root);
        debug!("Opening configuration session for {}", root);

        ensure_env_file(server.as_ref(), &paths)?;
        let (env, gateway) = fetch(server.as_ref(), &paths)?;

        Ok(Self {
            server,
            paths,
            env,
            gateway,
        })
    }

    /// Reload both files from the remote server.
    ///
    /// On failure the current in-memory state is kept.
    pub fn load(&mut self) -> Result<()> {
        let (env, gateway) = fetch(self.server.as_ref(), &self.paths)?;
        self.env = env;
        self.gateway = gateway;
        debug!("Reloaded {} and {}", self.paths.env, self.paths.gateway);
        Ok(())
    }

    /// Write both files back to the remote server
    pub fn save(&self) -> Result<()> {
        let env_text = self.env.to_string();
        let gateway_text = self.gateway.to_yaml()?;

        write_remote(self.server.as_ref(), &env_text, &self.paths.env)?;
        write_remote(self.server.as_ref(), &gateway_text, &self.paths.gateway)?;
        info!("Saved {} and {}", self.paths.env, self.paths.gateway);
        Ok(())
    }

    /// Read an option, failing with `UnknownOption` if it is not set
    pub fn get(&self, name: &str) -> Result<String> {
        self.lookup(name)
            .ok_or_else(|| HservError::unknown_option(name))
    }

    /// Read an option, falling back to `default` when it is not set
    pub fn get_or(&self, name: &str, default: Option<&str>) -> Option<String> {
        self.lookup(name).or_else(|| default.map(str::to_string))
    }

    fn lookup(&self, name: &str) -> Option<String> {
        let keys = aliases::resolve(name);
        keys.first()
            .and_then(|key| self.env.extract(key))
            .map(str::to_string)
    }

    /// Set an option on every key it maps to.
    ///
    /// Fails with `UnknownOption` and changes nothing if any of those keys is
    /// missing from the `.env` file.
    pub fn set<V: fmt::Display>(&mut self, name: &str, value: V) -> Result<()> {
        let keys = aliases::resolve(name);
        let value = value.to_string();

        match self.env.replace_all(&keys, &value) {
            Ok(changed) => {
                debug!("Set '{}' ({} line(s) changed)", name, changed);
                Ok(())
            }
            Err(HservError::UnknownOption { .. }) => Err(HservError::unknown_option(name)),
            Err(e) => Err(e),
        }
    }

    pub fn env(&self) -> &EnvFile {
        &self.env
    }

    pub fn gateway(&self) -> &GatewayConfig {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut GatewayConfig {
        &mut self.gateway
    }

    pub fn env_path(&self) -> &str {
        &self.paths.env
    }
}
