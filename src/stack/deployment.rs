//! Project deployments
//!
//! A [`Deployment`] ties a project's local secrets to the Supabase docker
//! directory on the server, and knows how to push those secrets into the
//! stack's configuration.

use crate::error::{HservError, Result};
use crate::remote::{join_remote, RemoteServer};
use crate::stack::jwt::{generate_api_key, ApiRole};
use crate::stack::secrets::ProjectSecrets;
use crate::stack::session::{ConfigSession, ENV_FILE, ENV_TEMPLATE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Which secrets to apply to a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretScope {
    pub jwt: bool,
    pub postgres: bool,
}

impl SecretScope {
    pub fn all() -> Self {
        Self {
            jwt: true,
            postgres: true,
        }
    }
}

/// A project and the stack it deploys
pub struct Deployment {
    project: String,
    project_dir: PathBuf,
    docker_dir: String,
    secrets: ProjectSecrets,
    server: Arc<dyn RemoteServer>,
}

impl Deployment {
    /// Open a project below `base_path`, creating its secrets on first use
    pub fn open(server: Arc<dyn RemoteServer>, base_path: &Path, project: &str) -> Result<Self> {
        let project_dir = if base_path.ends_with(project) {
            base_path.to_path_buf()
        } else {
            base_path.join(project)
        };
        let secrets = ProjectSecrets::load_or_create(&project_dir)?;
        let docker_dir = join_remote(&project_dir.to_string_lossy(), &["supabase", "docker"]);

        Ok(Self {
            project: project.to_string(),
            project_dir,
            docker_dir,
            secrets,
            server,
        })
    }

    /// Use a different remote docker directory
    pub fn with_docker_dir<S: Into<String>>(mut self, docker_dir: S) -> Self {
        self.docker_dir = docker_dir.into();
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn docker_dir(&self) -> &str {
        &self.docker_dir
    }

    pub fn secrets(&self) -> &ProjectSecrets {
        &self.secrets
    }

    /// Whether the stack's docker directory has been put in place
    pub fn is_downloaded(&self) -> Result<bool> {
        for file in [ENV_TEMPLATE, ENV_FILE] {
            let path = join_remote(&self.docker_dir, &[file]);
            if self.server.exists(&path).map_err(HservError::remote_io)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Open a configuration session on the stack
    pub fn session(&self) -> Result<ConfigSession> {
        ConfigSession::initialize(self.server.clone(), &self.docker_dir)
    }

    /// Whether the stack already uses this project's password and JWT secret
    pub fn is_configured(&self, session: &ConfigSession) -> bool {
        session.get_or("postgres_password", None).as_deref()
            == Some(self.secrets.postgres_password.as_str())
            && session.get_or("jwt_secret", None).as_deref() == Some(self.secrets.jwt_secret.as_str())
    }

    /// Sign an API key with the project's JWT secret
    pub fn api_key(&self, role: ApiRole) -> Result<String> {
        generate_api_key(role, &self.secrets.jwt_secret)
    }

    /// Write the project's secrets into the session. The caller saves.
    pub fn apply_secrets(&self, session: &mut ConfigSession, scope: SecretScope) -> Result<()> {
        if scope.postgres {
            session.set("postgres_password", &self.secrets.postgres_password)?;
            session.set("postgres_port", self.secrets.postgres_port)?;
        }

        if scope.jwt {
            let anon = self.api_key(ApiRole::Anon)?;
            let service = self.api_key(ApiRole::ServiceRole)?;

            session.set("jwt_secret", &self.secrets.jwt_secret)?;
            session.set("anon_jwt", &anon)?;
            session.set("service_jwt", &service)?;

            let gateway = session.gateway_mut();
            gateway.set_consumer_key(ApiRole::Anon.as_str(), &anon)?;
            gateway.set_consumer_key(ApiRole::ServiceRole.as_str(), &service)?;
        }

        info!(
            "Applied secrets to project '{}' (jwt: {}, postgres: {})",
            self.project, scope.jwt, scope.postgres
        );
        Ok(())
    }

    /// Make sure the stack uses this project's secrets.
    ///
    /// The stack must already be in place on the server. When it is not yet
    /// configured, every secret is applied and both files are saved. Returns
    /// whether anything was written.
    pub fn ensure_configured(&self) -> Result<bool> {
        if !self.is_downloaded()? {
            return Err(HservError::config(format!(
                "No stack found at {} for project '{}'",
                self.docker_dir, self.project
            )));
        }

        let mut session = self.session()?;
        if self.is_configured(&session) {
            debug!("Project '{}' is already configured", self.project);
            return Ok(false);
        }

        self.apply_secrets(&mut session, SecretScope::all())?;
        session.save()?;
        Ok(true)
    }
}
