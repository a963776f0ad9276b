//! Deployment configuration management
//!
//! This module provides access to a Supabase stack's `.env` file and Kong
//! gateway file, along with the project secrets used to configure them.

pub mod aliases;
pub mod deployment;
pub mod env_file;
pub mod gateway;
pub mod jwt;
pub mod secrets;
pub mod session;

// Re-export commonly used types
pub use deployment::{Deployment, SecretScope};
pub use env_file::EnvFile;
pub use gateway::GatewayConfig;
pub use jwt::{generate_api_key, ApiRole};
pub use secrets::ProjectSecrets;
pub use session::{ConfigPaths, ConfigSession};
