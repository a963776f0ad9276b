//! hserv - Supabase stack configuration tool
//!
//! Reads and writes the `.env` and Kong gateway configuration of Supabase
//! stacks deployed on a server, using friendly option names and per-project
//! secrets.

pub mod cli;
pub mod config;
pub mod error;
pub mod remote;
pub mod stack;
pub mod utils;

// Re-export commonly used types
pub use error::{HservError, Result};
pub use remote::{LocalServer, MemoryServer, RemoteServer};
pub use stack::{ConfigSession, Deployment, EnvFile, GatewayConfig};
