//! Remote file store abstraction
//!
//! This module defines the transport used to reach a deployment's files and
//! ships two implementations: a filesystem-backed server and an in-memory one.

pub mod local;
pub mod memory;
pub mod server;

// Re-export commonly used types
pub use local::LocalServer;
pub use memory::{MemoryServer, Operation};
pub use server::{join_remote, RemoteServer};
