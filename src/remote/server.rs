//! Remote server trait
//!
//! Every remote interaction goes through [`RemoteServer`]. Implementations own
//! connection handling, timeouts and retries; callers only see blocking calls
//! that either succeed or return the transport's `io::Error`.

use std::io::{self, Read, Write};

/// Trait for remote file transports
pub trait RemoteServer: Send + Sync {
    /// Check whether a file exists at `path`
    fn exists(&self, path: &str) -> io::Result<bool>;

    /// Copy a remote file to another remote path. Fails if `source` is absent.
    fn cp(&self, source: &str, dest: &str) -> io::Result<()>;

    /// Stream the whole remote file at `path` into `sink`
    fn get(&self, path: &str, sink: &mut dyn Write) -> io::Result<()>;

    /// Write everything readable from `source` to `path`, creating or overwriting it
    fn put(&self, source: &mut dyn Read, path: &str) -> io::Result<()>;
}

/// Join remote path segments with `/`, collapsing duplicate separators
pub fn join_remote(root: &str, parts: &[&str]) -> String {
    let mut path = root.trim_end_matches('/').to_string();
    for part in parts {
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        path.push('/');
        path.push_str(part);
    }
    path
}
