//! In-memory remote server
//!
//! Keeps files in a map and records every call, which makes it suitable for
//! dry runs and for asserting exactly which remote operations happened.

use crate::remote::server::RemoteServer;
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A recorded remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Exists(String),
    Copy { source: String, dest: String },
    Get(String),
    Put(String),
}

/// Remote server holding its files in memory
#[derive(Debug, Default)]
pub struct MemoryServer {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    log: Mutex<Vec<Operation>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("No such remote file: {path}"),
    )
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content
    pub fn with_file<P: Into<String>, B: Into<Vec<u8>>>(self, path: P, content: B) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert<P: Into<String>, B: Into<Vec<u8>>>(&self, path: P, content: B) {
        lock(&self.files).insert(path.into(), content.into());
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.files).remove(path)
    }

    /// Current content of a file, if present
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.files).get(path).cloned()
    }

    /// Current content of a file as text, if present and UTF-8
    pub fn read_string(&self, path: &str) -> Option<String> {
        self.read(path).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Every call made so far, in order
    pub fn operations(&self) -> Vec<Operation> {
        lock(&self.log).clone()
    }

    /// Number of remote copies performed so far
    pub fn copy_count(&self) -> usize {
        lock(&self.log)
            .iter()
            .filter(|op| matches!(op, Operation::Copy { .. }))
            .count()
    }

    pub fn clear_operations(&self) {
        lock(&self.log).clear();
    }

    fn record(&self, op: Operation) {
        lock(&self.log).push(op);
    }
}

impl RemoteServer for MemoryServer {
    fn exists(&self, path: &str) -> io::Result<bool> {
        self.record(Operation::Exists(path.to_string()));
        Ok(lock(&self.files).contains_key(path))
    }

    fn cp(&self, source: &str, dest: &str) -> io::Result<()> {
        self.record(Operation::Copy {
            source: source.to_string(),
            dest: dest.to_string(),
        });
        let mut files = lock(&self.files);
        let content = files.get(source).cloned().ok_or_else(|| not_found(source))?;
        files.insert(dest.to_string(), content);
        Ok(())
    }

    fn get(&self, path: &str, sink: &mut dyn Write) -> io::Result<()> {
        self.record(Operation::Get(path.to_string()));
        let content = self.read(path).ok_or_else(|| not_found(path))?;
        sink.write_all(&content)
    }

    fn put(&self, source: &mut dyn Read, path: &str) -> io::Result<()> {
        self.record(Operation::Put(path.to_string()));
        let mut content = Vec::new();
        source.read_to_end(&mut content)?;
        self.insert(path, content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_records_operation() {
        let server = MemoryServer::new().with_file("/a", "x");
        server.cp("/a", "/b").unwrap();

        assert_eq!(server.read_string("/b"), Some("x".to_string()));
        assert_eq!(server.copy_count(), 1);
        assert_eq!(
            server.operations(),
            vec![Operation::Copy {
                source: "/a".to_string(),
                dest: "/b".to_string()
            }]
        );
    }

    #[test]
    fn test_get_missing_file_fails() {
        let server = MemoryServer::new();
        let mut sink = Vec::new();
        let err = server.get("/nope", &mut sink).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(sink.is_empty());
    }
}
