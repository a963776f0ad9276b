//! Filesystem-backed remote server
//!
//! Serves a deployment that lives on the local machine. Paths can optionally
//! be confined under a root directory, which is how tests sandbox a stack.

use crate::remote::server::RemoteServer;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Remote server backed by the local filesystem
#[derive(Debug, Clone, Default)]
pub struct LocalServer {
    root: Option<PathBuf>,
}

impl LocalServer {
    /// Create a server that uses paths as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a server that resolves every path below `root`
    pub fn rooted<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_file(path: &Path, source: &mut dyn Read) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    io::copy(source, &mut file)?;
    file.sync_all()
}

impl RemoteServer for LocalServer {
    fn exists(&self, path: &str) -> io::Result<bool> {
        Ok(self.resolve(path).exists())
    }

    fn cp(&self, source: &str, dest: &str) -> io::Result<()> {
        let from = self.resolve(source);
        let to = self.resolve(dest);
        debug!("Copying {} to {}", from.display(), to.display());
        ensure_parent(&to)?;
        fs::copy(&from, &to)?;
        Ok(())
    }

    fn get(&self, path: &str, sink: &mut dyn Write) -> io::Result<()> {
        let mut file = fs::File::open(self.resolve(path))?;
        io::copy(&mut file, &mut *sink)?;
        sink.flush()
    }

    fn put(&self, source: &mut dyn Read, path: &str) -> io::Result<()> {
        let target = self.resolve(path);
        ensure_parent(&target)?;

        // Write next to the target and rename so readers never see a partial file
        let mut tmp_name = target.as_os_str().to_owned();
        tmp_name.push(".hserv.tmp");
        let tmp = PathBuf::from(tmp_name);

        if let Err(e) = write_file(&tmp, source) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        fs::rename(&tmp, &target)
    }
}
