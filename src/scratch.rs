use crate::error::Result;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use tempfile::TempDir;

static INTERRUPTED: LazyLock<Arc<AtomicBool>> = LazyLock::new(|| Arc::new(AtomicBool::new(false)));

/// SIGINT and SIGTERM only raise a flag; the pipeline stops before the next
/// section and [`Scratch`] cleans up as it drops.
pub fn install_signal_handlers() -> Result<()> {
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&INTERRUPTED))?;
    }
    Ok(())
}

pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("sbcreport-").tempdir()?;
        tracing::debug!("scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Return the cached value for `key`, computing and storing it on first
    /// use. `None` results are not cached.
    pub fn cached(&self, key: &str, compute: impl FnOnce() -> Option<String>) -> Option<String> {
        let file = self.dir.path().join(key);
        if let Ok(content) = std::fs::read_to_string(&file) {
            return Some(content);
        }
        let value = compute()?;
        if let Err(e) = std::fs::write(&file, &value) {
            tracing::warn!("could not cache {}: {}", key, e);
        }
        Some(value)
    }
}
