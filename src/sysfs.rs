use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Abstraction over the pseudo-filesystems sbcreport reads (`/proc`, `/sys`,
/// `/dev`, `/boot`, `/etc`).
/// Defaults to `/` in production, redirectable to a temp directory for testing.
#[derive(Debug, Clone)]
pub struct SysfsRoot {
    root: PathBuf,
}

impl Default for SysfsRoot {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }
}

impl SysfsRoot {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a path relative to this root.
    /// e.g., `path("proc/cpuinfo")` -> `/proc/cpuinfo` or `<test_root>/proc/cpuinfo`
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn read_optional(&self, relative: impl AsRef<Path>) -> Result<Option<String>> {
        let path = self.path(relative);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Ok(None),
            Err(e) => Err(Error::SysfsRead { path, source: e }),
        }
    }

    /// Read a device-tree property. These are NUL-terminated (and sometimes
    /// NUL-separated) byte strings rather than text lines.
    pub fn read_device_tree(&self, property: &str) -> Option<String> {
        let path = self.path(Path::new("proc/device-tree").join(property));
        let bytes = std::fs::read(path).ok()?;
        let text: String = String::from_utf8_lossy(&bytes)
            .split('\0')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    pub fn list_dir(&self, relative: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = self.path(relative);
        let entries = std::fs::read_dir(&path).map_err(|e| Error::SysfsRead {
            path: path.clone(),
            source: e,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::SysfsRead {
                path: path.clone(),
                source: e,
            })?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.path(relative).exists()
    }

    pub fn cpuinfo_field(&self, key: &str) -> Option<String> {
        let cpuinfo = self.read_optional("proc/cpuinfo").ok()??;
        cpuinfo.lines().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            (k.trim() == key).then(|| v.trim().to_string())
        })
    }
}
