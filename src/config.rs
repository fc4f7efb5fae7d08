use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level sbcreport configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub report: SelectionConfig,
    pub sampling: SamplingConfig,
    pub privilege: PrivilegeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub skip: Vec<String>,
    pub only: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Window for the CPU utilisation sample, in seconds (1-10).
    pub cpu_sample_secs: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { cpu_sample_secs: 1 }
    }
}

impl SamplingConfig {
    pub const MIN_SECS: u64 = 1;
    pub const MAX_SECS: u64 = 10;

    pub fn cpu_sample(&self) -> Duration {
        Duration::from_secs(self.cpu_sample_secs.clamp(Self::MIN_SECS, Self::MAX_SECS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegeConfig {
    /// Accept passwordless `sudo -n` when not running as root.
    pub use_sudo: bool,
}

impl Default for PrivilegeConfig {
    fn default() -> Self {
        Self { use_sudo: true }
    }
}

/// Per-user section selection saved with `--remember`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub selected: Vec<String>,
}

impl Preferences {
    pub fn path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("sbcreport").join("preferences.toml"))
    }

    pub fn load() -> Option<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content)
            .inspect_err(|e| {
                tracing::warn!("failed to parse preferences at {}: {}", path.display(), e)
            })
            .ok()
    }

    pub fn save(&self) -> crate::error::Result<PathBuf> {
        let path = Self::path()
            .ok_or_else(|| crate::error::Error::Config("no user config directory".to_string()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

const SYSTEM_CONFIG: &str = "/etc/sbcreport/config.toml";

/// Load the system config file if it exists.
fn load_system() -> Option<toml::Value> {
    let path = Path::new(SYSTEM_CONFIG);
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Load the user config file (~/.config/sbcreport/config.toml) if it exists.
fn load_user() -> Option<toml::Value> {
    let dir = dirs::config_dir()?;
    let path = dir.join("sbcreport").join("config.toml");
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Recursively merge two TOML values. Tables are merged key-by-key;
/// all other types in `overlay` replace `base`.
fn merge_values(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load config from a specific path, ignoring system/user files.
fn load_from_path(path: &Path) -> ReportConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("failed to parse config at {}: {}", path.display(), e);
            ReportConfig::default()
        }),
        Err(e) => {
            tracing::warn!("failed to read config at {}: {}", path.display(), e);
            ReportConfig::default()
        }
    }
}

/// Load the merged config: system defaults, then user overrides.
/// If `override_path` is provided, use only that file instead.
pub fn load(override_path: Option<&PathBuf>) -> ReportConfig {
    if let Some(path) = override_path {
        return load_from_path(path);
    }

    let system = load_system();
    let user = load_user();

    let merged = match (system, user) {
        (Some(s), Some(u)) => Some(merge_values(s, u)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    };

    match merged {
        Some(value) => value.try_into().unwrap_or_else(|e| {
            tracing::warn!("failed to deserialize config: {}", e);
            ReportConfig::default()
        }),
        None => ReportConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert!(config.report.skip.is_empty());
        assert!(config.report.only.is_empty());
        assert_eq!(config.sampling.cpu_sample_secs, 1);
        assert!(config.privilege.use_sudo);
    }

    #[test]
    fn test_cpu_sample_is_clamped() {
        let zero = SamplingConfig { cpu_sample_secs: 0 };
        assert_eq!(zero.cpu_sample(), Duration::from_secs(1));
        let long = SamplingConfig {
            cpu_sample_secs: 600,
        };
        assert_eq!(long.cpu_sample(), Duration::from_secs(10));
        let three = SamplingConfig { cpu_sample_secs: 3 };
        assert_eq!(three.cpu_sample(), Duration::from_secs(3));
    }

    #[test]
    fn test_merge_values_tables() {
        let base: toml::Value = toml::from_str(
            r#"
            [report]
            skip = ["lshw"]
            [sampling]
            cpu_sample_secs = 2
        "#,
        )
        .unwrap();

        let overlay: toml::Value = toml::from_str(
            r#"
            [report]
            skip = ["dmesg", "modules"]
        "#,
        )
        .unwrap();

        let merged = merge_values(base, overlay);
        let table = merged.as_table().unwrap();

        // arrays are replaced, not appended
        let report = table["report"].as_table().unwrap();
        assert_eq!(report["skip"].as_array().unwrap().len(), 2);

        // sampling preserved
        let sampling = table["sampling"].as_table().unwrap();
        assert_eq!(sampling["cpu_sample_secs"].as_integer(), Some(2));
    }

    #[test]
    fn test_merge_values_overlay_replaces_scalar() {
        let base: toml::Value = toml::from_str("value = 1").unwrap();
        let overlay: toml::Value = toml::from_str("value = 2").unwrap();
        let merged = merge_values(base, overlay);
        assert_eq!(merged["value"].as_integer(), Some(2));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
            [privilege]
            use_sudo = false
        "#;
        let config: ReportConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.privilege.use_sudo);
        assert_eq!(config.sampling.cpu_sample_secs, 1);
        assert!(config.report.only.is_empty());
    }

    #[test]
    fn test_load_from_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[report]\nonly = [\"throttle\", \"cpu\"]\n[sampling]\ncpu_sample_secs = 4\n",
        )
        .unwrap();
        let config = load(Some(&path));
        assert_eq!(config.report.only, vec!["throttle", "cpu"]);
        assert_eq!(config.sampling.cpu_sample(), Duration::from_secs(4));
    }

    #[test]
    fn test_load_from_nonexistent_path() {
        let config = load_from_path(Path::new("/nonexistent/config.toml"));
        assert!(config.privilege.use_sudo);
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[sampling]\ncpu_sample_secs = \"soon\"\n").unwrap();
        let config = load_from_path(&path);
        assert_eq!(config.sampling.cpu_sample_secs, 1);
    }

    #[test]
    fn test_preferences_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sbcreport").join("preferences.toml");
        let prefs = Preferences {
            selected: vec!["gpio".to_string(), "i2c".to_string()],
        };
        prefs.save_to(&path).unwrap();
        assert_eq!(Preferences::load_from(&path), Some(prefs));
    }

    #[test]
    fn test_preferences_missing_file() {
        assert!(Preferences::load_from(Path::new("/nonexistent/preferences.toml")).is_none());
    }
}
