use crate::invoke::Invoker;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct PackageDb {
    installed: HashSet<String>,
}

impl PackageDb {
    /// Query the package manager once. Never fails; an unusable database is
    /// an empty one.
    pub fn query(invoker: &dyn Invoker) -> Self {
        match invoker.invoke("dpkg-query", &["-W", "-f", "${Package} ${Status}\\n"]) {
            Ok(inv) if inv.success() => {
                let db = Self::parse(&inv.stdout);
                tracing::debug!("package database: {} installed", db.installed.len());
                db
            }
            Ok(inv) => {
                tracing::debug!("dpkg-query failed: {}", inv.stderr.trim());
                Self::default()
            }
            Err(e) => {
                tracing::debug!("package database unavailable: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(listing: &str) -> Self {
        let installed = listing
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let name = parts.next()?;
                let state = parts.last()?;
                (state == "installed").then(|| name.to_string())
            })
            .collect();
        Self { installed }
    }

    pub fn contains(&self, package: &str) -> bool {
        self.installed.contains(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::{Invocation, ScriptedInvoker};

    const LISTING: &str = "\
alsa-utils install ok installed
i2c-tools install ok installed
wiringpi deinstall ok config-files
libraspberrypi-bin install ok installed
";

    #[test]
    fn test_parse_keeps_installed_only() {
        let db = PackageDb::parse(LISTING);
        assert!(db.contains("alsa-utils"));
        assert!(db.contains("libraspberrypi-bin"));
        assert!(!db.contains("wiringpi"));
        assert!(db.contains("i2c-tools"));
    }

    #[test]
    fn test_contains_is_exact() {
        let db = PackageDb::parse(LISTING);
        assert!(!db.contains("alsa"));
        assert!(!db.contains("i2c-tools-extra"));
    }

    #[test]
    fn test_query_without_dpkg() {
        let db = PackageDb::query(&ScriptedInvoker::new());
        assert!(!db.contains("alsa-utils"));
    }

    #[test]
    fn test_query_parses_output() {
        let inv = ScriptedInvoker::new().respond(
            "dpkg-query -W -f ${Package} ${Status}\\n",
            Invocation::ok(LISTING),
        );
        let db = PackageDb::query(&inv);
        assert!(db.contains("i2c-tools"));
        assert!(!db.contains("wiringpi"));
    }
}
