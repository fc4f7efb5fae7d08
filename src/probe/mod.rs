pub mod packages;

use crate::invoke::Invoker;
use crate::sysfs::SysfsRoot;
use packages::PackageDb;
use serde::Serialize;
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locate {
    /// Executable found in PATH.
    OnPath(&'static str),
    /// Executable found and a read-only invocation exits 0. When `expect` is
    /// set, the reported version must equal it exactly.
    SmokeTest {
        program: &'static str,
        args: &'static [&'static str],
        expect: Option<&'static str>,
    },
    Package(&'static str),
    Process(&'static str),
    DeviceNode(&'static str),
    /// Every member must hold; the first failure decides the result.
    All(&'static [Locate]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub name: &'static str,
    pub locate: Locate,
    /// Shown when the capability is absent, e.g. `sudo apt install i2c-tools`.
    pub hint: &'static str,
}

impl Capability {
    pub const fn new(name: &'static str, locate: Locate, hint: &'static str) -> Self {
        Self { name, locate, hint }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeResult {
    Present,
    Absent,
    /// Installed, but unusable on this system.
    Incompatible { reason: String },
}

impl ProbeResult {
    pub fn is_present(&self) -> bool {
        matches!(self, ProbeResult::Present)
    }
}

pub struct Prober<'a> {
    sysfs: &'a SysfsRoot,
    invoker: &'a dyn Invoker,
    packages: OnceCell<PackageDb>,
    cache: RefCell<HashMap<&'static str, ProbeResult>>,
}

impl<'a> Prober<'a> {
    pub fn new(sysfs: &'a SysfsRoot, invoker: &'a dyn Invoker) -> Self {
        Self {
            sysfs,
            invoker,
            packages: OnceCell::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn packages(&self) -> &PackageDb {
        self.packages.get_or_init(|| PackageDb::query(self.invoker))
    }

    pub fn on_path(&self, program: &str) -> bool {
        self.invoker.locate(program).is_some()
    }

    pub fn probe(&self, capability: &Capability) -> ProbeResult {
        if let Some(cached) = self.cache.borrow().get(capability.name) {
            return cached.clone();
        }

        let result = self.evaluate(&capability.locate);
        tracing::debug!("probe {}: {:?}", capability.name, result);
        self.cache
            .borrow_mut()
            .insert(capability.name, result.clone());
        result
    }

    fn evaluate(&self, locate: &Locate) -> ProbeResult {
        match *locate {
            Locate::OnPath(program) => present_if(self.on_path(program)),
            Locate::SmokeTest {
                program,
                args,
                expect,
            } => self.smoke_test(program, args, expect),
            Locate::Package(name) => present_if(self.packages().contains(name)),
            Locate::Process(name) => present_if(self.process_running(name)),
            Locate::DeviceNode(path) => present_if(self.sysfs.exists(path)),
            Locate::All(members) => members
                .iter()
                .map(|m| self.evaluate(m))
                .find(|r| !r.is_present())
                .unwrap_or(ProbeResult::Present),
        }
    }

    fn smoke_test(
        &self,
        program: &str,
        args: &[&str],
        expect: Option<&str>,
    ) -> ProbeResult {
        if !self.on_path(program) {
            return ProbeResult::Absent;
        }

        let invocation = match self.invoker.invoke(program, args) {
            Ok(inv) => inv,
            Err(e) => {
                return ProbeResult::Incompatible {
                    reason: e.to_string(),
                };
            }
        };

        let command = format!("{} {}", program, args.join(" "));
        if !invocation.success() {
            let detail = invocation
                .first_line()
                .map(str::to_string)
                .unwrap_or_else(|| format!("exit status {:?}", invocation.status));
            return ProbeResult::Incompatible {
                reason: format!("`{}` failed: {}", command.trim(), detail),
            };
        }

        let Some(wanted) = expect else {
            return ProbeResult::Present;
        };
        let reported = reported_version(&invocation.stdout)
            .or_else(|| reported_version(&invocation.stderr));
        if reported == Some(wanted) {
            ProbeResult::Present
        } else {
            ProbeResult::Incompatible {
                reason: format!(
                    "{} reports version {}, this board needs {}",
                    program,
                    reported.unwrap_or("unknown"),
                    wanted
                ),
            }
        }
    }

    pub fn process_running(&self, name: &str) -> bool {
        let Ok(entries) = self.sysfs.list_dir("proc") else {
            return false;
        };
        entries
            .iter()
            .filter(|e| e.chars().all(|c| c.is_ascii_digit()))
            .any(|pid| {
                self.sysfs
                    .read_optional(format!("proc/{}/comm", pid))
                    .ok()
                    .flatten()
                    .is_some_and(|comm| comm == name)
            })
    }
}

/// `gpio version: 2.52` -> `2.52`
fn reported_version(output: &str) -> Option<&str> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once("version")?;
        let token = rest.trim_start_matches(':').split_whitespace().next()?;
        Some(token.trim_start_matches('v'))
    })
}

fn present_if(found: bool) -> ProbeResult {
    if found {
        ProbeResult::Present
    } else {
        ProbeResult::Absent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::{Invocation, ScriptedInvoker};
    use std::fs;

    const GPIO: Capability = Capability::new(
        "wiringpi",
        Locate::SmokeTest {
            program: "gpio",
            args: &["-v"],
            expect: Some("2.52"),
        },
        "sudo apt install wiringpi",
    );

    #[test]
    fn test_on_path() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new().program("lsusb");
        let prober = Prober::new(&sysfs, &inv);

        let lsusb = Capability::new("lsusb", Locate::OnPath("lsusb"), "");
        let lshw = Capability::new("lshw", Locate::OnPath("lshw"), "");
        assert_eq!(prober.probe(&lsusb), ProbeResult::Present);
        assert_eq!(prober.probe(&lshw), ProbeResult::Absent);
    }

    #[test]
    fn test_smoke_test_distinguishes_absent_and_incompatible() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());

        let missing = ScriptedInvoker::new();
        assert_eq!(
            Prober::new(&sysfs, &missing).probe(&GPIO),
            ProbeResult::Absent
        );

        let failing = ScriptedInvoker::new().respond(
            "gpio -v",
            Invocation::failed(1, "Oops - unable to determine board type... model: 17"),
        );
        match Prober::new(&sysfs, &failing).probe(&GPIO) {
            ProbeResult::Incompatible { reason } => {
                assert!(reason.contains("unable to determine board type"))
            }
            other => panic!("expected Incompatible, got {:?}", other),
        }

        let old = ScriptedInvoker::new()
            .respond("gpio -v", Invocation::ok("gpio version: 2.50\n"));
        assert!(matches!(
            Prober::new(&sysfs, &old).probe(&GPIO),
            ProbeResult::Incompatible { .. }
        ));

        let good = ScriptedInvoker::new()
            .respond("gpio -v", Invocation::ok("gpio version: 2.52\n"));
        assert_eq!(Prober::new(&sysfs, &good).probe(&GPIO), ProbeResult::Present);
    }

    #[test]
    fn test_version_must_match_exactly() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());

        for output in [
            "gpio version: 2.520\n",
            "gpio version: 12.52\n",
            "gpio version: 2.5\n",
            "Copyright 2.52\n",
        ] {
            let inv = ScriptedInvoker::new().respond("gpio -v", Invocation::ok(output));
            assert!(
                matches!(
                    Prober::new(&sysfs, &inv).probe(&GPIO),
                    ProbeResult::Incompatible { .. }
                ),
                "{:?} should not match 2.52",
                output
            );
        }
    }

    #[test]
    fn test_reported_version() {
        let out = "gpio version: 2.52\nCopyright (c) 2012-2018 Gordon Henderson\n";
        assert_eq!(reported_version(out), Some("2.52"));
        assert_eq!(reported_version("tool version v1.4 (build 7)"), Some("1.4"));
        assert_eq!(reported_version("no numbers here"), None);
    }

    #[test]
    fn test_results_are_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new()
            .respond("gpio -v", Invocation::ok("gpio version: 2.52"));
        let prober = Prober::new(&sysfs, &inv);

        prober.probe(&GPIO);
        prober.probe(&GPIO);
        assert_eq!(inv.calls_to("gpio"), 1);
    }

    #[test]
    fn test_package_db_queried_once() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new().respond(
            "dpkg-query -W -f ${Package} ${Status}\\n",
            Invocation::ok("i2c-tools install ok installed\n"),
        );
        let prober = Prober::new(&sysfs, &inv);

        let a = Capability::new("i2c-tools", Locate::Package("i2c-tools"), "");
        let b = Capability::new("alsa-utils", Locate::Package("alsa-utils"), "");
        assert!(prober.probe(&a).is_present());
        assert!(!prober.probe(&b).is_present());
        assert_eq!(inv.calls_to("dpkg-query"), 1);
    }

    #[test]
    fn test_process_and_device_node() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        fs::create_dir_all(tmp.path().join("proc/412")).unwrap();
        fs::write(tmp.path().join("proc/412/comm"), "bluetoothd\n").unwrap();
        fs::create_dir_all(tmp.path().join("proc/self")).unwrap();
        fs::create_dir_all(tmp.path().join("dev")).unwrap();
        fs::write(tmp.path().join("dev/rtc0"), "").unwrap();

        let inv = ScriptedInvoker::new();
        let prober = Prober::new(&sysfs, &inv);

        let bt = Capability::new("bluetoothd", Locate::Process("bluetoothd"), "");
        let smbd = Capability::new("smbd", Locate::Process("smbd"), "");
        let rtc = Capability::new("rtc", Locate::DeviceNode("dev/rtc0"), "");
        assert!(prober.probe(&bt).is_present());
        assert!(!prober.probe(&smbd).is_present());
        assert!(prober.probe(&rtc).is_present());
    }

    #[test]
    fn test_composite_first_failure_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new().program("i2cdetect");
        let prober = Prober::new(&sysfs, &inv);

        let i2c = Capability::new(
            "i2c",
            Locate::All(&[Locate::OnPath("i2cdetect"), Locate::DeviceNode("dev/i2c-1")]),
            "",
        );
        assert_eq!(prober.probe(&i2c), ProbeResult::Absent);
    }
}
