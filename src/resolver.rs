use crate::capabilities::{Requirement, Supplement};
use crate::decode::revision::BoardModel;
use crate::error::{Error, MissingRequirement, Result};
use crate::probe::{ProbeResult, Prober};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequiredReport {
    pub satisfied: Vec<&'static str>,
    /// Requirements whose hardware condition does not hold on this board.
    pub not_applicable: Vec<&'static str>,
    #[serde(skip)]
    pub missing: Vec<MissingRequirement>,
}

impl RequiredReport {
    pub fn hits(&self) -> usize {
        self.satisfied.len()
    }

    pub fn total(&self) -> usize {
        self.satisfied.len() + self.missing.len()
    }

    /// Fatal when anything is missing; every missing entry is carried.
    pub fn into_result(self) -> Result<Self> {
        if self.missing.is_empty() {
            Ok(self)
        } else {
            Err(Error::MissingRequirements(self.missing))
        }
    }
}

pub fn resolve_required(
    prober: &Prober<'_>,
    requirements: &[Requirement],
    model: Option<BoardModel>,
) -> RequiredReport {
    let mut report = RequiredReport::default();

    for req in requirements {
        if !req.when.holds(model) {
            tracing::debug!("requirement {} does not apply to this board", req.package);
            report.not_applicable.push(req.package);
            continue;
        }

        if installed(prober, req.package, req.program) {
            report.satisfied.push(req.package);
        } else {
            report.missing.push(MissingRequirement {
                package: req.package.to_string(),
                install_hint: req.install_hint(),
            });
        }
    }

    tracing::info!(
        "required packages: {}/{} present",
        report.hits(),
        report.total()
    );
    report
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplementStatus {
    pub package: &'static str,
    pub capability: &'static str,
    pub installed: bool,
    pub result: ProbeResult,
    #[serde(skip)]
    pub hint: &'static str,
}

impl SupplementStatus {
    pub fn usable(&self) -> bool {
        self.installed && self.result.is_present()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SupplementalReport {
    pub entries: Vec<SupplementStatus>,
}

impl SupplementalReport {
    pub fn hits(&self) -> usize {
        self.entries.iter().filter(|e| e.usable()).count()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }
}

/// Check the optional packages. A package only counts when its capability
/// probes as present, so an installed but unusable tool is a miss.
pub fn resolve_supplemental(prober: &Prober<'_>, supplements: &[Supplement]) -> SupplementalReport {
    let entries: Vec<SupplementStatus> = supplements
        .iter()
        .map(|s| {
            let installed = installed(prober, s.package, s.program());
            let result = if installed {
                prober.probe(&s.capability)
            } else {
                ProbeResult::Absent
            };
            SupplementStatus {
                package: s.package,
                capability: s.capability.name,
                installed,
                result,
                hint: s.capability.hint,
            }
        })
        .collect();

    let report = SupplementalReport { entries };
    tracing::info!(
        "supplemental packages: {}/{} usable",
        report.hits(),
        report.total()
    );
    report
}

fn installed(prober: &Prober<'_>, package: &str, program: Option<&str>) -> bool {
    if prober.packages().contains(package) {
        return true;
    }
    match program {
        Some(program) if prober.on_path(program) => {
            tracing::debug!("{} not in package database, found {} on PATH", package, program);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Condition, SUPPLEMENTS, WIRINGPI};
    use crate::invoke::{Invocation, ScriptedInvoker};
    use crate::probe::{Capability, Locate};
    use crate::sysfs::SysfsRoot;

    const DPKG: &str = "dpkg-query -W -f ${Package} ${Status}\\n";

    const REQS: &[Requirement] = &[
        Requirement {
            package: "usbutils",
            program: Some("lsusb"),
            when: Condition::Always,
        },
        Requirement {
            package: "procps",
            program: Some("free"),
            when: Condition::Always,
        },
        Requirement {
            package: "rpi-eeprom",
            program: Some("rpi-eeprom-update"),
            when: Condition::EepromBoard,
        },
    ];

    #[test]
    fn test_all_required_present() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new().respond(
            DPKG,
            Invocation::ok("usbutils install ok installed\nprocps install ok installed\n"),
        );
        let prober = Prober::new(&sysfs, &inv);

        let report = resolve_required(&prober, REQS, Some(BoardModel::ThreeBPlus));
        assert!(report.missing.is_empty());
        assert_eq!(report.not_applicable, vec!["rpi-eeprom"]);
        assert_eq!((report.hits(), report.total()), (2, 2));
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_one_missing_required_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new()
            .respond(DPKG, Invocation::ok("usbutils install ok installed\n"));
        let prober = Prober::new(&sysfs, &inv);

        let report = resolve_required(&prober, REQS, Some(BoardModel::ThreeBPlus));
        match report.into_result() {
            Err(Error::MissingRequirements(missing)) => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].package, "procps");
                assert_eq!(missing[0].install_hint, "sudo apt install procps");
            }
            other => panic!("expected MissingRequirements, got {:?}", other),
        }
    }

    #[test]
    fn test_every_missing_requirement_is_listed() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new().respond(DPKG, Invocation::ok(""));
        let prober = Prober::new(&sysfs, &inv);

        let report = resolve_required(&prober, REQS, Some(BoardModel::FourB));
        let names: Vec<_> = report.missing.iter().map(|m| m.package.as_str()).collect();
        assert_eq!(names, vec!["usbutils", "procps", "rpi-eeprom"]);
    }

    #[test]
    fn test_source_build_falls_back_to_path() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new()
            .respond(DPKG, Invocation::ok("usbutils install ok installed\n"))
            .program("free");
        let prober = Prober::new(&sysfs, &inv);

        let report = resolve_required(&prober, REQS, None);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_prefix_named_package_does_not_satisfy() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new().respond(
            DPKG,
            Invocation::ok("usbutils-extra install ok installed\nprocps install ok installed\n"),
        );
        let prober = Prober::new(&sysfs, &inv);

        let report = resolve_required(&prober, REQS, None);
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].package, "usbutils");
    }

    #[test]
    fn test_installed_but_failing_smoke_test_is_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new()
            .respond(DPKG, Invocation::ok("wiringpi install ok installed\n"))
            .respond(
                "gpio -v",
                Invocation::failed(1, "Oops - unable to determine board type"),
            );
        let prober = Prober::new(&sysfs, &inv);

        let supplements = [Supplement {
            package: "wiringpi",
            capability: WIRINGPI,
        }];
        let report = resolve_supplemental(&prober, &supplements);
        assert_eq!((report.hits(), report.total()), (0, 1));
        assert!(report.entries[0].installed);
        assert!(matches!(
            report.entries[0].result,
            ProbeResult::Incompatible { .. }
        ));
    }

    #[test]
    fn test_supplemental_tally() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new()
            .respond(DPKG, Invocation::ok("lshw install ok installed\n"))
            .program("lshw")
            .program("aplay");
        let prober = Prober::new(&sysfs, &inv);

        let report = resolve_supplemental(&prober, SUPPLEMENTS);
        assert_eq!(report.total(), SUPPLEMENTS.len());
        // lshw from the package database, alsa-utils via PATH fallback.
        assert_eq!(report.hits(), 2);
    }

    #[test]
    fn test_uninstalled_supplement_is_not_probed() {
        let tmp = tempfile::tempdir().unwrap();
        let sysfs = SysfsRoot::new(tmp.path());
        let inv = ScriptedInvoker::new().respond(DPKG, Invocation::ok(""));
        let prober = Prober::new(&sysfs, &inv);

        let probe_only = Capability::new(
            "rpcbind",
            Locate::SmokeTest {
                program: "rpcinfo",
                args: &["-p"],
                expect: None,
            },
            "",
        );
        let report = resolve_supplemental(
            &prober,
            &[Supplement {
                package: "rpcbind",
                capability: probe_only,
            }],
        );
        assert_eq!(report.entries[0].result, ProbeResult::Absent);
        assert_eq!(inv.calls_to("rpcinfo"), 0);
    }
}
