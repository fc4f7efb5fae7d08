use super::InspectEnv;
use crate::context::{active_lines, read_config_txt};
use crate::report::Section;

/// Kernel log lines shown at the end of the report.
const DMESG_TAIL: usize = 30;
const BLAME_TOP: usize = 10;

pub fn failed_units(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("systemd-failed", "Failed units");
    s.output_or(
        "systemctl --failed",
        &env.run(
            "systemctl",
            &["--failed", "--no-pager", "--no-legend", "--plain"],
        ),
        "No failed units",
    );
    s
}

pub fn boot_time(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("boot-time", "Boot time");
    s.output("systemd-analyze", &env.run("systemd-analyze", &[]));

    let blame = env.run("systemd-analyze", &["blame", "--no-pager"]);
    match blame.output() {
        Some(out) => {
            for line in out.lines().take(BLAME_TOP) {
                s.text(line.trim());
            }
        }
        None => {
            s.output("systemd-analyze blame", &blame);
        }
    }
    s
}

pub fn packages_held(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("packages-held", "Held packages");
    s.output_or(
        "apt-mark showhold",
        &env.run("apt-mark", &["showhold"]),
        "No packages on hold",
    );
    s
}

pub fn config_txt(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("config-txt", "config.txt");
    match read_config_txt(env.sysfs) {
        Some(config) => {
            for line in active_lines(&config) {
                s.text(line);
            }
            if s.is_empty() {
                s.text("No active settings");
            }
        }
        None => {
            s.unavailable("config.txt not found in /boot/firmware or /boot");
        }
    }
    s
}

pub fn cmdline(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("cmdline", "Kernel command line");
    match env.read("proc/cmdline") {
        Some(cmdline) => s.text(cmdline),
        None => s.unavailable("/proc/cmdline"),
    };
    s
}

pub fn modules(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("modules", "Kernel modules");
    s.output("lsmod", &env.run("lsmod", &[]));
    s
}

pub fn dmesg(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("dmesg", "Kernel log");
    let inv = env.run_privileged("dmesg", &[]);
    let Some(log) = inv.output() else {
        s.output("dmesg", &inv);
        return s;
    };

    let undervoltage = log
        .lines()
        .filter(|l| l.contains("Undervoltage detected") || l.contains("Under-voltage detected"))
        .count();
    if undervoltage > 0 {
        s.warning(format!("{} under-voltage events logged", undervoltage));
    }

    let lines: Vec<&str> = log.lines().collect();
    let start = lines.len().saturating_sub(DMESG_TAIL);
    for line in &lines[start..] {
        s.text(*line);
    }
    s
}
