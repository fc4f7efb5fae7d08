use super::InspectEnv;
use crate::decode::revision::Revision;
use crate::decode::throttle::{ThrottleStatus, parse_get_throttled};
use crate::report::Section;

pub fn system(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("system", "System");
    let board = &env.ctx.board;

    s.field("Hostname", board.hostname.as_deref().unwrap_or("unknown"));
    s.field("Model", board.model_string.as_deref().unwrap_or("unknown"));

    match env
        .read("etc/os-release")
        .as_deref()
        .and_then(|o| os_release_value(o, "PRETTY_NAME"))
    {
        Some(name) => s.field("OS", name),
        None => s.unavailable("/etc/os-release"),
    };

    let uname = env.run("uname", &["-srvm"]);
    match uname.output() {
        Some(out) => s.field("Kernel", out.trim()),
        None => s.unavailable("uname"),
    };

    if let Some(uptime) = env
        .read("proc/uptime")
        .as_deref()
        .and_then(|u| u.split_whitespace().next())
        .and_then(|secs| secs.parse::<f64>().ok())
    {
        s.field("Uptime", format_uptime(uptime as u64));
    }

    s
}

pub fn revision(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("revision", "Board revision");
    let board = &env.ctx.board;

    let Some(raw) = board.revision_raw.as_deref() else {
        s.unavailable("no Revision line in /proc/cpuinfo");
        return s;
    };
    s.field("Revision code", raw);

    match &board.revision {
        Some(Revision::Encoded(hw)) => {
            s.field("Model", hw.model.to_string());
            s.field("PCB revision", hw.pcb_revision_string());
            s.field("Processor", hw.processor.to_string());
            s.field("Manufacturer", hw.manufacturer.to_string());
            s.field("Memory", hw.memory.to_string());
            s.field("Warranty void", yes_no(hw.warranty_void));
            s.field("Warranty void (old flag)", yes_no(hw.warranty_void_legacy));
            if hw.overvoltage_disallowed {
                s.field("Overvoltage", "disallowed");
            }
            if hw.otp_program_disallowed || hw.otp_read_disallowed {
                s.field(
                    "OTP",
                    format!(
                        "program {}, read {}",
                        allowed(!hw.otp_program_disallowed),
                        allowed(!hw.otp_read_disallowed)
                    ),
                );
            }
            if let Some(advisory) = hw.erratum() {
                s.warning(advisory);
            }
        }
        Some(Revision::Legacy { .. }) => {
            s.text("Old-style revision code, fields not decoded");
        }
        None => {
            s.unavailable(format!("could not parse revision '{}'", raw));
        }
    }

    if let Some(serial) = env.sysfs.cpuinfo_field("Serial") {
        s.field("Serial", serial);
    }
    s
}

pub fn firmware(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("firmware", "Firmware");
    s.output("vcgencmd version", &env.run("vcgencmd", &["version"]));
    s
}

pub fn eeprom(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("eeprom", "Bootloader EEPROM");
    let inv = env.run_privileged("rpi-eeprom-update", &[]);
    // Exit status 1 means "update available", which is still a valid report.
    if inv.status == Some(1) && !inv.stdout.trim().is_empty() {
        s.block(inv.stdout.trim_end());
        s.warning("A bootloader update is available");
    } else {
        s.output("rpi-eeprom-update", &inv);
    }
    s
}

pub fn throttle(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("throttle", "Throttling");
    let inv = env.run("vcgencmd", &["get_throttled"]);

    let Some(word) = inv.output().and_then(parse_get_throttled) else {
        s.output("vcgencmd get_throttled", &inv);
        return s;
    };

    s.field("Status word", format!("0x{:x}", word));
    let status = ThrottleStatus::decode(word);
    if status.is_clean() {
        s.text("No throttling conditions now or since boot");
        return s;
    }

    for (label, now, since_boot) in status.conditions() {
        if now {
            s.warning(format!("{}: active now", label));
        } else if since_boot {
            s.warning(format!("{}: occurred since boot", label));
        } else {
            s.field(label, "no");
        }
    }
    s
}

fn os_release_value(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key).then(|| v.trim().trim_matches('"').to_string())
    })
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn allowed(value: bool) -> &'static str {
    if value { "allowed" } else { "disallowed" }
}
