use crate::context::Privilege;
use crate::error::{Error, Result};
use crate::invoke::Invoker;

/// First kernel log line after power-on. If it is gone, the ring buffer has
/// wrapped and early boot messages (under-voltage, firmware) are lost.
pub const BOOT_MARKER: &str = "Booting Linux";

pub fn privilege(invoker: &dyn Invoker, is_root: bool, allow_sudo: bool) -> Result<Privilege> {
    if is_root {
        return Ok(Privilege::Root);
    }
    if allow_sudo && invoker.locate("sudo").is_some() {
        match invoker.invoke("sudo", &["-n", "true"]) {
            Ok(inv) if inv.success() => return Ok(Privilege::Sudo),
            Ok(inv) => tracing::debug!("sudo -n true: {}", inv.stderr.trim()),
            Err(e) => tracing::debug!("sudo -n true: {}", e),
        }
    }
    Err(Error::NoPrivilege)
}

/// The kernel log must still hold the boot marker.
pub fn boot_marker(invoker: &dyn Invoker, privilege: Privilege) -> Result<()> {
    let result = match privilege {
        Privilege::Root => invoker.invoke("dmesg", &[]),
        Privilege::Sudo => invoker.invoke("sudo", &["-n", "dmesg"]),
    };
    match result {
        Ok(inv) if inv.success() && inv.stdout.contains(BOOT_MARKER) => Ok(()),
        Ok(_) => Err(Error::BootMarkerMissing),
        Err(e) => {
            tracing::debug!("dmesg: {}", e);
            Err(Error::BootMarkerMissing)
        }
    }
}

pub fn remediation(err: &Error) -> Vec<String> {
    match err {
        Error::MissingRequirements(missing) => missing
            .iter()
            .map(|m| format!("{} is not installed: {}", m.package, m.install_hint))
            .collect(),
        Error::BootMarkerMissing => vec![
            "The kernel log has wrapped and early boot messages are gone. Reboot, then run sbcreport again."
                .to_string(),
        ],
        Error::NoPrivilege => vec![
            "Run as root (sudo sbcreport), or give this user passwordless sudo.".to_string(),
        ],
        _ => Vec::new(),
    }
}
