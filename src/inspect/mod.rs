pub mod board;
pub mod io;
pub mod media;
pub mod network;
pub mod processor;
pub mod storage;
pub mod system;

use crate::capabilities as caps;
use crate::context::{Privilege, SystemContext};
use crate::invoke::{Invocation, Invoker};
use crate::probe::Capability;
use crate::report::Section;
use crate::scratch::Scratch;
use crate::sysfs::SysfsRoot;

pub struct Inspection {
    /// Stable key for `--only` / `--skip`.
    pub id: &'static str,
    pub title: &'static str,
    /// Every capability must probe as present.
    pub requires: &'static [Capability],
    /// Board/context predicate, checked before `requires`.
    pub applies: fn(&SystemContext) -> bool,
    pub body: fn(&InspectEnv<'_>) -> Section,
}

impl std::fmt::Debug for Inspection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspection")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

pub struct InspectEnv<'a> {
    pub ctx: &'a SystemContext,
    pub sysfs: &'a SysfsRoot,
    pub invoker: &'a dyn Invoker,
    pub scratch: &'a Scratch,
}

impl InspectEnv<'_> {
    pub fn run(&self, program: &str, args: &[&str]) -> Invocation {
        self.invoker
            .invoke(program, args)
            .unwrap_or_else(|e| Invocation {
                status: None,
                stdout: String::new(),
                stderr: e.to_string(),
            })
    }

    pub fn run_privileged(&self, program: &str, args: &[&str]) -> Invocation {
        match self.ctx.privilege {
            Privilege::Root => self.run(program, args),
            Privilege::Sudo => {
                let mut sudo_args = vec!["-n", program];
                sudo_args.extend_from_slice(args);
                self.run("sudo", &sudo_args)
            }
        }
    }

    pub fn read(&self, relative: &str) -> Option<String> {
        self.sysfs.read_optional(relative).unwrap_or(None)
    }

    pub fn lshw_short(&self) -> Option<String> {
        if !self.ctx.usable(caps::LSHW.name) {
            return None;
        }
        self.scratch.cached("lshw-short", || {
            self.run_privileged("lshw", &["-short", "-quiet", "-sanitize"])
                .output()
                .map(str::to_string)
        })
    }

    pub fn lshw_class(&self, class: &str) -> Vec<String> {
        self.lshw_short()
            .map(|listing| lshw_rows(&listing, class))
            .unwrap_or_default()
    }
}

/// Rows of an `lshw -short` listing whose Class column equals `class`.
/// Column bounds come from the header line.
pub fn lshw_rows(listing: &str, class: &str) -> Vec<String> {
    let mut lines = listing.lines();
    let Some((start, end)) = lines.by_ref().find_map(|header| {
        Some((header.find("Class")?, header.find("Description")?))
    }) else {
        return Vec::new();
    };

    lines
        .filter(|line| !line.starts_with("==="))
        .filter(|line| {
            line.get(start..end.min(line.len()))
                .is_some_and(|column| column.trim() == class)
        })
        .map(|line| line.trim_end().to_string())
        .collect()
}

fn always(_: &SystemContext) -> bool {
    true
}

fn eeprom_board(ctx: &SystemContext) -> bool {
    ctx.model().is_some_and(|m| m.has_eeprom())
}

fn drm_display(ctx: &SystemContext) -> bool {
    ctx.board.display.uses_drm()
}

fn firmware_display(ctx: &SystemContext) -> bool {
    ctx.board.display.uses_firmware_display()
}

pub const CATALOGUE: &[Inspection] = &[
    Inspection {
        id: "system",
        title: "System",
        requires: &[],
        applies: always,
        body: board::system,
    },
    Inspection {
        id: "revision",
        title: "Board revision",
        requires: &[],
        applies: always,
        body: board::revision,
    },
    Inspection {
        id: "firmware",
        title: "Firmware",
        requires: &[],
        applies: always,
        body: board::firmware,
    },
    Inspection {
        id: "eeprom",
        title: "Bootloader EEPROM",
        requires: &[],
        applies: eeprom_board,
        body: board::eeprom,
    },
    Inspection {
        id: "throttle",
        title: "Throttling",
        requires: &[],
        applies: always,
        body: board::throttle,
    },
    Inspection {
        id: "cpu",
        title: "CPU",
        requires: &[],
        applies: always,
        body: processor::cpu,
    },
    Inspection {
        id: "cpu-usage",
        title: "CPU utilisation",
        requires: &[],
        applies: always,
        body: processor::cpu_usage,
    },
    Inspection {
        id: "memory",
        title: "Memory",
        requires: &[],
        applies: always,
        body: processor::memory,
    },
    Inspection {
        id: "storage",
        title: "Storage",
        requires: &[],
        applies: always,
        body: storage::storage,
    },
    Inspection {
        id: "usb",
        title: "USB",
        requires: &[],
        applies: always,
        body: storage::usb,
    },
    Inspection {
        id: "lshw",
        title: "Hardware list",
        requires: &[caps::LSHW],
        applies: always,
        body: storage::lshw,
    },
    Inspection {
        id: "audio",
        title: "Audio",
        requires: &[caps::ALSA],
        applies: always,
        body: media::audio,
    },
    Inspection {
        id: "video-kms",
        title: "Video (KMS)",
        requires: &[caps::KMSPRINT],
        applies: drm_display,
        body: media::video_kms,
    },
    Inspection {
        id: "video-legacy",
        title: "Video (firmware)",
        requires: &[caps::TVSERVICE],
        applies: firmware_display,
        body: media::video_legacy,
    },
    Inspection {
        id: "gpio",
        title: "GPIO",
        requires: &[caps::WIRINGPI],
        applies: always,
        body: io::gpio,
    },
    Inspection {
        id: "i2c",
        title: "I2C bus 1",
        requires: &[caps::I2C],
        applies: always,
        body: io::i2c,
    },
    Inspection {
        id: "rtc",
        title: "Real-time clock",
        requires: &[caps::RTC],
        applies: always,
        body: io::rtc,
    },
    Inspection {
        id: "network",
        title: "Network",
        requires: &[],
        applies: always,
        body: network::network,
    },
    Inspection {
        id: "wifi",
        title: "Wireless",
        requires: &[caps::IWCONFIG],
        applies: always,
        body: network::wifi,
    },
    Inspection {
        id: "bluetooth",
        title: "Bluetooth",
        requires: &[caps::BLUETOOTH],
        applies: always,
        body: network::bluetooth,
    },
    Inspection {
        id: "nfs",
        title: "NFS exports",
        requires: &[caps::NFS],
        applies: always,
        body: network::nfs,
    },
    Inspection {
        id: "samba",
        title: "Samba shares",
        requires: &[caps::SAMBA],
        applies: always,
        body: network::samba,
    },
    Inspection {
        id: "systemd-failed",
        title: "Failed units",
        requires: &[caps::SYSTEMD],
        applies: always,
        body: system::failed_units,
    },
    Inspection {
        id: "boot-time",
        title: "Boot time",
        requires: &[caps::SYSTEMD],
        applies: always,
        body: system::boot_time,
    },
    Inspection {
        id: "packages-held",
        title: "Held packages",
        requires: &[caps::APT_MARK],
        applies: always,
        body: system::packages_held,
    },
    Inspection {
        id: "config-txt",
        title: "config.txt",
        requires: &[],
        applies: always,
        body: system::config_txt,
    },
    Inspection {
        id: "cmdline",
        title: "Kernel command line",
        requires: &[],
        applies: always,
        body: system::cmdline,
    },
    Inspection {
        id: "modules",
        title: "Kernel modules",
        requires: &[],
        applies: always,
        body: system::modules,
    },
    Inspection {
        id: "dmesg",
        title: "Kernel log",
        requires: &[],
        applies: always,
        body: system::dmesg,
    },
];

pub fn find(id: &str) -> Option<&'static Inspection> {
    CATALOGUE.iter().find(|i| i.id == id)
}
