use crate::decode::revision::BoardModel;
use crate::probe::{Capability, Locate};

/// Hardware condition under which a requirement applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    /// Only boards that boot from SPI EEPROM (4B, 400, CM4).
    EepromBoard,
}

impl Condition {
    pub fn holds(&self, model: Option<BoardModel>) -> bool {
        match self {
            Condition::Always => true,
            Condition::EepromBoard => model.is_some_and(|m| m.has_eeprom()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub package: &'static str,
    /// Executable that proves a from-source install when the package
    /// database has no record.
    pub program: Option<&'static str>,
    pub when: Condition,
}

impl Requirement {
    pub fn install_hint(&self) -> String {
        format!("sudo apt install {}", self.package)
    }
}

pub const REQUIRED: &[Requirement] = &[
    Requirement {
        package: "libraspberrypi-bin",
        program: Some("vcgencmd"),
        when: Condition::Always,
    },
    Requirement {
        package: "util-linux",
        program: Some("lsblk"),
        when: Condition::Always,
    },
    Requirement {
        package: "procps",
        program: Some("free"),
        when: Condition::Always,
    },
    Requirement {
        package: "usbutils",
        program: Some("lsusb"),
        when: Condition::Always,
    },
    Requirement {
        package: "iproute2",
        program: Some("ip"),
        when: Condition::Always,
    },
    Requirement {
        package: "rpi-eeprom",
        program: Some("rpi-eeprom-update"),
        when: Condition::EepromBoard,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Supplement {
    pub package: &'static str,
    pub capability: Capability,
}

impl Supplement {
    pub fn program(&self) -> Option<&'static str> {
        first_program(&self.capability.locate)
    }
}

fn first_program(locate: &Locate) -> Option<&'static str> {
    match *locate {
        Locate::OnPath(p) => Some(p),
        Locate::SmokeTest { program, .. } => Some(program),
        Locate::All(members) => members.iter().find_map(first_program),
        Locate::Package(_) | Locate::Process(_) | Locate::DeviceNode(_) => None,
    }
}

pub const WIRINGPI: Capability = Capability::new(
    "wiringpi",
    Locate::SmokeTest {
        program: "gpio",
        args: &["-v"],
        expect: Some("2.52"),
    },
    "install WiringPi 2.52 from https://github.com/WiringPi/WiringPi/releases",
);

pub const I2C: Capability = Capability::new(
    "i2c",
    Locate::All(&[Locate::OnPath("i2cdetect"), Locate::DeviceNode("dev/i2c-1")]),
    "sudo apt install i2c-tools, then enable I2C with raspi-config",
);

pub const RTC: Capability = Capability::new(
    "rtc",
    Locate::All(&[Locate::DeviceNode("dev/rtc0"), Locate::OnPath("hwclock")]),
    "attach an RTC and add its dtoverlay to config.txt",
);

pub const ALSA: Capability = Capability::new(
    "alsa-utils",
    Locate::OnPath("aplay"),
    "sudo apt install alsa-utils",
);

pub const LSHW: Capability = Capability::new(
    "lshw",
    Locate::OnPath("lshw"),
    "sudo apt install lshw",
);

pub const KMSPRINT: Capability = Capability::new(
    "kmsprint",
    Locate::OnPath("kmsprint"),
    "sudo apt install kms++-utils",
);

pub const TVSERVICE: Capability = Capability::new(
    "tvservice",
    Locate::OnPath("tvservice"),
    "sudo apt install libraspberrypi-bin",
);

pub const IWCONFIG: Capability = Capability::new(
    "wireless-tools",
    Locate::OnPath("iwconfig"),
    "sudo apt install wireless-tools",
);

pub const BLUETOOTH: Capability = Capability::new(
    "bluetooth",
    Locate::All(&[Locate::OnPath("bluetoothctl"), Locate::Process("bluetoothd")]),
    "sudo apt install bluez && sudo systemctl start bluetooth",
);

pub const NFS: Capability = Capability::new(
    "nfs",
    Locate::All(&[Locate::OnPath("showmount"), Locate::Process("rpcbind")]),
    "sudo apt install nfs-kernel-server && sudo systemctl start rpcbind",
);

pub const SAMBA: Capability = Capability::new(
    "samba",
    Locate::All(&[Locate::OnPath("testparm"), Locate::Process("smbd")]),
    "sudo apt install samba && sudo systemctl start smbd",
);

pub const SYSTEMD: Capability = Capability::new(
    "systemd",
    Locate::SmokeTest {
        program: "systemctl",
        args: &["--version"],
        expect: None,
    },
    "systemd is not the init system",
);

pub const APT_MARK: Capability = Capability::new(
    "apt-mark",
    Locate::OnPath("apt-mark"),
    "sudo apt install apt",
);

pub const SUPPLEMENTS: &[Supplement] = &[
    Supplement {
        package: "wiringpi",
        capability: WIRINGPI,
    },
    Supplement {
        package: "i2c-tools",
        capability: I2C,
    },
    Supplement {
        package: "alsa-utils",
        capability: ALSA,
    },
    Supplement {
        package: "lshw",
        capability: LSHW,
    },
    Supplement {
        package: "kms++-utils",
        capability: KMSPRINT,
    },
    Supplement {
        package: "wireless-tools",
        capability: IWCONFIG,
    },
    Supplement {
        package: "bluez",
        capability: BLUETOOTH,
    },
    Supplement {
        package: "nfs-kernel-server",
        capability: NFS,
    },
    Supplement {
        package: "samba",
        capability: SAMBA,
    },
];
