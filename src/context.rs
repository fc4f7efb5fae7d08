use crate::decode::revision::{self, BoardModel, Revision};
use crate::resolver::{RequiredReport, SupplementalReport};
use crate::sysfs::SysfsRoot;
use serde::Serialize;
use std::time::Duration;

pub const CONFIG_TXT_PATHS: &[&str] = &["boot/firmware/config.txt", "boot/config.txt"];

const FIRMWARE_FRAMEBUFFER: &str = "sys/class/graphics/fb0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayDriver {
    Kms,
    /// Firmware KMS (`vc4-fkms-v3d`): DRM on top of the firmware display stack.
    FakeKms,
    Legacy,
    /// No DRM driver and no firmware framebuffer.
    Headless,
}

impl DisplayDriver {
    pub fn detect(sysfs: &SysfsRoot) -> Self {
        if let Some(config) = read_config_txt(sysfs) {
            for line in active_lines(&config) {
                if line.starts_with("dtoverlay=vc4-fkms-v3d") {
                    return Self::FakeKms;
                }
                if line.starts_with("dtoverlay=vc4-kms-v3d") {
                    return Self::Kms;
                }
            }
        }

        let vc4_loaded = sysfs
            .read_optional("proc/modules")
            .unwrap_or(None)
            .is_some_and(|m| m.lines().any(|l| l.split_whitespace().next() == Some("vc4")));
        if vc4_loaded {
            Self::Kms
        } else if sysfs.exists(FIRMWARE_FRAMEBUFFER) {
            Self::Legacy
        } else {
            Self::Headless
        }
    }

    pub fn uses_drm(&self) -> bool {
        matches!(self, Self::Kms | Self::FakeKms)
    }

    pub fn uses_firmware_display(&self) -> bool {
        matches!(self, Self::Legacy | Self::FakeKms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Privilege {
    Root,
    Sudo,
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub hostname: Option<String>,
    pub model_string: Option<String>,
    pub revision_raw: Option<String>,
    pub revision: Option<Revision>,
    pub display: DisplayDriver,
}

impl Board {
    pub fn discover(sysfs: &SysfsRoot) -> Self {
        let revision_raw = sysfs.cpuinfo_field("Revision");
        let revision = revision_raw.as_deref().and_then(|raw| {
            revision::decode(raw)
                .inspect_err(|e| tracing::warn!("{}", e))
                .ok()
        });

        let board = Self {
            hostname: sysfs
                .read_optional("proc/sys/kernel/hostname")
                .unwrap_or(None),
            model_string: sysfs
                .read_device_tree("model")
                .or_else(|| sysfs.cpuinfo_field("Model")),
            revision_raw,
            revision,
            display: DisplayDriver::detect(sysfs),
        };
        tracing::debug!("board: {:?}", board);
        board
    }

    pub fn model(&self) -> Option<BoardModel> {
        self.revision.as_ref().and_then(Revision::model)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemContext {
    pub board: Board,
    pub privilege: Privilege,
    pub required: RequiredReport,
    pub supplemental: SupplementalReport,
    #[serde(skip)]
    pub cpu_sample: Duration,
}

impl SystemContext {
    pub fn model(&self) -> Option<BoardModel> {
        self.board.model()
    }

    pub fn usable(&self, capability: &str) -> bool {
        self.supplemental
            .entries
            .iter()
            .any(|e| e.capability == capability && e.usable())
    }
}

pub fn read_config_txt(sysfs: &SysfsRoot) -> Option<String> {
    CONFIG_TXT_PATHS
        .iter()
        .find_map(|p| sysfs.read_optional(p).unwrap_or(None))
}

pub fn active_lines(config: &str) -> impl Iterator<Item = &str> {
    config
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
}
