use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

// New-style revision layout: NOQuuuWuFMMMCCCCPPPPTTTTTTTTRRRR
const ENCODED_FLAG: u32 = 1 << 23;
const WARRANTY_LEGACY: u32 = 1 << 24;
const WARRANTY: u32 = 1 << 25;
const OTP_READ_DISALLOWED: u32 = 1 << 29;
const OTP_PROGRAM_DISALLOWED: u32 = 1 << 30;
const OVERVOLTAGE_DISALLOWED: u32 = 1 << 31;

/// Revision suffix of the 4B rev 1.1 boards whose USB-C port misdetects
/// e-marked cables.
const USB_C_ERRATUM_SUFFIX: &str = "03111";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoardModel {
    A,
    B,
    APlus,
    BPlus,
    TwoB,
    Alpha,
    Cm1,
    ThreeB,
    Zero,
    Cm3,
    ZeroW,
    ThreeBPlus,
    ThreeAPlus,
    Internal,
    Cm3Plus,
    FourB,
    Zero2W,
    Pi400,
    Cm4,
    Cm4S,
    Five,
    Cm5,
    Pi500,
    Cm5Lite,
    Unknown(u8),
}

impl BoardModel {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::A,
            0x01 => Self::B,
            0x02 => Self::APlus,
            0x03 => Self::BPlus,
            0x04 => Self::TwoB,
            0x05 => Self::Alpha,
            0x06 => Self::Cm1,
            0x08 => Self::ThreeB,
            0x09 => Self::Zero,
            0x0a => Self::Cm3,
            0x0c => Self::ZeroW,
            0x0d => Self::ThreeBPlus,
            0x0e => Self::ThreeAPlus,
            0x0f => Self::Internal,
            0x10 => Self::Cm3Plus,
            0x11 => Self::FourB,
            0x12 => Self::Zero2W,
            0x13 => Self::Pi400,
            0x14 => Self::Cm4,
            0x15 => Self::Cm4S,
            0x17 => Self::Five,
            0x18 => Self::Cm5,
            0x19 => Self::Pi500,
            0x1a => Self::Cm5Lite,
            other => Self::Unknown(other),
        }
    }

    pub fn has_eeprom(&self) -> bool {
        matches!(self, Self::FourB | Self::Pi400 | Self::Cm4)
    }
}

impl fmt::Display for BoardModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::A => "A",
            Self::B => "B",
            Self::APlus => "A+",
            Self::BPlus => "B+",
            Self::TwoB => "2B",
            Self::Alpha => "Alpha (early prototype)",
            Self::Cm1 => "CM1",
            Self::ThreeB => "3B",
            Self::Zero => "Zero",
            Self::Cm3 => "CM3",
            Self::ZeroW => "Zero W",
            Self::ThreeBPlus => "3B+",
            Self::ThreeAPlus => "3A+",
            Self::Internal => "Internal use only",
            Self::Cm3Plus => "CM3+",
            Self::FourB => "4B",
            Self::Zero2W => "Zero 2 W",
            Self::Pi400 => "400",
            Self::Cm4 => "CM4",
            Self::Cm4S => "CM4S",
            Self::Five => "5",
            Self::Cm5 => "CM5",
            Self::Pi500 => "500",
            Self::Cm5Lite => "CM5 Lite",
            Self::Unknown(code) => return write!(f, "unknown (0x{:02x})", code),
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Processor {
    Bcm2835,
    Bcm2836,
    Bcm2837,
    Bcm2711,
    Bcm2712,
    Unknown(u8),
}

impl Processor {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Bcm2835,
            1 => Self::Bcm2836,
            2 => Self::Bcm2837,
            3 => Self::Bcm2711,
            4 => Self::Bcm2712,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bcm2835 => f.write_str("BCM2835"),
            Self::Bcm2836 => f.write_str("BCM2836"),
            Self::Bcm2837 => f.write_str("BCM2837"),
            Self::Bcm2711 => f.write_str("BCM2711"),
            Self::Bcm2712 => f.write_str("BCM2712"),
            Self::Unknown(code) => write!(f, "unknown ({})", code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Manufacturer {
    SonyUk,
    Egoman,
    Embest,
    SonyJapan,
    Stadium,
    Unknown(u8),
}

impl Manufacturer {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::SonyUk,
            1 => Self::Egoman,
            2 | 4 => Self::Embest,
            3 => Self::SonyJapan,
            5 => Self::Stadium,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SonyUk => f.write_str("Sony UK"),
            Self::Egoman => f.write_str("Egoman"),
            Self::Embest => f.write_str("Embest"),
            Self::SonyJapan => f.write_str("Sony Japan"),
            Self::Stadium => f.write_str("Stadium"),
            Self::Unknown(code) => write!(f, "unknown ({})", code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemorySize {
    Mb256,
    Mb512,
    Gb1,
    Gb2,
    Gb4,
    Gb8,
    Gb16,
    Unknown(u8),
}

impl MemorySize {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Mb256,
            1 => Self::Mb512,
            2 => Self::Gb1,
            3 => Self::Gb2,
            4 => Self::Gb4,
            5 => Self::Gb8,
            6 => Self::Gb16,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mb256 => f.write_str("256MB"),
            Self::Mb512 => f.write_str("512MB"),
            Self::Gb1 => f.write_str("1GB"),
            Self::Gb2 => f.write_str("2GB"),
            Self::Gb4 => f.write_str("4GB"),
            Self::Gb8 => f.write_str("8GB"),
            Self::Gb16 => f.write_str("16GB"),
            Self::Unknown(code) => write!(f, "unknown ({})", code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HardwareRevision {
    pub raw: u32,
    pub pcb_revision: u8,
    pub model: BoardModel,
    pub processor: Processor,
    pub manufacturer: Manufacturer,
    pub memory: MemorySize,
    /// Bit 25: warranty void (overclocked / overvolted).
    pub warranty_void: bool,
    /// Bit 24: the pre-2017 position of the warranty flag.
    pub warranty_void_legacy: bool,
    pub overvoltage_disallowed: bool,
    pub otp_program_disallowed: bool,
    pub otp_read_disallowed: bool,
}

impl HardwareRevision {
    pub fn pcb_revision_string(&self) -> String {
        format!("1.{}", self.pcb_revision)
    }

    /// One-line advisory for boards with a known hardware defect.
    pub fn erratum(&self) -> Option<&'static str> {
        (self.model == BoardModel::FourB
            && format!("{:x}", self.raw).ends_with(USB_C_ERRATUM_SUFFIX))
        .then_some(
            "Pi 4B rev 1.1: USB-C port may refuse e-marked cables; use a non e-marked (official) power supply",
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum Revision {
    Encoded(HardwareRevision),
    /// Old-style code; reported raw, never field-decoded.
    Legacy { raw: u32 },
}

impl Revision {
    pub fn hardware(&self) -> Option<&HardwareRevision> {
        match self {
            Self::Encoded(hw) => Some(hw),
            Self::Legacy { .. } => None,
        }
    }

    pub fn model(&self) -> Option<BoardModel> {
        self.hardware().map(|hw| hw.model)
    }
}

pub fn decode(raw_hex: &str) -> Result<Revision> {
    let text = raw_hex.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let raw = u32::from_str_radix(digits, 16).map_err(|e| Error::Parse {
        what: "hardware revision".to_string(),
        detail: format!("'{}': {}", text, e),
    })?;
    Ok(decode_value(raw))
}

pub fn decode_value(raw: u32) -> Revision {
    if raw & ENCODED_FLAG == 0 {
        return Revision::Legacy { raw };
    }

    let field = |shift: u32, mask: u32| ((raw >> shift) & mask) as u8;

    Revision::Encoded(HardwareRevision {
        raw,
        pcb_revision: field(0, 0xf),
        model: BoardModel::from_code(field(4, 0xff)),
        processor: Processor::from_code(field(12, 0xf)),
        manufacturer: Manufacturer::from_code(field(16, 0xf)),
        memory: MemorySize::from_code(field(20, 0x7)),
        warranty_void: raw & WARRANTY != 0,
        warranty_void_legacy: raw & WARRANTY_LEGACY != 0,
        overvoltage_disallowed: raw & OVERVOLTAGE_DISALLOWED != 0,
        otp_program_disallowed: raw & OTP_PROGRAM_DISALLOWED != 0,
        otp_read_disallowed: raw & OTP_READ_DISALLOWED != 0,
    })
}
