use serde::Serialize;

const UNDERVOLTED: u32 = 1 << 0;
const FREQUENCY_CAPPED: u32 = 1 << 1;
const THROTTLED: u32 = 1 << 2;
const SOFT_TEMP_LIMIT: u32 = 1 << 3;
const UNDERVOLTED_SINCE_BOOT: u32 = 1 << 16;
const FREQUENCY_CAPPED_SINCE_BOOT: u32 = 1 << 17;
const THROTTLED_SINCE_BOOT: u32 = 1 << 18;
const SOFT_TEMP_LIMIT_SINCE_BOOT: u32 = 1 << 19;

/// Firmware throttling flags as reported by `vcgencmd get_throttled`.
/// Each field is a single bit; no field implies another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ThrottleStatus {
    pub undervolted: bool,
    pub undervolted_since_boot: bool,
    pub frequency_capped: bool,
    pub frequency_capped_since_boot: bool,
    pub throttled: bool,
    pub throttled_since_boot: bool,
    pub soft_temp_limit: bool,
    pub soft_temp_limit_since_boot: bool,
}

impl ThrottleStatus {
    pub fn decode(word: u32) -> Self {
        Self {
            undervolted: word & UNDERVOLTED != 0,
            undervolted_since_boot: word & UNDERVOLTED_SINCE_BOOT != 0,
            frequency_capped: word & FREQUENCY_CAPPED != 0,
            frequency_capped_since_boot: word & FREQUENCY_CAPPED_SINCE_BOOT != 0,
            throttled: word & THROTTLED != 0,
            throttled_since_boot: word & THROTTLED_SINCE_BOOT != 0,
            soft_temp_limit: word & SOFT_TEMP_LIMIT != 0,
            soft_temp_limit_since_boot: word & SOFT_TEMP_LIMIT_SINCE_BOOT != 0,
        }
    }

    pub fn conditions(&self) -> [(&'static str, bool, bool); 4] {
        [
            ("Under-voltage", self.undervolted, self.undervolted_since_boot),
            (
                "ARM frequency capped",
                self.frequency_capped,
                self.frequency_capped_since_boot,
            ),
            ("Throttled", self.throttled, self.throttled_since_boot),
            (
                "Soft temperature limit",
                self.soft_temp_limit,
                self.soft_temp_limit_since_boot,
            ),
        ]
    }

    pub fn is_clean(&self) -> bool {
        self.conditions().iter().all(|(_, now, ever)| !now && !ever)
    }
}

/// Extract the status word from `throttled=0x50005`.
pub fn parse_get_throttled(output: &str) -> Option<u32> {
    let value = output.trim().strip_prefix("throttled=")?;
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(digits, 16).ok()
}
