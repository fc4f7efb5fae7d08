use super::InspectEnv;
use crate::report::Section;

pub fn gpio(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("gpio", "GPIO");
    s.output("gpio readall", &env.run("gpio", &["readall"]));
    s
}

pub fn i2c(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("i2c", "I2C bus 1");
    s.output("i2cdetect -y 1", &env.run("i2cdetect", &["-y", "1"]));
    s
}

pub fn rtc(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("rtc", "Real-time clock");
    if let Some(name) = env.read("sys/class/rtc/rtc0/name") {
        s.field("Device", name);
    }
    match env.run_privileged("hwclock", &["-r"]).output() {
        Some(time) => s.field("Hardware clock", time.trim()),
        None => s.unavailable("hwclock -r"),
    };
    s
}
