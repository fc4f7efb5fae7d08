use super::InspectEnv;
use crate::report::Section;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn cpu(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("cpu", "CPU");

    if let Some(temp) = env
        .run("vcgencmd", &["measure_temp"])
        .output()
        .and_then(|o| o.trim().strip_prefix("temp=").map(str::to_string))
    {
        s.field("SoC temperature", temp.replace('\'', "°"));
    } else if let Some(milli) = env
        .read("sys/class/thermal/thermal_zone0/temp")
        .and_then(|t| t.parse::<f64>().ok())
    {
        s.field("SoC temperature", format!("{:.1}°C", milli / 1000.0));
    } else {
        s.unavailable("temperature");
    }

    match env
        .run("vcgencmd", &["measure_clock", "arm"])
        .output()
        .and_then(parse_clock_hz)
    {
        Some(hz) => s.field("ARM clock", format!("{} MHz", hz / 1_000_000)),
        None => s.unavailable("vcgencmd measure_clock arm"),
    };

    if let Some(volts) = env
        .run("vcgencmd", &["measure_volts", "core"])
        .output()
        .and_then(|o| o.trim().strip_prefix("volt=").map(str::to_string))
    {
        s.field("Core voltage", volts);
    }

    if let Some(governor) = env.read("sys/devices/system/cpu/cpu0/cpufreq/scaling_governor") {
        s.field("Governor", governor);
    }

    s.output("lscpu", &env.run("lscpu", &[]));
    s
}

pub fn cpu_usage(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("cpu-usage", "CPU utilisation");
    let window = env.ctx.cpu_sample;

    let Some(before) = env.read("proc/stat").as_deref().and_then(CpuTimes::parse) else {
        s.unavailable("/proc/stat");
        return s;
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Sampling CPU for {}s", window.as_secs()));
    spinner.enable_steady_tick(Duration::from_millis(80));
    std::thread::sleep(window);
    spinner.finish_and_clear();

    let after = env.read("proc/stat").as_deref().and_then(CpuTimes::parse);
    match after.and_then(|after| busy_percent(&before, &after)) {
        Some(pct) => s.field(
            format!("Busy over {}s", window.as_secs()),
            format!("{:.1}%", pct),
        ),
        None => s.unavailable("no CPU time elapsed during the sample"),
    };

    if let Some(load) = env.read("proc/loadavg") {
        let fields: Vec<&str> = load.split_whitespace().take(3).collect();
        s.field("Load average", fields.join(" "));
    }
    s
}

pub fn memory(env: &InspectEnv<'_>) -> Section {
    let mut s = Section::new("memory", "Memory");
    for (label, arg) in [("ARM split", "arm"), ("GPU split", "gpu")] {
        if let Some(value) = env
            .run("vcgencmd", &["get_mem", arg])
            .output()
            .and_then(|o| o.split_once('=').map(|(_, v)| v.trim().to_string()))
        {
            s.field(label, value);
        }
    }
    s.output("free", &env.run("free", &["-h"]));
    s
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub total: u64,
    pub idle: u64,
}

impl CpuTimes {
    pub fn parse(stat: &str) -> Option<Self> {
        let line = stat.lines().find(|l| l.starts_with("cpu "))?;
        // guest and guest_nice are already counted in user and nice
        let values: Vec<u64> = line
            .split_whitespace()
            .skip(1)
            .take(8)
            .filter_map(|v| v.parse().ok())
            .collect();
        if values.len() < 4 {
            return None;
        }
        // idle + iowait
        let idle = values[3] + values.get(4).copied().unwrap_or(0);
        Some(Self {
            total: values.iter().sum(),
            idle,
        })
    }
}

pub fn busy_percent(before: &CpuTimes, after: &CpuTimes) -> Option<f64> {
    let total = after.total.checked_sub(before.total)?;
    let idle = after.idle.checked_sub(before.idle)?;
    if total == 0 {
        return None;
    }
    Some(100.0 * total.saturating_sub(idle) as f64 / total as f64)
}

/// `frequency(48)=1500345728` -> 1500345728
fn parse_clock_hz(output: &str) -> Option<u64> {
    output
        .trim()
        .strip_prefix("frequency(")?
        .split_once(")=")?
        .1
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_times_parse() {
        let stat = "cpu  100 0 50 800 50 0 0 0 0 0\ncpu0 25 0 12 200 13 0 0 0 0 0\n";
        let t = CpuTimes::parse(stat).unwrap();
        assert_eq!(t.total, 1000);
        assert_eq!(t.idle, 850);
        assert!(CpuTimes::parse("intr 12345").is_none());
    }

    #[test]
    fn test_cpu_times_ignore_guest_columns() {
        let stat = "cpu  100 0 50 800 50 0 0 0 40 10
";
        let t = CpuTimes::parse(stat).unwrap();
        assert_eq!(t.total, 1000);
    }

    #[test]
    fn test_busy_percent() {
        let a = CpuTimes { total: 1000, idle: 850 };
        let b = CpuTimes { total: 1200, idle: 900 };
        assert_eq!(busy_percent(&a, &b), Some(75.0));
        assert_eq!(busy_percent(&a, &a), None);
        assert_eq!(busy_percent(&b, &a), None);
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock_hz("frequency(48)=1500345728\n"), Some(1_500_345_728));
        assert_eq!(parse_clock_hz("error=1"), None);
        assert_eq!(parse_clock_hz("frequency(48)=bogus"), None);
    }
}
