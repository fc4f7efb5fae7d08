use crate::error::Error;
use crate::inspect::Inspection;
use crate::pipeline::preconditions;
use crate::report::{Line, Report, Section, Skipped};
use colored::Colorize;
use std::io::{self, Write};

const LABEL_W: usize = 18;
const DIVIDER_W: usize = 64;

pub fn write_summary(w: &mut impl Write, report: &Report) -> io::Result<()> {
    let s = &report.summary;
    let rows: Vec<(&str, String)> = vec![
        (
            "Host",
            s.hostname.clone().unwrap_or_else(|| "Unknown".to_string()),
        ),
        (
            "Model",
            s.model.clone().unwrap_or_else(|| "Unknown".to_string()),
        ),
        ("Generated", report.generated.clone()),
        (
            "Required",
            format!("{}/{} packages", s.required.0, s.required.1),
        ),
        (
            "Supplemental",
            format!("{}/{} usable", s.supplemental.0, s.supplemental.1),
        ),
    ];

    // Box width from content
    let inner_w = rows
        .iter()
        .map(|(l, v)| l.len().max(LABEL_W) + 2 + v.chars().count())
        .max()
        .unwrap_or(40);

    let title = format!("sbcreport {}", report.version);
    let fill = inner_w.saturating_sub(1 + title.len());
    writeln!(w, "╭─ {} {}╮", title.bold(), "─".repeat(fill))?;

    for (label, value) in &rows {
        let padded = format!("{:<w$}", label, w = LABEL_W);
        let pad = inner_w.saturating_sub(LABEL_W + 2 + value.chars().count());
        writeln!(w, "│ {}  {}{} │", padded.dimmed(), value, " ".repeat(pad))?;
    }

    writeln!(w, "╰{}╯", "─".repeat(inner_w + 2))
}

fn write_divider(w: &mut impl Write, title: &str) -> io::Result<()> {
    let fill = DIVIDER_W.saturating_sub(2 + title.chars().count());
    writeln!(w, "── {} {}", title.bold(), "─".repeat(fill))
}

pub fn write_section(w: &mut impl Write, section: &Section) -> io::Result<()> {
    write_divider(w, section.title)?;
    for line in &section.lines {
        match line {
            Line::Text(text) => writeln!(w, "  {}", text)?,
            Line::Field { label, value } => {
                let padded = format!("{:<w$}", label, w = LABEL_W);
                writeln!(w, "  {}  {}", padded.dimmed(), value)?
            }
            Line::Warning(text) => writeln!(w, "  {} {}", "!".yellow().bold(), text.yellow())?,
            Line::Unavailable(text) => {
                writeln!(w, "  {} {}", "✗".red().bold(), format!("{} (not available)", text).red())?
            }
            Line::Incompatible(text) => {
                writeln!(w, "  {} {}", "!".yellow().bold(), format!("incompatible: {}", text).yellow())?
            }
        }
    }
    writeln!(w)
}

fn write_skipped(w: &mut impl Write, skipped: &[Skipped]) -> io::Result<()> {
    if skipped.is_empty() {
        return Ok(());
    }
    write_divider(w, &format!("Skipped ({})", skipped.len()))?;
    for s in skipped {
        let padded = format!("{:<w$}", s.title, w = LABEL_W);
        writeln!(w, "  {} {}  {}", "-".dimmed(), padded, s.reason.dimmed())?;
    }
    writeln!(w)
}

pub fn write_text(w: &mut impl Write, report: &Report) -> io::Result<()> {
    write_summary(w, report)?;
    writeln!(w)?;
    for section in &report.sections {
        write_section(w, section)?;
    }
    write_skipped(w, &report.skipped)
}

pub fn write_json(w: &mut impl Write, report: &Report) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, report)?;
    writeln!(w)
}

/// Red banner for a run that stopped early, with what to do about it.
pub fn write_abort(w: &mut impl Write, err: &Error) -> io::Result<()> {
    writeln!(w, "{} {}", " ABORTED ".on_red().white().bold(), err.to_string().red())?;
    for line in preconditions::remediation(err) {
        writeln!(w, "  {} {}", "→".cyan(), line)?;
    }
    if let Error::MissingRequirements(missing) = err {
        if missing.len() > 1 {
            let packages: Vec<&str> = missing.iter().map(|m| m.package.as_str()).collect();
            writeln!(w)?;
            writeln!(
                w,
                "  Install all at once: {}",
                format!("sudo apt install {}", packages.join(" ")).cyan()
            )?;
        }
    }
    Ok(())
}

pub fn write_catalogue(w: &mut impl Write, catalogue: &[Inspection]) -> io::Result<()> {
    let id_w = catalogue.iter().map(|i| i.id.len()).max().unwrap_or(8);
    let title_w = catalogue.iter().map(|i| i.title.len()).max().unwrap_or(8);
    for inspection in catalogue {
        let needs: Vec<&str> = inspection.requires.iter().map(|c| c.name).collect();
        let needs = if needs.is_empty() {
            String::new()
        } else {
            format!("needs {}", needs.join(", "))
        };
        writeln!(
            w,
            "  {:<iw$}  {:<tw$}  {}",
            inspection.id.bold(),
            inspection.title,
            needs.dimmed(),
            iw = id_w,
            tw = title_w
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MissingRequirement;
    use crate::report::Summary;

    fn render(report: &Report) -> String {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_text(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample() -> Report {
        let mut report = Report::new(Summary {
            hostname: Some("pi4".to_string()),
            model: Some("Raspberry Pi 4 Model B Rev 1.4".to_string()),
            required: (6, 6),
            supplemental: (3, 9),
        });
        let mut throttle = Section::new("throttle", "Throttling");
        throttle.field("Raw", "0x50005").warning("under-voltage now");
        report.sections.push(throttle);
        let mut gpio = Section::new("gpio", "GPIO");
        gpio.incompatible("wiringpi: gpio -v does not report 2.52");
        report.sections.push(gpio);
        report.skipped.push(Skipped {
            id: "samba",
            title: "Samba shares",
            reason: "missing samba (sudo apt install samba)".to_string(),
        });
        report
    }

    #[test]
    fn test_text_report() {
        let text = render(&sample());
        assert!(text.contains("pi4"));
        assert!(text.contains("6/6 packages"));
        assert!(text.contains("3/9 usable"));
        assert!(text.contains("── Throttling"));
        assert!(text.contains("! under-voltage now"));
        assert!(text.contains("incompatible: wiringpi"));
        assert!(text.contains("Skipped (1)"));
        assert!(text.contains("sudo apt install samba"));
    }

    #[test]
    fn test_skipped_have_no_inline_header() {
        let text = render(&sample());
        assert!(!text.contains("── Samba shares"));
    }

    #[test]
    fn test_json_report() {
        let mut buf = Vec::new();
        write_json(&mut buf, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["summary"]["required"][0], 6);
        assert_eq!(value["sections"][0]["id"], "throttle");
        assert_eq!(value["sections"][0]["lines"][1]["kind"], "warning");
        assert_eq!(value["skipped"][0]["id"], "samba");
    }

    #[test]
    fn test_abort_banner_lists_every_package() {
        colored::control::set_override(false);
        let err = Error::MissingRequirements(vec![
            MissingRequirement {
                package: "usbutils".to_string(),
                install_hint: "sudo apt install usbutils".to_string(),
            },
            MissingRequirement {
                package: "rpi-eeprom".to_string(),
                install_hint: "sudo apt install rpi-eeprom".to_string(),
            },
        ]);
        let mut buf = Vec::new();
        write_abort(&mut buf, &err).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("ABORTED"));
        assert!(text.contains("usbutils is not installed"));
        assert!(text.contains("sudo apt install usbutils rpi-eeprom"));
    }

    #[test]
    fn test_catalogue_listing() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_catalogue(&mut buf, crate::inspect::CATALOGUE).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), crate::inspect::CATALOGUE.len());
        assert!(text.contains("needs wiringpi"));
    }
}
