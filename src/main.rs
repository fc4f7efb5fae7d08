use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use sbcreport::cli::Cli;
use sbcreport::config::{self, Preferences};
use sbcreport::error::Error;
use sbcreport::invoke::SystemInvoker;
use sbcreport::pipeline::{self, Options};
use sbcreport::sysfs::SysfsRoot;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `--debug` wins over `RUST_LOG`; the default only shows warnings.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("sbcreport=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sbcreport=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if cli.no_color || cli.output.is_some() {
        colored::control::set_override(false);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<Error>() {
                Some(err) if err.is_precondition() || matches!(err, Error::Interrupted) => {
                    let _ = sbcreport::output::write_abort(&mut io::stderr(), err);
                }
                _ => eprintln!("{} {:#}", "error:".red().bold(), e),
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        sbcreport::cli::print_completions(shell);
        return Ok(());
    }

    if cli.list {
        sbcreport::output::write_catalogue(&mut io::stdout(), sbcreport::inspect::CATALOGUE)?;
        return Ok(());
    }

    let config = config::load(cli.config.as_ref());
    let (only, skip) =
        pipeline::selection(&cli.only, &cli.skip, &config.report, Preferences::load());
    let selected = pipeline::select(&only, &skip)?;

    if cli.remember {
        let prefs = Preferences {
            selected: selected.iter().map(|i| i.id.to_string()).collect(),
        };
        let path = prefs.save().context("failed to save preferences")?;
        tracing::info!("saved selection to {}", path.display());
    }

    sbcreport::scratch::install_signal_handlers()?;

    let sysfs = match &cli.root {
        Some(root) => SysfsRoot::new(root),
        None => SysfsRoot::system(),
    };
    let options = Options {
        cpu_sample: config.sampling.cpu_sample(),
        use_sudo: config.privilege.use_sudo,
        ..Options::default()
    };

    let report = pipeline::generate(&sysfs, &SystemInvoker, options, &selected)?;

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut w = BufWriter::new(file);
            write_report(&mut w, &report, cli.json)?;
            w.flush()?;
            eprintln!("Report written to {}", path.display().to_string().cyan());
        }
        None => {
            let mut w = io::stdout().lock();
            write_report(&mut w, &report, cli.json)?;
        }
    }

    Ok(())
}

fn write_report(w: &mut impl Write, report: &sbcreport::report::Report, json: bool) -> io::Result<()> {
    if json {
        sbcreport::output::write_json(w, report)
    } else {
        sbcreport::output::write_text(w, report)
    }
}
