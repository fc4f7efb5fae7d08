use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sbcreport",
    about = "Read-only hardware and software report for Raspberry Pi boards",
    version
)]
pub struct Cli {
    /// Output as JSON instead of formatted text
    #[arg(long)]
    pub json: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Run only these sections (comma separated ids, see --list)
    #[arg(long, value_delimiter = ',', value_name = "ID,...")]
    pub only: Vec<String>,

    /// Never run these sections
    #[arg(long, value_delimiter = ',', value_name = "ID,...")]
    pub skip: Vec<String>,

    /// Save this run's section selection as the default for later runs
    #[arg(long)]
    pub remember: bool,

    /// List every section with its requirements and exit
    #[arg(long)]
    pub list: bool,

    /// Use only this config file, ignoring system and user configs
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Treat PATH as the filesystem root for /proc, /sys, /dev and /boot
    #[arg(long, hide = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Log probe results and every command run to stderr
    #[arg(long)]
    pub debug: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

/// Print shell completions to stdout.
pub fn print_completions(shell: Shell) {
    clap_complete::generate(
        shell,
        &mut Cli::command(),
        "sbcreport",
        &mut std::io::stdout(),
    );
}
