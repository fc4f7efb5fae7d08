use std::path::PathBuf;

/// A required package that was not found, with the command that installs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingRequirement {
    pub package: String,
    pub install_hint: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("read failed: {path}: {source}")]
    SysfsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error for {what}: {detail}")]
    Parse { what: String, detail: String },

    #[error("failed to run {program}: {source}")]
    Invoke {
        program: String,
        source: std::io::Error,
    },

    #[error("{} required package(s) missing", .0.len())]
    MissingRequirements(Vec<MissingRequirement>),

    #[error("kernel log no longer contains the boot marker")]
    BootMarkerMissing,

    #[error("no root access and sudo is not usable without a password")]
    NoPrivilege,

    #[error("interrupted by signal")]
    Interrupted,

    #[error("pipeline used out of order: {0}")]
    State(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::MissingRequirements(_) | Error::BootMarkerMissing | Error::NoPrivilege
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
