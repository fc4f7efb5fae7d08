use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Invocation {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn output(&self) -> Option<&str> {
        let out = self.stdout.trim_end();
        (self.success() && !out.trim().is_empty()).then_some(out)
    }

    pub fn first_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
    }
}

pub trait Invoker {
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run `program` with `args`, stdin closed, capturing output.
    /// Returns an error only when the program could not be started.
    fn invoke(&self, program: &str, args: &[&str]) -> Result<Invocation>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInvoker;

impl Invoker for SystemInvoker {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn invoke(&self, program: &str, args: &[&str]) -> Result<Invocation> {
        tracing::debug!("invoke: {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Invoke {
                program: program.to_string(),
                source,
            })?;

        let invocation = Invocation {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !invocation.success() {
            tracing::debug!(
                "{} exited with {:?}: {}",
                program,
                invocation.status,
                invocation.stderr.trim()
            );
        }
        Ok(invocation)
    }
}

/// Invoker with canned responses, for tests and offline fixtures.
///
/// A program is "installed" once it has been declared with [`program`] or given
/// a response. Installed programs without a scripted response exit 0 with
/// empty output. Every invocation is recorded as `"program arg1 arg2"`.
///
/// [`program`]: ScriptedInvoker::program
#[derive(Debug, Default)]
pub struct ScriptedInvoker {
    installed: HashSet<String>,
    responses: HashMap<String, Invocation>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(mut self, program: &str) -> Self {
        self.installed.insert(program.to_string());
        self
    }

    /// Script the result of `command_line` (program followed by its arguments,
    /// space separated).
    pub fn respond(mut self, command_line: &str, invocation: Invocation) -> Self {
        if let Some(program) = command_line.split_whitespace().next() {
            self.installed.insert(program.to_string());
        }
        self.responses.insert(command_line.to_string(), invocation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(program))
            .count()
    }
}

impl Invoker for ScriptedInvoker {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }

    fn invoke(&self, program: &str, args: &[&str]) -> Result<Invocation> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.borrow_mut().push(line.clone());

        if let Some(invocation) = self.responses.get(&line) {
            return Ok(invocation.clone());
        }
        if self.installed.contains(program) {
            return Ok(Invocation::ok(""));
        }
        Err(Error::Invoke {
            program: program.to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}
