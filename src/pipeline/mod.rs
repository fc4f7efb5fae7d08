pub mod preconditions;

use crate::capabilities::{REQUIRED, SUPPLEMENTS};
use crate::config::{Preferences, SelectionConfig};
use crate::context::{Board, SystemContext};
use crate::error::{Error, Result};
use crate::inspect::{self, InspectEnv, Inspection};
use crate::invoke::Invoker;
use crate::probe::{Capability, ProbeResult, Prober};
use crate::report::{Report, Section, Skipped, Summary};
use crate::resolver::{resolve_required, resolve_supplemental};
use crate::scratch::{self, Scratch};
use crate::sysfs::SysfsRoot;
use std::time::Duration;

/// `NotStarted -> PreconditionsChecked -> Running -> Completed`, with
/// `Aborted` reachable from the middle two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    PreconditionsChecked,
    Running,
    Completed,
    Aborted,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub cpu_sample: Duration,
    pub use_sudo: bool,
    pub is_root: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cpu_sample: Duration::from_secs(1),
            use_sudo: true,
            is_root: nix::unistd::geteuid().is_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Gate {
    Run,
    Incompatible(Vec<String>),
    Skip(String),
}

pub struct Pipeline<'a> {
    sysfs: &'a SysfsRoot,
    invoker: &'a dyn Invoker,
    prober: Prober<'a>,
    options: Options,
    interrupted: fn() -> bool,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(sysfs: &'a SysfsRoot, invoker: &'a dyn Invoker, options: Options) -> Self {
        Self {
            sysfs,
            invoker,
            prober: Prober::new(sysfs, invoker),
            options,
            interrupted: scratch::interrupted,
            state: PipelineState::NotStarted,
        }
    }

    pub fn with_interrupt_check(mut self, check: fn() -> bool) -> Self {
        self.interrupted = check;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Required packages, then privilege, then the boot marker.
    pub fn check_preconditions(&mut self) -> Result<SystemContext> {
        if self.state != PipelineState::NotStarted {
            return Err(Error::State(format!(
                "preconditions checked in state {:?}",
                self.state
            )));
        }

        let outcome = self.build_context();
        self.state = match &outcome {
            Ok(_) => PipelineState::PreconditionsChecked,
            Err(e) => {
                tracing::warn!("aborting: {}", e);
                PipelineState::Aborted
            }
        };
        outcome
    }

    fn build_context(&self) -> Result<SystemContext> {
        let board = Board::discover(self.sysfs);
        let required = resolve_required(&self.prober, REQUIRED, board.model()).into_result()?;

        let privilege =
            preconditions::privilege(self.invoker, self.options.is_root, self.options.use_sudo)?;
        preconditions::boot_marker(self.invoker, privilege)?;

        let supplemental = resolve_supplemental(&self.prober, SUPPLEMENTS);

        Ok(SystemContext {
            board,
            privilege,
            required,
            supplemental,
            cpu_sample: self.options.cpu_sample,
        })
    }

    pub fn run(
        &mut self,
        ctx: &SystemContext,
        selection: &[&'static Inspection],
        scratch: &Scratch,
    ) -> Result<Report> {
        if self.state != PipelineState::PreconditionsChecked {
            return Err(Error::State(format!("run in state {:?}", self.state)));
        }
        self.state = PipelineState::Running;

        let mut report = Report::new(summary(ctx));
        let env = InspectEnv {
            ctx,
            sysfs: self.sysfs,
            invoker: self.invoker,
            scratch,
        };

        for inspection in selection {
            if (self.interrupted)() {
                self.state = PipelineState::Aborted;
                return Err(Error::Interrupted);
            }

            match self.gate(inspection, ctx) {
                Gate::Run => {
                    tracing::debug!("running {}", inspection.id);
                    report.sections.push((inspection.body)(&env));
                }
                Gate::Incompatible(reasons) => {
                    tracing::info!("{} incompatible: {}", inspection.id, reasons.join("; "));
                    let mut section = Section::new(inspection.id, inspection.title);
                    for reason in reasons {
                        section.incompatible(reason);
                    }
                    report.sections.push(section);
                }
                Gate::Skip(reason) => {
                    tracing::debug!("skipping {}: {}", inspection.id, reason);
                    report.skipped.push(Skipped {
                        id: inspection.id,
                        title: inspection.title,
                        reason,
                    });
                }
            }
        }

        self.state = PipelineState::Completed;
        Ok(report)
    }

    fn gate(&self, inspection: &Inspection, ctx: &SystemContext) -> Gate {
        if !(inspection.applies)(ctx) {
            return Gate::Skip("not applicable to this board".to_string());
        }

        let mut incompatible = Vec::new();
        for capability in inspection.requires {
            match self.capability_state(capability, ctx) {
                ProbeResult::Present => {}
                ProbeResult::Absent => {
                    return Gate::Skip(format!("missing {} ({})", capability.name, capability.hint));
                }
                ProbeResult::Incompatible { reason } => {
                    incompatible.push(format!("{}: {}", capability.name, reason));
                }
            }
        }

        if incompatible.is_empty() {
            Gate::Run
        } else {
            Gate::Incompatible(incompatible)
        }
    }

    /// Supplemental packages were resolved with the context; reuse that
    /// verdict so an uninstalled package is never probed.
    fn capability_state(&self, capability: &Capability, ctx: &SystemContext) -> ProbeResult {
        ctx.supplemental
            .entries
            .iter()
            .find(|e| e.capability == capability.name)
            .map(|e| e.result.clone())
            .unwrap_or_else(|| self.prober.probe(capability))
    }
}

fn summary(ctx: &SystemContext) -> Summary {
    Summary {
        hostname: ctx.board.hostname.clone(),
        model: ctx.board.model_string.clone(),
        required: (ctx.required.hits(), ctx.required.total()),
        supplemental: (ctx.supplemental.hits(), ctx.supplemental.total()),
    }
}

/// Combine command-line, saved and configured selections into `(only, skip)`.
///
/// `--only` wins over saved preferences, which win over `report.only`. Any
/// selection flag disables the saved preferences. Skips from config and
/// flags always apply.
pub fn selection(
    only_flag: &[String],
    skip_flag: &[String],
    config: &SelectionConfig,
    prefs: Option<Preferences>,
) -> (Vec<String>, Vec<String>) {
    let flags_given = !only_flag.is_empty() || !skip_flag.is_empty();
    let saved = prefs
        .filter(|_| !flags_given)
        .map(|p| known_ids(p.selected))
        .filter(|ids| !ids.is_empty());

    let only = if !only_flag.is_empty() {
        only_flag.to_vec()
    } else if let Some(saved) = saved {
        saved
    } else {
        config.only.clone()
    };

    let mut skip = config.skip.clone();
    skip.extend(skip_flag.iter().cloned());
    (only, skip)
}

fn known_ids(ids: Vec<String>) -> Vec<String> {
    ids.into_iter()
        .filter(|id| {
            let known = inspect::find(id).is_some();
            if !known {
                tracing::warn!("ignoring saved section '{}': no longer exists", id);
            }
            known
        })
        .collect()
}

pub fn select(only: &[String], skip: &[String]) -> Result<Vec<&'static Inspection>> {
    for id in only.iter().chain(skip) {
        if inspect::find(id).is_none() {
            return Err(Error::Config(format!("unknown section '{}'", id)));
        }
    }

    Ok(inspect::CATALOGUE
        .iter()
        .filter(|i| only.is_empty() || only.iter().any(|o| o == i.id))
        .filter(|i| !skip.iter().any(|s| s == i.id))
        .collect())
}

pub fn generate(
    sysfs: &SysfsRoot,
    invoker: &dyn Invoker,
    options: Options,
    selection: &[&'static Inspection],
) -> Result<Report> {
    let mut pipeline = Pipeline::new(sysfs, invoker, options);
    let ctx = pipeline.check_preconditions()?;
    let scratch = Scratch::new()?;
    pipeline.run(&ctx, selection, &scratch)
}
