//! The ordered stage plan.
//!
//! The plan is plain data: the orchestrator walks it front to back, skips a
//! stage whose predicate is false, and applies the stage's failure policy
//! when its generator fails.

use std::fmt;

use codegen::StageKind;
use config::RunContext;

/// What a stage failure does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Return the error immediately
    Abort,
    /// Remember the error, keep running, and return it at the end
    Defer,
}

/// One entry of the plan
#[derive(Clone, Copy)]
pub struct Stage {
    /// Which generator runs
    pub kind: StageKind,
    /// Whether the stage applies to a run
    pub predicate: fn(&RunContext) -> bool,
    /// Failure policy
    pub on_failure: OnFailure,
}

impl Stage {
    fn always(kind: StageKind) -> Self { Self { kind, predicate: |_| true, on_failure: OnFailure::Abort } }

    /// Whether this stage runs for `ctx`
    pub fn applies(&self, ctx: &RunContext) -> bool { (self.predicate)(ctx) }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage").field("kind", &self.kind).field("on_failure", &self.on_failure).finish()
    }
}

/// The stages of a run, in execution order
///
/// The eight core stages always run. The call stage defers its failure unless
/// `strict_call_stage` is set, so the build files that follow are still
/// written. Makefile and Dockerfile only run when requested.
pub fn stage_plan(strict_call_stage: bool) -> Vec<Stage> {
    vec![
        Stage::always(StageKind::Etc),
        Stage::always(StageKind::Pb),
        Stage::always(StageKind::Config),
        Stage::always(StageKind::Svc),
        Stage::always(StageKind::Logic),
        Stage::always(StageKind::Server),
        Stage::always(StageKind::Main),
        Stage {
            kind: StageKind::Call,
            predicate: |_| true,
            on_failure: if strict_call_stage { OnFailure::Abort } else { OnFailure::Defer },
        },
        Stage { kind: StageKind::Makefile, predicate: |ctx| ctx.make_file, on_failure: OnFailure::Abort },
        Stage { kind: StageKind::Dockerfile, predicate: |ctx| ctx.docker_file, on_failure: OnFailure::Abort },
    ]
}
