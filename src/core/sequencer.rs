// src/core/sequencer.rs

use crate::{
    core::{
        dispatcher,
        phases::{PhaseCatalog, PhaseError},
        resolver::CommandResolver,
    },
    models::{CommandDefinition, ErrorCode, RunOutcome, RunResult},
    state::ExecutionContext,
};

/// Drives the phase catalog upwards one phase at a time and dispatches the
/// invoked command at the earliest phase that fully satisfies it.
#[derive(Debug)]
pub struct BootstrapSequencer<'a, R: ?Sized> {
    phases: &'a PhaseCatalog,
    resolver: &'a R,
}

impl<'a, R: CommandResolver + ?Sized> BootstrapSequencer<'a, R> {
    pub fn new(phases: &'a PhaseCatalog, resolver: &'a R) -> Self {
        Self { phases, resolver }
    }

    /// Runs the bootstrap loop.
    ///
    /// After every successful elevation the command is resolved afresh. It is
    /// dispatched only when its requirement is exactly the phase just reached
    /// and nothing was deferred; otherwise it is kept as the last candidate and
    /// the loop climbs on. A failed elevation ends the loop. Failures are only
    /// recorded once it is clear nothing will be dispatched.
    pub fn run(&self, ctx: &mut ExecutionContext) -> RunResult {
        let mut last_candidate: Option<CommandDefinition> = None;
        let mut elevation_failure: Option<PhaseError> = None;

        for descriptor in self.phases.iter() {
            let reached = descriptor.rank();

            if let Err(e) = self.phases.elevate(ctx, reached) {
                log::debug!("Stopping bootstrap: {}", e);
                elevation_failure = Some(e);
                break;
            }

            let Some(command) = self.resolver.resolve(ctx, reached, self.phases) else {
                continue;
            };

            if command.is_dispatchable_at(reached) {
                let value = dispatcher::dispatch(ctx, &command);
                return RunResult {
                    outcome: RunOutcome::Dispatched {
                        command: command.name,
                        phase: reached,
                    },
                    value,
                    halted_at: None,
                };
            }

            log::debug!(
                "Command '{}' needs phase '{}' ({} deferred error(s)); continuing from '{}'.",
                command.name,
                self.phases.name_of(command.bootstrap),
                command.bootstrap_errors.len(),
                descriptor.name()
            );
            last_candidate = Some(command);
        }

        let halted_at = elevation_failure.as_ref().map(PhaseError::rank);
        let outcome = self.report_failure(ctx, last_candidate, elevation_failure);
        RunResult {
            outcome,
            value: None,
            halted_at,
        }
    }

    /// Turns an undispatched run into recorded errors.
    fn report_failure(
        &self,
        ctx: &mut ExecutionContext,
        last_candidate: Option<CommandDefinition>,
        elevation_failure: Option<PhaseError>,
    ) -> RunOutcome {
        let invocation = format!("{} {}", ctx.program_name(), ctx.args().join(" "));
        let invocation = invocation.trim_end().to_string();

        match last_candidate {
            Some(candidate) => {
                // A validation failure of the next phase is usually what the
                // candidate already deferred; anything else is a new cause.
                if let Some(failure) = elevation_failure {
                    let repeats_deferred = matches!(
                        &failure,
                        PhaseError::Validation { errors, .. } if *errors == candidate.bootstrap_errors
                    );
                    if !repeats_deferred {
                        record_elevation_failure(ctx, failure);
                    }
                }
                for error in candidate.bootstrap_errors {
                    ctx.set_error(error.code, error.message);
                }
                ctx.set_error(
                    ErrorCode::CommandNotExecutable,
                    format!(t!("error.command_not_executable"), invocation = invocation),
                );
                RunOutcome::NotExecutable {
                    command: candidate.name,
                }
            }
            None => {
                if let Some(failure) = elevation_failure {
                    record_elevation_failure(ctx, failure);
                }
                if ctx.args().is_empty() {
                    ctx.set_error(ErrorCode::CouldNotExecute, t!("error.could_not_execute"));
                    RunOutcome::CouldNotExecute
                } else {
                    ctx.set_error(
                        ErrorCode::CommandNotFound,
                        format!(t!("error.command_not_found"), invocation = invocation),
                    );
                    RunOutcome::NotFound
                }
            }
        }
    }
}

fn record_elevation_failure(ctx: &mut ExecutionContext, failure: PhaseError) {
    // Validation records are written on their own, so the summary only names the phase.
    let message = match failure {
        PhaseError::Validation { phase, errors, .. } => {
            for error in errors {
                ctx.set_error(error.code, error.message);
            }
            format!(t!("error.phase_not_ready"), phase = phase)
        }
        other => other.to_string(),
    };
    ctx.set_error(
        ErrorCode::BootstrapIncomplete,
        format!(t!("error.bootstrap_incomplete"), reason = message),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phases::tests::{CountingPhase, catalog};
    use crate::core::resolver::{CommandEntry, CommandRegistry};
    use crate::models::{ErrorRecord, PhaseRank};
    use crate::state::OutputModes;
    use serde_json::{Value, json};

    fn status(ctx: &mut ExecutionContext, _args: &[String]) -> anyhow::Result<Value> {
        let calls = ctx.setting("calls").and_then(Value::as_u64).unwrap_or(0);
        ctx.set_setting("calls", calls + 1);
        ctx.print("ok");
        Ok(json!({ "phase": ctx.phase() }))
    }

    fn entry(name: &'static str, bootstrap: u8) -> CommandEntry {
        CommandEntry {
            name,
            aliases: &[],
            bootstrap: PhaseRank(bootstrap),
            available_from: PhaseRank(0),
            description: "",
            handler: status,
        }
    }

    fn context(args: &[&str]) -> ExecutionContext {
        ExecutionContext::new(
            "/bin/ascend",
            args.iter().map(|s| s.to_string()).collect(),
            OutputModes::default(),
        )
    }

    fn codes(ctx: &ExecutionContext) -> Vec<String> {
        ctx.errors().iter().map(|e| e.code.to_string()).collect()
    }

    fn three_phases() -> PhaseCatalog {
        catalog(vec![
            ("p0", CountingPhase::ok("p0")),
            ("p1", CountingPhase::ok("p1")),
            ("p2", CountingPhase::ok("p2")),
        ])
    }

    #[test]
    fn test_dispatches_at_required_phase_and_stops_climbing() {
        let phases = three_phases();
        let registry = CommandRegistry::new([entry("status", 1)]);
        let mut ctx = context(&["status"]);

        let result = BootstrapSequencer::new(&phases, &registry).run(&mut ctx);

        assert_eq!(
            result.outcome,
            RunOutcome::Dispatched {
                command: "status".to_string(),
                phase: PhaseRank(1)
            }
        );
        assert_eq!(result.value, Some(json!({ "phase": 1 })));
        assert_eq!(ctx.setting("calls"), Some(&json!(1)));
        assert_eq!(ctx.setting_str("visits"), Some("p0;p1;"));
        assert!(ctx.setting("p2").is_none());
        assert!(!ctx.has_error());
    }

    #[test]
    fn test_unknown_command_is_not_found() {
        let phases = three_phases();
        let registry = CommandRegistry::new([entry("status", 1)]);
        let mut ctx = context(&["bogus", "x"]);

        let result = BootstrapSequencer::new(&phases, &registry).run(&mut ctx);

        assert_eq!(result.outcome, RunOutcome::NotFound);
        assert_eq!(ctx.setting_str("visits"), Some("p0;p1;p2;"));
        assert_eq!(codes(&ctx), vec!["COMMAND_NOT_FOUND"]);
        assert_eq!(
            ctx.errors()[0].message,
            "The command 'ascend bogus x' could not be found."
        );
    }

    #[test]
    fn test_no_arguments_could_not_execute() {
        let phases = three_phases();
        let registry = CommandRegistry::new([entry("status", 1)]);
        let mut ctx = context(&[]);

        let result = BootstrapSequencer::new(&phases, &registry).run(&mut ctx);

        assert_eq!(result.outcome, RunOutcome::CouldNotExecute);
        assert_eq!(codes(&ctx), vec!["COULD_NOT_EXECUTE"]);
    }

    #[test]
    fn test_elevation_failure_without_candidate_is_bootstrap_incomplete() {
        let phases = catalog(vec![
            ("p0", CountingPhase::ok("p0")),
            ("p1", CountingPhase::ok("p1")),
            ("p2", CountingPhase::failing("p2")),
            ("p3", CountingPhase::ok("p3")),
        ]);
        // Only discoverable once p2 is up, so nothing is seen before the failure.
        let registry = CommandRegistry::new([CommandEntry {
            available_from: PhaseRank(2),
            ..entry("site-cmd", 2)
        }]);
        let mut ctx = context(&["site-cmd"]);

        let result = BootstrapSequencer::new(&phases, &registry).run(&mut ctx);

        assert_eq!(result.halted_at, Some(PhaseRank(2)));
        assert_eq!(result.outcome, RunOutcome::NotFound);
        assert_eq!(codes(&ctx), vec!["BOOTSTRAP_INCOMPLETE", "COMMAND_NOT_FOUND"]);
        assert!(ctx.setting("p3").is_none());
        assert_eq!(ctx.phase(), Some(PhaseRank(1)));
    }

    #[test]
    fn test_elevation_failure_with_candidate_is_not_executable() {
        let phases = catalog(vec![
            ("p0", CountingPhase::ok("p0")),
            ("p1", CountingPhase::ok("p1")),
            ("p2", CountingPhase::failing("p2")),
        ]);
        let registry = CommandRegistry::new([entry("site-cmd", 2)]);
        let mut ctx = context(&["site-cmd"]);

        let result = BootstrapSequencer::new(&phases, &registry).run(&mut ctx);

        assert_eq!(
            result.outcome,
            RunOutcome::NotExecutable {
                command: "site-cmd".to_string()
            }
        );
        assert_eq!(
            codes(&ctx),
            vec!["BOOTSTRAP_INCOMPLETE", "COMMAND_NOT_EXECUTABLE"]
        );
        assert_eq!(ctx.setting("calls"), None);
    }

    #[test]
    fn test_deferred_errors_are_reported_when_nothing_clears_them() {
        let phases = catalog(vec![
            ("p0", CountingPhase::ok("p0")),
            ("p1", CountingPhase::invalid("p1", "SITE_NOT_FOUND")),
        ]);
        let registry = CommandRegistry::new([entry("site-cmd", 1)]);
        let mut ctx = context(&["site-cmd"]);

        let result = BootstrapSequencer::new(&phases, &registry).run(&mut ctx);

        assert!(!result.dispatched());
        assert_eq!(
            ctx.errors(),
            &[
                ErrorRecord::new(ErrorCode::framework("SITE_NOT_FOUND"), "p1 is not ready"),
                ErrorRecord::new(
                    ErrorCode::CommandNotExecutable,
                    "The command 'ascend site-cmd' could not be executed."
                ),
            ]
        );
    }

    /// Resolves a command whose deferred errors only exist at phase 0.
    #[derive(Debug)]
    struct FlakyResolver;

    impl CommandResolver for FlakyResolver {
        fn resolve(
            &self,
            ctx: &ExecutionContext,
            reached: PhaseRank,
            _phases: &PhaseCatalog,
        ) -> Option<CommandDefinition> {
            let bootstrap_errors = if reached == PhaseRank(0) {
                vec![ErrorRecord::new(ErrorCode::framework("NOT_YET"), "wait")]
            } else {
                vec![]
            };
            Some(CommandDefinition {
                name: ctx.command_name()?.to_string(),
                bootstrap: PhaseRank(1),
                handler: status,
                arguments: vec![],
                bootstrap_errors,
            })
        }
    }

    #[test]
    fn test_deferred_errors_are_dropped_when_a_later_phase_succeeds() {
        let phases = three_phases();
        let mut ctx = context(&["status"]);

        let result = BootstrapSequencer::new(&phases, &FlakyResolver).run(&mut ctx);

        assert!(result.dispatched());
        assert!(!ctx.has_error());
    }

    /// Matches at phase 0 only, then stops matching.
    #[derive(Debug)]
    struct VanishingResolver;

    impl CommandResolver for VanishingResolver {
        fn resolve(
            &self,
            _ctx: &ExecutionContext,
            reached: PhaseRank,
            _phases: &PhaseCatalog,
        ) -> Option<CommandDefinition> {
            (reached == PhaseRank(0)).then(|| CommandDefinition {
                name: "ghost".to_string(),
                bootstrap: PhaseRank(2),
                handler: status,
                arguments: vec![],
                bootstrap_errors: vec![ErrorRecord::new(ErrorCode::framework("GONE"), "gone")],
            })
        }
    }

    #[test]
    fn test_last_candidate_survives_phases_that_resolve_nothing() {
        let phases = three_phases();
        let mut ctx = context(&["ghost"]);

        let result = BootstrapSequencer::new(&phases, &VanishingResolver).run(&mut ctx);

        assert_eq!(
            result.outcome,
            RunOutcome::NotExecutable {
                command: "ghost".to_string()
            }
        );
        assert_eq!(codes(&ctx), vec!["GONE", "COMMAND_NOT_EXECUTABLE"]);
    }

    #[test]
    fn test_validation_failure_of_a_phase_is_recorded() {
        let phases = catalog(vec![
            ("p0", CountingPhase::ok("p0")),
            ("p1", CountingPhase::invalid("p1", "NO_ROOT")),
        ]);
        let registry = CommandRegistry::new([entry("status", 0)]);
        let mut ctx = context(&["other"]);

        let result = BootstrapSequencer::new(&phases, &registry).run(&mut ctx);

        assert_eq!(result.halted_at, Some(PhaseRank(1)));
        assert_eq!(
            codes(&ctx),
            vec!["NO_ROOT", "BOOTSTRAP_INCOMPLETE", "COMMAND_NOT_FOUND"]
        );
        assert_eq!(
            ctx.errors()[1].message,
            "Bootstrap incomplete. Phase 'p1' is not ready."
        );
    }

    #[test]
    fn test_failure_below_deferred_phase_is_still_reported() {
        let phases = catalog(vec![
            ("p0", CountingPhase::ok("p0")),
            ("p1", CountingPhase::failing("p1")),
            ("p2", CountingPhase::invalid("p2", "P2_NOT_READY")),
        ]);
        let registry = CommandRegistry::new([entry("site-cmd", 2)]);
        let mut ctx = context(&["site-cmd"]);

        let result = BootstrapSequencer::new(&phases, &registry).run(&mut ctx);

        assert_eq!(result.halted_at, Some(PhaseRank(1)));
        assert_eq!(
            codes(&ctx),
            vec!["BOOTSTRAP_INCOMPLETE", "P2_NOT_READY", "COMMAND_NOT_EXECUTABLE"]
        );
        assert!(ctx.errors()[0].message.contains("p1 is unavailable"));
    }

    #[test]
    fn test_validation_failure_differing_from_deferred_is_reported() {
        let phases = catalog(vec![
            ("p0", CountingPhase::ok("p0")),
            ("p1", CountingPhase::invalid("p1", "P1_NOT_READY")),
            ("p2", CountingPhase::ok("p2")),
        ]);
        let mut ctx = context(&["ghost"]);

        // The only candidate deferred errors unrelated to p1.
        let result = BootstrapSequencer::new(&phases, &VanishingResolver).run(&mut ctx);

        assert_eq!(result.halted_at, Some(PhaseRank(1)));
        assert_eq!(
            codes(&ctx),
            vec!["P1_NOT_READY", "BOOTSTRAP_INCOMPLETE", "GONE", "COMMAND_NOT_EXECUTABLE"]
        );
    }
}
