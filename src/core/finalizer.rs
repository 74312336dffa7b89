// src/core/finalizer.rs

use crate::{
    constants::{BACKEND_OUTPUT_END, BACKEND_OUTPUT_START, FRAMEWORK_ERROR, SUCCESS},
    core::phases::PhaseCatalog,
    models::{ErrorCode, LogCategory, LogEntry, PhaseRank},
    state::{ContextSnapshot, ExecutionContext},
};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// The single structured document written in backend mode.
#[derive(Debug, Serialize)]
struct BackendPayload<'a> {
    output: &'a str,
    object: Option<&'a Value>,
    error_status: i32,
    log: &'a [LogEntry],
    error_log: BTreeMap<&'a str, Vec<&'a str>>,
    context: ContextSnapshot<'a>,
}

/// Runs `body` with the finalizer armed, then marks the run completed.
///
/// The finalizer runs exactly once, whether `body` returns or panics. A panic
/// keeps unwinding after finalization; the returned status is only reached on
/// a normal return.
pub fn run_guarded(
    ctx: &mut ExecutionContext,
    phases: &PhaseCatalog,
    out: &mut dyn Write,
    err: &mut dyn Write,
    body: impl FnOnce(&mut ExecutionContext),
) -> i32 {
    {
        let mut guarded = scopeguard::guard(&mut *ctx, |ctx| {
            finalize(ctx, phases, out, err);
        });
        body(&mut **guarded);
        guarded.mark_completed();
    }
    ctx.finalized().unwrap_or_else(|| exit_status(ctx))
}

/// Closes the run: detects abrupt termination, cleans up an interrupted
/// phase, writes the output the active modes call for, and returns the exit
/// status.
///
/// Only the first call has any effect; later calls return the same status.
pub fn finalize(
    ctx: &mut ExecutionContext,
    phases: &PhaseCatalog,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> i32 {
    // 1. A context is only finalized once.
    if let Some(status) = ctx.finalized() {
        log::debug!("Finalizer already ran; keeping exit status {}.", status);
        return status;
    }

    // 2. Detect abrupt termination and clean up a half-elevated phase.
    if !ctx.is_completed() {
        ctx.set_error(ErrorCode::NotCompleted, t!("error.not_completed"));
    }

    let mut surfaced = Vec::new();
    if let Some(rank) = ctx.bootstrapping() {
        surfaced = cleanup_interrupted_phase(ctx, phases, rank);
    }

    // 3. Decide the status before anything is written.
    let status = exit_status(ctx);
    let modes = ctx.modes();

    // 4. Write what the active modes call for.

    let written = if modes.backend {
        write_backend_payload(ctx, status, out)
    } else {
        let shown = if modes.quiet {
            log::debug!("Quiet mode: discarding {} byte(s) of output.", ctx.output().len());
            Ok(())
        } else {
            out.write_all(ctx.output().as_bytes())
        };
        shown
            .and_then(|()| write_surfaced_messages(&surfaced, err))
            .and_then(|()| write_failure_report(ctx, err))
    };

    // 5. Pipe output is independent of the mode chosen above.
    let written = written.and_then(|()| {
        if modes.pipe && !ctx.pipe_output().is_empty() {
            out.write_all(ctx.pipe_output().as_bytes())
        } else {
            Ok(())
        }
    });

    if let Err(e) = written.and_then(|()| out.flush()) {
        log::warn!("Failed to write final output: {}", e);
    }

    ctx.set_finalized(status);
    status
}

/// `SUCCESS` if and only if no error was recorded.
pub fn exit_status(ctx: &ExecutionContext) -> i32 {
    if ctx.has_error() {
        FRAMEWORK_ERROR
    } else {
        SUCCESS
    }
}

fn cleanup_interrupted_phase(
    ctx: &mut ExecutionContext,
    phases: &PhaseCatalog,
    rank: PhaseRank,
) -> Vec<LogEntry> {
    let phase = phases.name_of(rank);
    log::debug!("Run ended while elevating phase '{}'; cleaning up.", phase);

    let surfaced = ctx.unwind_bootstrap();
    phases.abort(ctx, rank);
    ctx.set_error(
        ErrorCode::BootstrapInterrupted,
        format!(t!("error.bootstrap_interrupted"), phase = phase),
    );
    surfaced
}

fn write_surfaced_messages(entries: &[LogEntry], err: &mut dyn Write) -> io::Result<()> {
    // Errors are part of the failure report already.
    for entry in entries
        .iter()
        .filter(|e| !matches!(e.category, LogCategory::Bootstrap | LogCategory::Error))
    {
        writeln!(err, "{} {}", format!("[{:?}]", entry.category).dimmed(), entry.message)?;
    }
    Ok(())
}

fn write_failure_report(ctx: &ExecutionContext, err: &mut dyn Write) -> io::Result<()> {
    if !ctx.has_error() {
        return Ok(());
    }
    if ctx.errors().iter().any(|e| e.code == ErrorCode::NotCompleted) {
        writeln!(err, "{}", t!("report.not_completed").yellow().bold())?;
    }
    for error in ctx.errors() {
        writeln!(err, "{}: {}", t!("report.error_label").red().bold(), error.message)?;
    }
    Ok(())
}

fn write_backend_payload(ctx: &ExecutionContext, status: i32, out: &mut dyn Write) -> io::Result<()> {
    let mut error_log: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for error in ctx.errors() {
        error_log
            .entry(error.code.as_str())
            .or_default()
            .push(error.message.as_str());
    }

    let payload = BackendPayload {
        output: ctx.output(),
        object: ctx.result(),
        error_status: status,
        log: ctx.log_entries(),
        error_log,
        context: ctx.snapshot(),
    };

    let json = serde_json::to_string(&payload).map_err(io::Error::other)?;
    writeln!(out, "{}{}{}", BACKEND_OUTPUT_START, json, BACKEND_OUTPUT_END)
}
