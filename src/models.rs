// src/models.rs

use crate::state::ExecutionContext;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

// --- PHASES ---

/// The rank of a bootstrap phase. Ranks are compared numerically and the
/// sequencer only ever moves from a lower rank to a higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PhaseRank(pub u8);

impl PhaseRank {
    /// The rank every catalog is expected to start from.
    pub const LOWEST: Self = Self(0);
}

impl fmt::Display for PhaseRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- ERRORS ---

/// The error taxonomy recorded in the execution context.
///
/// The engine's own failures have dedicated variants; codes reported by phases
/// and command handlers travel as `Framework`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No command matched the invoked name at any reachable phase.
    CommandNotFound,
    /// A command matched, but the phases it requires could not be validated.
    CommandNotExecutable,
    /// A phase elevation failed.
    BootstrapIncomplete,
    /// Termination happened while a phase was still being elevated.
    BootstrapInterrupted,
    /// The run never reached its normal end marker.
    NotCompleted,
    /// Nothing was invoked and nothing could run.
    CouldNotExecute,
    /// A dispatched handler returned an error.
    CommandFailed,
    /// Any other code reported by a phase or a command handler.
    Framework(String),
}

impl ErrorCode {
    /// Shorthand for a framework-reported code.
    pub fn framework(code: impl Into<String>) -> Self {
        Self::Framework(code.into())
    }

    /// The stable, upper-case representation of the code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CommandNotFound => "COMMAND_NOT_FOUND",
            Self::CommandNotExecutable => "COMMAND_NOT_EXECUTABLE",
            Self::BootstrapIncomplete => "BOOTSTRAP_INCOMPLETE",
            Self::BootstrapInterrupted => "BOOTSTRAP_INTERRUPTED",
            Self::NotCompleted => "NOT_COMPLETED",
            Self::CouldNotExecute => "COULD_NOT_EXECUTE",
            Self::CommandFailed => "COMMAND_FAILED",
            Self::Framework(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single recorded error. Records are append-only within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

// --- LOG ---

/// The category of a log entry kept in the execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Bootstrap,
    Debug,
    Notice,
    Ok,
    Success,
    Warning,
    Error,
}

impl LogCategory {
    /// The `log` facade level an entry of this category is forwarded at.
    ///
    /// Never above `Debug`: the finalizer's report and the backend payload
    /// are what surface these entries to the user.
    pub fn level(self) -> log::Level {
        match self {
            Self::Bootstrap | Self::Debug => log::Level::Trace,
            Self::Notice | Self::Ok | Self::Success | Self::Warning | Self::Error => {
                log::Level::Debug
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub category: LogCategory,
    pub message: String,
    /// Seconds since the execution context was created.
    pub elapsed: f64,
}

// --- COMMANDS ---

/// The signature every command handler shares. A `Value::Null` return means
/// the command produced no result object.
pub type Handler = fn(&mut ExecutionContext, &[String]) -> anyhow::Result<Value>;

/// A command as resolved for one specific phase.
///
/// Definitions are looked up fresh on every resolution; `bootstrap_errors`
/// holds the validation failures found for the phases between the one just
/// reached and the one the command requires.
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub bootstrap: PhaseRank,
    pub handler: Handler,
    /// The invocation arguments that follow the command name.
    pub arguments: Vec<String>,
    pub bootstrap_errors: Vec<ErrorRecord>,
}

impl CommandDefinition {
    /// True when the command may run right now: its required phase is exactly
    /// the one just reached and nothing was deferred.
    pub fn is_dispatchable_at(&self, reached: PhaseRank) -> bool {
        self.bootstrap == reached && self.bootstrap_errors.is_empty()
    }
}

// --- RUN RESULT ---

/// How a bootstrap-and-dispatch run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Dispatched { command: String, phase: PhaseRank },
    NotExecutable { command: String },
    NotFound,
    CouldNotExecute,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub outcome: RunOutcome,
    /// The dispatched handler's result object, if it returned one.
    pub value: Option<Value>,
    /// The rank whose elevation failed and stopped the run, if any.
    pub halted_at: Option<PhaseRank>,
}

impl RunResult {
    pub fn dispatched(&self) -> bool {
        matches!(self.outcome, RunOutcome::Dispatched { .. })
    }
}
