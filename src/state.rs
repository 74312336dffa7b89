// src/state.rs

use crate::models::{ErrorCode, ErrorRecord, LogCategory, LogEntry, PhaseRank};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

/// The runtime mode flags that shape what the finalizer writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutputModes {
    /// Replace all output with a single structured payload.
    pub backend: bool,
    /// Discard buffered normal output.
    pub quiet: bool,
    /// Additionally emit the command's compact result.
    pub pipe: bool,
}

/// Where the run stood when a phase elevation began. Used to clean up after a
/// phase that never finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BootstrapMark {
    rank: PhaseRank,
    output_len: usize,
    log_len: usize,
}

/// The single, explicitly passed state of one invocation.
///
/// Every component reads and mutates it in place: phases store their named
/// settings here, handlers print into its buffers, and errors are only ever
/// recorded through it, never raised.
#[derive(Debug)]
pub struct ExecutionContext {
    program: String,
    args: Vec<String>,
    modes: OutputModes,
    settings: BTreeMap<String, Value>,
    phase: Option<PhaseRank>,
    bootstrapping: Option<BootstrapMark>,
    command: Option<String>,
    result: Option<Value>,
    errors: Vec<ErrorRecord>,
    log: Vec<LogEntry>,
    output: String,
    pipe_output: String,
    completed: bool,
    finalized: Option<i32>,
    started: Instant,
}

/// A serializable view of the context, embedded in the backend payload.
#[derive(Debug, Serialize)]
pub struct ContextSnapshot<'a> {
    pub program: &'a str,
    pub args: &'a [String],
    pub modes: OutputModes,
    pub phase: Option<PhaseRank>,
    pub command: Option<&'a str>,
    pub settings: &'a BTreeMap<String, Value>,
}

impl ExecutionContext {
    pub fn new(program: impl Into<String>, args: Vec<String>, modes: OutputModes) -> Self {
        Self {
            program: program.into(),
            args,
            modes,
            settings: BTreeMap::new(),
            phase: None,
            bootstrapping: None,
            command: None,
            result: None,
            errors: Vec::new(),
            log: Vec::new(),
            output: String::new(),
            pipe_output: String::new(),
            completed: false,
            finalized: None,
            started: Instant::now(),
        }
    }

    // --- Arguments & modes ---

    /// The basename of the invoked program, as shown in user-facing messages.
    pub fn program_name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.program)
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The command name is the first positional argument.
    pub fn command_name(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn modes(&self) -> OutputModes {
        self.modes
    }

    // --- Named settings ---

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn remove_setting(&mut self, key: &str) -> Option<Value> {
        self.settings.remove(key)
    }

    pub fn settings(&self) -> &BTreeMap<String, Value> {
        &self.settings
    }

    // --- Phase bookkeeping ---

    /// The highest phase reached so far, `None` before the first elevation.
    pub fn phase(&self) -> Option<PhaseRank> {
        self.phase
    }

    pub fn has_reached(&self, rank: PhaseRank) -> bool {
        self.phase.is_some_and(|current| current >= rank)
    }

    /// The phase currently being elevated, if an elevation is in progress.
    pub fn bootstrapping(&self) -> Option<PhaseRank> {
        self.bootstrapping.map(|mark| mark.rank)
    }

    pub(crate) fn begin_bootstrap(&mut self, rank: PhaseRank) {
        self.bootstrapping = Some(BootstrapMark {
            rank,
            output_len: self.output.len(),
            log_len: self.log.len(),
        });
    }

    /// Closes the in-progress elevation; on success the phase becomes current.
    pub(crate) fn end_bootstrap(&mut self, reached: bool) {
        if let Some(mark) = self.bootstrapping.take() {
            if reached {
                self.phase = Some(mark.rank);
            }
        }
    }

    /// Drops the output printed since the interrupted elevation began and
    /// returns the log entries written during it.
    pub(crate) fn unwind_bootstrap(&mut self) -> Vec<LogEntry> {
        let Some(mark) = self.bootstrapping.take() else {
            return Vec::new();
        };
        self.output.truncate(mark.output_len);
        self.log.get(mark.log_len..).map(<[LogEntry]>::to_vec).unwrap_or_default()
    }

    // --- Command result ---

    pub(crate) fn mark_command_found(&mut self, name: &str) {
        self.command = Some(name.to_string());
    }

    /// The name of the dispatched command, if one was found.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub(crate) fn set_result(&mut self, value: Option<Value>) {
        self.result = value;
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    // --- Output buffers ---

    /// Buffers a line of normal output. What reaches stdout is decided at
    /// shutdown, according to the active modes.
    pub fn print(&mut self, line: impl AsRef<str>) {
        self.output.push_str(line.as_ref());
        self.output.push('\n');
    }

    /// Buffers a line of the compact, machine-parseable result.
    pub fn print_pipe(&mut self, line: impl AsRef<str>) {
        self.pipe_output.push_str(line.as_ref());
        self.pipe_output.push('\n');
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn pipe_output(&self) -> &str {
        &self.pipe_output
    }

    // --- Log ---

    /// Records a message in the run log and forwards it to the `log` facade.
    pub fn log(&mut self, message: impl Into<String>, category: LogCategory) {
        let message = message.into();
        log::log!(category.level(), "[{:?}] {}", category, message);
        self.log.push(LogEntry {
            category,
            message,
            elapsed: self.started.elapsed().as_secs_f64(),
        });
    }

    pub fn log_entries(&self) -> &[LogEntry] {
        &self.log
    }

    // --- Error / completion controller ---

    /// Appends an error record. There is no deduplication.
    pub fn set_error(&mut self, code: ErrorCode, message: impl Into<String>) {
        let record = ErrorRecord::new(code, message);
        self.log(record.message.clone(), LogCategory::Error);
        self.errors.push(record);
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All recorded errors, in the order they were recorded.
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Marks the normal end of the run. Only the main flow calls this, last.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub(crate) fn finalized(&self) -> Option<i32> {
        self.finalized
    }

    pub(crate) fn set_finalized(&mut self, status: i32) {
        self.finalized = Some(status);
    }

    pub fn snapshot(&self) -> ContextSnapshot<'_> {
        ContextSnapshot {
            program: &self.program,
            args: &self.args,
            modes: self.modes,
            phase: self.phase,
            command: self.command.as_deref(),
            settings: &self.settings,
        }
    }
}
