// src/core/dispatcher.rs

use crate::{
    models::{CommandDefinition, ErrorCode, LogCategory},
    state::ExecutionContext,
};
use serde_json::Value;

/// Invokes a resolved command's handler exactly once and captures its result.
///
/// A handler error is recorded as `COMMAND_FAILED`; it never escapes the
/// dispatcher. The returned value is also stored as the run's result.
pub fn dispatch(ctx: &mut ExecutionContext, command: &CommandDefinition) -> Option<Value> {
    ctx.log(
        format!(t!("log.found_command"), command = command.name),
        LogCategory::Bootstrap,
    );
    ctx.mark_command_found(&command.name);

    let value = match (command.handler)(ctx, &command.arguments) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            ctx.set_error(
                ErrorCode::CommandFailed,
                format!(t!("error.command_failed"), command = command.name, reason = format!("{:#}", e)),
            );
            None
        }
    };

    ctx.set_result(value.clone());
    value
}
