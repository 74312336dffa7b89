// src/cli/handlers/whoami.rs

use anyhow::Result;
use clap::Parser;
use serde_json::Value;

use crate::{constants::SETTING_ACCOUNT, state::ExecutionContext};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows the logged-in account.")]
struct WhoamiArgs {}

pub fn handle(ctx: &mut ExecutionContext, args: &[String]) -> Result<Value> {
    let _whoami_args = WhoamiArgs::try_parse_from(args)?;

    let Some(account) = ctx.setting(SETTING_ACCOUNT).cloned() else {
        ctx.print(t!("whoami.anonymous"));
        ctx.print_pipe("anonymous");
        return Ok(Value::Null);
    };

    let name = account
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    ctx.print(format!(t!("whoami.output"), name = name));
    ctx.print_pipe(&name);
    Ok(account)
}
