// src/cli/handlers/status.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;
use serde_json::{Map, Value};

use crate::{
    constants::{DEFAULT_SITE, SETTING_ROOT, SETTING_SITE, SETTING_USER, SETTING_VERSION},
    state::ExecutionContext,
    system::phases,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Shows the workspace root, the addressed site and the reached phase."
)]
struct StatusArgs {
    /// Show only this field (e.g. `root`).
    #[arg(long)]
    field: Option<String>,
}

pub fn handle(ctx: &mut ExecutionContext, args: &[String]) -> Result<Value> {
    let status_args = StatusArgs::try_parse_from(args)?;
    let catalog = phases::standard_catalog()?;

    let mut fields: Vec<(&str, String)> = Vec::new();
    if let Some(version) = ctx.setting_str(SETTING_VERSION) {
        fields.push(("version", version.to_string()));
    }
    if let Some(root) = ctx.setting_str(SETTING_ROOT) {
        fields.push(("root", root.to_string()));
    }
    fields.push((
        "site",
        ctx.setting_str(SETTING_SITE).unwrap_or(DEFAULT_SITE).to_string(),
    ));
    if let Some(rank) = ctx.phase() {
        fields.push(("phase", catalog.name_of(rank).to_string()));
    }
    if let Some(user) = ctx.setting_str(SETTING_USER) {
        fields.push(("user", user.to_string()));
    }

    if let Some(wanted) = status_args.field {
        fields.retain(|(key, _)| *key == wanted);
        if fields.is_empty() {
            return Err(anyhow!(t!("status.error.unknown_field"), field = wanted));
        }
    }

    let mut object = Map::new();
    for (key, value) in fields {
        ctx.print(format!("  {:<10} {}", key.blue(), value));
        ctx.print_pipe(format!("{}={}", key, value));
        object.insert(key.to_string(), Value::String(value));
    }

    Ok(Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::phases::tests::{context_in, workspace};
    use serde_json::json;

    #[test]
    fn test_status_reports_root_and_default_site() {
        let temp = workspace(None);
        let mut ctx = context_in(temp.path(), &["status"]);

        let value = handle(&mut ctx, &[]).unwrap();

        assert_eq!(value["site"], json!("default"));
        assert!(value.get("root").is_some());
        assert!(ctx.pipe_output().contains("site=default\n"));
    }

    #[test]
    fn test_status_single_field() {
        let temp = workspace(None);
        let mut ctx = context_in(temp.path(), &["status"]);

        let value = handle(&mut ctx, &["--field".to_string(), "site".to_string()]).unwrap();

        assert_eq!(value, json!({ "site": "default" }));
        assert!(handle(&mut ctx, &["--field".to_string(), "nope".to_string()]).is_err());
    }
}
