// tests/bootstrap_flow.rs

use ascend::{
    cli::registry,
    constants::{
        BACKEND_OUTPUT_END, BACKEND_OUTPUT_START, FRAMEWORK_ERROR, SETTING_ROOT, SETTING_SITE,
        SETTING_USER, SUCCESS,
    },
    core::{finalizer, sequencer::BootstrapSequencer},
    models::{ErrorCode, RunOutcome, RunResult},
    state::{ExecutionContext, OutputModes},
    system::phases,
};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

const SITE_TOML: &str = r#"
name = "Acme"
extensions = ["search"]

[[users]]
id = 1
name = "admin"
"#;

fn workspace() -> TempDir {
    let temp = tempdir().unwrap();
    let site = temp.path().join(".ascend").join("sites").join("default");
    fs::create_dir_all(&site).unwrap();
    fs::write(site.join("site.toml"), SITE_TOML).unwrap();
    temp
}

struct Finished {
    result: RunResult,
    ctx: ExecutionContext,
    status: i32,
    out: String,
}

fn invoke(
    root: &Path,
    args: &[&str],
    modes: OutputModes,
    setup: impl FnOnce(&mut ExecutionContext),
) -> Finished {
    let catalog = phases::standard_catalog().unwrap();
    let registry = registry::builtin_registry();
    let mut ctx = ExecutionContext::new(
        "/usr/bin/ascend",
        args.iter().map(|s| s.to_string()).collect(),
        modes,
    );
    ctx.set_setting(SETTING_ROOT, root.display().to_string());
    setup(&mut ctx);

    let result = BootstrapSequencer::new(&catalog, &registry).run(&mut ctx);
    ctx.mark_completed();

    let (mut out, mut err) = (Vec::new(), Vec::new());
    let status = finalizer::finalize(&mut ctx, &catalog, &mut out, &mut err);
    Finished {
        result,
        ctx,
        status,
        out: String::from_utf8(out).unwrap(),
    }
}

fn codes(ctx: &ExecutionContext) -> Vec<String> {
    ctx.errors().iter().map(|e| e.code.to_string()).collect()
}

#[test]
fn status_dispatches_at_root_phase() {
    let temp = workspace();

    let run = invoke(temp.path(), &["status"], OutputModes::default(), |_| {});

    assert_eq!(
        run.result.outcome,
        RunOutcome::Dispatched {
            command: "status".to_string(),
            phase: phases::ROOT
        }
    );
    // Nothing beyond the root phase was attempted.
    assert_eq!(run.ctx.phase(), Some(phases::ROOT));
    assert!(run.ctx.setting("site.config").is_none());
    assert_eq!(run.status, SUCCESS);
    assert!(run.out.contains("default"));
}

#[test]
fn unknown_command_is_not_found() {
    let temp = workspace();

    let run = invoke(temp.path(), &["bogus"], OutputModes::default(), |_| {});

    assert_eq!(run.result.outcome, RunOutcome::NotFound);
    assert_eq!(codes(&run.ctx), vec!["COMMAND_NOT_FOUND"]);
    assert_eq!(run.status, FRAMEWORK_ERROR);
    // Every phase was climbed looking for it.
    assert_eq!(run.ctx.phase(), Some(phases::LOGIN));
}

#[test]
fn missing_site_makes_command_not_executable() {
    let temp = workspace();

    let run = invoke(temp.path(), &["site-info"], OutputModes::default(), |ctx| {
        ctx.set_setting(SETTING_SITE, "shop");
    });

    assert_eq!(
        run.result.outcome,
        RunOutcome::NotExecutable {
            command: "site-info".to_string()
        }
    );
    assert_eq!(run.result.halted_at, Some(phases::SITE));
    assert_eq!(codes(&run.ctx), vec!["SITE_NOT_FOUND", "COMMAND_NOT_EXECUTABLE"]);
    assert_eq!(
        run.ctx.errors()[1].message,
        "The command 'ascend site-info' could not be executed."
    );
    assert_eq!(run.status, FRAMEWORK_ERROR);
}

#[test]
fn no_workspace_stops_at_root_phase() {
    let temp = tempdir().unwrap();

    let run = invoke(temp.path(), &["status"], OutputModes::default(), |_| {});

    assert_eq!(run.result.halted_at, Some(phases::ROOT));
    assert_eq!(codes(&run.ctx), vec!["NO_ROOT", "COMMAND_NOT_EXECUTABLE"]);
    assert_eq!(run.ctx.phase(), Some(phases::LAUNCHER));
}

#[test]
fn backend_mode_emits_only_the_payload() {
    let temp = workspace();

    let run = invoke(
        temp.path(),
        &["version"],
        OutputModes {
            backend: true,
            ..OutputModes::default()
        },
        |_| {},
    );

    assert_eq!(run.status, SUCCESS);
    let body = run
        .out
        .trim_end()
        .strip_prefix(BACKEND_OUTPUT_START)
        .and_then(|s| s.strip_suffix(BACKEND_OUTPUT_END))
        .expect("stdout holds exactly one framed payload");
    let payload: Value = serde_json::from_str(body).unwrap();
    assert_eq!(payload["object"]["version"], json!(env!("CARGO_PKG_VERSION")));
    assert_eq!(payload["error_status"], json!(0));
    assert_eq!(payload["context"]["command"], json!("version"));
}

#[test]
fn pipe_mode_appends_compact_result() {
    let temp = workspace();

    let run = invoke(
        temp.path(),
        &["extensions"],
        OutputModes {
            pipe: true,
            ..OutputModes::default()
        },
        |_| {},
    );

    assert_eq!(run.status, SUCCESS);
    assert!(run.out.ends_with("search\n"));
    assert_eq!(run.result.value, Some(json!(["search"])));
}

#[test]
fn whoami_logs_in_requested_user() {
    let temp = workspace();

    let run = invoke(temp.path(), &["whoami"], OutputModes::default(), |ctx| {
        ctx.set_setting(SETTING_USER, "admin");
    });

    assert!(run.result.dispatched());
    assert_eq!(run.result.value.unwrap()["id"], json!(1));
}

#[test]
fn failed_login_is_reported_with_its_own_code() {
    let temp = workspace();

    let run = invoke(temp.path(), &["whoami"], OutputModes::default(), |ctx| {
        ctx.set_setting(SETTING_USER, "mallory");
    });

    assert!(!run.result.dispatched());
    assert_eq!(run.ctx.errors()[0].code, ErrorCode::framework("USER_LOGIN_FAILED"));
    assert_eq!(
        run.ctx.errors()[0].message,
        "Could not login with user account `mallory'."
    );
    assert_eq!(run.status, FRAMEWORK_ERROR);
}
