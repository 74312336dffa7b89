// src/bin/ascend.rs

use ascend::{
    cli::{Cli, registry},
    constants::{FRAMEWORK_ERROR, SETTING_CWD, SETTING_ROOT, SETTING_SITE, SETTING_USER},
    core::{
        config_loader::{self, RuntimeConfig},
        finalizer,
        sequencer::BootstrapSequencer,
    },
    models::ErrorCode,
    state::ExecutionContext,
    system::phases,
};
use clap::Parser;
use colored::Colorize;
use std::panic::{self, AssertUnwindSafe};
use std::{env, io, process};

/// The main entry point of the `ascend` application.
///
/// The finalizer is armed as soon as the execution context exists, so it runs
/// on every way out of the run: a normal return, or a panic unwinding through
/// it. A panic that reaches this point has already been reported.
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    log::debug!("CLI args parsed: {:?}", cli);

    let catalog = match phases::standard_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("\n{}: {}", "Error".red().bold(), e);
            process::exit(FRAMEWORK_ERROR);
        }
    };
    let registry = registry::builtin_registry();

    let (config, config_error) = match config_loader::load_runtime_config(cli.options()) {
        Ok(config) => (config, None),
        // Flags from the command line alone still decide how the failure is reported.
        Err(e) => (RuntimeConfig::from(cli.options()), Some(e)),
    };

    let program = env::args().next().unwrap_or_else(|| "ascend".to_string());
    let mut ctx = build_context(program, cli.args, &config);

    let status = panic::catch_unwind(AssertUnwindSafe(|| {
        finalizer::run_guarded(
            &mut ctx,
            &catalog,
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
            |ctx| match config_error {
                Some(e) => ctx.set_error(ErrorCode::framework("CONFIG_INVALID"), e.to_string()),
                None => {
                    let result = BootstrapSequencer::new(&catalog, &registry).run(ctx);
                    log::debug!("Run finished: {:?}", result.outcome);
                }
            },
        )
    }))
    .unwrap_or(FRAMEWORK_ERROR);

    process::exit(status);
}

fn build_context(program: String, args: Vec<String>, config: &RuntimeConfig) -> ExecutionContext {
    let mut ctx = ExecutionContext::new(program, args, config.modes);
    if let Ok(cwd) = env::current_dir() {
        ctx.set_setting(SETTING_CWD, cwd.display().to_string());
    }
    if let Some(root) = &config.root {
        ctx.set_setting(SETTING_ROOT, root.display().to_string());
    }
    if let Some(site) = &config.site {
        ctx.set_setting(SETTING_SITE, site.as_str());
    }
    if let Some(user) = &config.user {
        ctx.set_setting(SETTING_USER, user.as_str());
    }
    ctx
}

/// `RUST_LOG` wins; otherwise `-v` raises the default from `warn`.
fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}
