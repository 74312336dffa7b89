use crate::core::config_loader::OptionsConfig;
use clap::{ArgAction, Parser};

pub mod handlers;
pub mod registry;

/// Builds the color-aware help string at runtime.
fn build_help_string() -> &'static str {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    let template = t!("cli.help.template");

    let title = if use_colors { "\x1b[1;33m" } else { "" }; // Bold Yellow
    let cmd = if use_colors { "\x1b[36m" } else { "" }; // Cyan (for commands)
    let dim = if use_colors { "\x1b[2m" } else { "" }; // Dim
    let reset = if use_colors { "\x1b[0m" } else { "" };

    let formatted_string = template
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset);

    Box::leak(formatted_string.into_boxed_str())
}

/// ascend: climbs through bootstrap phases and runs the command you name.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    help_template = { build_help_string() },
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Emit a single structured payload instead of normal output.
    #[arg(long)]
    pub backend: bool,

    /// Discard normal output.
    #[arg(long, short)]
    pub quiet: bool,

    /// Also print the command's compact, machine-parseable result.
    #[arg(long, short)]
    pub pipe: bool,

    /// Workspace root to use instead of searching upwards from the cwd.
    #[arg(long, short)]
    pub root: Option<String>,

    /// The site to address inside the workspace.
    #[arg(long, short = 'l', visible_alias = "uri")]
    pub site: Option<String>,

    /// Log in as this user (numeric id or account name).
    #[arg(long, short)]
    pub user: Option<String>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(long, short, action = ArgAction::Count)]
    pub verbose: u8,

    /// The command to run followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// The command line layer of the runtime configuration. Flags that were
    /// not given stay unset so lower layers can supply them.
    pub fn options(&self) -> OptionsConfig {
        OptionsConfig {
            backend: self.backend.then_some(true),
            quiet: self.quiet.then_some(true),
            pipe: self.pipe.then_some(true),
            root: self.root.clone(),
            site: self.site.clone(),
            user: self.user.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_before_command_are_options() {
        let cli = Cli::try_parse_from(["ascend", "--pipe", "-l", "blog", "status", "--field", "root"])
            .unwrap();

        let options = cli.options();

        assert_eq!(options.pipe, Some(true));
        assert_eq!(options.backend, None);
        assert_eq!(options.site.as_deref(), Some("blog"));
        assert_eq!(cli.args, vec!["status", "--field", "root"]);
    }

    #[test]
    fn test_no_arguments_is_valid() {
        let cli = Cli::try_parse_from(["ascend"]).unwrap();
        assert!(cli.args.is_empty());
    }
}
