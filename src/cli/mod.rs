use crate::core::arg_parser::{GlobalOptions, Invocation};
use clap::Parser;

/// Routes an invocation to its handler.
pub mod dispatcher;
/// One handler per top-level action.
pub mod handlers;

/// ali: run named shortcuts for shell commands, sequences and parallel jobs.
///
/// Every flag that is not listed here is forwarded to the alias: it fills a matching
/// `<flag>` placeholder of the command or is appended to it. `--V_<name>=<value>`
/// overrides the variable `{{name}}` for this run.
#[derive(Parser, Debug)]
#[command(
    name = "ali",
    author,
    version,
    about,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
#[command(trailing_var_arg = true)]
pub struct Cli {
    /// Echo the debug log to stderr.
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// Ignore the global configuration in ~/.ali.
    #[arg(short = 'L', long)]
    pub local_env: bool,

    /// Run a group from the `parallel` section instead of an alias.
    #[arg(short, long)]
    pub parallel: bool,

    /// Do not echo the output of parallel jobs.
    #[arg(long)]
    pub without_output: bool,

    /// Color every line of parallel output.
    #[arg(long, value_name = "COLOR")]
    pub output_color: Option<String>,

    /// Print each final command line before running it.
    #[arg(long)]
    pub print: bool,

    /// List the available aliases, optionally filtered by a search term.
    #[arg(short, long)]
    pub list: bool,

    /// With --list, show the variables of the `vars` section instead.
    #[arg(long)]
    pub vars: bool,

    /// With --list, show the global and per-alias environment instead.
    #[arg(long)]
    pub envs: bool,

    /// The alias name followed by its arguments and flags.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ALIAS [ARGS]...")]
    pub args: Vec<String>,
}

impl Cli {
    /// Global flags given before the alias name, as parsed by clap.
    pub fn leading_options(&self) -> GlobalOptions {
        GlobalOptions {
            debug: self.debug,
            local_env: self.local_env,
            parallel: self.parallel,
            without_output: self.without_output,
            output_color: self.output_color.clone(),
            print: self.print,
            list: self.list,
            list_vars: self.vars,
            list_envs: self.envs,
        }
    }

    /// Splits the command line into the effective global options and the invocation.
    /// Global flags are honoured wherever they appear.
    pub fn resolve(&self) -> (GlobalOptions, Invocation) {
        let mut options = GlobalOptions::default();
        let invocation = Invocation::parse(&self.args, &mut options);
        options.merge(&self.leading_options());
        (options, invocation)
    }
}
