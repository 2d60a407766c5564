#![forbid(unsafe_code)]

mod cmd;
mod output;
mod validate;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use gymdesk_core::config::resolve_config;
use gymdesk_core::error::{GymError, LoadError};
use output::{CliError, OutputMode, render_error};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cmd::Context;
use crate::validate::{ValidationError, parse_now};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "gd: query the gym back office from the terminal",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides --json, FORMAT and the user config).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Dataset file to load instead of the configured or embedded one.
    #[arg(long, global = true, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Pin the reference instant used by relative periods (RFC 3339).
    #[arg(long, global = true, value_name = "INSTANT")]
    now: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Output mode from flags alone, used before config is loaded.
    fn fallback_output(&self) -> OutputMode {
        match self.format {
            Some(mode) => mode,
            None if self.json => OutputMode::Json,
            None => OutputMode::Text,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Query",
        about = "List one page of a collection",
        long_about = "List one page of a filtered, sorted collection together with the filtered total."
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Query",
        about = "Summarize the filtered set of a collection",
        long_about = "Compute dashboard figures (counts, rates, totals) over every record that matches the filters."
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Query",
        about = "Bucket a collection by day, week or month",
        long_about = "Count records (or total a numeric field) per day, week or month over a bounded period."
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Query",
        about = "Export the filtered set as CSV or JSON"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Dates",
        about = "Show the range a period token resolves to"
    )]
    Period(cmd::period::PeriodArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    gd completions bash > ~/.local/share/bash-completion/completions/gd"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GYMDESK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "gymdesk=debug,info"
        } else {
            "gymdesk=info,warn"
        })
    });

    let format = env::var("GYMDESK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
}

fn build_context(cli: &Cli) -> anyhow::Result<Context> {
    let project_root = env::current_dir()?;
    let config = resolve_config(
        &project_root,
        cli.format.map(OutputMode::as_str),
        cli.json,
    )?;
    let now = cli.now.as_deref().map(parse_now).transpose()?;
    Context::new(config, &project_root, cli.data.clone(), now)
}

fn dispatch(command: &Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::List(args) => cmd::list::run_list(args, ctx),
        Commands::Summary(args) => cmd::summary::run_summary(args, ctx),
        Commands::Report(args) => cmd::report::run_report(args, ctx),
        Commands::Export(args) => cmd::export::run_export(args, ctx),
        Commands::Period(args) => cmd::period::run_period(args, ctx),
        Commands::Completions(args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    }
}

/// Map a command failure onto the structured error shape.
fn to_cli_error(err: &anyhow::Error) -> CliError {
    if let Some(load) = err.downcast_ref::<LoadError>() {
        let code = load.code();
        return CliError {
            message: format!("{err:#}"),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
            fields: Vec::new(),
        };
    }
    if let Some(gym) = err.downcast_ref::<GymError>() {
        return CliError::from(gym);
    }
    if let Some(invalid) = err.downcast_ref::<ValidationError>() {
        return invalid.to_cli_error();
    }
    CliError::new(format!("{err:#}"))
}

fn fail(output: OutputMode, err: &anyhow::Error) -> ExitCode {
    debug!(error = ?err, "command failed");
    if let Err(render_err) = render_error(output, &to_cli_error(err)) {
        eprintln!("error: {err:#} (while rendering: {render_err})");
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let ctx = match build_context(&cli) {
        Ok(ctx) => ctx,
        Err(err) => return fail(cli.fallback_output(), &err),
    };

    match dispatch(&cli.command, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(ctx.output, &err),
    }
}
