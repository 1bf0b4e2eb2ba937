#![forbid(unsafe_code)]

mod chart;
mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cardflow: Trello board activity charts",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides --json and CARDFLOW_FORMAT).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Config file (default: ./cardflow.toml, then the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Browse",
        about = "List boards",
        long_about = "List every board visible to the configured Trello credentials.",
        after_help = "EXAMPLES:\n    # Show board names and ids\n    cardflow boards\n\n    # Emit machine-readable output\n    cardflow boards --json"
    )]
    Boards,

    #[command(
        next_help_heading = "Browse",
        about = "List the lists of a board",
        long_about = "List every list (column) on the board whose name contains the given text.",
        after_help = "EXAMPLES:\n    # Lists on 'Team Roadmap 2019'\n    cardflow lists --board Roadmap\n\n    # Emit machine-readable output\n    cardflow lists --board Roadmap --json"
    )]
    Lists(cmd::lists::ListsArgs),

    #[command(
        next_help_heading = "Report",
        about = "Summarize cards in chosen lists",
        long_about = "Print one line per card of the chosen lists, with its short URL and label tags.",
        after_help = "EXAMPLES:\n    # Cards in progress and in review\n    cardflow summary --board Roadmap --lists \"Doing,Review\"\n\n    # Emit machine-readable output\n    cardflow summary --board Roadmap --lists Doing --json"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Charts",
        about = "Chart the current card distribution",
        long_about = "Count open cards per list and draw one horizontal bar per list.\n\nCards are cached in cards.csv; the cache is reused until --force.",
        after_help = "EXAMPLES:\n    # Snapshot with default colors\n    cardflow static --board Roadmap\n\n    # Fixed order, custom colors, reversed\n    cardflow static --board Roadmap --lists \"Todo,Doing,Done\" --colors \"r,orange,#2ca02c\" -r\n\n    # Refresh the cache and choose the file name\n    cardflow static --board Roadmap --force --output roadmap.svg"
    )]
    Static(cmd::static_cmd::StaticArgs),

    #[command(
        next_help_heading = "Charts",
        about = "Chart daily list counts over time",
        long_about = "Replay the board's card history and draw stacked daily counts per list.\n\nCounts are cached in counts.csv and the first activity date in .start; the cache is reused until --force.",
        after_help = "EXAMPLES:\n    # All lists, default colormap\n    cardflow timed --board Roadmap\n\n    # Chosen lists with the summer colormap\n    cardflow timed --board Roadmap --lists \"Doing,Done\" --colors summer\n\n    # Pull the full history again\n    cardflow timed --board Roadmap --force"
    )]
    Timed(cmd::timed::TimedArgs),
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "cardflow=debug,info"
    } else {
        "cardflow=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CARDFLOW_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let format = env::var("CARDFLOW_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let ctx = cmd::Context::load(cli.config.as_deref(), output)?;
    match &cli.command {
        Commands::Boards => cmd::boards::run_boards(&ctx),
        Commands::Lists(args) => cmd::lists::run_lists(args, &ctx),
        Commands::Summary(args) => cmd::summary::run_summary(args, &ctx),
        Commands::Static(args) => cmd::static_cmd::run_static(args, &ctx),
        Commands::Timed(args) => cmd::timed::run_timed(args, &ctx),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            if let Err(render_err) = render_error(output, &CliError::from(&err)) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}
