use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codetree::cli::IndexOptions;
use codetree::cli::ui::output;

#[derive(Parser)]
#[command(name = "codetree")]
#[command(
    version,
    about = "Structural code trees for Python, Java, Kotlin and C/C++"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the structural tree of a file or directory
    Index {
        #[arg(help = "File or directory to index")]
        path: PathBuf,
        #[arg(long, short, help = "Config file (skips global/project lookup)")]
        config: Option<PathBuf>,
        #[arg(long, help = "Summarization model")]
        model: Option<String>,
        #[arg(long, help = "Add node summaries")]
        summaries: bool,
        #[arg(long = "doc-description", help = "Add a one-sentence document description")]
        doc_description: bool,
        #[arg(long, help = "Include node source text")]
        text: bool,
        #[arg(long = "no-node-ids", help = "Omit node ids")]
        no_node_ids: bool,
        #[arg(long, help = "Merge small class/function subtrees")]
        thinning: bool,
        #[arg(long = "thinning-threshold", help = "Token threshold for thinning")]
        thinning_threshold: Option<usize>,
        #[arg(long, help = "Files analyzed in parallel")]
        workers: Option<usize>,
        #[arg(long, short, help = "Output file (default: <output.dir>/<name>_code_structure.json)")]
        output: Option<PathBuf>,
        #[arg(long, conflicts_with = "output", help = "Print the document to stdout")]
        stdout: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Print as JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mcodetree encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::failure(e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    // Logs go to stderr so `--stdout` output stays clean JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Index {
            path,
            config,
            model,
            summaries,
            doc_description,
            text,
            no_node_ids,
            thinning,
            thinning_threshold,
            workers,
            output,
            stdout,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(codetree::cli::commands::index::run(IndexOptions {
                path,
                config,
                model,
                summaries,
                doc_description,
                text,
                no_node_ids,
                thinning,
                thinning_threshold,
                workers,
                output,
                stdout,
            }))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                codetree::cli::commands::config::show(json)?;
            }
            ConfigAction::Path => {
                codetree::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                codetree::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
