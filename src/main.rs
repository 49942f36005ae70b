use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hslfind::config::{load_config, BraceMode};
use hslfind::help::find_help;
use hslfind::indexer::build_index;
use hslfind::listing::render_listing;
use hslfind::server::{run_stdio_server, INVALID_DIRECTORY_MESSAGE};
use hslfind::viewer::render_file_view;
use hslfind::xml_builder::build_index_xml;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hslfind")]
#[command(version)]
#[command(about = "Search the functions of a Hamilton HSL library tree")]
struct Cli {
    /// Config file (JSON). Defaults to ./.hslfind.json when present.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index a directory and print its functions
    Index {
        /// Library root to walk
        root: PathBuf,

        /// Case-insensitive name filter; `a|b` matches either
        #[arg(long, short = 'f', value_name = "TEXT")]
        filter: Option<String>,

        /// Print the index as JSON
        #[arg(long, conflicts_with = "xml")]
        json: bool,

        /// Print the index as XML
        #[arg(long)]
        xml: bool,

        /// Also accept `function F() {` with the brace on the signature line
        #[arg(long)]
        loose_braces: bool,
    },
    /// Print a file with one line highlighted
    View {
        file: PathBuf,

        /// 1-based line to highlight
        #[arg(long, short = 'l')]
        line: usize,

        /// Only show N lines around the highlighted one
        #[arg(long, short = 'c', value_name = "N")]
        context: Option<usize>,
    },
    /// Print the help document associated with a stem
    HelpFor {
        stem: String,
        dir: PathBuf,
    },
    /// Start the stdio JSON-RPC server
    Mcp,
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().context("Failed to get current dir")?;
    let mut cfg = load_config(cli.config.as_deref(), &cwd)?;

    match cli.cmd {
        Command::Mcp => run_stdio_server(cfg),
        Command::Index {
            root,
            filter,
            json,
            xml,
            loose_braces,
        } => {
            if loose_braces {
                cfg.extract.brace_mode = BraceMode::SameLine;
            }

            let pb = spinner("indexing...");
            let result = build_index(&root, &cfg);
            pb.finish_and_clear();

            let index = match result {
                Ok(index) => index,
                Err(e) if e.is_invalid_root() => {
                    anyhow::bail!("{INVALID_DIRECTORY_MESSAGE} ({})", root.display())
                }
                Err(e) => return Err(e).context("Indexing failed"),
            };
            let index = match filter.as_deref() {
                Some(f) => index.filter(f),
                None => index,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&index)?);
            } else if xml {
                println!("{}", build_index_xml(&index)?);
            } else {
                print!("{}", render_listing(&index));
            }
            Ok(())
        }
        Command::View { file, line, context } => {
            print!("{}", render_file_view(&file, line, context)?);
            Ok(())
        }
        Command::HelpFor { stem, dir } => {
            match find_help(&stem, &dir, &cfg.extensions) {
                Some(p) => println!("{}", p.display()),
                None => eprintln!("No help document for `{stem}` in {}", dir.display()),
            }
            Ok(())
        }
    }
}
