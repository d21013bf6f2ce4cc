//! Tether CLI.
//!
//! ```text
//! tether schemas                        # tool definitions sent to the model
//! tether policy --max-mutating 10       # policy block for the system prompt
//! tether read src/main.rs --start 40    # anchored lines, as read_file shows them
//! tether call --root . < calls.json     # dispatch one turn of tool calls
//! ```

use std::io::Read as _;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use tether::{load_settings, parse_calls, policy, read_anchored, run_calls, schemas_json};
use tether_types::ToolCall;

#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(about = "Hash-anchored file editing tools for coding agents")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every tool definition in function-calling JSON
    Schemas,
    /// Print the tool policy text
    Policy {
        /// Workspace root to state (default: from config)
        #[arg(long)]
        root: Option<String>,
        /// Mutating calls allowed per turn (default: from config)
        #[arg(long)]
        max_mutating: Option<usize>,
    },
    /// Print a local file with line anchors
    Read {
        file: PathBuf,
        /// First line (1-indexed)
        #[arg(long)]
        start: Option<u32>,
        /// Last line (inclusive)
        #[arg(long)]
        end: Option<u32>,
    },
    /// Dispatch tool calls against a local directory
    Call {
        /// Directory acting as the workspace root
        #[arg(long)]
        root: PathBuf,
        /// Tool name; without it, calls are read from stdin as JSON
        #[arg(long, requires = "args")]
        name: Option<String>,
        /// Tool arguments as a JSON object
        #[arg(long, requires = "name")]
        args: Option<String>,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let output = match args.command {
        Command::Schemas => schemas_json()?,
        Command::Policy { root, max_mutating } => {
            policy(&load_settings()?, root.as_deref(), max_mutating)?
        }
        Command::Read { file, start, end } => read_anchored(&file, start, end)?,
        Command::Call { root, name, args } => {
            let calls = match (name, args) {
                (Some(name), Some(args)) => {
                    let arguments =
                        serde_json::from_str(&args).context("--args must be a JSON object")?;
                    vec![ToolCall::new("call_1", name, arguments)]
                }
                (None, None) => {
                    let mut input = String::new();
                    std::io::stdin()
                        .read_to_string(&mut input)
                        .context("reading tool calls from stdin")?;
                    parse_calls(&input)?
                }
                _ => bail!("--name and --args must be given together"),
            };
            let reports = run_calls(&root, load_settings()?, &calls)?;
            serde_json::to_string_pretty(&reports)?
        }
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
