use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cypherdraw::{AutoUuidProp, Mode, TransformOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cypherdraw",
    version,
    about = "Generate Cypher MATCH/CREATE statements from draw.io flowcharts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log errors only
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a MATCH statement for the whole diagram
    Match {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Generate a CREATE statement, matching marked elements first
    Create {
        #[command(flatten)]
        common: CommonArgs,

        /// Prefix on the first line of vertex or edge text that marks it to be used for matching
        #[arg(short = 'm')]
        prefix_mark: Option<String>,

        /// Label automatically added to created nodes
        #[arg(short = 'l')]
        auto_label: Option<String>,

        /// Property name for an auto-generated UUID on created elements
        #[arg(short = 'u')]
        auto_uuid_prop: Option<String>,

        /// Text mixed into every auto-generated UUID
        #[arg(short = 'g')]
        auto_uuid_global_context: Option<String>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Input file in draw.io XML format ("-" reads stdin)
    input: String,

    /// Prefix on the first line of vertex or edge text that marks it to be ignored
    #[arg(short = 'i')]
    prefix_ignore: Option<String>,

    /// Take into account only nodes that have circle as a shape
    #[arg(short = 'c')]
    allow_only_circle_nodes: bool,

    /// Output file for generated Cypher code (stdout if not provided)
    #[arg(short = 'o')]
    output: Option<PathBuf>,
}

impl CommonArgs {
    fn options(&self) -> TransformOptions {
        TransformOptions {
            prefix_ignore: self.prefix_ignore.clone(),
            allow_only_circle_nodes: self.allow_only_circle_nodes,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let (mode, common, options) = match cli.command {
        Command::Match { common } => {
            let options = common.options();
            (Mode::Match, common, options)
        }
        Command::Create {
            common,
            prefix_mark,
            auto_label,
            auto_uuid_prop,
            auto_uuid_global_context,
        } => {
            if auto_uuid_prop.is_none() && auto_uuid_global_context.is_some() {
                warn!("-g has no effect without -u");
            }
            let options = TransformOptions {
                prefix_mark,
                auto_label,
                auto_uuid_prop: auto_uuid_prop.map(|name| {
                    AutoUuidProp::new(name, auto_uuid_global_context.unwrap_or_default())
                }),
                ..common.options()
            };
            (Mode::Create, common, options)
        }
    };

    let input = load_input(&common.input)?;
    let cypher = cypherdraw::generate(&input, mode, &options)
        .with_context(|| format!("failed to convert {}", common.input))?;
    info!(mode = ?mode, bytes = cypher.len(), "generated cypher");

    write_output(common.output.as_deref(), &cypher)
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
    }
}

fn write_output(output: Option<&Path>, cypher: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, cypher).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(cypher.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write stdout")
        }
    }
}
