//! paircache command-line driver
//!
//! Runs operation scripts against a fresh pair allocator, which is handy for
//! reproducing allocation and eviction sequences outside a terminal.
//!
//! # Examples
//!
//! ```bash
//! # Run a script with a 16-pair table
//! PAIRCACHE_MAX_PAIRS=16 paircache run ops.txt
//!
//! # Same, with JSON output
//! paircache --config paircache.toml run ops.txt --json
//!
//! # Walk through LRU eviction on a tiny table
//! paircache demo
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use paircache::script::{run_script, Outcome};
use paircache::{PairAllocator, PairCacheConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// paircache - color-pair slot allocator
#[derive(Parser, Debug)]
#[command(name = "paircache")]
#[command(version = paircache::VERSION)]
#[command(about = "Drive a color-pair slot allocator from the command line", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "PAIRCACHE_CONFIG")]
    config: Option<PathBuf>,

    /// Log directory path; logs only go to stderr when unset
    #[arg(long, global = true, env = "PAIRCACHE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an operation script
    Run(RunArgs),

    /// Walk through allocation and eviction on a 4-slot table
    Demo,

    /// Print the effective configuration
    Config,

    /// Show version
    Version,
}

/// Script arguments
#[derive(Args, Debug)]
struct RunArgs {
    /// Script file, one operation per line
    script: PathBuf,

    /// Print outcomes as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    match cli.command {
        Commands::Run(ref args) => run_command(&cli, args),
        Commands::Demo => demo_command(),
        Commands::Config => config_command(&cli),
        Commands::Version => {
            println!("paircache {}", paircache::VERSION);
            Ok(())
        }
    }
}

/// Setup logging to stderr, plus daily rolling files if a log dir is given
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    let file_layer = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "paircache.log");
            Some(fmt::layer().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .with(file_layer)
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<PairCacheConfig> {
    Ok(PairCacheConfig::load(cli.config.as_deref())?)
}

/// Run command - execute a script and print each outcome
fn run_command(cli: &Cli, args: &RunArgs) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;

    let mut pairs = PairAllocator::from_source(&config)?;
    info!(script = %args.script.display(), max_pairs = config.max_pairs, "Running script");

    let outcomes = run_script(&mut pairs, &text, config.trace_lists)?;
    let stats = pairs.stats();

    if args.json {
        for outcome in &outcomes {
            println!("{}", serde_json::to_string(outcome)?);
        }
        println!("{}", serde_json::to_string(&Outcome::Stats(stats))?);
    } else {
        for outcome in &outcomes {
            println!("{}", outcome);
        }
        println!("───────────────────────────────");
        println!("{}", Outcome::Stats(stats));
    }

    let failures = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Failed { .. }))
        .count();
    if failures > 0 {
        info!(failures, "Some operations were rejected");
    }

    pairs.teardown();
    Ok(())
}

/// Demo command - fill a 4-slot table and force an eviction
fn demo_command() -> anyhow::Result<()> {
    let mut pairs = PairAllocator::new(4)?;

    let a = pairs.allocate(1, 2)?;
    let b = pairs.allocate(3, 4)?;
    let c = pairs.allocate(5, 6)?;
    println!("alloc (1,2) -> {}", a);
    println!("alloc (3,4) -> {}", b);
    println!("alloc (5,6) -> {}", c);
    println!("table full: {}", pairs.is_full());

    let d = pairs.allocate(7, 8)?;
    println!("alloc (7,8) -> {} (reused oldest)", d);
    println!("find (1,2) -> {:?}", pairs.find(1, 2));

    pairs.reserve(b, 9, 10)?;
    println!("reserve {} = (9,10); find (3,4) -> {:?}", b, pairs.find(3, 4));

    let order: Vec<String> = pairs.recent().map(|p| p.to_string()).collect();
    println!("most recent first: [{}]", order.join(" "));

    println!("teardown released {} pairs", pairs.teardown());
    Ok(())
}

/// Config command - print the effective configuration as TOML
fn config_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    print!("{}", config.to_toml()?);
    Ok(())
}
