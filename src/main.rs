//! scroll-keeper - Entry Point
//!
//! Replays a scenario file against the simulated editor host and prints where
//! every view ended up after each step.

use clap::Parser;
use scroll_keeper::model::ReferencePolicy;
use scroll_keeper::scenario::{self, Scenario};
use std::path::PathBuf;
use tracing::info;

/// scroll-keeper - keep the reading position stable across reflows
#[derive(Parser, Debug)]
#[command(name = "scroll-keeper")]
#[command(version)]
#[command(about = "Replay an editor scenario and report how scroll positions survive reflows")]
pub struct Args {
    /// Path to the TOML scenario to replay
    pub scenario: PathBuf,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Quiet period before a debounced restore, in milliseconds
    #[arg(short, long)]
    pub debounce_ms: Option<u64>,

    /// Reference line used to anchor the reading position (top or center)
    #[arg(short, long)]
    pub reference: Option<ReferencePolicy>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = scroll_keeper::config::load_config_with_precedence(args.config.clone())?;
        let merged = scroll_keeper::config::merge_config(config_file);
        let with_env = scroll_keeper::config::apply_env_overrides(merged);
        scroll_keeper::config::apply_cli_overrides(with_env, args.debounce_ms, args.reference)
    };

    scroll_keeper::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        scenario = %args.scenario.display(),
        "Configuration loaded and resolved"
    );

    let scenario = Scenario::load(&args.scenario)?;
    let report = scenario::run(&scenario, config.settings())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }

    Ok(())
}
