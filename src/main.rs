use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use reforge_optimizer::{
    init_tracing, DamageOptimizer, OptimizeOptions, OptimizerConfig, PlayerProfile,
    ProfileSnapshot, ReforgeCatalog, SolverFactory,
};
use tracing::info;

/// Find the reforges that maximize damage for a player profile
#[derive(Debug, Parser)]
#[command(name = "reforge-optimizer", version)]
struct Cli {
    /// Profile snapshot (JSON)
    #[arg(long)]
    profile: PathBuf,

    /// Reforge catalog (JSON)
    #[arg(long)]
    catalog: PathBuf,

    /// Require crit chance of at least 99.5
    #[arg(long)]
    perfect_crit_chance: bool,

    /// Cap on attack speed; also turns on the speed-adjusted objective
    #[arg(long)]
    attack_speed_limit: Option<f64>,

    /// Only consider reforges available from the blacksmith
    #[arg(long)]
    only_blacksmith: bool,

    /// Apply dungeon stat bonuses
    #[arg(long)]
    dungeon: bool,

    /// Solver budget in seconds (overrides REFORGE_TIME_LIMIT)
    #[arg(long)]
    time_limit: Option<f64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = OptimizerConfig::from_env();
    init_tracing(&config.log_filter);

    let cli = Cli::parse();

    let catalog = Arc::new(ReforgeCatalog::load(&cli.catalog)?);
    let profile: Arc<dyn PlayerProfile> = Arc::new(ProfileSnapshot::load(&cli.profile)?);

    let solver = SolverFactory::create_from_backend(config.backend)?;
    info!(solver = solver.name(), backend = %config.backend, reforges = catalog.len(), "starting optimization");

    let optimizer =
        DamageOptimizer::new(catalog, solver).with_gap_tolerance(config.gap_tolerance);
    let options = OptimizeOptions::default()
        .with_perfect_crit_chance(cli.perfect_crit_chance)
        .with_attack_speed_limit(cli.attack_speed_limit)
        .with_only_blacksmith_reforges(cli.only_blacksmith)
        .with_dungeon_bonus(cli.dungeon)
        .with_time_limit(cli.time_limit.unwrap_or(config.time_limit));

    let report = optimizer.optimize_in_background(profile, options).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
