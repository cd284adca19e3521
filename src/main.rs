use anyhow::Context;
use coevo::config::ConfigManager;
use coevo::engines::generation::{EvolutionEngine, LogProgressCallback};
use coevo::engines::metrics::{JsonLinesSink, StatisticsSink};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

const DEFAULT_CONFIG: &str = "coevo.toml";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let records_path = args.next();

    let manager = ConfigManager::new();
    if Path::new(&config_path).exists() {
        manager
            .load_from_file(&config_path)
            .with_context(|| format!("failed to load configuration from {}", config_path))?;
    } else {
        warn!("{} not found, running with default configuration", config_path);
    }
    let config = manager.get()?;

    let mut engine = EvolutionEngine::from_config(config).context("failed to build engine")?;
    info!(
        "Start program: {}",
        engine.start_program().expression()?
    );

    let result = match &records_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create records file {}", path))?;
            let mut sink = JsonLinesSink::new(BufWriter::new(file));
            run(&mut engine, &mut sink)?
        }
        None => {
            let mut sink = JsonLinesSink::new(io::stdout().lock());
            run(&mut engine, &mut sink)?
        }
    };

    let report = result.report(engine.topology().name());
    info!("Run finished: {}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run<S: StatisticsSink>(
    engine: &mut EvolutionEngine,
    sink: &mut S,
) -> anyhow::Result<coevo::engines::generation::EvolutionResult> {
    Ok(engine.run(LogProgressCallback, sink)?)
}
