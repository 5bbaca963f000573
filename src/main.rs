use anyhow::Context;
use evotrader::config::ConfigManager;
use evotrader::data::{FeatureFeed, FrameLoader};
use evotrader::engines::generation::{ConsoleProgressCallback, ProgressFanout, RunLogCallback};
use evotrader::persistence::{IpcPolicyStore, PolicyStore};
use evotrader::PopulationManager;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // usage: evotrader <config.toml> <features.(arrow|feather|csv)>
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(String::as_str).unwrap_or("evotrader.toml");
    let features_path = args
        .get(2)
        .context("missing feature file argument")?;

    let manager = ConfigManager::new();
    manager
        .load_from_file(config_path)
        .with_context(|| format!("loading {}", config_path))?;
    let config = manager.get();

    let frame = FrameLoader::load(features_path)?;
    let exclude: Vec<&str> = config.trading.exclude_columns.iter().map(String::as_str).collect();
    let feed = FeatureFeed::from_frame(&frame, &exclude)?;
    log::info!(
        "Loaded {} feature rows x {} columns from {}",
        feed.len(),
        feed.width(),
        features_path
    );

    let store: Option<Box<dyn PolicyStore>> = if config.persistence.enabled {
        let store = IpcPolicyStore::new(&config.persistence.root);
        log::info!("Checkpoints under {}", store.root().display());
        Some(Box::new(store))
    } else {
        None
    };

    let mut progress = ProgressFanout::new().with(ConsoleProgressCallback);
    if let Some(path) = &config.persistence.run_log {
        progress = progress.with(RunLogCallback::new(path));
    }

    let mut population = PopulationManager::new(&config, store)?;
    population.run(&feed, progress)?;

    if let Some(best) = population.finish()? {
        log::info!(
            "Best agent {}: fitness {:.4}, profit {:.4}, trades {}",
            best.id,
            best.fitness,
            best.cumulative_profit,
            best.trade_count
        );
    }

    Ok(())
}
