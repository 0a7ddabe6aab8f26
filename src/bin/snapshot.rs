use anyhow::{Context, Result};
use chrono::Local;

use ridership::logging::ts_epoch_secs;
use ridership::report::DashboardView;
use ridership::seed;
use ridership::state::{Config, Dataset};
use ridership::{DayClock, MetricsEngine};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let now = DayClock::from_datetime(&Local::now());
    let hour = match args.get(1) {
        Some(v) => v.parse::<usize>().context("hour must be an integer 0-23")?,
        None => now.hour,
    };
    let weekday = match args.get(2) {
        Some(v) => v.parse::<u8>().context("weekday must be an integer 0-6 (0 = Sunday)")?,
        None => now.weekday,
    };

    let cfg = Config::from_env();
    let dataset = match &cfg.dataset_path {
        Some(path) => Dataset::load(path)?,
        None => seed::dataset(),
    };

    let clock = DayClock::new(hour, weekday)?;
    let snapshot = MetricsEngine::new().snapshot(&dataset, clock)?;
    let view = DashboardView::render(&snapshot, ts_epoch_secs(), cfg.countdown_secs);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
