use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Local;
use tokio::time::{sleep, Duration};

use ridership::logging::{self, log_error, Domain, ProfileScope};
use ridership::report::DashboardView;
use ridership::seed;
use ridership::sim::{self, RngSource};
use ridership::state::{Config, Dataset, SharedDataset};
use ridership::ticker::PeriodicTask;
use ridership::{DayClock, MetricsEngine};

fn load_dataset(cfg: &Config) -> Result<Dataset> {
    let dataset = match &cfg.dataset_path {
        Some(path) => Dataset::load(path)?,
        None => seed::dataset(),
    };
    dataset.validate()?;
    Ok(dataset)
}

fn rng_for(cfg: &Config, stream: u64) -> RngSource<rand::rngs::StdRng> {
    match cfg.sim_seed {
        Some(seed) => RngSource::seeded(seed.wrapping_add(stream)),
        None => RngSource::from_entropy(),
    }
}

fn publish(shared: &SharedDataset, engine: &MetricsEngine, cfg: &Config) {
    let _scope = ProfileScope::new("dashboard_refresh");
    let snapshot = shared.snapshot();
    let clock = DayClock::from_datetime(&Local::now());
    match engine.snapshot(&snapshot, clock) {
        Ok(snap) => {
            let view = DashboardView::render(&snap, logging::ts_epoch_secs(), cfg.countdown_secs);
            logging::log_dashboard(&view);
        }
        Err(err) => log_error(Domain::Metrics, "snapshot_failed", &err),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let dataset = load_dataset(&cfg)?;
    logging::log_startup(
        &dataset.fingerprint()?,
        dataset.routes.len(),
        cfg.tick_secs,
        cfg.drift_secs,
        cfg.sim_seed.is_some(),
    );

    let shared = SharedDataset::new(dataset);
    let mut dispatch_rng = rng_for(&cfg, 2);
    shared.update(|d| sim::dispatch_tick(d, &mut dispatch_rng));
    let engine = Arc::new(MetricsEngine::new());
    let started = Instant::now();
    let data_ticks = Arc::new(AtomicU64::new(0));
    let system_ticks = Arc::new(AtomicU64::new(0));

    publish(&shared, &engine, &cfg);

    let mut data_task = {
        let shared = shared.clone();
        let engine = Arc::clone(&engine);
        let cfg = cfg.clone();
        let counter = Arc::clone(&data_ticks);
        let mut rng = rng_for(&cfg, 0);
        let mut dispatch_rng = dispatch_rng;
        PeriodicTask::spawn("data", Duration::from_secs(cfg.tick_secs.max(1)), move |_| {
            let hour = DayClock::from_datetime(&Local::now()).hour;
            match shared.update(|d| sim::data_tick(d, hour, &mut rng)) {
                Ok(tick) => logging::log_data_tick(&tick),
                Err(err) => log_error(Domain::Sim, "data_tick_failed", &err),
            }
            shared.update(|d| sim::dispatch_tick(d, &mut dispatch_rng));
            counter.fetch_add(1, Ordering::SeqCst);
            publish(&shared, &engine, &cfg);
        })
    };

    let mut system_task = {
        let shared = shared.clone();
        let counter = Arc::clone(&system_ticks);
        let mut rng = rng_for(&cfg, 1);
        PeriodicTask::spawn("system", Duration::from_secs(cfg.drift_secs.max(1)), move |_| {
            let tick = shared.update(|d| sim::system_tick(d, &mut rng));
            logging::log_system_tick(&tick);
            counter.fetch_add(1, Ordering::SeqCst);
        })
    };

    match cfg.run_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sleep(Duration::from_secs(secs)) => {}
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    data_task.stop();
    system_task.stop();
    data_task.join().await;
    system_task.join().await;

    logging::log_session_summary(
        started.elapsed().as_secs(),
        data_ticks.load(Ordering::SeqCst),
        system_ticks.load(Ordering::SeqCst),
        shared.snapshot().system_status.prediction_accuracy,
    );
    Ok(())
}
