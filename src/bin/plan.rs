use anyhow::Result;

use ridership::logging;
use ridership::report::fmt_count;
use ridership::schedule::tomorrow_plan;
use ridership::seed;
use ridership::state::{Config, Dataset};

fn main() -> Result<()> {
    let filter = std::env::args().nth(1);
    let cfg = Config::from_env();
    let dataset = match &cfg.dataset_path {
        Some(path) => Dataset::load(path)?,
        None => seed::dataset(),
    };

    let routes: Vec<_> = match &filter {
        Some(id) => vec![dataset.route(id)?],
        None => dataset.routes.iter().collect(),
    };

    let weekday = dataset.tomorrow_weekday();
    for route in routes {
        let plan = tomorrow_plan(&dataset, &route.id, weekday)?;
        logging::log_plan(&plan);
        println!(
            "{} ({}): demand={} peak_buses={} cost={:.2} factors=weather x{:.2} festival x{:.2} market x{:.2}",
            route.name,
            route.id,
            fmt_count(plan.total_demand),
            plan.peak_buses,
            plan.total_cost,
            plan.factors.weather,
            plan.factors.festival,
            plan.factors.market
        );
        for h in &plan.hours {
            println!(
                "  {:02}:00 demand={:>4} buses={} headway={}m util={:>3.0}% cost={:.2}",
                h.hour,
                h.demand,
                h.plan.buses,
                h.plan.headway_min,
                h.utilization * 100.0,
                h.cost
            );
        }
    }
    Ok(())
}
