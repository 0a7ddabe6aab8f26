//! Dashboard KPI properties checked over seeded random inputs, plus the
//! worked scenarios from the Tiruppur dataset.

use rand::{rngs::StdRng, Rng, SeedableRng};

use ridership::metrics::{
    confidence_score, performance_ratio, route_accuracy, route_load, tomorrow_bus_recommendation,
};
use ridership::seed;
use ridership::{HourlySeries, MetricsError};

fn random_series(rng: &mut StdRng, max: u32) -> HourlySeries {
    let mut values = [0u32; 24];
    for v in values.iter_mut() {
        *v = rng.gen_range(0..=max);
    }
    HourlySeries::new(values)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn performance_is_100_when_nothing_predicted_yet() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let actual = random_series(&mut rng, 1_000);
        let hour = rng.gen_range(0..24);
        let mut predicted = random_series(&mut rng, 1_000);
        for h in 0..=hour {
            predicted.set(h, 0).unwrap();
        }
        assert_eq!(performance_ratio(&actual, &predicted, hour).unwrap(), 100.0);
    }
}

#[test]
fn load_is_monotonic_and_bounded() {
    let ds = seed::dataset();
    let mut rng = StdRng::seed_from_u64(12);
    for route in &ds.routes {
        for _ in 0..200 {
            let hour = rng.gen_range(0..24);
            let mut series = random_series(&mut rng, 2_000);
            let mut last = 0;
            for riders in (0..1_500).step_by(25) {
                series.set(hour, riders).unwrap();
                let load = route_load(route, &series, hour, ds.operational_costs.bus_capacity).unwrap();
                assert!(load <= 100);
                assert!(load >= last, "load dropped from {} to {} at {} riders", last, load, riders);
                last = load;
            }
        }
    }
}

#[test]
fn perfect_prediction_is_perfect_accuracy() {
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..500 {
        let series = random_series(&mut rng, 800);
        let hour = rng.gen_range(0..24);
        assert_eq!(route_accuracy(&series, &series, hour).unwrap(), 100);
    }
}

#[test]
fn accuracy_floors_at_zero_on_large_overshoot() {
    let mut rng = StdRng::seed_from_u64(14);
    for _ in 0..500 {
        let mut actual = [0u32; 24];
        let mut predicted = [0u32; 24];
        for h in 0..24 {
            actual[h] = rng.gen_range(200..=5_000);
            predicted[h] = rng.gen_range(1..=50);
        }
        let hour = rng.gen_range(0..24);
        // actual is at least 4x predicted, so the raw score is below -200
        let accuracy =
            route_accuracy(&HourlySeries::new(actual), &HourlySeries::new(predicted), hour).unwrap();
        assert_eq!(accuracy, 0);
    }
}

#[test]
fn bus_recommendation_monotonic_in_factor() {
    let mut rng = StdRng::seed_from_u64(15);
    for _ in 0..200 {
        let total = rng.gen_range(0..500);
        let mut last = 0;
        for step in 0..200 {
            let factor = 0.5 + step as f64 * 0.01;
            let buses = tomorrow_bus_recommendation(total, factor).unwrap();
            assert!(buses >= last);
            last = buses;
        }
    }
    assert_eq!(tomorrow_bus_recommendation(40, 1.0).unwrap(), 40);
}

#[test]
fn confidence_always_within_bounds() {
    let ds = seed::dataset();
    let mut rng = StdRng::seed_from_u64(16);
    for route in &ds.routes {
        for base in [0.0, 1000.0, -50.0, 70.0, 95.0, 87.3] {
            for weekday in 0..7u8 {
                let score = confidence_score(base, rng.gen_range(0.0..30.0), route, weekday).unwrap();
                assert!((70.0..=95.0).contains(&score), "score {}", score);
            }
        }
    }
}

#[test]
fn out_of_range_hours_rejected_everywhere() {
    let ds = seed::dataset();
    let route = ds.route("tp_pc").unwrap();
    let a = ds.actual("tp_pc").unwrap();
    let p = ds.predicted("tp_pc").unwrap();
    for hour in [24usize, 25, 100, usize::MAX] {
        assert!(matches!(performance_ratio(a, p, hour), Err(MetricsError::InvalidArgument { .. })));
        assert!(matches!(route_accuracy(a, p, hour), Err(MetricsError::InvalidArgument { .. })));
        assert!(matches!(route_load(route, a, hour, 45), Err(MetricsError::InvalidArgument { .. })));
    }
    assert!(matches!(confidence_score(87.3, 0.0, route, 9), Err(MetricsError::InvalidArgument { .. })));
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn pollachi_load_at_five_pm_slot() {
    let ds = seed::dataset();
    let route = ds.route("tp_pc").unwrap();
    assert_eq!(route.current_buses, 12);
    let actual = ds.actual("tp_pc").unwrap();
    assert_eq!(actual.get(16).unwrap(), 220);
    assert_eq!(route_load(route, actual, 16, 45).unwrap(), 41);
}

#[test]
fn rainy_tomorrow_needs_52_buses() {
    let ds = seed::dataset();
    assert_eq!(ds.total_buses(), 45);
    assert_eq!(ds.weather.forecast_tomorrow.weather_factor, 1.15);
    assert_eq!(tomorrow_bus_recommendation(45, 1.15).unwrap(), 52);
}

#[test]
fn rain_and_market_day_lower_confidence() {
    let ds = seed::dataset();
    let route = ds.route("tp_pc").unwrap();
    assert_eq!(route.market_days, vec![1, 4]);
    let score = confidence_score(87.3, 8.0, route, 4).unwrap();
    assert!((score - 79.3).abs() < 1e-9, "got {}", score);
}
