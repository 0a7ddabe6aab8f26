//! KPI derivation for the ridership dashboard.
//!
//! Every function here is a pure computation over the dataset. Hours are
//! 0..=23 and weekdays 0 (Sunday)..=6; anything else is rejected with
//! `MetricsError::InvalidArgument`.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::error::{MetricsError, Result};
use crate::schedule::{adjusted_demand, DemandFactors};
use crate::series::{check_hour, check_weekday, HourlySeries};
use crate::state::{Dataset, Route, UpcomingFestival};

pub const CONFIDENCE_FLOOR: f64 = 70.0;
pub const CONFIDENCE_CEILING: f64 = 95.0;
const RAIN_PENALTY: f64 = 5.0;
const MARKET_DAY_PENALTY: f64 = 3.0;

/// Caller-supplied "now": hour of day and weekday (0 = Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayClock {
    pub hour: usize,
    pub weekday: u8,
}

impl DayClock {
    pub fn new(hour: usize, weekday: u8) -> Result<Self> {
        Ok(Self {
            hour: check_hour(hour)?,
            weekday: check_weekday(weekday)?,
        })
    }

    pub fn from_datetime<T: Datelike + Timelike>(now: &T) -> Self {
        Self {
            hour: now.hour() as usize,
            weekday: now.weekday().num_days_from_sunday() as u8,
        }
    }

    pub fn tomorrow_weekday(&self) -> u8 {
        (self.weekday + 1) % 7
    }
}

// =============================================================================
// Per-route metrics
// =============================================================================

/// Actual vs. predicted ridership through `hour`, as a percentage.
pub fn performance_ratio(actual: &HourlySeries, predicted: &HourlySeries, hour: usize) -> Result<f64> {
    let actual_sum = actual.cumulative(hour)?;
    let predicted_sum = predicted.cumulative(hour)?;
    Ok(ratio_pct(actual_sum, predicted_sum))
}

fn ratio_pct(actual_sum: u64, predicted_sum: u64) -> f64 {
    if predicted_sum == 0 {
        return 100.0;
    }
    actual_sum as f64 / predicted_sum as f64 * 100.0
}

/// Share of the route's seat capacity used in the current hour, saturating at 100.
pub fn route_load(route: &Route, actual: &HourlySeries, hour: usize, bus_capacity: u32) -> Result<u32> {
    let load = actual.get(hour)?;
    let capacity = u64::from(route.current_buses) * u64::from(bus_capacity);
    if capacity == 0 {
        return Ok(100);
    }
    let pct = (f64::from(load) / capacity as f64 * 100.0).min(100.0);
    Ok(pct.round() as u32)
}

/// `(1 - |A - P| / P) * 100` over the cumulative sums through `hour`.
///
/// Divergence beyond 100% would go negative; the result is floored at 0.
pub fn route_accuracy(actual: &HourlySeries, predicted: &HourlySeries, hour: usize) -> Result<u32> {
    let actual_sum = actual.cumulative(hour)?;
    let predicted_sum = predicted.cumulative(hour)?;
    if predicted_sum == 0 {
        return Ok(100);
    }
    let miss = actual_sum.abs_diff(predicted_sum) as f64 / predicted_sum as f64;
    Ok(((1.0 - miss) * 100.0).round().max(0.0) as u32)
}

/// Buses to field tomorrow given the forecast weather factor.
pub fn tomorrow_bus_recommendation(total_current_buses: u32, weather_factor: f64) -> Result<u32> {
    if !weather_factor.is_finite() || weather_factor < 0.0 {
        return Err(MetricsError::invalid(format!(
            "weather factor {} must be finite and non-negative",
            weather_factor
        )));
    }
    Ok((f64::from(total_current_buses) * weather_factor).ceil() as u32)
}

/// Forecast confidence for a route, in [70, 95] with one decimal.
pub fn confidence_score(
    base_accuracy: f64,
    tomorrow_rainfall: f64,
    route: &Route,
    tomorrow_weekday: u8,
) -> Result<f64> {
    let weekday = check_weekday(tomorrow_weekday)?;
    let mut score = base_accuracy;
    if tomorrow_rainfall > 0.0 {
        score -= RAIN_PENALTY;
    }
    if route.is_market_day(weekday) {
        score -= MARKET_DAY_PENALTY;
    }
    // NaN falls through both comparisons; treat it as the floor.
    let clamped = if score.is_nan() {
        CONFIDENCE_FLOOR
    } else {
        score.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
    };
    Ok((clamped * 10.0).round() / 10.0)
}

// =============================================================================
// Dashboard aggregates
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCard {
    pub route_id: String,
    pub name: String,
    pub load_pct: u32,
    pub accuracy_pct: u32,
    pub performance_pct: f64,
    pub confidence_pct: f64,
    /// Tomorrow's forecast after weather, festival and market factors.
    pub tomorrow_demand: u64,
    pub next_bus_min: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub clock: DayClock,
    /// Network-wide actual vs. predicted through the current hour.
    pub performance_pct: f64,
    pub active_buses: u32,
    pub passengers_served: u64,
    pub routes: Vec<RouteCard>,
    pub tomorrow_buses: u32,
    pub weather_factor_tomorrow: f64,
    pub adjusted_allocation: HourlySeries,
    pub prediction_accuracy: f64,
    pub accuracy_history: Vec<f64>,
    pub next_model_update: NaiveDateTime,
    pub next_festival: Option<UpcomingFestival>,
}

pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn network_performance(&self, dataset: &Dataset, hour: usize) -> Result<f64> {
        let mut actual = 0u64;
        let mut predicted = 0u64;
        for route in &dataset.routes {
            actual += dataset.actual(&route.id)?.cumulative(hour)?;
            predicted += dataset.predicted(&route.id)?.cumulative(hour)?;
        }
        Ok(ratio_pct(actual, predicted))
    }

    pub fn passengers_served(&self, dataset: &Dataset, hour: usize) -> Result<u64> {
        let mut total = 0u64;
        for series in dataset.today_actual_data.values() {
            total += series.cumulative(hour)?;
        }
        Ok(total)
    }

    pub fn route_card(&self, dataset: &Dataset, route_id: &str, clock: DayClock) -> Result<RouteCard> {
        let route = dataset.route(route_id)?;
        let actual = dataset.actual(route_id)?;
        let predicted = dataset.predicted(route_id)?;
        let factors = DemandFactors::for_tomorrow(dataset, route, clock.tomorrow_weekday())?;
        Ok(RouteCard {
            route_id: route.id.clone(),
            name: route.name.clone(),
            load_pct: route_load(route, actual, clock.hour, dataset.operational_costs.bus_capacity)?,
            accuracy_pct: route_accuracy(actual, predicted, clock.hour)?,
            performance_pct: performance_ratio(actual, predicted, clock.hour)?,
            confidence_pct: confidence_score(
                dataset.system_status.prediction_accuracy,
                dataset.weather.forecast_tomorrow.rainfall,
                route,
                clock.tomorrow_weekday(),
            )?,
            tomorrow_demand: adjusted_demand(dataset.forecast(route_id)?, factors).total(),
            next_bus_min: dataset.next_departures.get(route_id).copied(),
        })
    }

    /// Base allocation scaled by tomorrow's weather factor, rounded up per hour.
    pub fn adjusted_allocation(&self, dataset: &Dataset) -> HourlySeries {
        dataset
            .allocation_plan
            .scaled_ceil(dataset.weather.forecast_tomorrow.weather_factor)
    }

    pub fn snapshot(&self, dataset: &Dataset, clock: DayClock) -> Result<DashboardSnapshot> {
        let clock = DayClock::new(clock.hour, clock.weekday)?;
        let routes = dataset
            .routes
            .iter()
            .map(|r| self.route_card(dataset, &r.id, clock))
            .collect::<Result<Vec<_>>>()?;
        let factor = dataset.weather.forecast_tomorrow.weather_factor;
        Ok(DashboardSnapshot {
            clock,
            performance_pct: self.network_performance(dataset, clock.hour)?,
            active_buses: dataset.total_buses(),
            passengers_served: self.passengers_served(dataset, clock.hour)?,
            routes,
            tomorrow_buses: tomorrow_bus_recommendation(dataset.total_buses(), factor)?,
            weather_factor_tomorrow: factor,
            adjusted_allocation: self.adjusted_allocation(dataset),
            prediction_accuracy: dataset.system_status.prediction_accuracy,
            accuracy_history: dataset.accuracy_history.clone(),
            next_model_update: dataset.system_status.next_update,
            next_festival: dataset.festivals.next().cloned(),
        })
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn flat(v: u32) -> HourlySeries {
        HourlySeries::new([v; 24])
    }

    #[test]
    fn test_performance_ratio_zero_prediction() {
        let actual = flat(10);
        assert_eq!(performance_ratio(&actual, &flat(0), 5).unwrap(), 100.0);
    }

    #[test]
    fn test_performance_ratio_partial_day() {
        let ds = seed::dataset();
        // tp_pc through 16:00: actual 2065, predicted 2178
        let ratio = performance_ratio(ds.actual("tp_pc").unwrap(), ds.predicted("tp_pc").unwrap(), 16).unwrap();
        assert!((ratio - 2065.0 / 2178.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_route_load_scenario() {
        let ds = seed::dataset();
        let route = ds.route("tp_pc").unwrap();
        let load = route_load(route, ds.actual("tp_pc").unwrap(), 16, 45).unwrap();
        assert_eq!(load, 41);
    }

    #[test]
    fn test_route_load_saturates() {
        let ds = seed::dataset();
        let route = ds.route("tp_pc").unwrap();
        assert_eq!(route_load(route, &flat(10_000), 7, 45).unwrap(), 100);
    }

    #[test]
    fn test_route_load_zero_capacity() {
        let ds = seed::dataset();
        let mut route = ds.route("tp_pc").unwrap().clone();
        route.current_buses = 0;
        assert_eq!(route_load(&route, &flat(5), 3, 45).unwrap(), 100);
        assert_eq!(route_load(&route, &flat(5), 3, 0).unwrap(), 100);
    }

    #[test]
    fn test_route_load_rejects_bad_hour() {
        let ds = seed::dataset();
        let route = ds.route("tp_pc").unwrap();
        assert!(route_load(route, &flat(5), 24, 45).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_route_accuracy_perfect_and_floored() {
        let a = flat(50);
        assert_eq!(route_accuracy(&a, &a, 23).unwrap(), 100);
        assert_eq!(route_accuracy(&flat(300), &flat(100), 4).unwrap(), 0);
        assert_eq!(route_accuracy(&flat(3), &flat(0), 4).unwrap(), 100);
    }

    #[test]
    fn test_route_accuracy_seed_value() {
        let ds = seed::dataset();
        // |2065 - 2178| / 2178 = 5.19% miss
        let acc = route_accuracy(ds.actual("tp_pc").unwrap(), ds.predicted("tp_pc").unwrap(), 16).unwrap();
        assert_eq!(acc, 95);
    }

    #[test]
    fn test_tomorrow_buses() {
        assert_eq!(tomorrow_bus_recommendation(45, 1.15).unwrap(), 52);
        assert_eq!(tomorrow_bus_recommendation(40, 1.0).unwrap(), 40);
        assert!(tomorrow_bus_recommendation(40, f64::NAN).is_err());
        assert!(tomorrow_bus_recommendation(40, -0.5).is_err());
    }

    #[test]
    fn test_confidence_scenario() {
        let ds = seed::dataset();
        let route = ds.route("tp_pc").unwrap();
        let score = confidence_score(87.3, 8.0, route, 4).unwrap();
        assert!((score - 79.3).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn test_confidence_clamps() {
        let ds = seed::dataset();
        let route = ds.route("tp_cb").unwrap();
        assert_eq!(confidence_score(0.0, 0.0, route, 3).unwrap(), 70.0);
        assert_eq!(confidence_score(1000.0, 12.0, route, 0).unwrap(), 95.0);
        assert_eq!(confidence_score(f64::NAN, 0.0, route, 3).unwrap(), 70.0);
        assert!(confidence_score(87.3, 0.0, route, 7).is_err());
    }

    #[test]
    fn test_clock_tomorrow_wraps() {
        let clock = DayClock::new(23, 6).unwrap();
        assert_eq!(clock.tomorrow_weekday(), 0);
        assert!(DayClock::new(24, 0).is_err());
        assert!(DayClock::new(0, 7).is_err());
    }

    #[test]
    fn test_clock_from_datetime() {
        // 2025-08-30 was a Saturday
        let dt = chrono::NaiveDate::from_ymd_opt(2025, 8, 30)
            .unwrap()
            .and_hms_opt(16, 34, 0)
            .unwrap();
        let clock = DayClock::from_datetime(&dt);
        assert_eq!(clock, DayClock { hour: 16, weekday: 6 });
    }

    #[test]
    fn test_snapshot_seed() {
        let ds = seed::dataset();
        let engine = MetricsEngine::new();
        let snap = engine.snapshot(&ds, DayClock::new(16, 6).unwrap()).unwrap();
        assert_eq!(snap.active_buses, 45);
        assert_eq!(snap.tomorrow_buses, 52);
        assert_eq!(snap.routes.len(), 3);
        assert_eq!(snap.passengers_served, ds.today_actual_data.values().map(|s| s.total()).sum::<u64>());
        assert_eq!(snap.next_festival.as_ref().map(|f| f.name.as_str()), Some("Vinayaka Chaturthi"));
        // Sunday tomorrow is a market day only for tp_cb
        let cb = snap.routes.iter().find(|c| c.route_id == "tp_cb").unwrap();
        assert!((cb.confidence_pct - 79.3).abs() < 1e-9);
        let sl = snap.routes.iter().find(|c| c.route_id == "tp_sl").unwrap();
        assert!((sl.confidence_pct - 82.3).abs() < 1e-9);
        // market day lifts tp_cb above its weather-only forecast
        let cb_weather_only = adjusted_demand(
            ds.forecast("tp_cb").unwrap(),
            DemandFactors { market: 1.0, ..DemandFactors::for_tomorrow(&ds, ds.route("tp_cb").unwrap(), 0).unwrap() },
        );
        assert!(cb.tomorrow_demand > cb_weather_only.total());
        assert!(snap.routes.iter().all(|c| c.next_bus_min.is_none()));
        assert_eq!(snap.accuracy_history.len(), 7);
        assert_eq!(snap.next_model_update, ds.system_status.next_update);
    }

    #[test]
    fn test_route_card_reads_next_departure() {
        let mut ds = seed::dataset();
        ds.next_departures.insert("tp_pc".to_string(), 12);
        let card = MetricsEngine::new().route_card(&ds, "tp_pc", DayClock::new(9, 2).unwrap()).unwrap();
        assert_eq!(card.next_bus_min, Some(12));
    }

    #[test]
    fn test_snapshot_rejects_bad_clock() {
        let ds = seed::dataset();
        let bad = DayClock { hour: 30, weekday: 0 };
        assert!(MetricsEngine::new().snapshot(&ds, bad).unwrap_err().is_invalid_argument());
    }
}
