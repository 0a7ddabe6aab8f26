use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{MetricsError, Result};
use crate::series::HourlySeries;

#[derive(Clone, Debug)]
pub struct Config {
    /// Seconds between simulated ridership updates.
    pub tick_secs: u64,
    /// Seconds between accuracy/health drift updates.
    pub drift_secs: u64,
    /// Period used for the "next refresh" countdown shown on the dashboard.
    pub countdown_secs: u64,
    pub dataset_path: Option<String>,
    pub sim_seed: Option<u64>,
    /// Stop the live loop after this many seconds (runs until Ctrl-C when unset).
    pub run_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            tick_secs: std::env::var("TICK_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            drift_secs: std::env::var("DRIFT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(60),
            countdown_secs: std::env::var("COUNTDOWN_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            dataset_path: std::env::var("DATASET_PATH").ok().filter(|p| !p.is_empty()),
            sim_seed: std::env::var("SIM_SEED").ok().and_then(|v| v.parse().ok()),
            run_secs: std::env::var("RUN_SECS").ok().and_then(|v| v.parse().ok()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_secs: 30,
            drift_secs: 60,
            countdown_secs: 30,
            dataset_path: None,
            sim_seed: None,
            run_secs: None,
        }
    }
}

// =============================================================================
// Reference data
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    /// Kilometres, one way.
    pub distance: f64,
    /// Scheduled minutes, one way.
    pub travel_time: u32,
    pub current_buses: u32,
    pub daily_passengers: u32,
    /// Weekday indices, 0 = Sunday.
    pub market_days: Vec<u8>,
    pub route_type: String,
}

impl Route {
    pub fn is_market_day(&self, weekday: u8) -> bool {
        self.market_days.contains(&weekday)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temp: f64,
    pub condition: String,
    pub humidity: f64,
    /// Millimetres.
    pub rainfall: f64,
    /// Published demand multiplier. Files may omit it; `Dataset::load` then
    /// derives it from the conditions.
    #[serde(default)]
    pub weather_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    pub current: WeatherSnapshot,
    pub forecast_tomorrow: WeatherSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestivalDay {
    pub is_festival: bool,
    pub name: Option<String>,
    pub impact: f64,
}

impl FestivalDay {
    pub fn regular() -> Self {
        Self {
            is_festival: false,
            name: None,
            impact: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingFestival {
    pub date: NaiveDate,
    pub name: String,
    pub impact: f64,
    pub days_away: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestivalState {
    pub today: FestivalDay,
    pub tomorrow: FestivalDay,
    /// Ascending by date.
    pub upcoming: Vec<UpcomingFestival>,
}

impl FestivalState {
    pub fn next(&self) -> Option<&UpcomingFestival> {
        self.upcoming.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    Excellent,
    Good,
    Fair,
}

impl Health {
    pub const ALL: [Health; 3] = [Health::Excellent, Health::Good, Health::Fair];

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Excellent => "Excellent",
            Health::Good => "Good",
            Health::Fair => "Fair",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub last_update: NaiveDateTime,
    pub next_update: NaiveDateTime,
    pub prediction_accuracy: f64,
    pub system_health: Health,
    pub auto_updates: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalCosts {
    pub fuel_per_km: f64,
    pub driver_salary_per_hour: f64,
    pub maintenance_per_km: f64,
    /// Passengers per bus.
    pub bus_capacity: u32,
}

// =============================================================================
// Dataset
// =============================================================================

/// Everything the dashboard reads, owned in one place.
///
/// Only the simulation ticks mutate it (`today_actual_data`,
/// `system_status.prediction_accuracy`, `system_status.system_health`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub current_date: NaiveDate,
    pub timezone: String,
    pub routes: Vec<Route>,
    #[serde(rename = "weather_data")]
    pub weather: WeatherState,
    pub festivals: FestivalState,
    pub today_actual_data: BTreeMap<String, HourlySeries>,
    pub today_predicted_data: BTreeMap<String, HourlySeries>,
    pub tomorrow_predictions: BTreeMap<String, HourlySeries>,
    pub system_status: SystemStatus,
    pub operational_costs: OperationalCosts,
    /// Base buses required per hour before weather adjustment.
    pub allocation_plan: HourlySeries,
    /// Daily accuracy percentages, Monday first.
    #[serde(default)]
    pub accuracy_history: Vec<f64>,
    /// Minutes until each route's next departure, redrawn every data tick.
    #[serde(default)]
    pub next_departures: BTreeMap<String, u32>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| MetricsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut dataset: Dataset = serde_json::from_str(&raw)?;
        for snapshot in [&mut dataset.weather.current, &mut dataset.weather.forecast_tomorrow] {
            if snapshot.weather_factor == 0.0 {
                snapshot.weather_factor = snapshot.derived_factor();
            }
        }
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for route in &self.routes {
            if !seen.insert(route.id.as_str()) {
                return Err(MetricsError::dataset(format!("duplicate route id {}", route.id)));
            }
            if let Some(day) = route.market_days.iter().find(|d| **d > 6) {
                return Err(MetricsError::dataset(format!(
                    "route {} has market day {} outside 0..=6",
                    route.id, day
                )));
            }
            for (label, map) in [
                ("today_actual_data", &self.today_actual_data),
                ("today_predicted_data", &self.today_predicted_data),
                ("tomorrow_predictions", &self.tomorrow_predictions),
            ] {
                if !map.contains_key(&route.id) {
                    return Err(MetricsError::dataset(format!("{} missing route {}", label, route.id)));
                }
            }
        }
        if self.operational_costs.bus_capacity == 0 {
            return Err(MetricsError::dataset("bus_capacity must be positive"));
        }
        if self
            .festivals
            .upcoming
            .windows(2)
            .any(|w| w[0].date > w[1].date)
        {
            return Err(MetricsError::dataset("upcoming festivals must be ordered by date"));
        }
        for (label, snapshot) in [
            ("current", &self.weather.current),
            ("forecast_tomorrow", &self.weather.forecast_tomorrow),
        ] {
            if !snapshot.weather_factor.is_finite() || snapshot.weather_factor <= 0.0 {
                return Err(MetricsError::dataset(format!(
                    "{} weather_factor {} must be positive",
                    label, snapshot.weather_factor
                )));
            }
        }
        if !self.system_status.prediction_accuracy.is_finite() {
            return Err(MetricsError::dataset("prediction_accuracy must be finite"));
        }
        Ok(())
    }

    pub fn route(&self, id: &str) -> Result<&Route> {
        self.routes
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| MetricsError::unknown_route(id))
    }

    pub fn actual(&self, id: &str) -> Result<&HourlySeries> {
        self.today_actual_data.get(id).ok_or_else(|| MetricsError::unknown_route(id))
    }

    pub fn predicted(&self, id: &str) -> Result<&HourlySeries> {
        self.today_predicted_data.get(id).ok_or_else(|| MetricsError::unknown_route(id))
    }

    pub fn forecast(&self, id: &str) -> Result<&HourlySeries> {
        self.tomorrow_predictions.get(id).ok_or_else(|| MetricsError::unknown_route(id))
    }

    /// Weekday (0 = Sunday) of the day after `current_date`.
    pub fn tomorrow_weekday(&self) -> u8 {
        (self.current_date.weekday().num_days_from_sunday() as u8 + 1) % 7
    }

    pub fn total_buses(&self) -> u32 {
        self.routes.iter().map(|r| r.current_buses).sum()
    }

    /// Hex SHA-256 of the canonical JSON encoding.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

// =============================================================================
// Shared handle
// =============================================================================

/// Dataset handle shared between the tick tasks and readers.
///
/// Writers hold the lock for a whole tick; readers clone a snapshot before
/// computing anything.
#[derive(Clone, Debug)]
pub struct SharedDataset {
    inner: Arc<RwLock<Dataset>>,
}

impl SharedDataset {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            inner: Arc::new(RwLock::new(dataset)),
        }
    }

    pub fn snapshot(&self) -> Dataset {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update<T>(&self, f: impl FnOnce(&mut Dataset) -> T) -> T {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}
