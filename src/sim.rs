//! Simulated live updates: per-hour ridership jitter, accuracy drift and
//! health relabelling.
//!
//! Randomness always comes from a caller-supplied `RandomSource`, so a
//! scripted source makes every tick reproducible.

use std::collections::VecDeque;

use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::Result;
use crate::series::{check_hour, HourlySeries};
use crate::state::{Dataset, Health};

pub const ACCURACY_FLOOR: f64 = 75.0;
pub const ACCURACY_CEILING: f64 = 95.0;
pub const NEXT_BUS_MIN_MIN: u32 = 5;
pub const NEXT_BUS_MAX_MIN: u32 = 29;

/// Uniform samples in [0, 1).
pub trait RandomSource {
    fn unit(&mut self) -> f64;
}

/// Adapter over any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: VecDeque<f64>,
}

impl ScriptedSource {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl RandomSource for ScriptedSource {
    fn unit(&mut self) -> f64 {
        match self.values.pop_front() {
            Some(v) => {
                self.values.push_back(v);
                v.clamp(0.0, 1.0 - f64::EPSILON)
            }
            None => 0.5,
        }
    }
}

/// Nudge `series[hour]` by an integer in [-10, 10), saturating at 0 and `u32::MAX`.
///
/// Hours with no riders yet are left alone. Returns the change actually stored.
pub fn simulate_hourly_jitter<S: RandomSource + ?Sized>(
    series: &mut HourlySeries,
    hour: usize,
    rng: &mut S,
) -> Result<Option<i64>> {
    let current = series.get(check_hour(hour)?)?;
    if current == 0 {
        return Ok(None);
    }
    let delta = ((rng.unit() - 0.5) * 20.0).floor() as i32;
    let next = current.saturating_add_signed(delta);
    series.set(hour, next)?;
    Ok(Some(i64::from(next) - i64::from(current)))
}

/// Move accuracy by a value in [-1, 1), clamped to [75, 95].
pub fn simulate_accuracy_drift<S: RandomSource + ?Sized>(current: f64, rng: &mut S) -> f64 {
    let variation = (rng.unit() - 0.5) * 2.0;
    (current + variation).clamp(ACCURACY_FLOOR, ACCURACY_CEILING)
}

/// Minutes until the next departure, 5..=29.
pub fn simulate_next_bus<S: RandomSource + ?Sized>(rng: &mut S) -> u32 {
    let span = (NEXT_BUS_MAX_MIN - NEXT_BUS_MIN_MIN + 1) as f64;
    NEXT_BUS_MIN_MIN + ((rng.unit() * span).floor() as u32).min(NEXT_BUS_MAX_MIN - NEXT_BUS_MIN_MIN)
}

pub fn simulate_health<S: RandomSource + ?Sized>(rng: &mut S) -> Health {
    let idx = (rng.unit() * Health::ALL.len() as f64).floor() as usize;
    Health::ALL[idx.min(Health::ALL.len() - 1)]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTick {
    pub hour: usize,
    /// (route id, applied delta) for every route that had riders this hour.
    pub deltas: Vec<(String, i64)>,
}

/// Jitter the current hour of every route's actual series.
pub fn data_tick<S: RandomSource + ?Sized>(dataset: &mut Dataset, hour: usize, rng: &mut S) -> Result<DataTick> {
    let hour = check_hour(hour)?;
    let mut deltas = Vec::new();
    for (route_id, series) in dataset.today_actual_data.iter_mut() {
        if let Some(delta) = simulate_hourly_jitter(series, hour, rng)? {
            deltas.push((route_id.clone(), delta));
        }
    }
    Ok(DataTick { hour, deltas })
}

/// Redraw the next-departure countdown of every route.
pub fn dispatch_tick<S: RandomSource + ?Sized>(dataset: &mut Dataset, rng: &mut S) -> Vec<(String, u32)> {
    let ids: Vec<String> = dataset.routes.iter().map(|r| r.id.clone()).collect();
    ids.into_iter()
        .map(|id| {
            let minutes = simulate_next_bus(rng);
            dataset.next_departures.insert(id.clone(), minutes);
            (id, minutes)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemTick {
    pub previous_accuracy: f64,
    pub accuracy: f64,
    pub health: Health,
}

/// Drift prediction accuracy and relabel system health.
pub fn system_tick<S: RandomSource + ?Sized>(dataset: &mut Dataset, rng: &mut S) -> SystemTick {
    let status = &mut dataset.system_status;
    let previous_accuracy = status.prediction_accuracy;
    status.system_health = simulate_health(rng);
    status.prediction_accuracy = simulate_accuracy_drift(previous_accuracy, rng);
    status.last_update = Local::now().naive_local();
    SystemTick {
        previous_accuracy,
        accuracy: status.prediction_accuracy,
        health: status.system_health,
    }
}
