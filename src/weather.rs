//! Demand multipliers from weather conditions and the festival calendar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::state::{FestivalDay, FestivalState, UpcomingFestival, WeatherSnapshot};

pub const MAX_WEATHER_FACTOR: f64 = 2.0;

fn condition_multiplier(condition: &str) -> f64 {
    match condition {
        "Heavy Rain" => 1.6,
        "Thunderstorm" => 1.4,
        "Rain" => 1.3,
        "Light Rain" | "Hot" => 1.15,
        "Cloudy" => 1.05,
        _ => 1.0,
    }
}

/// Expected demand inflation for the given conditions, capped at 2x.
pub fn weather_factor(condition: &str, rainfall: f64, temperature: f64) -> f64 {
    let mut factor = 1.0;

    if rainfall > 20.0 {
        factor *= 1.5;
    } else if rainfall > 10.0 {
        factor *= 1.3;
    } else if rainfall > 5.0 {
        factor *= 1.15;
    }

    if temperature > 35.0 {
        factor *= 1.2;
    } else if temperature < 15.0 {
        factor *= 0.9;
    }

    factor *= condition_multiplier(condition);
    f64::min(factor, MAX_WEATHER_FACTOR)
}

impl WeatherSnapshot {
    /// Snapshot whose factor is derived from its own conditions.
    pub fn observed(temp: f64, condition: &str, humidity: f64, rainfall: f64) -> Self {
        Self {
            temp,
            condition: condition.to_string(),
            humidity,
            rainfall,
            weather_factor: weather_factor(condition, rainfall, temp),
        }
    }

    pub fn derived_factor(&self) -> f64 {
        weather_factor(&self.condition, self.rainfall, self.temp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FestivalKind {
    Major,
    Regional,
    National,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestivalEntry {
    pub date: NaiveDate,
    pub name: String,
    pub impact: f64,
    pub kind: FestivalKind,
}

/// Dated festival list, kept sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FestivalCalendar {
    entries: Vec<FestivalEntry>,
}

impl FestivalCalendar {
    pub fn new(mut entries: Vec<FestivalEntry>) -> Self {
        entries.sort_by_key(|e| e.date);
        Self { entries }
    }

    /// Tamil Nadu calendar for 2025-09 through 2026-04.
    pub fn tamil_nadu() -> Self {
        let raw: [(i32, u32, u32, &str, f64, FestivalKind); 12] = [
            (2025, 9, 1, "Vinayaka Chaturthi", 1.6, FestivalKind::Major),
            (2025, 9, 17, "Onam", 1.4, FestivalKind::Regional),
            (2025, 10, 2, "Gandhi Jayanti", 1.3, FestivalKind::National),
            (2025, 10, 12, "Vijaya Dashami", 1.7, FestivalKind::Major),
            (2025, 11, 1, "Diwali", 1.8, FestivalKind::Major),
            (2025, 11, 15, "Karthikai Deepam", 1.5, FestivalKind::Regional),
            (2025, 12, 25, "Christmas", 1.4, FestivalKind::National),
            (2026, 1, 14, "Thai Pusam", 1.6, FestivalKind::Regional),
            (2026, 1, 26, "Republic Day", 1.3, FestivalKind::National),
            (2026, 2, 16, "Maha Shivratri", 1.5, FestivalKind::Major),
            (2026, 3, 14, "Holi", 1.4, FestivalKind::National),
            (2026, 4, 14, "Tamil New Year", 1.7, FestivalKind::Regional),
        ];
        Self::new(
            raw.into_iter()
                .filter_map(|(y, m, d, name, impact, kind)| {
                    NaiveDate::from_ymd_opt(y, m, d).map(|date| FestivalEntry {
                        date,
                        name: name.to_string(),
                        impact,
                        kind,
                    })
                })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[FestivalEntry] {
        &self.entries
    }

    pub fn festival_on(&self, date: NaiveDate) -> FestivalDay {
        match self.entries.iter().find(|e| e.date == date) {
            Some(e) => FestivalDay {
                is_festival: true,
                name: Some(e.name.clone()),
                impact: e.impact,
            },
            None => FestivalDay::regular(),
        }
    }

    /// Festivals strictly after `from`, soonest first.
    pub fn upcoming(&self, from: NaiveDate, limit: usize) -> Vec<UpcomingFestival> {
        self.entries
            .iter()
            .filter(|e| e.date > from)
            .take(limit)
            .map(|e| UpcomingFestival {
                date: e.date,
                name: e.name.clone(),
                impact: e.impact,
                days_away: (e.date - from).num_days(),
            })
            .collect()
    }

    /// Festival view of the dashboard as of `today`.
    pub fn state_for(&self, today: NaiveDate, limit: usize) -> FestivalState {
        let tomorrow = today.succ_opt().unwrap_or(today);
        FestivalState {
            today: self.festival_on(today),
            tomorrow: self.festival_on(tomorrow),
            upcoming: self.upcoming(today, limit),
        }
    }
}
