//! Display formatting for dashboard values.

use serde::Serialize;

use crate::metrics::DashboardSnapshot;

/// `value` with `decimals` fixed places and a trailing `%`.
pub fn fmt_pct(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// Deviation from plan, e.g. `+2.1%` or `-5.2%`.
pub fn fmt_trend(performance_pct: f64) -> String {
    let delta = performance_pct - 100.0;
    let rounded = format!("{:.1}", delta);
    if delta > 0.0 && rounded != "0.0" {
        format!("+{}%", rounded)
    } else if rounded == "-0.0" {
        "0.0%".to_string()
    } else {
        format!("{}%", rounded)
    }
}

/// Integer with comma thousands separators.
pub fn fmt_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Seconds until the next multiple of `period_secs`, as `MM:SS`.
///
/// Exactly on a boundary the countdown shows the full period.
pub fn refresh_countdown(now_epoch_secs: u64, period_secs: u64) -> String {
    let period = period_secs.max(1);
    let remaining = period - (now_epoch_secs % period);
    format!("{:02}:{:02}", remaining / 60, remaining % 60)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteView {
    pub route_id: String,
    pub name: String,
    pub load: String,
    pub accuracy: String,
    pub confidence: String,
    pub next_bus: String,
    pub tomorrow_demand: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub performance: String,
    pub performance_trend: String,
    pub trend_up: bool,
    pub active_buses: String,
    pub passengers_served: String,
    pub tomorrow_buses: String,
    pub prediction_accuracy: String,
    pub next_update: String,
    pub next_model_update: String,
    pub accuracy_history: Vec<String>,
    pub next_festival: Option<String>,
    pub routes: Vec<RouteView>,
    pub allocation: Vec<u32>,
}

impl DashboardView {
    pub fn render(snapshot: &DashboardSnapshot, now_epoch_secs: u64, countdown_secs: u64) -> Self {
        let routes = snapshot
            .routes
            .iter()
            .map(|card| RouteView {
                route_id: card.route_id.clone(),
                name: card.name.clone(),
                load: fmt_pct(f64::from(card.load_pct), 0),
                accuracy: fmt_pct(f64::from(card.accuracy_pct), 0),
                confidence: fmt_pct(card.confidence_pct, 1),
                next_bus: card
                    .next_bus_min
                    .map(|m| format!("{} min", m))
                    .unwrap_or_else(|| "--".to_string()),
                tomorrow_demand: fmt_count(card.tomorrow_demand),
            })
            .collect();
        Self {
            performance: fmt_pct(snapshot.performance_pct, 1),
            performance_trend: fmt_trend(snapshot.performance_pct),
            trend_up: snapshot.performance_pct >= 100.0,
            active_buses: snapshot.active_buses.to_string(),
            passengers_served: fmt_count(snapshot.passengers_served),
            tomorrow_buses: snapshot.tomorrow_buses.to_string(),
            prediction_accuracy: fmt_pct(snapshot.prediction_accuracy, 1),
            next_update: refresh_countdown(now_epoch_secs, countdown_secs),
            next_model_update: snapshot.next_model_update.format("%Y-%m-%d %H:%M").to_string(),
            accuracy_history: snapshot.accuracy_history.iter().map(|a| fmt_pct(*a, 1)).collect(),
            next_festival: snapshot
                .next_festival
                .as_ref()
                .map(|f| format!("{} in {} days (x{:.1})", f.name, f.days_away, f.impact)),
            routes,
            allocation: snapshot.adjusted_allocation.as_slice().to_vec(),
        }
    }
}
