//! Structured JSON-lines logging for the dashboard.
//!
//! Every record carries a run id, a monotonically increasing sequence number
//! and an RFC3339 timestamp. Records go to stdout; when `LOG_DIR` is set they
//! are also appended to `<LOG_DIR>/<run_id>/{events,trace}.jsonl`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use crate::report::DashboardView;
use crate::schedule::DailyPlan;
use crate::sim::{DataTick, SystemTick};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

const LEVELS: [Level; 5] = [Level::Trace, Level::Debug, Level::Info, Level::Warn, Level::Error];

impl Level {
    /// Case-insensitive lookup by name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        LEVELS.into_iter().find(|l| l.as_str().eq_ignore_ascii_case(name))
    }

    /// Threshold from `LOG_LEVEL`; unknown or unset values mean info.
    pub fn from_env() -> Self {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Level::parse(&v))
            .unwrap_or(Level::Info)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Metrics,  // Derived KPIs, dashboard views
    Sim,      // Simulated jitter and drift
    Schedule, // Service plans and costs
    System,   // Startup, shutdown, config
    Profile,  // Timing
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Metrics => "metrics",
            Domain::Sim => "sim",
            Domain::Schedule => "schedule",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        match std::env::var("LOG_DOMAINS") {
            Ok(list) => self.listed_in(&list),
            Err(_) => true,
        }
    }

    /// `list` is comma-separated; an empty list or "all" enables everything.
    fn listed_in(&self, list: &str) -> bool {
        let mut names = list.split(',').map(str::trim).filter(|n| !n.is_empty()).peekable();
        if names.peek().is_none() {
            return true;
        }
        names.any(|n| n == "all" || n == self.as_str())
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunSinks {
    events: Mutex<BufWriter<File>>,
    trace: Mutex<BufWriter<File>>,
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    sinks: Option<RunSinks>,
}

fn open_sinks(run_id: &str) -> Option<RunSinks> {
    let base = std::env::var("LOG_DIR").ok()?;
    let mut run_dir = PathBuf::from(base);
    run_dir.push(run_id);
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir: {}", err);
        return None;
    }
    let _ = std::fs::write(
        run_dir.join("manifest.json"),
        json!({
            "run_id": run_id,
            "ts": ts_now(),
            "pid": process::id(),
            "log_dir": run_dir.to_string_lossy(),
        })
        .to_string(),
    );
    let open = |name: &str| match File::create(run_dir.join(name)) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", name, err);
            None
        }
    };
    Some(RunSinks {
        events: open("events.jsonl")?,
        trace: open("trace.jsonl")?,
    })
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let sinks = open_sinks(&run_id);
        RunContext { run_id, sinks }
    })
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["route_id", "task", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Mutex<BufWriter<File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

pub fn ts_epoch_secs() -> u64 {
    Utc::now().timestamp() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    let line = build_record(level, domain, event, fields);
    let ctx = ensure_run_context();
    if let Some(sinks) = &ctx.sinks {
        match level {
            Level::Trace | Level::Debug => write_line(&sinks.trace, &line),
            _ => write_line(&sinks.events, &line),
        }
    }
    println!("{}", line);
}

fn build_record(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) -> String {
    let ctx = ensure_run_context();
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry).to_string()
}

// =============================================================================
// Domain-specific helpers
// =============================================================================

pub fn log_startup(dataset_fingerprint: &str, routes: usize, tick_secs: u64, drift_secs: u64, seeded: bool) {
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("dataset_sha256", v_str(dataset_fingerprint)),
            ("routes", json!(routes)),
            ("tick_secs", json!(tick_secs)),
            ("drift_secs", json!(drift_secs)),
            ("seeded", json!(seeded)),
        ]),
    );
}

pub fn log_data_tick(tick: &DataTick) {
    for (route_id, delta) in &tick.deltas {
        log(
            Level::Debug,
            Domain::Sim,
            "jitter",
            obj(&[
                ("route_id", v_str(route_id)),
                ("hour", json!(tick.hour)),
                ("delta", json!(delta)),
            ]),
        );
    }
}

pub fn log_system_tick(tick: &SystemTick) {
    log(
        Level::Info,
        Domain::Sim,
        "accuracy_drift",
        obj(&[
            ("previous", v_num(tick.previous_accuracy)),
            ("accuracy", v_num(tick.accuracy)),
            ("health", v_str(tick.health.as_str())),
        ]),
    );
}

pub fn log_plan(plan: &DailyPlan) {
    log(
        Level::Info,
        Domain::Schedule,
        "daily_plan",
        obj(&[
            ("route_id", v_str(&plan.route_id)),
            ("total_demand", json!(plan.total_demand)),
            ("peak_buses", json!(plan.peak_buses)),
            ("total_cost", v_num(plan.total_cost)),
            ("demand_factor", v_num(plan.factors.combined())),
        ]),
    );
}

pub fn log_dashboard(view: &DashboardView) {
    let fields = match serde_json::to_value(view) {
        Ok(Value::Object(map)) => map,
        Ok(other) => obj(&[("view", other)]),
        Err(err) => obj(&[("msg", v_str(&format!("unserializable view: {}", err)))]),
    };
    log(Level::Info, Domain::Metrics, "dashboard", fields);
}

pub fn log_error(domain: Domain, event: &str, err: &dyn std::fmt::Display) {
    log(Level::Error, domain, event, obj(&[("msg", v_str(&err.to_string()))]));
}

pub fn log_session_summary(duration_secs: u64, data_ticks: u64, system_ticks: u64, final_accuracy: f64) {
    log(
        Level::Info,
        Domain::System,
        "session_summary",
        obj(&[
            ("duration_secs", json!(duration_secs)),
            ("data_ticks", json!(data_ticks)),
            ("system_ticks", json!(system_ticks)),
            ("final_accuracy", v_num(final_accuracy)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits elapsed time at trace level on drop.
pub struct ProfileScope {
    label: &'static str,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        log(
            Level::Trace,
            Domain::Profile,
            "profile",
            obj(&[("label", v_str(self.label)), ("elapsed_ms", v_num(elapsed_ms))]),
        );
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("WARN"), Some(Level::Warn));
        assert_eq!(Level::parse(" debug "), Some(Level::Debug));
        assert_eq!(Level::parse("fatal"), None);
        assert_eq!(Level::parse(""), None);
    }

    #[test]
    fn test_domain_list() {
        assert!(Domain::Sim.listed_in("metrics, sim"));
        assert!(!Domain::Schedule.listed_in("metrics,sim"));
        assert!(Domain::Profile.listed_in("all"));
        assert!(Domain::System.listed_in(" , "));
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m.get("key").unwrap(), "value");
        assert_eq!(m.get("num").unwrap(), 42.0);
    }

    #[test]
    fn test_seq_increments() {
        let s1 = next_seq();
        let s2 = next_seq();
        assert!(s2 > s1);
    }

    #[test]
    fn test_record_hoists_route_id() {
        let line = build_record(
            Level::Debug,
            Domain::Sim,
            "jitter",
            obj(&[("route_id", v_str("tp_pc")), ("delta", json!(-3))]),
        );
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["route_id"], "tp_pc");
        assert_eq!(parsed["component"], "sim");
        assert_eq!(parsed["lvl"], "DEBUG");
        assert_eq!(parsed["data"]["delta"], -3);
        assert!(parsed["data"].get("route_id").is_none());
    }
}
