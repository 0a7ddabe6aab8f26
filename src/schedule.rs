//! Hour-by-hour service planning from forecast demand.

use serde::Serialize;

use crate::error::Result;
use crate::series::{check_weekday, HourlySeries, HOURS_PER_DAY};
use crate::state::{Dataset, OperationalCosts, Route};

pub const MARKET_DAY_FACTOR: f64 = 1.3;

/// External multipliers applied to a route's baseline forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DemandFactors {
    pub weather: f64,
    pub festival: f64,
    pub market: f64,
}

impl DemandFactors {
    pub const NEUTRAL: DemandFactors = DemandFactors {
        weather: 1.0,
        festival: 1.0,
        market: 1.0,
    };

    /// Tomorrow's weather forecast, tomorrow's festival and the route's market calendar.
    pub fn for_tomorrow(dataset: &Dataset, route: &Route, tomorrow_weekday: u8) -> Result<Self> {
        let weekday = check_weekday(tomorrow_weekday)?;
        Ok(Self {
            weather: dataset.weather.forecast_tomorrow.weather_factor,
            festival: dataset.festivals.tomorrow.impact,
            market: if route.is_market_day(weekday) { MARKET_DAY_FACTOR } else { 1.0 },
        })
    }

    pub fn combined(&self) -> f64 {
        self.weather * self.festival * self.market
    }
}

/// Baseline demand with each factor applied in turn, truncating to whole
/// passengers after every step.
pub fn adjusted_demand(base: &HourlySeries, factors: DemandFactors) -> HourlySeries {
    let mut out = [0u32; HOURS_PER_DAY];
    for (slot, v) in out.iter_mut().zip(base.iter()) {
        let mut demand = v;
        for factor in [factors.weather, factors.festival, factors.market] {
            demand = (f64::from(demand) * factor).floor().max(0.0) as u32;
        }
        *slot = demand;
    }
    HourlySeries::new(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServicePlan {
    pub buses: u32,
    /// Minutes between departures.
    pub headway_min: u32,
}

/// Buses and headway for one hour of forecast demand.
pub fn service_plan(demand: u32) -> ServicePlan {
    let (buses, headway_min) = match demand {
        0 => (0, 120),
        1..=20 => (1, 90),
        21..=45 => (1, 60),
        46..=90 => (2, 45),
        91..=135 => (2, 30),
        136..=200 => (3, 25),
        201..=300 => (4, 20),
        301..=400 => (5, 15),
        _ => {
            let buses = demand.div_ceil(45).clamp(3, 8);
            (buses, (60 / buses.saturating_sub(2).max(1)).max(10))
        }
    };
    ServicePlan { buses, headway_min }
}

/// Operating cost for one hour of the plan on a route of `distance_km`.
pub fn hourly_cost(plan: ServicePlan, distance_km: f64, costs: &OperationalCosts) -> f64 {
    if plan.buses == 0 {
        return 0.0;
    }
    let trips_per_hour = if plan.headway_min > 0 {
        60.0 / f64::from(plan.headway_min)
    } else {
        0.0
    };
    let buses = f64::from(plan.buses);
    let per_km = costs.fuel_per_km + costs.maintenance_per_km;
    distance_km * per_km * trips_per_hour * buses + costs.driver_salary_per_hour * buses
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourPlan {
    pub hour: usize,
    pub demand: u32,
    pub plan: ServicePlan,
    pub cost: f64,
    /// Demand over seats fielded, capped at 1.
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPlan {
    pub route_id: String,
    pub factors: DemandFactors,
    pub hours: Vec<HourPlan>,
    pub total_demand: u64,
    pub total_cost: f64,
    pub peak_buses: u32,
}

pub fn daily_plan(route: &Route, forecast: &HourlySeries, costs: &OperationalCosts) -> Result<DailyPlan> {
    let mut hours = Vec::with_capacity(HOURS_PER_DAY);
    for hour in 0..HOURS_PER_DAY {
        let demand = forecast.get(hour)?;
        let plan = service_plan(demand);
        let seats = f64::from(plan.buses) * f64::from(costs.bus_capacity);
        hours.push(HourPlan {
            hour,
            demand,
            plan,
            cost: hourly_cost(plan, route.distance, costs),
            utilization: if seats > 0.0 { (f64::from(demand) / seats).min(1.0) } else { 0.0 },
        });
    }
    Ok(DailyPlan {
        route_id: route.id.clone(),
        factors: DemandFactors::NEUTRAL,
        total_demand: forecast.total(),
        total_cost: hours.iter().map(|h| h.cost).sum(),
        peak_buses: hours.iter().map(|h| h.plan.buses).max().unwrap_or(0),
        hours,
    })
}

/// Plan for tomorrow from the route's forecast adjusted by external factors.
pub fn tomorrow_plan(dataset: &Dataset, route_id: &str, tomorrow_weekday: u8) -> Result<DailyPlan> {
    let route = dataset.route(route_id)?;
    let factors = DemandFactors::for_tomorrow(dataset, route, tomorrow_weekday)?;
    let demand = adjusted_demand(dataset.forecast(route_id)?, factors);
    let mut plan = daily_plan(route, &demand, &dataset.operational_costs)?;
    plan.factors = factors;
    Ok(plan)
}
