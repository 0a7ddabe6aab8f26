pub mod error;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod schedule;
pub mod seed;
pub mod series;
pub mod sim;
pub mod state;
pub mod ticker;
pub mod weather;

pub use error::{MetricsError, Result};
pub use metrics::{DayClock, MetricsEngine};
pub use series::HourlySeries;
pub use state::{Config, Dataset, SharedDataset};
