//! Hour-of-day ridership series.
//!
//! Every series carries exactly one count per hour (0..=23). Hours that have
//! not happened yet in an "actual" series are zero.

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

pub const HOURS_PER_DAY: usize = 24;

/// Reject hour indices outside 0..=23.
pub fn check_hour(hour: usize) -> Result<usize> {
    if hour < HOURS_PER_DAY {
        Ok(hour)
    } else {
        Err(MetricsError::invalid(format!(
            "hour {} outside 0..={}",
            hour,
            HOURS_PER_DAY - 1
        )))
    }
}

/// Reject weekday indices outside 0 (Sunday)..=6 (Saturday).
pub fn check_weekday(weekday: u8) -> Result<u8> {
    if weekday < 7 {
        Ok(weekday)
    } else {
        Err(MetricsError::invalid(format!("weekday {} outside 0..=6", weekday)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct HourlySeries([u32; HOURS_PER_DAY]);

impl HourlySeries {
    pub fn zeros() -> Self {
        Self([0; HOURS_PER_DAY])
    }

    pub fn new(values: [u32; HOURS_PER_DAY]) -> Self {
        Self(values)
    }

    pub fn from_slice(values: &[u32]) -> Result<Self> {
        let arr: [u32; HOURS_PER_DAY] = values
            .try_into()
            .map_err(|_| MetricsError::SeriesLength { len: values.len() })?;
        Ok(Self(arr))
    }

    pub fn get(&self, hour: usize) -> Result<u32> {
        Ok(self.0[check_hour(hour)?])
    }

    pub fn set(&mut self, hour: usize, value: u32) -> Result<()> {
        self.0[check_hour(hour)?] = value;
        Ok(())
    }

    /// Sum of hours 0..=hour.
    pub fn cumulative(&self, hour: usize) -> Result<u64> {
        let hour = check_hour(hour)?;
        Ok(self.0[..=hour].iter().map(|&v| u64::from(v)).sum())
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&v| u64::from(v)).sum()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Element-wise `ceil(value * factor)`.
    pub fn scaled_ceil(&self, factor: f64) -> Self {
        let mut out = [0u32; HOURS_PER_DAY];
        for (slot, &v) in out.iter_mut().zip(self.0.iter()) {
            *slot = (f64::from(v) * factor).ceil().max(0.0) as u32;
        }
        Self(out)
    }
}

impl Default for HourlySeries {
    fn default() -> Self {
        Self::zeros()
    }
}

impl TryFrom<Vec<u32>> for HourlySeries {
    type Error = MetricsError;

    fn try_from(values: Vec<u32>) -> Result<Self> {
        Self::from_slice(&values)
    }
}

impl From<HourlySeries> for Vec<u32> {
    fn from(series: HourlySeries) -> Self {
        series.0.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> HourlySeries {
        let mut values = [0u32; HOURS_PER_DAY];
        for (i, v) in values.iter_mut().enumerate() {
            *v = i as u32;
        }
        HourlySeries::new(values)
    }

    #[test]
    fn test_cumulative_is_inclusive() {
        let s = ramp();
        assert_eq!(s.cumulative(0).unwrap(), 0);
        assert_eq!(s.cumulative(3).unwrap(), 6);
        assert_eq!(s.cumulative(23).unwrap(), s.total());
    }

    #[test]
    fn test_hour_out_of_range_rejected() {
        let s = ramp();
        assert!(s.get(24).unwrap_err().is_invalid_argument());
        assert!(s.cumulative(100).unwrap_err().is_invalid_argument());
        assert!(check_weekday(7).is_err());
        assert_eq!(check_weekday(6).unwrap(), 6);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = HourlySeries::from_slice(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, MetricsError::SeriesLength { len: 3 }));
    }

    #[test]
    fn test_json_length_is_enforced() {
        let ok: HourlySeries = serde_json::from_str(&serde_json::to_string(&vec![1u32; 24]).unwrap()).unwrap();
        assert_eq!(ok.total(), 24);
        assert!(serde_json::from_str::<HourlySeries>("[1,2,3]").is_err());
        assert!(serde_json::from_str::<HourlySeries>(&format!("{:?}", vec![-1i32; 24])).is_err());
    }

    #[test]
    fn test_scaled_ceil() {
        let s = HourlySeries::from_slice(&[8, 6, 4, 3, 5, 12, 25, 35, 32, 20, 18, 15, 14, 13, 12, 11, 28, 38, 35, 25, 18, 15, 12, 10]).unwrap();
        let adjusted = s.scaled_ceil(1.15);
        assert_eq!(adjusted.get(0).unwrap(), 10); // ceil(9.2)
        assert_eq!(adjusted.get(17).unwrap(), 44); // ceil(43.7)
        assert_eq!(s.scaled_ceil(1.0), s);
    }
}
