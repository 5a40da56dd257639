//! Fixed lookback/forecast horizon.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Sampling grid and window sizes shared by the model and the pipeline.
///
/// These are configuration constants, not request parameters: every forecast
/// covers the same nominal horizon regardless of the window a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonConfig {
    pub interval_minutes: u32,
    pub lookback_days: u32,
    pub predict_days: u32,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
            lookback_days: 30,
            predict_days: 60,
        }
    }
}

impl HorizonConfig {
    pub fn new(interval_minutes: u32, lookback_days: u32, predict_days: u32) -> ForecastResult<Self> {
        let cfg = Self {
            interval_minutes,
            lookback_days,
            predict_days,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ForecastResult<()> {
        if self.interval_minutes == 0 {
            return Err(ForecastError::invalid_request("interval_minutes must be > 0"));
        }
        for (name, days) in [("lookback_days", self.lookback_days), ("predict_days", self.predict_days)] {
            if days.checked_mul(MINUTES_PER_DAY).is_none() {
                return Err(ForecastError::invalid_request(format!("{name} {days} is too large")));
            }
        }
        if self.seq_len() == 0 {
            return Err(ForecastError::invalid_request("lookback window must contain at least one row"));
        }
        if self.pred_len() == 0 {
            return Err(ForecastError::invalid_request("forecast horizon must contain at least one row"));
        }
        Ok(())
    }

    /// Lookback window length in rows.
    pub fn seq_len(&self) -> usize {
        self.rows(self.lookback_days)
    }

    /// Forecast horizon length in rows.
    pub fn pred_len(&self) -> usize {
        self.rows(self.predict_days)
    }

    fn rows(&self, days: u32) -> usize {
        let minutes = u64::from(days) * u64::from(MINUTES_PER_DAY);
        (minutes / u64::from(self.interval_minutes.max(1))) as usize
    }

    pub fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.interval_minutes))
    }
}
