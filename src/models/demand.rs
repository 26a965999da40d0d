//! Demand forecasting payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observed data point for `POST demand/submit/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandDataPoint {
    pub city: String,
    pub date: NaiveDate,
    pub donation_volume: u32,
    pub request_volume: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_event: Option<String>,
}

/// One forecast record from `GET demand/forecast/`. Field names come from
/// the forecasting model's output frame.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastPoint {
    /// Forecast date.
    pub ds: NaiveDate,
    /// Predicted demand volume.
    pub yhat: f64,
}
