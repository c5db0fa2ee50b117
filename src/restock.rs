//! Turning a demand forecast into a reorder recommendation.

use serde::Serialize;

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::utils::stats::round_to;

/// Guards the days-of-stock division when forecast demand is zero.
const DEMAND_EPSILON: f64 = 1e-9;

/// Reorder advice for one SKU.
///
/// Quantities are rounded to whole units and `days_of_stock_remaining` to
/// one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestockRecommendation {
    pub current_stock: f64,
    pub forecasted_demand_total: f64,
    pub demand_during_lead_time: f64,
    pub recommended_order_qty: f64,
    pub days_of_stock_remaining: f64,
    pub reorder_alert: bool,
}

/// Recommend an order quantity from a forecast.
///
/// The order covers the whole forecast horizon inflated by
/// `safety_factor`, net of stock on hand. An alert is raised when current
/// stock runs out before a new order could arrive.
///
/// # Errors
/// `InvalidParameter` for negative or non-finite stock, a safety factor
/// below 1, or an empty or non-finite forecast.
///
/// # Example
/// ```
/// use restock_forecast::core::TimeSeries;
/// use restock_forecast::restock::recommend;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let forecast = TimeSeries::new(start, vec![10.0; 30]);
///
/// let rec = recommend(&forecast, 100.0, 7, 1.2).unwrap();
/// assert_eq!(rec.forecasted_demand_total, 300.0);
/// assert_eq!(rec.demand_during_lead_time, 70.0);
/// assert_eq!(rec.recommended_order_qty, 260.0);
/// assert!(!rec.reorder_alert);
/// ```
pub fn recommend(
    forecast: &TimeSeries,
    current_stock: f64,
    lead_time_days: u32,
    safety_factor: f64,
) -> Result<RestockRecommendation> {
    if !current_stock.is_finite() || current_stock < 0.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "current_stock must be a non-negative number, got {current_stock}"
        )));
    }
    if !safety_factor.is_finite() || safety_factor < 1.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "safety_factor must be at least 1.0, got {safety_factor}"
        )));
    }
    let demand = forecast.values();
    if demand.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "forecast must not be empty".to_string(),
        ));
    }
    if demand.iter().any(|d| !d.is_finite()) {
        return Err(ForecastError::InvalidParameter(
            "forecast contains non-finite values".to_string(),
        ));
    }

    // A model extrapolating below zero means no demand that day.
    let demand: Vec<f64> = demand.iter().map(|d| d.max(0.0)).collect();
    let total: f64 = demand.iter().sum();
    let lead = (lead_time_days as usize).min(demand.len());
    let during_lead: f64 = demand[..lead].iter().sum();
    let order = (total * safety_factor - current_stock).max(0.0);
    let daily_avg = total / demand.len() as f64;
    let days_remaining = current_stock / (daily_avg + DEMAND_EPSILON);

    Ok(RestockRecommendation {
        current_stock,
        forecasted_demand_total: total.round(),
        demand_during_lead_time: during_lead.round(),
        recommended_order_qty: order.round(),
        days_of_stock_remaining: round_to(days_remaining, 1),
        reorder_alert: days_remaining < f64::from(lead_time_days),
    })
}
