//! Resampling raw sales observations onto a daily calendar.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};

/// Units sold on one day for a single SKU.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub quantity: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, quantity: f64) -> Self {
        Self { date, quantity }
    }
}

/// A sales line from a multi-SKU table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub sku: String,
    pub date: NaiveDate,
    pub quantity: f64,
}

/// Build a contiguous daily series from unordered observations.
///
/// The series spans the earliest to the latest date inclusive. Quantities
/// on the same date are summed and days without sales are zero.
///
/// # Errors
/// `InsufficientData` for empty input, `InvalidParameter` for a negative
/// or non-finite quantity.
///
/// # Example
/// ```
/// use restock_forecast::preparation::{prepare, Observation};
/// use chrono::NaiveDate;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
/// let series = prepare(&[
///     Observation::new(day(3), 2.0),
///     Observation::new(day(1), 4.0),
///     Observation::new(day(3), 1.0),
/// ])
/// .unwrap();
///
/// assert_eq!(series.start(), day(1));
/// assert_eq!(series.values(), &[4.0, 0.0, 3.0]);
/// ```
pub fn prepare(observations: &[Observation]) -> Result<TimeSeries> {
    if let Some(bad) = observations
        .iter()
        .find(|o| !o.quantity.is_finite() || o.quantity < 0.0)
    {
        return Err(ForecastError::InvalidParameter(format!(
            "quantity on {} must be a non-negative number, got {}",
            bad.date, bad.quantity
        )));
    }

    let (Some(first), Some(last)) = (
        observations.iter().map(|o| o.date).min(),
        observations.iter().map(|o| o.date).max(),
    ) else {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    };

    let days = (last - first).num_days() as usize + 1;
    let mut values = vec![0.0; days];
    for o in observations {
        values[(o.date - first).num_days() as usize] += o.quantity;
    }

    Ok(TimeSeries::new(first, values))
}

/// Group sales records by SKU and prepare one daily series per SKU.
///
/// SKUs are returned in lexical order. Any invalid record fails the whole
/// batch, naming the offending SKU.
pub fn prepare_by_sku(records: &[SalesRecord]) -> Result<BTreeMap<String, TimeSeries>> {
    let mut grouped: BTreeMap<&str, Vec<Observation>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.sku.as_str())
            .or_default()
            .push(Observation::new(record.date, record.quantity));
    }

    grouped
        .into_iter()
        .map(|(sku, observations)| {
            let series = prepare(&observations).map_err(|e| match e {
                ForecastError::InvalidParameter(msg) => {
                    ForecastError::InvalidParameter(format!("sku {sku}: {msg}"))
                }
                other => other,
            })?;
            tracing::debug!(sku, days = series.len(), "prepared daily series");
            Ok((sku.to_string(), series))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn fills_gaps_and_sums_duplicates() {
        let series = prepare(&[
            Observation::new(day(5), 1.0),
            Observation::new(day(2), 3.0),
            Observation::new(day(5), 2.0),
        ])
        .unwrap();

        assert_eq!(series.start(), day(2));
        assert_eq!(series.end(), Some(day(5)));
        assert_eq!(series.values(), &[3.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn spans_month_boundary() {
        let series = prepare(&[
            Observation::new(day(28), 1.0),
            Observation::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 1.0),
        ])
        .unwrap();
        // 2024 is a leap year: 28, 29, 1
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn single_observation() {
        let series = prepare(&[Observation::new(day(1), 7.0)]).unwrap();
        assert_eq!(series.values(), &[7.0]);
    }

    #[test]
    fn rejects_empty_and_invalid() {
        assert_eq!(
            prepare(&[]),
            Err(ForecastError::InsufficientData { needed: 1, got: 0 })
        );
        assert!(matches!(
            prepare(&[Observation::new(day(1), -1.0)]),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            prepare(&[Observation::new(day(1), f64::NAN)]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn groups_records_by_sku() {
        let record = |sku: &str, d, q| SalesRecord {
            sku: sku.to_string(),
            date: day(d),
            quantity: q,
        };
        let by_sku = prepare_by_sku(&[
            record("B", 1, 1.0),
            record("A", 3, 2.0),
            record("B", 3, 5.0),
            record("A", 3, 1.0),
        ])
        .unwrap();

        let skus: Vec<&str> = by_sku.keys().map(String::as_str).collect();
        assert_eq!(skus, vec!["A", "B"]);
        assert_eq!(by_sku["A"].values(), &[3.0]);
        assert_eq!(by_sku["B"].values(), &[1.0, 0.0, 5.0]);
    }

    #[test]
    fn invalid_record_names_its_sku() {
        let err = prepare_by_sku(&[SalesRecord {
            sku: "SKU-9".to_string(),
            date: day(1),
            quantity: -3.0,
        }])
        .unwrap_err();
        assert!(err.to_string().contains("SKU-9"));
    }
}
