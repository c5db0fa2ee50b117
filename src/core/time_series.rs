//! Daily time series with a dense calendar index.

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use serde::ser::{Serialize, SerializeSeq, Serializer};

/// A daily time series: one value per calendar day, no gaps.
///
/// The series is stored as a start date plus a dense vector, so the index
/// of a value uniquely determines its date (`start + i days`). Model
/// outputs reuse this type and mark undefined entries (warm-up points,
/// decomposition edges) as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series starting at `start` with one value per day.
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Self {
        Self { start, values }
    }

    /// Create an empty series anchored at `start`.
    pub fn empty(start: NaiveDate) -> Self {
        Self::new(start, Vec::new())
    }

    /// Create a series from explicit dates, which must be contiguous days.
    pub fn from_dates(dates: &[NaiveDate], values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "got {} dates for {} values",
                dates.len(),
                values.len()
            )));
        }
        let Some(&start) = dates.first() else {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        };
        for pair in dates.windows(2) {
            if pair[1] != pair[0] + Duration::days(1) {
                return Err(ForecastError::InvalidParameter(format!(
                    "dates must be contiguous days, found {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        Ok(Self::new(start, values))
    }

    /// Number of days in the series.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First date of the series.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date of the series, `None` when empty.
    pub fn end(&self) -> Option<NaiveDate> {
        self.len().checked_sub(1).map(|last| self.date_at(last))
    }

    /// Date of the value at `index`.
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    /// Index of `date`, if it falls inside the series.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        usize::try_from(offset).ok().filter(|&i| i < self.len())
    }

    /// Value on `date`, if present.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.index_of(date).map(|i| self.values[i])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Iterate over all calendar dates of the series.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.len()).map(move |i| self.date_at(i))
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &v)| (self.date_at(i), v))
    }

    /// First `n` days (or the whole series if shorter).
    pub fn head(&self, n: usize) -> TimeSeries {
        let n = n.min(self.len());
        Self::new(self.start, self.values[..n].to_vec())
    }

    /// Last `n` days (or the whole series if shorter).
    pub fn tail(&self, n: usize) -> TimeSeries {
        let n = n.min(self.len());
        let offset = self.len() - n;
        Self::new(self.date_at(offset), self.values[offset..].to_vec())
    }

    /// Split into the first `at` days and the remainder.
    pub fn split_at(&self, at: usize) -> (TimeSeries, TimeSeries) {
        let at = at.min(self.len());
        (self.head(at), self.tail(self.len() - at))
    }

    /// A series starting the day after this one ends.
    pub fn continuation(&self, values: Vec<f64>) -> TimeSeries {
        Self::new(self.date_at(self.len()), values)
    }

    /// A series on the same dates with different values.
    pub fn with_values(&self, values: Vec<f64>) -> TimeSeries {
        debug_assert_eq!(values.len(), self.len());
        Self::new(self.start, values)
    }

    /// Sum of the finite values.
    pub fn sum(&self) -> f64 {
        self.values.iter().filter(|v| v.is_finite()).sum()
    }

    /// Number of finite (defined) values.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }
}

/// Serialized as a list of `{date, value}` points; undefined values become `null`.
impl Serialize for TimeSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Point {
            date: NaiveDate,
            value: Option<f64>,
        }

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (date, value) in self.iter() {
            let value = value.is_finite().then_some(value);
            seq.serialize_element(&Point { date, value })?;
        }
        seq.end()
    }
}
