use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{ProcessingError, Result};

/// Ordered hourly observations for one (variable, location) pair.
///
/// Timestamps are strictly increasing; appending a duplicate or earlier
/// timestamp is a validation error. Built incrementally as grid files are
/// consumed in chronological order.
#[derive(Debug, Clone, Default)]
pub struct ScalarSeries {
    points: Vec<(NaiveDateTime, f64)>,
}

impl ScalarSeries {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn append(&mut self, series_label: &str, timestamp: NaiveDateTime, value: f64) -> Result<()> {
        if let Some(&(last, _)) = self.points.last() {
            if timestamp <= last {
                return Err(ProcessingError::DuplicateTimestamp {
                    series: series_label.to_string(),
                    timestamp: timestamp.to_string(),
                });
            }
        }
        self.points.push((timestamp, value));
        Ok(())
    }

    pub fn points(&self) -> &[(NaiveDateTime, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One aggregated value per UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: chrono::NaiveDate,
    pub value: f64,
}

/// One aggregated value per ISO-8601 (year, week).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyAggregate {
    pub iso_year: i32,
    pub iso_week: u32,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hour(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_append_in_order() {
        let mut series = ScalarSeries::new();
        series.append("t2m/dakar", hour(1, 0), 10.0).unwrap();
        series.append("t2m/dakar", hour(1, 1), 11.0).unwrap();
        series.append("t2m/dakar", hour(2, 0), 12.0).unwrap();
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_duplicate_timestamp_rejected() {
        let mut series = ScalarSeries::new();
        series.append("t2m/dakar", hour(1, 5), 10.0).unwrap();
        assert!(series.append("t2m/dakar", hour(1, 5), 10.5).is_err());
        // Going backwards is rejected too.
        assert!(series.append("t2m/dakar", hour(1, 4), 9.0).is_err());
        assert_eq!(series.len(), 1);
    }
}
