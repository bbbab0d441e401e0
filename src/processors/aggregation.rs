use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::{Aggregator, DailyAggregate, ScalarSeries, WeeklyAggregate};

/// Reduces an hourly series into daily and weekly series.
///
/// Grouping is by UTC calendar date and by ISO-8601 (year, week). Periods
/// with zero observations are omitted entirely, so partial coverage never
/// fabricates data. BTreeMap grouping keeps output independent of
/// processing order.
pub struct AggregationEngine;

impl AggregationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn daily(&self, series: &ScalarSeries, aggregator: Aggregator) -> Vec<DailyAggregate> {
        let mut groups: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for &(timestamp, value) in series.points() {
            groups.entry(timestamp.date()).or_default().push(value);
        }

        groups
            .into_iter()
            .map(|(date, values)| DailyAggregate {
                date,
                value: aggregator.apply(&values),
            })
            .collect()
    }

    pub fn weekly(&self, series: &ScalarSeries, aggregator: Aggregator) -> Vec<WeeklyAggregate> {
        let mut groups: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
        for &(timestamp, value) in series.points() {
            let week = timestamp.date().iso_week();
            groups
                .entry((week.year(), week.week()))
                .or_default()
                .push(value);
        }

        groups
            .into_iter()
            .map(|((iso_year, iso_week), values)| WeeklyAggregate {
                iso_year,
                iso_week,
                value: aggregator.apply(&values),
            })
            .collect()
    }
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new()
    }
}
