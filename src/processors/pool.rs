use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Location, ScalarSeries, VariableSpec};
use crate::processors::aggregation::AggregationEngine;
use crate::processors::extractor::SeriesExtractor;
use crate::processors::summary::PairSummary;
use crate::readers::GridReader;
use crate::utils::filename::parse_grid_file_name;
use crate::utils::progress::ProgressReporter;
use crate::writers::SeriesWriter;

/// Drives extraction and aggregation for every (variable, location)
/// pair across a fixed worker pool.
///
/// Each pair is wholly owned by the worker that processes it, and grid
/// files are consumed strictly one at a time, so peak memory stays
/// bounded no matter how long the requested date range is.
pub struct ProcessingPool {
    workers: usize,
}

impl ProcessingPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Process every pair and write the hourly/daily/weekly artifacts.
    /// Pairs with partial or no data still complete; the shortfall shows
    /// up in their summaries.
    pub fn process_all(
        &self,
        variables: &[VariableSpec],
        locations: &[Location],
        raw_dir: &Path,
        output_dir: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<PairSummary>> {
        let pairs: Vec<(&VariableSpec, &Location)> = variables
            .iter()
            .flat_map(|v| locations.iter().map(move |l| (v, l)))
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| crate::error::ProcessingError::Config(e.to_string()))?;

        let processed_count = AtomicUsize::new(0);

        let mut summaries: Vec<PairSummary> = pool.install(|| {
            pairs
                .par_iter()
                .map(|(variable, location)| {
                    let result = self.process_pair(variable, location, raw_dir, output_dir);

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.increment(1);
                        p.set_message(&format!("Processed {}/{} pairs", count, pairs.len()));
                    }

                    result
                })
                .collect::<Result<Vec<_>>>()
        })?;

        summaries.sort_by(|a, b| {
            a.variable
                .cmp(&b.variable)
                .then_with(|| a.location.cmp(&b.location))
        });

        Ok(summaries)
    }

    fn process_pair(
        &self,
        variable: &VariableSpec,
        location: &Location,
        raw_dir: &Path,
        output_dir: &Path,
    ) -> Result<PairSummary> {
        let files = variable_files(&raw_dir.join(&variable.name), &variable.database_id)?;

        let reader = GridReader::new();
        let extractor = SeriesExtractor::new();
        let label = format!("{}/{}", variable.name, location.name);

        let mut series = ScalarSeries::new();
        let mut gap_count = 0usize;
        let mut files_used = 0usize;
        let mut files_skipped = 0usize;

        for (_, path) in &files {
            // One decoded file at a time per worker.
            let subset = match reader.read(path) {
                Ok(subset) => subset,
                Err(e) => {
                    warn!(%label, path = %path.display(), error = %e, "skipping unreadable grid file");
                    files_skipped += 1;
                    continue;
                }
            };

            if subset.field_id != variable.field_id {
                warn!(%label, path = %path.display(), "skipping file with foreign field");
                files_skipped += 1;
                continue;
            }

            let extraction = extractor.extract(&subset, location, variable.conversion);

            // Files sorted by date can still collide: a stale copy of the
            // same day under a different bounding box survives a location
            // change, and a file may repeat entries on its own time axis.
            let last_seen = series.points().last().map(|&(ts, _)| ts);
            let in_order = extraction
                .points
                .first()
                .map_or(true, |&(first, _)| last_seen.map_or(true, |last| first > last))
                && extraction.points.windows(2).all(|w| w[0].0 < w[1].0);
            if !in_order {
                warn!(%label, path = %path.display(), "skipping file with overlapping or repeated timestamps");
                files_skipped += 1;
                continue;
            }

            gap_count += extraction.gaps.len();
            for (timestamp, value) in extraction.points {
                series.append(&label, timestamp, value)?;
            }
            files_used += 1;
        }

        let engine = AggregationEngine::new();
        let daily = engine.daily(&series, variable.aggregator);
        let weekly = engine.weekly(&series, variable.aggregator);

        if series.is_empty() {
            warn!(%label, "no usable data, writing no output");
        } else {
            SeriesWriter::new(output_dir).write_all(variable, location, &series, &daily, &weekly)?;
            info!(
                %label,
                observations = series.len(),
                days = daily.len(),
                weeks = weekly.len(),
                "series written"
            );
        }

        Ok(PairSummary {
            variable: variable.name.clone(),
            location: location.name.clone(),
            observations: series.len(),
            days: daily.len(),
            weeks: weekly.len(),
            gap_count,
            files_used,
            files_skipped,
        })
    }
}

impl Default for ProcessingPool {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

/// All raw grid files for one variable, sorted chronologically. A
/// missing directory just means nothing was downloaded yet.
fn variable_files(var_dir: &Path, database_id: &str) -> Result<Vec<(NaiveDate, PathBuf)>> {
    let mut files = Vec::new();

    let entries = match std::fs::read_dir(var_dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(files),
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(parsed) = parse_grid_file_name(name) else {
            continue;
        };
        if parsed.database_id == database_id {
            files.push((parsed.date, path));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Aggregator, ConversionRule, FetchUnit, GridBounds};
    use crate::readers::GridSubset;
    use crate::utils::filename::grid_file_name;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn variable() -> VariableSpec {
        VariableSpec {
            name: "temperature".to_string(),
            field_id: "T2M".to_string(),
            database_name: "M2T1NXSLV".to_string(),
            database_id: "tavg1_2d_slv_Nx".to_string(),
            conversion: ConversionRule::Offset(-273.15),
            aggregator: Aggregator::Mean,
        }
    }

    fn bounds() -> GridBounds {
        GridBounds {
            lat_min: 209,
            lat_max: 209,
            lon_min: 260,
            lon_max: 260,
        }
    }

    fn day_subset(variable: &VariableSpec, date: NaiveDate) -> GridSubset {
        GridSubset {
            database_id: variable.database_id.clone(),
            field_id: variable.field_id.clone(),
            date,
            time_hours: (0..24).collect(),
            latitudes: vec![14.5],
            longitudes: vec![-17.5],
            missing_value: 1.0e15,
            values: (0..24)
                .map(|h| vec![vec![Some(288.15 + h as f64)]])
                .collect(),
        }
    }

    fn write_subset(raw_dir: &Path, variable: &VariableSpec, bounds: GridBounds, subset: &GridSubset) {
        let unit = FetchUnit::new(variable.clone(), subset.date, bounds);
        let dir = raw_dir.join(&variable.name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(grid_file_name(&unit).unwrap()),
            serde_json::to_string(subset).unwrap(),
        )
        .unwrap();
    }

    fn write_grid_file(raw_dir: &Path, variable: &VariableSpec, date: NaiveDate) {
        write_subset(raw_dir, variable, bounds(), &day_subset(variable, date));
    }

    #[test]
    fn test_process_pair_end_to_end() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let variable = variable();
        let location = Location::new("dakar".to_string(), 14.74, -17.49);

        write_grid_file(raw.path(), &variable, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        write_grid_file(raw.path(), &variable, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());

        let summaries = ProcessingPool::new(2)
            .process_all(
                &[variable],
                std::slice::from_ref(&location),
                raw.path(),
                out.path(),
                None,
            )
            .unwrap();

        assert_eq!(summaries.len(), 1);
        let pair = &summaries[0];
        assert_eq!(pair.observations, 48);
        assert_eq!(pair.days, 2);
        assert_eq!(pair.files_used, 2);
        assert_eq!(pair.gap_count, 0);

        let hourly = std::fs::read_to_string(
            out.path()
                .join("temperature/dakar/temperature_dakar_hourly.csv"),
        )
        .unwrap();
        assert_eq!(hourly.lines().count(), 49); // header + 48 rows
        assert!(hourly.contains("2023-01-01,0,15"));
    }

    #[test]
    fn test_unreadable_file_is_skipped_not_fatal() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let variable = variable();
        let location = Location::new("dakar".to_string(), 14.74, -17.49);

        write_grid_file(raw.path(), &variable, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());

        // A corrupt file alongside the good one.
        let unit = FetchUnit::new(
            variable.clone(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            bounds(),
        );
        std::fs::write(
            raw.path()
                .join(&variable.name)
                .join(grid_file_name(&unit).unwrap()),
            b"{\"truncated",
        )
        .unwrap();

        let summaries = ProcessingPool::new(1)
            .process_all(
                &[variable],
                std::slice::from_ref(&location),
                raw.path(),
                out.path(),
                None,
            )
            .unwrap();

        let pair = &summaries[0];
        assert_eq!(pair.files_used, 1);
        assert_eq!(pair.files_skipped, 1);
        assert_eq!(pair.observations, 24);
    }

    #[test]
    fn test_stale_duplicate_date_file_is_skipped() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let variable = variable();
        let location = Location::new("dakar".to_string(), 14.74, -17.49);
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

        write_grid_file(raw.path(), &variable, date);

        // The same day under a wider box, left behind by an earlier run
        // with a different location set.
        let wide = GridBounds {
            lat_min: 198,
            lat_max: 210,
            lon_min: 255,
            lon_max: 265,
        };
        write_subset(raw.path(), &variable, wide, &day_subset(&variable, date));

        let summaries = ProcessingPool::new(1)
            .process_all(
                std::slice::from_ref(&variable),
                std::slice::from_ref(&location),
                raw.path(),
                out.path(),
                None,
            )
            .unwrap();

        let pair = &summaries[0];
        assert_eq!(pair.observations, 24);
        assert_eq!(pair.files_used, 1);
        assert_eq!(pair.files_skipped, 1);
    }

    #[test]
    fn test_repeated_time_axis_entry_is_skipped() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let variable = variable();
        let location = Location::new("dakar".to_string(), 14.74, -17.49);
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

        // 24 entries, but hour 4 appears twice.
        let mut subset = day_subset(&variable, date);
        subset.time_hours[5] = 4;
        write_subset(raw.path(), &variable, bounds(), &subset);

        let summaries = ProcessingPool::new(1)
            .process_all(
                std::slice::from_ref(&variable),
                std::slice::from_ref(&location),
                raw.path(),
                out.path(),
                None,
            )
            .unwrap();

        let pair = &summaries[0];
        assert_eq!(pair.observations, 0);
        assert_eq!(pair.files_used, 0);
        assert_eq!(pair.files_skipped, 1);
    }

    #[test]
    fn test_missing_variable_dir_yields_empty_pair() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let location = Location::new("dakar".to_string(), 14.74, -17.49);

        let summaries = ProcessingPool::new(1)
            .process_all(
                &[variable()],
                std::slice::from_ref(&location),
                raw.path(),
                out.path(),
                None,
            )
            .unwrap();

        assert_eq!(summaries[0].observations, 0);
        assert!(!out.path().join("temperature").exists());
    }
}
