use std::path::{Path, PathBuf};

use chrono::Timelike;

use crate::error::Result;
use crate::models::{DailyAggregate, Location, ScalarSeries, VariableSpec, WeeklyAggregate};

/// Writes the three tabular artifacts for one (variable, location) pair:
/// `{variable}_{location}_hourly.csv`, `..._daily.csv`, `..._weekly.csv`
/// under `<output dir>/<variable>/<location>/`.
pub struct SeriesWriter {
    output_dir: PathBuf,
}

impl SeriesWriter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn write_all(
        &self,
        variable: &VariableSpec,
        location: &Location,
        series: &ScalarSeries,
        daily: &[DailyAggregate],
        weekly: &[WeeklyAggregate],
    ) -> Result<PathBuf> {
        let dir = self.output_dir.join(&variable.name).join(&location.name);
        std::fs::create_dir_all(&dir)?;

        let stem = format!("{}_{}", variable.name, location.name);
        self.write_hourly(&dir.join(format!("{}_hourly.csv", stem)), series)?;
        self.write_daily(&dir.join(format!("{}_daily.csv", stem)), daily)?;
        self.write_weekly(&dir.join(format!("{}_weekly.csv", stem)), weekly)?;

        Ok(dir)
    }

    fn write_hourly(&self, path: &Path, series: &ScalarSeries) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["date", "hour", "value"])?;
        for &(timestamp, value) in series.points() {
            writer.write_record([
                timestamp.date().to_string(),
                timestamp.hour().to_string(),
                value.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_daily(&self, path: &Path, daily: &[DailyAggregate]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["date", "value"])?;
        for row in daily {
            writer.write_record([row.date.to_string(), row.value.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_weekly(&self, path: &Path, weekly: &[WeeklyAggregate]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["iso_year", "iso_week", "value"])?;
        for row in weekly {
            writer.write_record([
                row.iso_year.to_string(),
                row.iso_week.to_string(),
                row.value.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Aggregator, ConversionRule};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn variable() -> VariableSpec {
        VariableSpec {
            name: "temperature".to_string(),
            field_id: "T2M".to_string(),
            database_name: "M2T1NXSLV".to_string(),
            database_id: "tavg1_2d_slv_Nx".to_string(),
            conversion: ConversionRule::Identity,
            aggregator: Aggregator::Mean,
        }
    }

    #[test]
    fn test_write_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let location = Location::new("dakar".to_string(), 14.74, -17.49);

        let mut series = ScalarSeries::new();
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        series
            .append("t", date.and_hms_opt(0, 0, 0).unwrap(), 15.5)
            .unwrap();
        series
            .append("t", date.and_hms_opt(1, 0, 0).unwrap(), 16.5)
            .unwrap();

        let daily = vec![DailyAggregate { date, value: 16.0 }];
        let weekly = vec![WeeklyAggregate {
            iso_year: 2022,
            iso_week: 52,
            value: 16.0,
        }];

        let writer = SeriesWriter::new(dir.path());
        let pair_dir = writer
            .write_all(&variable(), &location, &series, &daily, &weekly)
            .unwrap();

        let hourly = std::fs::read_to_string(pair_dir.join("temperature_dakar_hourly.csv")).unwrap();
        assert_eq!(
            hourly,
            "date,hour,value\n2023-01-01,0,15.5\n2023-01-01,1,16.5\n"
        );

        let daily_csv = std::fs::read_to_string(pair_dir.join("temperature_dakar_daily.csv")).unwrap();
        assert_eq!(daily_csv, "date,value\n2023-01-01,16\n");

        let weekly_csv =
            std::fs::read_to_string(pair_dir.join("temperature_dakar_weekly.csv")).unwrap();
        assert_eq!(weekly_csv, "iso_year,iso_week,value\n2022,52,16\n");
    }
}
