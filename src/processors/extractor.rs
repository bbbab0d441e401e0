use chrono::NaiveDateTime;

use crate::models::{ConversionRule, Location};
use crate::readers::GridSubset;

/// A timestep that could not be read or converted. Recorded, never
/// zero-filled.
#[derive(Debug, Clone)]
pub struct ExtractionGap {
    pub timestamp: Option<NaiveDateTime>,
    pub reason: String,
}

/// Result of extracting one location's series from one grid file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub points: Vec<(NaiveDateTime, f64)>,
    pub gaps: Vec<ExtractionGap>,
}

/// Pulls the nearest-gridpoint scalar series out of a grid subset, with
/// the variable's conversion rule applied elementwise.
pub struct SeriesExtractor;

impl SeriesExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        subset: &GridSubset,
        location: &Location,
        conversion: ConversionRule,
    ) -> Extraction {
        let mut extraction = Extraction::default();

        let Some((lat_idx, lon_idx)) =
            nearest_gridpoint(&subset.latitudes, &subset.longitudes, location)
        else {
            extraction.gaps.push(ExtractionGap {
                timestamp: None,
                reason: "grid file has empty coordinate axes".to_string(),
            });
            return extraction;
        };

        for time_idx in 0..subset.time_hours.len() {
            let Some(timestamp) = subset.timestamp(time_idx) else {
                extraction.gaps.push(ExtractionGap {
                    timestamp: None,
                    reason: format!("timestep {} has no valid hour", time_idx),
                });
                continue;
            };

            match subset.value_at(time_idx, lat_idx, lon_idx) {
                Some(raw) => {
                    let value = conversion.convert(raw);
                    if value.is_finite() {
                        extraction.points.push((timestamp, value));
                    } else {
                        extraction.gaps.push(ExtractionGap {
                            timestamp: Some(timestamp),
                            reason: format!("conversion produced non-finite value from {}", raw),
                        });
                    }
                }
                None => {
                    extraction.gaps.push(ExtractionGap {
                        timestamp: Some(timestamp),
                        reason: "missing observation".to_string(),
                    });
                }
            }
        }

        extraction
    }
}

impl Default for SeriesExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the gridpoint nearest to the location, by squared Euclidean
/// distance in (latitude, longitude) space. Exact ties resolve to the
/// lexicographically smaller (latitude, longitude) pair.
fn nearest_gridpoint(
    latitudes: &[f64],
    longitudes: &[f64],
    location: &Location,
) -> Option<(usize, usize)> {
    let mut best: Option<(f64, f64, f64, usize, usize)> = None;

    for (lat_idx, &lat) in latitudes.iter().enumerate() {
        for (lon_idx, &lon) in longitudes.iter().enumerate() {
            let d2 = (lat - location.latitude).powi(2) + (lon - location.longitude).powi(2);
            let candidate = (d2, lat, lon, lat_idx, lon_idx);
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    let closer = d2 < current.0
                        || (d2 == current.0 && (lat, lon) < (current.1, current.2));
                    if closer {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }
    }

    best.map(|(_, _, _, lat_idx, lon_idx)| (lat_idx, lon_idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn subset() -> GridSubset {
        GridSubset {
            database_id: "tavg1_2d_slv_Nx".to_string(),
            field_id: "T2M".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            time_hours: vec![0, 1, 2],
            latitudes: vec![14.5, 15.0],
            longitudes: vec![-17.5, -16.875],
            missing_value: 1.0e15,
            values: vec![
                vec![vec![Some(288.15), Some(290.0)], vec![Some(291.0), Some(292.0)]],
                vec![vec![None, Some(290.5)], vec![Some(291.5), Some(292.5)]],
                vec![vec![Some(289.15), Some(291.0)], vec![Some(292.0), Some(293.0)]],
            ],
        }
    }

    #[test]
    fn test_extract_nearest_with_conversion() {
        let location = Location::new("dakar".to_string(), 14.6, -17.4);
        let extraction =
            SeriesExtractor::new().extract(&subset(), &location, ConversionRule::Offset(-273.15));

        // Nearest gridpoint is (14.5, -17.5); hour 1 there is missing.
        assert_eq!(extraction.points.len(), 2);
        assert_eq!(extraction.gaps.len(), 1);
        assert!((extraction.points[0].1 - 15.0).abs() < 1e-9);
        assert!((extraction.points[1].1 - 16.0).abs() < 1e-9);
        assert_eq!(
            extraction.gaps[0].timestamp.unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 15)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_tie_break_is_lexicographic() {
        // Location equidistant from both latitude rows and both longitude
        // columns: all four corners tie; the smallest (lat, lon) wins.
        let latitudes = vec![15.0, 14.5];
        let longitudes = vec![-16.875, -17.5];
        let location = Location::new("midpoint".to_string(), 14.75, -17.1875);

        let (lat_idx, lon_idx) = nearest_gridpoint(&latitudes, &longitudes, &location).unwrap();
        assert_eq!(latitudes[lat_idx], 14.5);
        assert_eq!(longitudes[lon_idx], -17.5);
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        let latitudes = vec![14.5, 15.0];
        let longitudes = vec![-17.5, -16.875];
        let location = Location::new("midpoint".to_string(), 14.75, -17.1875);

        let first = nearest_gridpoint(&latitudes, &longitudes, &location).unwrap();
        for _ in 0..10 {
            assert_eq!(
                nearest_gridpoint(&latitudes, &longitudes, &location).unwrap(),
                first
            );
        }
        assert_eq!(latitudes[first.0], 14.5);
        assert_eq!(longitudes[first.1], -17.5);
    }

    #[test]
    fn test_empty_axes_yield_gap() {
        let mut s = subset();
        s.latitudes.clear();
        s.values.iter_mut().for_each(|v| v.clear());
        let location = Location::new("dakar".to_string(), 14.6, -17.4);

        let extraction =
            SeriesExtractor::new().extract(&s, &location, ConversionRule::Identity);
        assert!(extraction.points.is_empty());
        assert_eq!(extraction.gaps.len(), 1);
    }
}
