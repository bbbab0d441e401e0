use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};

/// Reduction applied when collapsing hourly observations into a daily or
/// weekly value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregator {
    Mean,
    Sum,
    Max,
    Min,
}

impl Aggregator {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "mean" => Ok(Aggregator::Mean),
            "sum" => Ok(Aggregator::Sum),
            "max" => Ok(Aggregator::Max),
            "min" => Ok(Aggregator::Min),
            other => Err(ProcessingError::InvalidCatalog(format!(
                "Unknown aggregator: '{}'",
                other
            ))),
        }
    }

    /// Reduce a non-empty group of values. Callers guarantee non-emptiness;
    /// an empty group yields NaN rather than a fabricated zero.
    pub fn apply(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        match self {
            Aggregator::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregator::Sum => values.iter().sum(),
            Aggregator::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregator::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

/// Scalar unit conversion applied elementwise to raw grid values.
///
/// The catalog names these as data (`identity`, `offset(k)`, `scale(k)`)
/// rather than carrying executable expressions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConversionRule {
    Identity,
    Offset(f64),
    Scale(f64),
}

impl ConversionRule {
    pub fn from_spec(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("identity") {
            return Ok(ConversionRule::Identity);
        }

        let parse_arg = |name: &str| -> Result<f64> {
            spec[name.len()..]
                .trim()
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    ProcessingError::InvalidCatalog(format!(
                        "Malformed conversion rule: '{}'",
                        spec
                    ))
                })
        };

        let lower = spec.to_lowercase();
        if lower.starts_with("offset") {
            Ok(ConversionRule::Offset(parse_arg("offset")?))
        } else if lower.starts_with("scale") {
            Ok(ConversionRule::Scale(parse_arg("scale")?))
        } else {
            Err(ProcessingError::InvalidCatalog(format!(
                "Unknown conversion rule: '{}'",
                spec
            )))
        }
    }

    pub fn convert(&self, value: f64) -> f64 {
        match self {
            ConversionRule::Identity => value,
            ConversionRule::Offset(k) => value + k,
            ConversionRule::Scale(k) => value * k,
        }
    }
}

/// One entry of the variable catalog. Loaded once, looked up by name.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VariableSpec {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 1))]
    pub field_id: String,

    #[validate(length(min = 1))]
    pub database_name: String,

    #[validate(length(min = 1))]
    pub database_id: String,

    pub conversion: ConversionRule,

    pub aggregator: Aggregator,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_aggregator_parsing() {
        assert_eq!(Aggregator::from_name("mean").unwrap(), Aggregator::Mean);
        assert_eq!(Aggregator::from_name(" Sum ").unwrap(), Aggregator::Sum);
        assert_eq!(Aggregator::from_name("MAX").unwrap(), Aggregator::Max);
        assert_eq!(Aggregator::from_name("min").unwrap(), Aggregator::Min);
        assert!(Aggregator::from_name("median").is_err());
    }

    #[test]
    fn test_aggregator_apply() {
        let values = [10.0, 20.0, 30.0];
        assert_eq!(Aggregator::Mean.apply(&values), 20.0);
        assert_eq!(Aggregator::Sum.apply(&values), 60.0);
        assert_eq!(Aggregator::Max.apply(&values), 30.0);
        assert_eq!(Aggregator::Min.apply(&values), 10.0);
    }

    #[test]
    fn test_conversion_rule_parsing() {
        assert_eq!(
            ConversionRule::from_spec("identity").unwrap(),
            ConversionRule::Identity
        );
        assert_eq!(
            ConversionRule::from_spec("offset(-273.15)").unwrap(),
            ConversionRule::Offset(-273.15)
        );
        assert_eq!(
            ConversionRule::from_spec("scale(3600)").unwrap(),
            ConversionRule::Scale(3600.0)
        );
        assert!(ConversionRule::from_spec("eval(x * 2)").is_err());
        assert!(ConversionRule::from_spec("offset(abc)").is_err());
    }

    #[test]
    fn test_conversion_rule_convert() {
        // Kelvin to Celsius
        assert!((ConversionRule::Offset(-273.15).convert(288.15) - 15.0).abs() < 1e-9);
        // kg/m^2/s to mm/h
        assert!((ConversionRule::Scale(3600.0).convert(0.001) - 3.6).abs() < 1e-9);
        assert_eq!(ConversionRule::Identity.convert(42.0), 42.0);
    }
}
