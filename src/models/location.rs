use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Location {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl Location {
    pub fn new(name: String, latitude: f64, longitude: f64) -> Self {
        Self {
            name,
            latitude,
            longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_validation() {
        let loc = Location::new("dakar".to_string(), 14.74, -17.49);
        assert!(loc.validate().is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        let loc = Location::new("nowhere".to_string(), 91.0, -17.49);
        assert!(loc.validate().is_err());

        let loc = Location::new("nowhere".to_string(), 14.74, 181.0);
        assert!(loc.validate().is_err());
    }
}
