//! Generation request parameters and validation.

use crate::biomes::{Humidity, Temperature};
use crate::generator::GenerationError;
use crate::grid::DistanceMetric;

/// Everything needed to generate one exterior map. Serializable so requests
/// can arrive as JSON files or be embedded in test fixtures.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GenerationRequest {
    /// Target map width in pixels; height follows at a fixed aspect.
    pub pixel_width: u32,
    /// Hex cell size in pixels.
    pub hex_size: u32,
    /// Probability that a hex starts as land.
    pub initial_land_pct: f32,
    /// Minimum land fraction for an acceptable map.
    pub required_land_pct: f32,
    /// Number of cellular-automaton growth passes per attempt.
    pub terraform_iterations: u32,
    /// Islands below this hex count dissolve back into ocean.
    pub min_island_size: usize,
    pub temperature: Temperature,
    pub humidity: Humidity,
    /// Bounds on each region's random expansion budget.
    pub min_region_expansions: u32,
    pub max_region_expansions: u32,
    /// Regions below this fraction of total hexes merge into a neighbor.
    pub min_region_size_pct: f32,
    #[serde(default = "default_pointy")]
    pub pointy: bool,
    #[serde(default)]
    pub metric: DistanceMetric,
    /// Cap on randomize/terraform attempts before giving up.
    #[serde(default = "default_max_terraform_attempts")]
    pub max_terraform_attempts: u32,
}

fn default_pointy() -> bool {
    true
}

fn default_max_terraform_attempts() -> u32 {
    32
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            pixel_width: 1000,
            hex_size: 10,
            initial_land_pct: 0.4,
            required_land_pct: 0.3,
            terraform_iterations: 20,
            min_island_size: 12,
            temperature: Temperature::Temperate,
            humidity: Humidity::Average,
            min_region_expansions: 2,
            max_region_expansions: 7,
            min_region_size_pct: 0.04,
            pointy: default_pointy(),
            metric: DistanceMetric::default(),
            max_terraform_attempts: default_max_terraform_attempts(),
        }
    }
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.hex_size == 0 {
            return Err(GenerationError::invalid("hex_size must be positive"));
        }
        if self.pixel_width < self.hex_size * 4 {
            return Err(GenerationError::invalid(
                "pixel_width must fit at least a few hexes",
            ));
        }
        for (name, value) in [
            ("initial_land_pct", self.initial_land_pct),
            ("required_land_pct", self.required_land_pct),
            ("min_region_size_pct", self.min_region_size_pct),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GenerationError::invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.min_region_expansions > self.max_region_expansions {
            return Err(GenerationError::invalid(
                "min_region_expansions exceeds max_region_expansions",
            ));
        }
        if self.max_terraform_attempts == 0 {
            return Err(GenerationError::invalid(
                "max_terraform_attempts must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_is_valid() {
        assert!(GenerationRequest::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_pct_is_rejected() {
        let mut request = GenerationRequest::default();
        request.initial_land_pct = 1.5;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_inverted_expansion_bounds_are_rejected() {
        let mut request = GenerationRequest::default();
        request.min_region_expansions = 9;
        request.max_region_expansions = 3;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_request_round_trips_through_json() {
        let request = GenerationRequest::default();
        let json = serde_json::to_string(&request).unwrap();
        let back: GenerationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pixel_width, request.pixel_width);
        assert_eq!(back.temperature, request.temperature);
        assert_eq!(back.pointy, request.pointy);
    }
}
