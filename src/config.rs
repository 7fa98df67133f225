//! Generation parameters and configuration
//!
//! Everything tunable about a run lives in [`GeoConfig`]. It can be built in code,
//! loaded from JSON, and is validated once before generation starts.

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{GeoError, Result};
use crate::mesh::MAX_SUBDIVISIONS;

/// How plates grow outward from their seeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PlateGrowth {
    /// Flood fill popping a uniformly random frontier region each step
    #[default]
    RandomFlood,
    /// Cheapest-first expansion where entering a region costs a noise sample
    NoiseWeighted,
    /// Every region joins the seed nearest to it on the sphere
    NearestSeed,
}

impl PlateGrowth {
    pub fn all() -> &'static [Self] {
        &[Self::RandomFlood, Self::NoiseWeighted, Self::NearestSeed]
    }
}

impl std::fmt::Display for PlateGrowth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RandomFlood => write!(f, "random-flood"),
            Self::NoiseWeighted => write!(f, "noise-weighted"),
            Self::NearestSeed => write!(f, "nearest-seed"),
        }
    }
}

/// How plates are picked to be oceanic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OceanSelection {
    /// Shuffle the plates and make the first `round(fraction * plates)` oceanic
    Quota { fraction: f64 },
    /// Each plate is oceanic independently with `probability`
    Bernoulli { probability: f64 },
}

impl Default for OceanSelection {
    fn default() -> Self {
        Self::Quota { fraction: 0.5 }
    }
}

/// Which neighbor wins when a boundary region touches several foreign regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CompressionExtremum {
    /// The most convergent neighbor
    #[default]
    Max,
    /// The most divergent neighbor
    Min,
}

/// How the coherent noise sample is combined with elevation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NoiseMode {
    /// `e * (1 + amplitude * n)`
    Multiplicative,
    /// `e + amplitude * n`
    #[default]
    Additive,
}

/// Step height sink filling enforces between a region and its outlet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FillEpsilon {
    /// Same epsilon on every pass
    Fixed { epsilon: f32 },
    /// Redrawn each pass from `[0.5, 1.5) * base`, avoiding perfectly flat plateaus
    Randomized { base: f32 },
}

impl Default for FillEpsilon {
    fn default() -> Self {
        Self::Fixed { epsilon: 1e-5 }
    }
}

/// Full configuration of a generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Master seed every stage seed is derived from
    pub seed: u64,

    /// Icosphere subdivision level of the bundled mesh (regions = 10 * 4^n + 2)
    pub subdivisions: u32,

    /// Requested plate count; clamped to the region count
    pub plate_count: usize,

    /// Number of volcano regions picked among collision regions
    pub volcano_count: usize,

    pub ocean_selection: OceanSelection,

    pub plate_growth: PlateGrowth,

    pub compression_extremum: CompressionExtremum,

    /// Square positive elevations to sharpen peaks
    pub tectonic_falloff: bool,

    /// Scale negative elevations to [-1, 0] and positive ones to [0, 1]
    pub normalize_elevation: bool,

    pub noise_mode: NoiseMode,

    /// Strength of the noise sample in either mode
    pub noise_amplitude: f32,

    pub fill_epsilon: FillEpsilon,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            subdivisions: 5,
            plate_count: 12,
            volcano_count: 5,
            ocean_selection: OceanSelection::default(),
            plate_growth: PlateGrowth::default(),
            compression_extremum: CompressionExtremum::default(),
            tectonic_falloff: true,
            normalize_elevation: true,
            noise_mode: NoiseMode::default(),
            noise_amplitude: 0.2,
            fill_epsilon: FillEpsilon::default(),
        }
    }
}

impl GeoConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| GeoError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| GeoError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject settings no stage can interpret.
    pub fn validate(&self) -> Result<()> {
        if self.plate_count == 0 {
            return Err(GeoError::NoPlates);
        }
        if self.subdivisions > MAX_SUBDIVISIONS {
            return Err(GeoError::ResolutionTooLarge(self.subdivisions));
        }
        match self.ocean_selection {
            OceanSelection::Quota { fraction } => check_fraction("ocean fraction", fraction)?,
            OceanSelection::Bernoulli { probability } => {
                check_fraction("ocean probability", probability)?
            }
        }
        if !self.noise_amplitude.is_finite() || self.noise_amplitude < 0.0 {
            return Err(GeoError::InvalidNoiseAmplitude(self.noise_amplitude));
        }
        let epsilon = match self.fill_epsilon {
            FillEpsilon::Fixed { epsilon } => epsilon,
            FillEpsilon::Randomized { base } => base,
        };
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(GeoError::InvalidFillEpsilon(epsilon));
        }
        Ok(())
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GeoError::FractionOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GeoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_fraction() {
        let config = GeoConfig {
            ocean_selection: OceanSelection::Bernoulli { probability: 1.5 },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GeoError::FractionOutOfRange { name: "ocean probability", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_plates() {
        let config = GeoConfig {
            plate_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GeoError::NoPlates)));
    }

    #[test]
    fn test_rejects_unusable_fill_epsilon() {
        for fill_epsilon in [
            FillEpsilon::Fixed { epsilon: f32::NAN },
            FillEpsilon::Fixed { epsilon: 0.0 },
            FillEpsilon::Randomized { base: -1e-5 },
            FillEpsilon::Randomized { base: f32::INFINITY },
        ] {
            let config = GeoConfig {
                fill_epsilon,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(GeoError::InvalidFillEpsilon(_))),
                "{:?} accepted",
                fill_epsilon
            );
        }

        let config = GeoConfig {
            fill_epsilon: FillEpsilon::Randomized { base: 1e-4 },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "seed": 42,
            "plate_count": 20,
            "ocean_selection": { "mode": "bernoulli", "probability": 0.3 },
            "plate_growth": "nearest_seed"
        }"#;
        let config: GeoConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.plate_count, 20);
        assert_eq!(config.plate_growth, PlateGrowth::NearestSeed);
        assert_eq!(config.ocean_selection, OceanSelection::Bernoulli { probability: 0.3 });
        assert_eq!(config.volcano_count, GeoConfig::default().volcano_count);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = GeoConfig::from_json_file(Path::new("/nonexistent/geo.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/geo.json"));
    }
}
