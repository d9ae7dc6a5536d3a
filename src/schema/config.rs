//! Configuration types for development, mutation and breeding.

use serde::{Deserialize, Serialize};

use super::gene::Organ;
use super::seed::SeedGenome;

/// Top-level configuration for a breeding run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneticsConfig {
    /// Embryonic development (decoder) parameters.
    #[serde(default)]
    pub development: DevelopmentConfig,
    /// Mutation pass parameters.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Reproductive compatibility parameters.
    #[serde(default)]
    pub breeding: BreedingConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Genome the first generation is cloned from.
    #[serde(default)]
    pub seed: SeedGenome,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Parameters of the developmental decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentConfig {
    /// Maximum number of leaf cells; further divisions are suppressed.
    #[serde(default = "default_max_cells")]
    pub max_cells: usize,
    /// Radius of the root cell.
    #[serde(default = "default_root_size")]
    pub root_size: f32,
    /// Bonds within this angle of the cut line (radians) go to both children.
    #[serde(default = "default_division_tolerance")]
    pub division_tolerance: f32,
    /// Smallest area fraction a division can give to the left child.
    #[serde(default = "default_min_ratio")]
    pub min_ratio: f32,
    /// Largest area fraction a division can give to the left child.
    #[serde(default = "default_max_ratio")]
    pub max_ratio: f32,
    /// Accepted bond length error, relative to the sum of the radii.
    #[serde(default = "default_relaxation_tolerance")]
    pub relaxation_tolerance: f32,
    /// Upper bound on cell visits in one relaxation pass.
    #[serde(default = "default_relaxation_max_visits")]
    pub relaxation_max_visits: usize,
    /// Organs a decoded body must contain to be viable.
    #[serde(default = "default_mandatory_organs")]
    pub mandatory_organs: Vec<Organ>,
}

impl Default for DevelopmentConfig {
    fn default() -> Self {
        Self {
            max_cells: default_max_cells(),
            root_size: default_root_size(),
            division_tolerance: default_division_tolerance(),
            min_ratio: default_min_ratio(),
            max_ratio: default_max_ratio(),
            relaxation_tolerance: default_relaxation_tolerance(),
            relaxation_max_visits: default_relaxation_max_visits(),
            mandatory_organs: default_mandatory_organs(),
        }
    }
}

fn default_max_cells() -> usize {
    128
}
fn default_root_size() -> f32 {
    1.0
}
fn default_division_tolerance() -> f32 {
    0.1
}
fn default_min_ratio() -> f32 {
    0.1
}
fn default_max_ratio() -> f32 {
    0.9
}
fn default_relaxation_tolerance() -> f32 {
    1e-3
}
fn default_relaxation_max_visits() -> usize {
    10_000
}
fn default_mandatory_organs() -> Vec<Organ> {
    vec![Organ::Mouth, Organ::Gonad]
}

/// Parameters of the mutation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Expected number of gene-level changes per chromosome per pass.
    #[serde(default = "default_expected_mutations")]
    pub expected_mutations: f32,
    /// Lower bound on any field's chance to mutate, before scaling.
    #[serde(default = "default_field_chance_floor")]
    pub field_chance_floor: f32,
    /// Standard deviation of the meta-parameter random walk.
    #[serde(default = "default_meta_drift")]
    pub meta_drift: f32,
    /// Chance of one new gene per existing gene per pass.
    #[serde(default = "default_insertion_rate")]
    pub insertion_rate: f32,
    /// Maximum length of a chromosome's insertion history.
    #[serde(default = "default_max_insertion_history")]
    pub max_insertion_history: usize,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            expected_mutations: default_expected_mutations(),
            field_chance_floor: default_field_chance_floor(),
            meta_drift: default_meta_drift(),
            insertion_rate: default_insertion_rate(),
            max_insertion_history: default_max_insertion_history(),
        }
    }
}

fn default_expected_mutations() -> f32 {
    2.0
}
fn default_field_chance_floor() -> f32 {
    0.005
}
fn default_meta_drift() -> f32 {
    0.005
}
fn default_insertion_rate() -> f32 {
    0.005
}
fn default_max_insertion_history() -> usize {
    64
}

/// Reproductive compatibility settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedingConfig {
    /// Largest expressed-length difference between two compatible genomes.
    #[serde(default = "default_compatibility_bound")]
    pub compatibility_bound: usize,
}

impl Default for BreedingConfig {
    fn default() -> Self {
        Self {
            compatibility_bound: default_compatibility_bound(),
        }
    }
}

fn default_compatibility_bound() -> usize {
    16
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of organisms kept alive.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Offspring conceived per generation.
    #[serde(default = "default_offspring")]
    pub offspring_per_generation: usize,
    /// Maximum number of generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            offspring_per_generation: default_offspring(),
            max_generations: default_max_generations(),
        }
    }
}

fn default_population_size() -> usize {
    32
}
fn default_offspring() -> usize {
    32
}
fn default_max_generations() -> usize {
    50
}

impl DevelopmentConfig {
    /// Validate decoder parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cells == 0 {
            return Err(ConfigError::InvalidMaxCells);
        }
        if !(self.root_size > 0.0) {
            return Err(ConfigError::InvalidRootSize);
        }
        if !(0.0..std::f32::consts::FRAC_PI_2).contains(&self.division_tolerance) {
            return Err(ConfigError::InvalidDivisionTolerance(
                self.division_tolerance,
            ));
        }
        if !(0.0 < self.min_ratio && self.min_ratio <= self.max_ratio && self.max_ratio < 1.0) {
            return Err(ConfigError::InvalidRatioBounds(
                self.min_ratio,
                self.max_ratio,
            ));
        }
        if !(self.relaxation_tolerance > 0.0) {
            return Err(ConfigError::InvalidRelaxationTolerance);
        }
        Ok(())
    }
}

impl MutationConfig {
    /// Validate mutation parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("expected_mutations", self.expected_mutations),
            ("field_chance_floor", self.field_chance_floor),
            ("meta_drift", self.meta_drift),
            ("insertion_rate", self.insertion_rate),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::NegativeRate(name.to_string(), value));
            }
        }
        Ok(())
    }
}

impl GeneticsConfig {
    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.development.validate()?;
        self.mutation.validate()?;
        if self.population.size < 2 {
            return Err(ConfigError::PopulationTooSmall);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Maximum cell count must be non-zero")]
    InvalidMaxCells,
    #[error("Root cell size must be positive")]
    InvalidRootSize,
    #[error("Division tolerance {0} must lie in [0, pi/2)")]
    InvalidDivisionTolerance(f32),
    #[error("Division ratio bounds ({0}, {1}) must satisfy 0 < min <= max < 1")]
    InvalidRatioBounds(f32, f32),
    #[error("Relaxation tolerance must be positive")]
    InvalidRelaxationTolerance,
    #[error("Rate {0} must be non-negative, got {1}")]
    NegativeRate(String, f32),
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = GeneticsConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_ratio_bounds() {
        let config = DevelopmentConfig {
            min_ratio: 0.8,
            max_ratio: 0.2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRatioBounds(..))
        ));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let config = MutationConfig {
            meta_drift: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeRate(name, _)) if name == "meta_drift"
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "development": { "max_cells": 8 }, "random_seed": 7 }"#;
        let config: GeneticsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.development.max_cells, 8);
        assert_eq!(
            config.development.mandatory_organs,
            vec![Organ::Mouth, Organ::Gonad]
        );
        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.mutation.max_insertion_history, 64);
    }

    #[test]
    fn test_serialization() {
        let config = GeneticsConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: GeneticsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.population.size, config.population.size);
    }
}
