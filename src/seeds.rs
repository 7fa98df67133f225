//! Seed management for geography generation
//!
//! Each stage that consumes randomness gets its own seed, derived from a master seed by
//! default. Every stage builds a fresh RNG from its seed, so the stages stay reproducible
//! on their own and an override for one stage leaves the others untouched.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeds for all generation stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Plate seeding, growth and velocity targets
    pub plates: u64,
    /// Ocean/continent classification of plates
    pub oceans: u64,
    /// Volcano selection among collision regions
    pub volcanoes: u64,
    /// Tie-breaking order of the elevation distance fields
    pub distance: u64,
    /// Coherent noise applied to elevation
    pub noise: u64,
    /// Visitation order and epsilon of sink filling
    pub fill: u64,
}

impl StageSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            plates: derive_seed(master, "plates"),
            oceans: derive_seed(master, "oceans"),
            volcanoes: derive_seed(master, "volcanoes"),
            distance: derive_seed(master, "distance"),
            noise: derive_seed(master, "noise"),
            fill: derive_seed(master, "fill"),
        }
    }

    /// Create a builder for customizing individual seeds
    pub fn builder(master: u64) -> StageSeedsBuilder {
        StageSeedsBuilder::new(master)
    }

    /// Fresh generator for one stage.
    pub fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }
}

/// Builder for overriding individual stage seeds while deriving the rest from master
pub struct StageSeedsBuilder {
    seeds: StageSeeds,
}

impl StageSeedsBuilder {
    pub fn new(master: u64) -> Self {
        Self {
            seeds: StageSeeds::from_master(master),
        }
    }

    /// Override the plate seed
    pub fn plates(mut self, seed: u64) -> Self {
        self.seeds.plates = seed;
        self
    }

    /// Override the ocean classification seed
    pub fn oceans(mut self, seed: u64) -> Self {
        self.seeds.oceans = seed;
        self
    }

    /// Override the volcano selection seed
    pub fn volcanoes(mut self, seed: u64) -> Self {
        self.seeds.volcanoes = seed;
        self
    }

    /// Override the distance field tie-breaking seed
    pub fn distance(mut self, seed: u64) -> Self {
        self.seeds.distance = seed;
        self
    }

    /// Override the noise seed
    pub fn noise(mut self, seed: u64) -> Self {
        self.seeds.noise = seed;
        self
    }

    /// Override the sink filling seed
    pub fn fill(mut self, seed: u64) -> Self {
        self.seeds.fill = seed;
        self
    }

    pub fn build(self) -> StageSeeds {
        self.seeds
    }
}

/// Derive a sub-seed from a master seed and a stage name.
fn derive_seed(master: u64, stage: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    stage.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for StageSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StageSeeds {{ master: {}, plates: {}, oceans: {}, volcanoes: {}, \
             distance: {}, noise: {}, fill: {} }}",
            self.master,
            self.plates,
            self.oceans,
            self.volcanoes,
            self.distance,
            self.noise,
            self.fill,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_derivation() {
        assert_eq!(StageSeeds::from_master(12345), StageSeeds::from_master(12345));
    }

    #[test]
    fn test_stages_get_different_seeds() {
        let seeds = StageSeeds::from_master(12345);
        assert_ne!(seeds.plates, seeds.oceans);
        assert_ne!(seeds.oceans, seeds.noise);
        assert_ne!(seeds.distance, seeds.fill);
    }

    #[test]
    fn test_builder_override() {
        let seeds = StageSeeds::builder(12345).noise(99999).build();
        assert_eq!(seeds.noise, 99999);

        let derived = StageSeeds::from_master(12345);
        assert_eq!(seeds.plates, derived.plates);
        assert_eq!(seeds.fill, derived.fill);
    }

    #[test]
    fn test_builder_covers_every_stage() {
        let seeds = StageSeeds::builder(1)
            .plates(10)
            .oceans(11)
            .volcanoes(12)
            .distance(13)
            .noise(14)
            .fill(15)
            .build();
        assert_eq!(seeds.master, 1);
        assert_eq!(
            [seeds.plates, seeds.oceans, seeds.volcanoes, seeds.distance, seeds.noise, seeds.fill],
            [10, 11, 12, 13, 14, 15]
        );
    }
}
