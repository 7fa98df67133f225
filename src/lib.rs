//! Planet geography library
//!
//! Derives plates, collisions, elevation and drainage over a spherical mesh.

pub mod config;
pub mod distance;
pub mod error;
pub mod export;
pub mod heightmap;
pub mod hydrology;
pub mod mesh;
pub mod parallel;
pub mod plates;
pub mod seeds;
pub mod world;

pub use config::GeoConfig;
pub use error::{GeoError, Result};
pub use mesh::{DualMesh, SphereMesh};
pub use seeds::StageSeeds;
pub use world::{generate, generate_icosphere, Geo};
