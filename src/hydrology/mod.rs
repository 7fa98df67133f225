//! Drainage over the sphere
//!
//! - **Downhill**: steepest strictly-lower neighbor of every region
//! - **Downflow**: triangle spanning structure ordered from the ocean inland
//! - **Fill**: Planchon-Darboux removal of interior depressions

pub mod downflow;
pub mod downhill;
pub mod fill;

pub use downflow::{assign_downflow, triangle_elevations, Downflow};
pub use downhill::{assign_downhill, region_slopes, sinks};
pub use fill::fill_sinks;

/// Elevation of the sea surface.
pub const SEA_LEVEL: f32 = 0.0;
