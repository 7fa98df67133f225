//! Geography pipeline
//!
//! Runs every stage in order (plates, collisions, compression, elevation, drainage) and
//! bundles the published arrays into a single struct.

use glam::Vec3;
use rand::Rng;
use tracing::info;

use crate::config::GeoConfig;
use crate::error::{GeoError, Result};
use crate::heightmap::{synthesize_elevation, ElevationParams, FbmNoise};
use crate::hydrology::{
    assign_downflow, assign_downhill, fill_sinks, region_slopes, sinks, triangle_elevations,
    Downflow, SEA_LEVEL,
};
use crate::mesh::{DualMesh, SphereMesh};
use crate::plates::{
    classify_oceans, find_collisions, generate_plates, pick_volcanoes, propagate_compression,
    Collisions, PlateId, Plates,
};
use crate::seeds::StageSeeds;

/// All generated geography bundled together
#[derive(Clone, Debug)]
pub struct Geo {
    /// Seeds used for generation (allows recreation)
    pub seeds: StageSeeds,
    /// Region to plate partition with velocities and ocean flags
    pub plates: Plates,
    /// Boundary lists and the sparse compression map
    pub collisions: Collisions,
    /// Signed elevation per region, sea level at 0
    pub elevation: Vec<f32>,
    /// Downhill neighbor per region, `None` for sinks
    pub downhill: Vec<Option<usize>>,
    /// Steepness toward the downhill neighbor
    pub region_slope: Vec<f32>,
    /// Mean elevation per triangle
    pub triangle_elevation: Vec<f32>,
    /// Triangle drainage sides and ocean-outward order
    pub downflow: Downflow,
    /// Elevation with interior depressions filled
    pub filled_elevation: Vec<f32>,
}

impl Geo {
    /// Convenience accessor for master seed
    pub fn seed(&self) -> u64 {
        self.seeds.master
    }

    pub fn region_plate(&self) -> &[PlateId] {
        &self.plates.region_plate
    }

    /// Velocity of every plate, in plate order.
    pub fn plate_velocities(&self) -> Vec<Vec3> {
        self.plates.plates().iter().map(|p| p.velocity).collect()
    }

    /// Fraction of regions above sea level.
    pub fn land_fraction(&self) -> f32 {
        if self.elevation.is_empty() {
            return 0.0;
        }
        let land = self.elevation.iter().filter(|&&e| e > SEA_LEVEL).count();
        land as f32 / self.elevation.len() as f32
    }

    /// Sinks of the unfilled elevation.
    pub fn sinks(&self, skip_below_sea: bool) -> Vec<usize> {
        sinks(&self.downhill, &self.elevation, skip_below_sea)
    }
}

/// Generate geography over any mesh.
pub fn generate<M>(mesh: &M, config: &GeoConfig, seeds: &StageSeeds) -> Result<Geo>
where
    M: SphereMesh + ?Sized,
{
    config.validate()?;
    if mesh.num_regions() == 0 {
        return Err(GeoError::EmptyMesh);
    }
    info!(
        regions = mesh.num_regions(),
        triangles = mesh.num_triangles(),
        seed = seeds.master,
        "generating geography"
    );

    let mut rng = StageSeeds::rng(seeds.plates);
    let mut plates = generate_plates(mesh, config.plate_count, config.plate_growth, &mut rng);
    let mut rng = StageSeeds::rng(seeds.oceans);
    classify_oceans(&mut plates, config.ocean_selection, &mut rng);
    info!(plates = plates.len(), growth = %config.plate_growth, "plates ready");

    let mut collisions = find_collisions(mesh, &plates, config.compression_extremum);
    let mut rng = StageSeeds::rng(seeds.volcanoes);
    pick_volcanoes(&mut collisions, config.volcano_count, &mut rng);
    let compression = propagate_compression(mesh, &collisions.compression);
    info!(
        mountains = collisions.mountain_r.len(),
        coastlines = collisions.coastline_r.len(),
        volcanoes = collisions.volcano_r.len(),
        "collisions resolved"
    );

    let noise = FbmNoise::terrain(StageSeeds::rng(seeds.noise).gen());
    let mut rng = StageSeeds::rng(seeds.distance);
    let elevation = synthesize_elevation(
        mesh,
        &plates,
        &collisions,
        &compression,
        &noise,
        &ElevationParams::from_config(config),
        &mut rng,
    );

    let downhill = assign_downhill(mesh, &elevation, None);
    let region_slope = region_slopes(mesh, &elevation, &downhill);
    let triangle_elevation = triangle_elevations(mesh, &elevation);
    let downflow = assign_downflow(mesh, &triangle_elevation);
    let mut rng = StageSeeds::rng(seeds.fill);
    let filled_elevation = fill_sinks(mesh, &elevation, config.fill_epsilon, &mut rng);

    let geo = Geo {
        seeds: seeds.clone(),
        plates,
        collisions,
        elevation,
        downhill,
        region_slope,
        triangle_elevation,
        downflow,
        filled_elevation,
    };
    info!(
        land_fraction = geo.land_fraction(),
        sinks = geo.sinks(true).len(),
        "geography complete"
    );
    Ok(geo)
}

/// Build the bundled icosphere mesh from `config` and generate geography over it.
pub fn generate_icosphere(config: &GeoConfig, seeds: &StageSeeds) -> Result<(DualMesh, Geo)> {
    config.validate()?;
    let mesh = DualMesh::icosphere(config.subdivisions)?;
    let geo = generate(&mesh, config, seeds)?;
    Ok((mesh, geo))
}
