use glam::Vec3;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use tracing::debug;

use crate::config::{GeoConfig, NoiseMode};
use crate::distance::DistanceField;
use crate::mesh::SphereMesh;
use crate::parallel::{map_chunks, update_chunks};
use crate::plates::{Collisions, Plates};

/// Added to every distance before taking reciprocals.
pub const DISTANCE_EPSILON: f32 = 1e-3;

/// Offset applied to regions on oceanic plates.
pub const OCEAN_BASELINE: f32 = -0.1;

/// Shape value for regions no mountain or ocean can reach.
pub const INTERIOR_BUMP: f32 = 0.1;

/// Coherent noise sampled at points on the unit sphere.
pub trait NoiseSource: Sync {
    /// Deterministic sample in [-1, 1].
    fn sample(&self, p: Vec3) -> f32;
}

/// Fractional Brownian Motion - multi-octave 3D Perlin noise
#[derive(Clone, Debug)]
pub struct FbmNoise {
    perlin: Perlin,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
    frequency: f64,
}

impl FbmNoise {
    pub fn new(seed: u32, octaves: u32, persistence: f64, lacunarity: f64, frequency: f64) -> Self {
        Self {
            perlin: Perlin::new(seed),
            octaves: octaves.max(1),
            persistence,
            lacunarity,
            frequency,
        }
    }

    /// Terrain texture defaults.
    pub fn terrain(seed: u32) -> Self {
        Self::new(seed, 5, 0.5, 2.0, 2.0)
    }
}

impl NoiseSource for FbmNoise {
    fn sample(&self, p: Vec3) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_value = 0.0;

        for _ in 0..self.octaves {
            let point = [p.x as f64 * frequency, p.y as f64 * frequency, p.z as f64 * frequency];
            total += amplitude * self.perlin.get(point);
            max_value += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }

        (total / max_value).clamp(-1.0, 1.0) as f32
    }
}

/// Elevation shaping options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElevationParams {
    pub noise_mode: NoiseMode,
    pub noise_amplitude: f32,
    pub normalize: bool,
    pub falloff: bool,
}

impl Default for ElevationParams {
    fn default() -> Self {
        Self::from_config(&GeoConfig::default())
    }
}

impl ElevationParams {
    pub fn from_config(config: &GeoConfig) -> Self {
        Self {
            noise_mode: config.noise_mode,
            noise_amplitude: config.noise_amplitude,
            normalize: config.normalize_elevation,
            falloff: config.tectonic_falloff,
        }
    }
}

/// Shape of a region from its distances to mountains (`a`), ocean (`b`) and coast (`c`).
///
/// Near mountains the value tends to 1, near ocean to -1, near coast to 0.
pub fn shape_factor(a: f32, b: f32, c: f32) -> f32 {
    let a = a + DISTANCE_EPSILON;
    let b = b + DISTANCE_EPSILON;
    let c = c + DISTANCE_EPSILON;
    if a.is_infinite() && b.is_infinite() {
        return INTERIOR_BUMP;
    }
    (1.0 / a - 1.0 / b) / (1.0 / a + 1.0 / b + 1.0 / c)
}

/// Build the elevation of every region.
///
/// Three distance fields are combined into a shape value: from mountains (blocked by
/// ocean), from ocean (blocked by coastline), and from coastline (blocked by every
/// boundary set). Shape and propagated compression are averaged, then noise, optional
/// normalization and optional falloff are applied.
pub fn synthesize_elevation<M, N, R>(
    mesh: &M,
    plates: &Plates,
    collisions: &Collisions,
    compression: &[f32],
    noise: &N,
    params: &ElevationParams,
    rng: &mut R,
) -> Vec<f32>
where
    M: SphereMesh + ?Sized,
    N: NoiseSource + ?Sized,
    R: Rng,
{
    let mountains = DistanceField::compute(mesh, &collisions.mountain_r, &collisions.ocean_r, rng);
    let oceans = DistanceField::compute(mesh, &collisions.ocean_r, &collisions.coastline_r, rng);

    let mut all_boundaries = collisions.mountain_r.clone();
    all_boundaries.extend_from_slice(&collisions.coastline_r);
    all_boundaries.extend_from_slice(&collisions.ocean_r);
    let coasts = DistanceField::compute(mesh, &collisions.coastline_r, &all_boundaries, rng);

    let mut elevation = map_chunks(mesh.num_regions(), |r| {
        let f = shape_factor(mountains.get(r), oceans.get(r), coasts.get(r));
        let baseline = if plates.region_is_ocean(r) {
            OCEAN_BASELINE
        } else {
            0.0
        };
        0.5 * (baseline + f) + 0.5 * compression[r]
    });

    apply_noise(mesh, &mut elevation, noise, params.noise_mode, params.noise_amplitude);
    if params.normalize {
        normalize_by_sign(&mut elevation);
    }
    if params.falloff {
        apply_falloff(&mut elevation);
    }

    let land = elevation.iter().filter(|&&e| e > 0.0).count();
    debug!(
        regions = elevation.len(),
        land,
        mode = ?params.noise_mode,
        "elevation synthesized"
    );
    elevation
}

/// Perturb elevation with noise sampled at each region's position.
pub fn apply_noise<M, N>(
    mesh: &M,
    elevation: &mut [f32],
    noise: &N,
    mode: NoiseMode,
    amplitude: f32,
) where
    M: SphereMesh + ?Sized,
    N: NoiseSource + ?Sized,
{
    if amplitude == 0.0 {
        return;
    }
    update_chunks(elevation, |r, e| {
        let n = noise.sample(mesh.region_xyz(r));
        *e = match mode {
            NoiseMode::Multiplicative => *e * (1.0 + amplitude * n),
            NoiseMode::Additive => *e + amplitude * n,
        };
    });
}

/// Scale negative values by the most negative and positive values by the most
/// positive, so each sign spans up to magnitude 1 independently.
pub fn normalize_by_sign(values: &mut [f32]) {
    let (min, max) = values
        .iter()
        .fold((0.0f32, 0.0f32), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    update_chunks(values, |_, v| {
        if *v > 0.0 {
            *v /= max;
        } else if *v < 0.0 {
            *v /= -min;
        }
    });
}

/// Square values above sea level to sharpen peaks.
pub fn apply_falloff(values: &mut [f32]) {
    update_chunks(values, |_, v| {
        if *v > 0.0 {
            *v *= *v;
        }
    });
}
