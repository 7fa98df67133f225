use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::hydrology::SEA_LEVEL;
use crate::mesh::SphereMesh;
use crate::plates::{PlateType, Plates};
use crate::world::Geo;

/// Region under every pixel of an equirectangular `width x width/2` image, row-major.
pub fn equirect_regions<M>(mesh: &M, width: u32) -> Vec<usize>
where
    M: SphereMesh + ?Sized,
{
    let width = width.max(2) as usize;
    let height = width / 2;
    let mut regions = vec![0usize; width * height];

    regions
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, row_regions)| {
            let lat = 90.0 - (row as f32 + 0.5) / height as f32 * 180.0;
            for (col, slot) in row_regions.iter_mut().enumerate() {
                let lon = -180.0 + (col as f32 + 0.5) / width as f32 * 360.0;
                *slot = mesh.nearest_region(lat, lon);
            }
        });

    regions
}

fn lerp_color(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t) as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t) as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t) as u8,
    ]
}

/// Blue ramp below sea level, green through brown to white above.
fn elevation_color(e: f32) -> [u8; 3] {
    if e.is_nan() {
        return [255, 0, 255];
    }
    if e < SEA_LEVEL {
        lerp_color([70, 140, 200], [10, 30, 90], -e)
    } else if e < 0.4 {
        lerp_color([80, 150, 70], [170, 150, 90], e / 0.4)
    } else if e < 0.8 {
        lerp_color([170, 150, 90], [120, 100, 80], (e - 0.4) / 0.4)
    } else {
        lerp_color([120, 100, 80], [250, 250, 250], (e - 0.8) / 0.2)
    }
}

fn to_image(width: u32, pixels: &[[u8; 3]]) -> RgbImage {
    let width = width.max(2);
    let height = width / 2;
    let mut img: RgbImage = ImageBuffer::new(width, height);
    for (i, color) in pixels.iter().enumerate() {
        img.put_pixel(i as u32 % width, i as u32 / width, Rgb(*color));
    }
    img
}

/// Render per-region elevation as an equirectangular map.
pub fn render_elevation<M>(mesh: &M, elevation: &[f32], width: u32) -> RgbImage
where
    M: SphereMesh + ?Sized,
{
    let pixels: Vec<[u8; 3]> = equirect_regions(mesh, width)
        .into_iter()
        .map(|r| elevation_color(elevation[r]))
        .collect();
    to_image(width, &pixels)
}

/// Render plates by type, darkening regions on a plate boundary.
pub fn render_plates<M>(mesh: &M, plates: &Plates, width: u32) -> RgbImage
where
    M: SphereMesh + ?Sized,
{
    let ocean_color = [30u8, 90, 160];
    let land_color = [120u8, 160, 80];

    let mut boundary = vec![false; mesh.num_regions()];
    for r in plates.boundary_regions(mesh) {
        boundary[r] = true;
    }

    let pixels: Vec<[u8; 3]> = equirect_regions(mesh, width)
        .into_iter()
        .map(|r| {
            let base = match plates.plate_of(r).plate_type {
                PlateType::Oceanic => ocean_color,
                PlateType::Continental => land_color,
            };
            if boundary[r] {
                [base[0] / 2, base[1] / 2, base[2] / 2]
            } else {
                base
            }
        })
        .collect();
    to_image(width, &pixels)
}

pub fn export_elevation_png<M>(
    mesh: &M,
    elevation: &[f32],
    width: u32,
    path: &Path,
) -> Result<()>
where
    M: SphereMesh + ?Sized,
{
    render_elevation(mesh, elevation, width).save(path)?;
    Ok(())
}

pub fn export_plates_png<M>(
    mesh: &M,
    plates: &Plates,
    width: u32,
    path: &Path,
) -> Result<()>
where
    M: SphereMesh + ?Sized,
{
    render_plates(mesh, plates, width).save(path)?;
    Ok(())
}

/// Counts and ranges describing a generated world.
#[derive(Clone, Debug, Serialize)]
pub struct GeoSummary {
    pub seed: u64,
    pub regions: usize,
    pub triangles: usize,
    pub plates: usize,
    pub oceanic_plates: usize,
    pub mountains: usize,
    pub coastlines: usize,
    pub ocean_seeds: usize,
    pub volcanoes: Vec<usize>,
    pub compressed_regions: usize,
    pub land_fraction: f32,
    pub min_elevation: f32,
    pub max_elevation: f32,
    pub sinks_above_sea: usize,
    pub filled_regions: usize,
}

impl GeoSummary {
    pub fn new<M: SphereMesh + ?Sized>(mesh: &M, geo: &Geo) -> Self {
        let (min_elevation, max_elevation) = geo
            .elevation
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &e| {
                (lo.min(e), hi.max(e))
            });
        let filled_regions = geo
            .filled_elevation
            .iter()
            .zip(&geo.elevation)
            .filter(|(f, e)| f > e)
            .count();

        Self {
            seed: geo.seed(),
            regions: mesh.num_regions(),
            triangles: mesh.num_triangles(),
            plates: geo.plates.len(),
            oceanic_plates: geo.plates.ocean_plates().count(),
            mountains: geo.collisions.mountain_r.len(),
            coastlines: geo.collisions.coastline_r.len(),
            ocean_seeds: geo.collisions.ocean_r.len(),
            volcanoes: geo.collisions.volcano_r.clone(),
            compressed_regions: geo.collisions.compression.count(),
            land_fraction: geo.land_fraction(),
            min_elevation,
            max_elevation,
            sinks_above_sea: geo.sinks(true).len(),
            filled_regions,
        }
    }
}

/// Pretty-printed JSON summary of a world.
pub fn summary_json<M: SphereMesh + ?Sized>(mesh: &M, geo: &Geo) -> Result<String> {
    Ok(serde_json::to_string_pretty(&GeoSummary::new(mesh, geo))?)
}

pub fn export_summary_json<M>(mesh: &M, geo: &Geo, path: &Path) -> Result<()>
where
    M: SphereMesh + ?Sized,
{
    std::fs::write(path, summary_json(mesh, geo)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeoConfig;
    use crate::mesh::DualMesh;
    use crate::seeds::StageSeeds;
    use crate::world::generate_icosphere;

    #[test]
    fn test_pixels_sample_the_nearest_region() {
        let mesh = DualMesh::icosphere(3).unwrap();
        let regions = equirect_regions(&mesh, 64);
        assert_eq!(regions.len(), 64 * 32);

        // First pixel of the top row sits just below the north pole.
        assert_eq!(regions[0], mesh.nearest_region(90.0 - 90.0 / 32.0, -180.0 + 180.0 / 64.0));
        let equator_row = &regions[16 * 64..17 * 64];
        let (lat, lon) = mesh.region_lat_lon(equator_row[32]);
        assert!(lat.abs() < 20.0 && lon.abs() < 20.0, "({}, {})", lat, lon);
    }

    #[test]
    fn test_elevation_colors() {
        assert_eq!(elevation_color(-1.0), [10, 30, 90]);
        assert_eq!(elevation_color(2.0), [250, 250, 250]);
        assert_ne!(elevation_color(-0.01), elevation_color(0.01));
    }

    #[test]
    fn test_render_dimensions() {
        let mesh = DualMesh::icosphere(2).unwrap();
        let elevation = vec![0.5; mesh.num_regions()];
        let img = render_elevation(&mesh, &elevation, 40);
        assert_eq!(img.dimensions(), (40, 20));
    }

    #[test]
    fn test_summary_json_fields() {
        let config = GeoConfig {
            subdivisions: 2,
            plate_count: 6,
            ..Default::default()
        };
        let (mesh, geo) = generate_icosphere(&config, &StageSeeds::from_master(2)).unwrap();
        let json = summary_json(&mesh, &geo).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["regions"], mesh.num_regions());
        assert_eq!(value["plates"], geo.plates.len());
        assert!(value["land_fraction"].as_f64().is_some());
    }
}
