//! Plate boundary collisions.
//!
//! Every region with a neighbor on another plate is stepped forward along both plate
//! velocities; the change in separation is its compression. Regions are then sorted
//! into mountain, coastline and ocean seed lists that drive elevation.

use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::config::CompressionExtremum;
use crate::mesh::SphereMesh;

use super::types::Plates;

/// Simulated time step used to displace boundary regions.
pub const COLLISION_DT: f32 = 1e-2;

/// Compression above this marks a collision.
pub const COLLISION_THRESHOLD: f32 = 0.75 * COLLISION_DT;

/// Sparse per-region compression stored densely, with NaN marking untouched regions.
#[derive(Clone, Debug)]
pub struct Compression {
    values: Vec<f32>,
}

impl Compression {
    pub fn new(num_regions: usize) -> Self {
        Self {
            values: vec![f32::NAN; num_regions],
        }
    }

    /// Add `value` to region `r`, starting from zero if it was untouched.
    pub fn accumulate(&mut self, r: usize, value: f32) {
        let slot = &mut self.values[r];
        *slot = if slot.is_nan() { value } else { *slot + value };
    }

    pub fn get(&self, r: usize) -> Option<f32> {
        let v = self.values[r];
        (!v.is_nan()).then_some(v)
    }

    /// Populated regions with their values, in region order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(r, &v)| (r, v))
    }

    /// Number of populated regions.
    pub fn count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn num_regions(&self) -> usize {
        self.values.len()
    }
}

/// Published result of collision detection.
#[derive(Clone, Debug)]
pub struct Collisions {
    pub mountain_r: Vec<usize>,
    pub coastline_r: Vec<usize>,
    /// Seed regions of oceanic plates.
    pub ocean_r: Vec<usize>,
    /// Filled by [`pick_volcanoes`]; empty until then.
    pub volcano_r: Vec<usize>,
    /// Collided regions whose partner plate is oceanic (subduction arcs and ocean-ocean).
    pub arc_r: Vec<usize>,
    pub compression: Compression,
}

/// Strongest foreign neighbor of a region.
#[derive(Clone, Copy, Debug)]
struct Contact {
    partner: usize,
    compression: f32,
}

/// Role a boundary region takes, from the plate types on both sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryRole {
    Mountain,
    Coastline,
    Neither,
}

/// Classification table for a boundary region.
pub fn classify_boundary(region_ocean: bool, partner_ocean: bool, collided: bool) -> BoundaryRole {
    match (region_ocean, partner_ocean, collided) {
        (true, true, true) => BoundaryRole::Coastline,
        (false, false, true) => BoundaryRole::Mountain,
        (false, true, true) => BoundaryRole::Mountain,
        (false, true, false) => BoundaryRole::Coastline,
        (true, false, false) => BoundaryRole::Coastline,
        _ => BoundaryRole::Neither,
    }
}

fn find_contact<M>(
    mesh: &M,
    plates: &Plates,
    r: usize,
    extremum: CompressionExtremum,
) -> Option<Contact>
where
    M: SphereMesh + ?Sized,
{
    let plate = plates.region_plate[r];
    let pos = mesh.region_xyz(r);
    let moved = pos + plates.plate(plate).velocity * COLLISION_DT;

    let mut best: Option<Contact> = None;
    for &n in mesh.region_neighbors(r) {
        let other = plates.region_plate[n];
        if other == plate {
            continue;
        }
        let other_pos = mesh.region_xyz(n);
        let other_moved = other_pos + plates.plate(other).velocity * COLLISION_DT;
        let compression = pos.distance(other_pos) - moved.distance(other_moved);

        let better = match (best, extremum) {
            (None, _) => true,
            (Some(b), CompressionExtremum::Max) => compression > b.compression,
            (Some(b), CompressionExtremum::Min) => compression < b.compression,
        };
        if better {
            best = Some(Contact {
                partner: n,
                compression,
            });
        }
    }
    best
}

/// Detect plate collisions and classify boundary regions.
pub fn find_collisions<M>(mesh: &M, plates: &Plates, extremum: CompressionExtremum) -> Collisions
where
    M: SphereMesh + ?Sized,
{
    let num_regions = mesh.num_regions();
    let contacts: Vec<Option<Contact>> = (0..num_regions)
        .into_par_iter()
        .map(|r| find_contact(mesh, plates, r, extremum))
        .collect();

    let mut collisions = Collisions {
        mountain_r: Vec::new(),
        coastline_r: Vec::new(),
        ocean_r: Vec::new(),
        volcano_r: Vec::new(),
        arc_r: Vec::new(),
        compression: Compression::new(num_regions),
    };

    for (r, contact) in contacts.iter().enumerate() {
        if plates.is_seed(r) && plates.region_is_ocean(r) {
            collisions.ocean_r.push(r);
        }

        let Some(contact) = contact else {
            continue;
        };
        collisions
            .compression
            .accumulate(contact.partner, contact.compression);

        let region_ocean = plates.region_is_ocean(r);
        let partner_ocean = plates.region_is_ocean(contact.partner);
        let collided = contact.compression > COLLISION_THRESHOLD;

        if collided && partner_ocean {
            collisions.arc_r.push(r);
        }
        match classify_boundary(region_ocean, partner_ocean, collided) {
            BoundaryRole::Mountain => collisions.mountain_r.push(r),
            BoundaryRole::Coastline => collisions.coastline_r.push(r),
            BoundaryRole::Neither => {}
        }
    }

    debug!(
        mountains = collisions.mountain_r.len(),
        coastlines = collisions.coastline_r.len(),
        oceans = collisions.ocean_r.len(),
        compressed = collisions.compression.count(),
        "collisions detected"
    );
    collisions
}

/// Pick up to `count` volcano regions, preferring arcs over plain mountains.
///
/// Volcanoes are also added to `mountain_r` so they become elevation peaks.
pub fn pick_volcanoes<R: Rng>(collisions: &mut Collisions, count: usize, rng: &mut R) {
    let mut arcs = collisions.arc_r.clone();
    arcs.shuffle(rng);
    let mut volcanoes: Vec<usize> = arcs.into_iter().take(count).collect();

    if volcanoes.len() < count {
        let mut rest: Vec<usize> = collisions
            .mountain_r
            .iter()
            .copied()
            .filter(|r| !volcanoes.contains(r))
            .collect();
        rest.shuffle(rng);
        let missing = count - volcanoes.len();
        volcanoes.extend(rest.into_iter().take(missing));
    }

    for &v in &volcanoes {
        if !collisions.mountain_r.contains(&v) {
            collisions.mountain_r.push(v);
        }
    }
    debug!(volcanoes = volcanoes.len(), requested = count, "volcanoes placed");
    collisions.volcano_r = volcanoes;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::DualMesh;
    use crate::plates::types::{Plate, PlateId, PlateType};
    use crate::seeds::StageSeeds;
    use glam::Vec3;

    /// Octahedron split into {+x, +z, -z} and {-x, +y, -y}.
    fn two_plates(velocity_a: Vec3, ocean_a: bool) -> Plates {
        let a = PlateId(0);
        let b = PlateId(2);
        let region_plate = vec![a, b, b, b, a, a];
        let mut plate_a = Plate::new(a, velocity_a);
        if ocean_a {
            plate_a.plate_type = PlateType::Oceanic;
        }
        let plate_b = Plate::new(b, -velocity_a);
        Plates::new(region_plate, vec![plate_a, plate_b])
    }

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_classification_table() {
        use BoundaryRole::*;
        assert_eq!(classify_boundary(true, true, true), Coastline);
        assert_eq!(classify_boundary(true, true, false), Neither);
        assert_eq!(classify_boundary(false, false, true), Mountain);
        assert_eq!(classify_boundary(false, false, false), Neither);
        assert_eq!(classify_boundary(false, true, true), Mountain);
        assert_eq!(classify_boundary(false, true, false), Coastline);
        assert_eq!(classify_boundary(true, false, true), Neither);
        assert_eq!(classify_boundary(true, false, false), Coastline);
    }

    #[test]
    fn test_converging_continents_raise_mountains_everywhere() {
        let mesh = DualMesh::octahedron();
        let plates = two_plates(Vec3::NEG_X, false);
        let c = find_collisions(&mesh, &plates, CompressionExtremum::Max);

        assert_eq!(sorted(c.mountain_r), vec![0, 1, 2, 3, 4, 5]);
        assert!(c.coastline_r.is_empty());
        assert!(c.ocean_r.is_empty());
    }

    #[test]
    fn test_ocean_subducts_under_continent() {
        let mesh = DualMesh::octahedron();
        let plates = two_plates(Vec3::NEG_X, true);
        let c = find_collisions(&mesh, &plates, CompressionExtremum::Max);

        assert_eq!(sorted(c.mountain_r), vec![1, 2, 3]);
        assert!(c.coastline_r.is_empty());
        assert_eq!(c.ocean_r, vec![0]);
        assert_eq!(sorted(c.arc_r), vec![1, 2, 3]);
    }

    #[test]
    fn test_separating_plates_make_coastlines() {
        let mesh = DualMesh::octahedron();
        let plates = two_plates(Vec3::X, true);
        let c = find_collisions(&mesh, &plates, CompressionExtremum::Max);

        assert!(c.mountain_r.is_empty());
        assert_eq!(sorted(c.coastline_r), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_compression_lands_on_partners() {
        let mesh = DualMesh::octahedron();
        let plates = two_plates(Vec3::NEG_X, false);
        let c = find_collisions(&mesh, &plates, CompressionExtremum::Max);

        // Every region collides with some neighbor, and all partner values are convergent.
        assert!(c.compression.count() > 0);
        for (_, v) in c.compression.iter() {
            assert!(v > 0.0);
        }
    }

    #[test]
    fn test_min_extremum_prefers_divergent_partner() {
        let mesh = DualMesh::octahedron();
        let plates = two_plates(Vec3::NEG_X, false);
        let max = find_collisions(&mesh, &plates, CompressionExtremum::Max);
        let min = find_collisions(&mesh, &plates, CompressionExtremum::Min);
        // Regions touching several foreign neighbors pick a sliding one under the minimum.
        assert!(min.mountain_r.len() < max.mountain_r.len());
    }

    #[test]
    fn test_volcanoes_prefer_arcs() {
        let mesh = DualMesh::octahedron();
        let plates = two_plates(Vec3::NEG_X, true);
        let mut c = find_collisions(&mesh, &plates, CompressionExtremum::Max);
        let mut rng = StageSeeds::rng(2);
        pick_volcanoes(&mut c, 2, &mut rng);

        assert_eq!(c.volcano_r.len(), 2);
        for v in &c.volcano_r {
            assert!(c.arc_r.contains(v));
            assert!(c.mountain_r.contains(v));
        }
    }

    #[test]
    fn test_volcano_count_capped_by_candidates() {
        let mesh = DualMesh::octahedron();
        let plates = two_plates(Vec3::X, false);
        let mut c = find_collisions(&mesh, &plates, CompressionExtremum::Max);
        let mut rng = StageSeeds::rng(2);
        pick_volcanoes(&mut c, 10, &mut rng);
        assert!(c.volcano_r.is_empty());
    }

    #[test]
    fn test_compression_sentinel() {
        let mut comp = Compression::new(4);
        assert_eq!(comp.get(1), None);
        comp.accumulate(1, 0.5);
        comp.accumulate(1, -0.25);
        assert_eq!(comp.get(1), Some(0.25));
        assert_eq!(comp.count(), 1);
        assert_eq!(comp.iter().collect::<Vec<_>>(), vec![(1, 0.25)]);
    }
}
