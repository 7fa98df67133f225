use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::{OceanSelection, PlateGrowth};
use crate::distance::ShuffleQueue;
use crate::heightmap::{FbmNoise, NoiseSource};
use crate::mesh::SphereMesh;

use super::types::{Plate, PlateId, PlateType, Plates};

/// Entry in the priority queue for noise-weighted plate expansion.
#[derive(Clone)]
struct ExpansionCell {
    region: usize,
    plate_id: PlateId,
    priority: f32,
}

impl PartialEq for ExpansionCell {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.region == other.region
    }
}

impl Eq for ExpansionCell {}

impl PartialOrd for ExpansionCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExpansionCell {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the cheapest cell pops first; region id breaks ties.
        other
            .priority
            .partial_cmp(&self.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.region.cmp(&self.region))
    }
}

/// Pick a uniformly random latitude/longitude and snap it to the nearest region.
///
/// Sampling positions instead of region ids keeps the macro layout comparable across
/// mesh resolutions for the same seed.
fn random_region<M, R>(mesh: &M, rng: &mut R) -> usize
where
    M: SphereMesh + ?Sized,
    R: Rng,
{
    let lat: f32 = rng.gen_range(-90.0..90.0);
    let lon: f32 = rng.gen_range(-180.0..180.0);
    mesh.nearest_region(lat, lon)
}

/// Generate tectonic plates over the mesh.
///
/// `2 * plate_count` random positions are drawn: the first half become plate seeds,
/// the second half give each plate a point its velocity is aimed at. Seeds landing on
/// the same region merge, so fewer plates than requested may come back. Every region
/// ends up owned by exactly one plate, and every plate id is its seed region's id.
/// All plates start continental; see [`classify_oceans`].
pub fn generate_plates<M, R>(
    mesh: &M,
    plate_count: usize,
    growth: PlateGrowth,
    rng: &mut R,
) -> Plates
where
    M: SphereMesh + ?Sized,
    R: Rng,
{
    let num_regions = mesh.num_regions();
    let count = plate_count.min(num_regions);
    if count < plate_count {
        warn!(
            requested = plate_count,
            regions = num_regions,
            "plate count clamped to region count"
        );
    }

    let candidates: Vec<usize> = (0..2 * count).map(|_| random_region(mesh, rng)).collect();
    let (seed_half, target_half) = candidates.split_at(count);

    let mut is_seed = vec![false; num_regions];
    let mut seeds: Vec<usize> = Vec::with_capacity(count);
    let mut targets: Vec<usize> = Vec::with_capacity(count);
    for (&seed, &target) in seed_half.iter().zip(target_half) {
        if !is_seed[seed] {
            is_seed[seed] = true;
            seeds.push(seed);
            targets.push(target);
        }
    }

    let mut owner: Vec<Option<PlateId>> = vec![None; num_regions];
    match growth {
        PlateGrowth::RandomFlood => grow_random_flood(mesh, &seeds, &mut owner, rng),
        PlateGrowth::NoiseWeighted => grow_noise_weighted(mesh, &seeds, &mut owner, rng),
        PlateGrowth::NearestSeed => grow_nearest_seed(mesh, &seeds, &mut owner),
    }

    // Mesh components no seed landed in get plates of their own.
    let mut orphans = 0;
    for r in 0..num_regions {
        if owner[r].is_none() {
            seeds.push(r);
            targets.push(random_region(mesh, rng));
            grow_random_flood(mesh, &[r], &mut owner, rng);
            orphans += 1;
        }
    }
    if orphans > 0 {
        debug!(orphans, "seeded plates for unreached mesh components");
    }

    let plates: Vec<Plate> = seeds
        .iter()
        .zip(&targets)
        .map(|(&seed, &target)| {
            let direction = mesh.region_xyz(target) - mesh.region_xyz(seed);
            Plate::new(PlateId(seed), direction.normalize_or_zero())
        })
        .collect();

    let region_plate: Vec<PlateId> = owner
        .into_iter()
        .map(|o| o.unwrap_or(PlateId(0)))
        .collect();

    debug!(plates = plates.len(), ?growth, "plates generated");
    Plates::new(region_plate, plates)
}

/// Flood fill from `seeds`, drawing the next frontier region at random.
fn grow_random_flood<M, R>(mesh: &M, seeds: &[usize], owner: &mut [Option<PlateId>], rng: &mut R)
where
    M: SphereMesh + ?Sized,
    R: Rng,
{
    let mut queue = ShuffleQueue::new(mesh.num_regions());
    for &seed in seeds {
        owner[seed] = Some(PlateId(seed));
        queue.push(seed);
    }

    while let Some(current) = queue.pop(rng) {
        let plate = owner[current];
        for &neighbor in mesh.region_neighbors(current) {
            if owner[neighbor].is_none() {
                owner[neighbor] = plate;
                queue.push(neighbor);
            }
        }
    }
}

/// Cheapest-first expansion: entering a region costs a base step plus fractal noise
/// and a little jitter, so boundaries follow the noise instead of staying round.
fn grow_noise_weighted<M, R>(mesh: &M, seeds: &[usize], owner: &mut [Option<PlateId>], rng: &mut R)
where
    M: SphereMesh + ?Sized,
    R: Rng,
{
    let boundary_noise = FbmNoise::new(rng.gen(), 6, 0.6, 2.0, 4.0);
    let mut heap: BinaryHeap<ExpansionCell> = BinaryHeap::new();

    for &seed in seeds {
        owner[seed] = Some(PlateId(seed));
        heap.push(ExpansionCell {
            region: seed,
            plate_id: PlateId(seed),
            priority: 0.0,
        });
    }

    while let Some(cell) = heap.pop() {
        for &neighbor in mesh.region_neighbors(cell.region) {
            if owner[neighbor].is_none() {
                owner[neighbor] = Some(cell.plate_id);

                let noise_cost = (boundary_noise.sample(mesh.region_xyz(neighbor)) + 1.0) * 1.25;
                let jitter: f32 = rng.gen_range(0.0..0.15);

                heap.push(ExpansionCell {
                    region: neighbor,
                    plate_id: cell.plate_id,
                    priority: cell.priority + 0.5 + noise_cost + jitter,
                });
            }
        }
    }
}

/// Assign every region to the seed closest to it on the sphere.
fn grow_nearest_seed<M>(mesh: &M, seeds: &[usize], owner: &mut [Option<PlateId>])
where
    M: SphereMesh + ?Sized,
{
    if seeds.is_empty() {
        return;
    }
    let seed_pos: Vec<Vec3> = seeds.iter().map(|&s| mesh.region_xyz(s)).collect();

    owner.par_iter_mut().enumerate().for_each(|(r, slot)| {
        let p = mesh.region_xyz(r);
        let mut best = 0;
        let mut best_dot = f32::NEG_INFINITY;
        for (i, q) in seed_pos.iter().enumerate() {
            let d = p.dot(*q);
            if d > best_dot {
                best_dot = d;
                best = i;
            }
        }
        *slot = Some(PlateId(seeds[best]));
    });

    // A seed always owns itself, even when another seed sits on the same spot.
    for &seed in seeds {
        owner[seed] = Some(PlateId(seed));
    }
}

/// Mark plates oceanic or continental.
///
/// Plate shapes are untouched; the flags only feed collision classification and
/// elevation baselines.
pub fn classify_oceans<R: Rng>(plates: &mut Plates, selection: OceanSelection, rng: &mut R) {
    let total = plates.len();
    let oceanic: Vec<bool> = match selection {
        OceanSelection::Quota { fraction } => {
            let mut order: Vec<usize> = (0..total).collect();
            order.shuffle(rng);
            let quota = ((fraction * total as f64).round() as usize).min(total);
            let mut flags = vec![false; total];
            for &i in &order[..quota] {
                flags[i] = true;
            }
            flags
        }
        OceanSelection::Bernoulli { probability } => {
            (0..total).map(|_| rng.gen_bool(probability)).collect()
        }
    };

    for (plate, ocean) in plates.plates_mut().iter_mut().zip(oceanic) {
        plate.plate_type = if ocean {
            PlateType::Oceanic
        } else {
            PlateType::Continental
        };
    }

    debug!(
        oceanic = plates.ocean_plates().count(),
        total,
        "plates classified"
    );
}
