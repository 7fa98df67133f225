use std::collections::VecDeque;

use tracing::debug;

use crate::heightmap::normalize_by_sign;
use crate::mesh::{great_circle_distance, SphereMesh};

use super::collision::Compression;

/// Spread boundary compression over the whole mesh.
///
/// Seeds are scaled to [-1, 1] per sign, then pushed outward breadth-first. Each hop
/// divides the value by `1 + great-circle distance`; a region reached again averages the
/// new estimate into its value. Seeds keep their values and unreached regions get 0.
/// The result is rescaled per sign and squared with its sign kept, so strong boundaries
/// stand out from weak ones.
pub fn propagate_compression<M>(mesh: &M, seeds: &Compression) -> Vec<f32>
where
    M: SphereMesh + ?Sized,
{
    let num_regions = mesh.num_regions();
    let mut values = vec![0.0f32; num_regions];
    let mut reached = vec![false; num_regions];
    let mut is_seed = vec![false; num_regions];
    let mut queue: VecDeque<usize> = VecDeque::new();

    let (seed_ids, mut seed_values): (Vec<usize>, Vec<f32>) = seeds.iter().unzip();
    normalize_by_sign(&mut seed_values);
    for (&r, &v) in seed_ids.iter().zip(&seed_values) {
        values[r] = v;
        reached[r] = true;
        is_seed[r] = true;
        queue.push_back(r);
    }

    let mut averaged = 0usize;
    while let Some(current) = queue.pop_front() {
        let source = values[current];
        let pos = mesh.region_xyz(current);
        for &n in mesh.region_neighbors(current) {
            if is_seed[n] {
                continue;
            }
            let estimate = source / (1.0 + great_circle_distance(pos, mesh.region_xyz(n)));
            if reached[n] {
                values[n] = 0.5 * (values[n] + estimate);
                averaged += 1;
            } else {
                values[n] = estimate;
                reached[n] = true;
                queue.push_back(n);
            }
        }
    }

    normalize_by_sign(&mut values);
    for v in &mut values {
        *v *= v.abs();
    }

    debug!(seeds = seed_ids.len(), averaged, "compression propagated");
    values
}
