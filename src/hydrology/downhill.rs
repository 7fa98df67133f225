use tracing::debug;

use crate::mesh::{great_circle_distance, SphereMesh};
use crate::parallel::map_chunks;

use super::SEA_LEVEL;

/// Lowest strictly-lower neighbor of every region, or `None` for sinks.
///
/// With `water`, each region's level is its elevation plus the standing water depth.
pub fn assign_downhill<M>(mesh: &M, elevation: &[f32], water: Option<&[f32]>) -> Vec<Option<usize>>
where
    M: SphereMesh + ?Sized,
{
    let level = |r: usize| elevation[r] + water.map_or(0.0, |w| w[r]);

    let downhill = map_chunks(mesh.num_regions(), |r| {
        let mut best = None;
        let mut lowest = level(r);
        for &n in mesh.region_neighbors(r) {
            let h = level(n);
            if h < lowest {
                lowest = h;
                best = Some(n);
            }
        }
        best
    });

    debug!(
        sinks = downhill.iter().filter(|d| d.is_none()).count(),
        "downhill assigned"
    );
    downhill
}

/// Regions with no downhill neighbor.
///
/// With `skip_below_sea`, sinks under the sea surface are left out since the ocean
/// drains them.
pub fn sinks(downhill: &[Option<usize>], elevation: &[f32], skip_below_sea: bool) -> Vec<usize> {
    downhill
        .iter()
        .enumerate()
        .filter(|(r, d)| d.is_none() && !(skip_below_sea && elevation[*r] < SEA_LEVEL))
        .map(|(r, _)| r)
        .collect()
}

/// Drop toward the downhill neighbor per radian of arc; 0 for sinks.
pub fn region_slopes<M>(mesh: &M, elevation: &[f32], downhill: &[Option<usize>]) -> Vec<f32>
where
    M: SphereMesh + ?Sized,
{
    map_chunks(mesh.num_regions(), |r| match downhill[r] {
        Some(d) => {
            let run = great_circle_distance(mesh.region_xyz(r), mesh.region_xyz(d));
            (elevation[r] - elevation[d]) / run
        }
        None => 0.0,
    })
}
