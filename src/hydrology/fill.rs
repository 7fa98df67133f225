use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::FillEpsilon;
use crate::mesh::SphereMesh;

use super::SEA_LEVEL;

impl FillEpsilon {
    /// Epsilon for one relaxation pass.
    fn draw<R: Rng>(self, rng: &mut R) -> f32 {
        match self {
            FillEpsilon::Fixed { epsilon } => epsilon,
            FillEpsilon::Randomized { base } => base * rng.gen_range(0.5..1.5),
        }
    }
}

/// Fill depressions using Planchon-Darboux relaxation.
///
/// Regions at or below sea level keep their elevation; everything else starts at
/// infinity and is lowered pass by pass, each pass in a fresh random order, until
/// nothing changes. A region settles at its own elevation once some neighbor sits at
/// least `epsilon` below it, otherwise at `epsilon` above its lowest neighbor. The
/// result is never below the input, and every finite region above sea level has a
/// strictly descending path to the sea. Regions with no path to the sea stay infinite.
pub fn fill_sinks<M, R>(mesh: &M, elevation: &[f32], epsilon: FillEpsilon, rng: &mut R) -> Vec<f32>
where
    M: SphereMesh + ?Sized,
    R: Rng,
{
    let mut filled: Vec<f32> = elevation
        .iter()
        .map(|&h| if h <= SEA_LEVEL { h } else { f32::INFINITY })
        .collect();

    let mut order: Vec<usize> = (0..mesh.num_regions()).collect();
    let mut passes = 0usize;
    let mut changed = true;

    while changed {
        changed = false;
        passes += 1;
        let eps = epsilon.draw(rng);
        order.shuffle(rng);

        for &r in &order {
            let h = elevation[r];
            if filled[r] == h {
                continue;
            }
            for &n in mesh.region_neighbors(r) {
                let outlet = filled[n] + eps;
                if h >= outlet {
                    filled[r] = h;
                    changed = true;
                    break;
                }
                if outlet < filled[r] {
                    filled[r] = outlet;
                    changed = true;
                }
            }
        }
    }

    let raised = filled
        .iter()
        .zip(elevation)
        .filter(|(f, h)| f.is_finite() && f > h)
        .count();
    debug!(passes, raised, "sinks filled");
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::DualMesh;
    use crate::seeds::StageSeeds;

    fn bumpy(mesh: &DualMesh) -> Vec<f32> {
        (0..mesh.num_regions())
            .map(|r| {
                let p = mesh.region_xyz(r);
                0.4 * p.z + 0.3 * (7.0 * p.x).sin() * (5.0 * p.y).cos()
            })
            .collect()
    }

    #[test]
    fn test_filled_is_at_least_input() {
        let mesh = DualMesh::icosphere(3).unwrap();
        let elevation = bumpy(&mesh);
        let filled = fill_sinks(&mesh, &elevation, FillEpsilon::default(), &mut StageSeeds::rng(1));

        for r in 0..mesh.num_regions() {
            assert!(filled[r] >= elevation[r]);
            if elevation[r] <= SEA_LEVEL {
                assert_eq!(filled[r], elevation[r]);
            }
        }
    }

    #[test]
    fn test_fill_is_idempotent() {
        let mesh = DualMesh::icosphere(3).unwrap();
        let elevation = bumpy(&mesh);
        let once = fill_sinks(&mesh, &elevation, FillEpsilon::default(), &mut StageSeeds::rng(1));
        let twice = fill_sinks(&mesh, &once, FillEpsilon::default(), &mut StageSeeds::rng(2));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_sinks_above_sea_after_fill() {
        let mesh = DualMesh::icosphere(3).unwrap();
        let elevation = bumpy(&mesh);
        let filled = fill_sinks(&mesh, &elevation, FillEpsilon::default(), &mut StageSeeds::rng(4));

        for r in 0..mesh.num_regions() {
            if filled[r] > SEA_LEVEL {
                let lowest = mesh
                    .region_neighbors(r)
                    .iter()
                    .map(|&n| filled[n])
                    .fold(f32::INFINITY, f32::min);
                assert!(lowest < filled[r], "region {} is still a sink", r);
            }
        }
    }

    #[test]
    fn test_raised_pit_is_filled() {
        let mesh = DualMesh::icosphere(2).unwrap();
        let mut elevation = vec![-1.0; mesh.num_regions()];
        elevation[0] = 1.0;
        for &n in mesh.region_neighbors(0) {
            elevation[n] = 2.0;
        }
        let epsilon = FillEpsilon::Fixed { epsilon: 1e-3 };
        let filled = fill_sinks(&mesh, &elevation, epsilon, &mut StageSeeds::rng(1));

        assert!(filled[0] > 2.0);
        for &n in mesh.region_neighbors(0) {
            assert_eq!(filled[n], 2.0);
        }
    }

    #[test]
    fn test_dry_world_stays_infinite() {
        let mesh = DualMesh::octahedron();
        let elevation = vec![1.0; 6];
        let filled = fill_sinks(&mesh, &elevation, FillEpsilon::default(), &mut StageSeeds::rng(1));
        assert!(filled.iter().all(|f| f.is_infinite()));
    }

    #[test]
    fn test_randomized_epsilon_stays_bounded() {
        let mesh = DualMesh::icosphere(2).unwrap();
        let elevation = bumpy(&mesh);
        let filled = fill_sinks(
            &mesh,
            &elevation,
            FillEpsilon::Randomized { base: 1e-4 },
            &mut StageSeeds::rng(9),
        );
        for r in 0..mesh.num_regions() {
            assert!(filled[r] >= elevation[r]);
            assert!(filled[r].is_finite());
        }
    }
}
