use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::mesh::SphereMesh;
use crate::parallel::map_chunks;

use super::SEA_LEVEL;

/// Triangle drainage graph.
#[derive(Clone, Debug)]
pub struct Downflow {
    /// Side through which each triangle drains, `None` for roots.
    pub sides: Vec<Option<usize>>,
    /// Every triangle once, each after the triangle it drains into.
    pub order: Vec<usize>,
}

impl Downflow {
    /// Triangle that `t` drains into.
    pub fn target<M: SphereMesh + ?Sized>(&self, mesh: &M, t: usize) -> Option<usize> {
        self.sides[t].map(|s| mesh.outer_triangle(s))
    }
}

/// Mean elevation of each triangle's three regions.
pub fn triangle_elevations<M>(mesh: &M, elevation: &[f32]) -> Vec<f32>
where
    M: SphereMesh + ?Sized,
{
    map_chunks(mesh.num_triangles(), |t| {
        let [a, b, c] = mesh.triangle_regions(t);
        (elevation[a] + elevation[b] + elevation[c]) / 3.0
    })
}

/// Min-heap entry ordered by (elevation, id).
#[derive(Clone, Copy)]
struct QueuedTriangle {
    elevation: f32,
    triangle: usize,
}

impl PartialEq for QueuedTriangle {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedTriangle {}

impl PartialOrd for QueuedTriangle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTriangle {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the lowest triangle pops first.
        other
            .elevation
            .total_cmp(&self.elevation)
            .then_with(|| other.triangle.cmp(&self.triangle))
    }
}

fn by_elevation(tri_elevation: &[f32]) -> impl Fn(&usize, &usize) -> Ordering + '_ {
    move |&a, &b| {
        tri_elevation[a]
            .total_cmp(&tri_elevation[b])
            .then_with(|| a.cmp(&b))
    }
}

/// Build the downflow graph from the ocean inland.
///
/// Sea triangles drain to their lowest strictly-lower neighbor, if any. Land triangles
/// are reached lowest-first from the sea and drain back into the triangle that reached
/// them. A landmass no sea triangle touches is rooted at its lowest triangle.
pub fn assign_downflow<M>(mesh: &M, tri_elevation: &[f32]) -> Downflow
where
    M: SphereMesh + ?Sized,
{
    let num_triangles = mesh.num_triangles();
    let mut sides: Vec<Option<usize>> = vec![None; num_triangles];
    let mut visited = vec![false; num_triangles];
    let mut order: Vec<usize> = Vec::with_capacity(num_triangles);
    let mut queue: BinaryHeap<QueuedTriangle> = BinaryHeap::new();

    let mut sea: Vec<usize> = (0..num_triangles)
        .filter(|&t| tri_elevation[t] < SEA_LEVEL)
        .collect();
    sea.sort_by(by_elevation(tri_elevation));

    for &t in &sea {
        let mut lowest = tri_elevation[t];
        for s in 3 * t..3 * t + 3 {
            let n = mesh.outer_triangle(s);
            if n != t && tri_elevation[n] < lowest {
                lowest = tri_elevation[n];
                sides[t] = Some(s);
            }
        }
        visited[t] = true;
        order.push(t);
        queue.push(QueuedTriangle {
            elevation: tri_elevation[t],
            triangle: t,
        });
    }

    // Candidate roots for regions the sea never reaches, lowest first.
    let mut by_height: Vec<usize> = (0..num_triangles).collect();
    by_height.sort_by(by_elevation(tri_elevation));
    let mut next_root = 0;
    let mut roots = 0usize;

    loop {
        while let Some(QueuedTriangle { triangle: t, .. }) = queue.pop() {
            for s in 3 * t..3 * t + 3 {
                let n = mesh.outer_triangle(s);
                if visited[n] {
                    continue;
                }
                visited[n] = true;
                sides[n] = Some(mesh.opposite_side(s));
                order.push(n);
                queue.push(QueuedTriangle {
                    elevation: tri_elevation[n],
                    triangle: n,
                });
            }
        }

        while next_root < num_triangles && visited[by_height[next_root]] {
            next_root += 1;
        }
        let Some(&root) = by_height.get(next_root) else {
            break;
        };
        visited[root] = true;
        order.push(root);
        queue.push(QueuedTriangle {
            elevation: tri_elevation[root],
            triangle: root,
        });
        roots += 1;
    }

    debug!(
        triangles = num_triangles,
        sea = sea.len(),
        inland_roots = roots,
        "downflow assigned"
    );
    Downflow { sides, order }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::DualMesh;

    fn assert_drain_before_drainee(mesh: &DualMesh, flow: &Downflow) {
        let mut position = vec![usize::MAX; mesh.num_triangles()];
        for (i, &t) in flow.order.iter().enumerate() {
            assert_eq!(position[t], usize::MAX, "triangle {} listed twice", t);
            position[t] = i;
        }
        for t in 0..mesh.num_triangles() {
            assert_ne!(position[t], usize::MAX, "triangle {} missing from order", t);
            if let Some(target) = flow.target(mesh, t) {
                assert!(
                    position[target] < position[t],
                    "triangle {} drains into later {}",
                    t,
                    target
                );
            }
        }
    }

    #[test]
    fn test_triangle_elevation_is_mean() {
        let mesh = DualMesh::octahedron();
        let elevation = vec![3.0, 0.0, 0.0, 0.0, 6.0, -3.0];
        let tri = triangle_elevations(&mesh, &elevation);
        for t in 0..mesh.num_triangles() {
            let [a, b, c] = mesh.triangle_regions(t);
            assert_eq!(tri[t], (elevation[a] + elevation[b] + elevation[c]) / 3.0);
        }
    }

    #[test]
    fn test_order_respects_drainage() {
        let mesh = DualMesh::icosphere(3).unwrap();
        let elevation: Vec<f32> = (0..mesh.num_regions())
            .map(|r| {
                let p = mesh.region_xyz(r);
                p.z + 0.3 * (5.0 * p.x).sin()
            })
            .collect();
        let tri = triangle_elevations(&mesh, &elevation);
        let flow = assign_downflow(&mesh, &tri);
        assert_drain_before_drainee(&mesh, &flow);
    }

    #[test]
    fn test_sea_triangles_come_first() {
        let mesh = DualMesh::icosphere(2).unwrap();
        let elevation: Vec<f32> = (0..mesh.num_regions()).map(|r| mesh.region_xyz(r).y).collect();
        let tri = triangle_elevations(&mesh, &elevation);
        let flow = assign_downflow(&mesh, &tri);

        let sea = tri.iter().filter(|&&e| e < SEA_LEVEL).count();
        assert!(flow.order[..sea].iter().all(|&t| tri[t] < SEA_LEVEL));
        for w in flow.order[..sea].windows(2) {
            assert!(tri[w[0]] <= tri[w[1]]);
        }
    }

    #[test]
    fn test_land_drains_back_toward_sea() {
        let mesh = DualMesh::icosphere(2).unwrap();
        let elevation: Vec<f32> = (0..mesh.num_regions()).map(|r| mesh.region_xyz(r).y).collect();
        let tri = triangle_elevations(&mesh, &elevation);
        let flow = assign_downflow(&mesh, &tri);

        for t in 0..mesh.num_triangles() {
            if tri[t] >= SEA_LEVEL {
                assert!(flow.sides[t].is_some(), "land triangle {} has no outlet", t);
            }
        }
    }

    #[test]
    fn test_dry_world_gets_a_root() {
        let mesh = DualMesh::icosphere(1).unwrap();
        let elevation: Vec<f32> = (0..mesh.num_regions())
            .map(|r| 1.0 + mesh.region_xyz(r).x)
            .collect();
        let tri = triangle_elevations(&mesh, &elevation);
        let flow = assign_downflow(&mesh, &tri);

        assert_drain_before_drainee(&mesh, &flow);
        let roots: Vec<usize> = (0..mesh.num_triangles())
            .filter(|&t| flow.sides[t].is_none())
            .collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(flow.order[0], roots[0]);
    }
}
