//! Spherical mesh topology.
//!
//! The generation stages only talk to the mesh through [`SphereMesh`]. Three index
//! spaces are exposed: regions (Voronoi cells, one per generator point), triangles
//! (Delaunay faces) and sides (directed half-edges, three per triangle, side `s` lives
//! in triangle `s / 3`).
//!
//! [`DualMesh`] is the bundled provider: it is built from an explicit triangle list or
//! from a subdivided icosahedron. Nearest-region queries go through a k-d tree over the
//! region centers.

use std::collections::HashMap;

use glam::Vec3;
use kiddo::{ImmutableKdTree, SquaredEuclidean};

use crate::error::{GeoError, Result};

/// Largest icosphere subdivision accepted by [`DualMesh::icosphere`].
pub const MAX_SUBDIVISIONS: u32 = 8;

/// Topology and coordinates of a closed mesh on the unit sphere.
pub trait SphereMesh: Sync {
    fn num_regions(&self) -> usize;

    fn num_triangles(&self) -> usize;

    fn num_sides(&self) -> usize {
        3 * self.num_triangles()
    }

    /// Regions sharing a Delaunay edge with `r`.
    fn region_neighbors(&self, r: usize) -> &[usize];

    /// Triangles having `r` as a corner.
    fn region_triangles(&self, r: usize) -> &[usize];

    /// The three corner regions of `t`, in side order.
    fn triangle_regions(&self, t: usize) -> [usize; 3];

    /// The half-edge running the other way along the same edge.
    fn opposite_side(&self, s: usize) -> usize;

    /// Triangle on the far side of `s`.
    fn outer_triangle(&self, s: usize) -> usize {
        self.opposite_side(s) / 3
    }

    fn region_xyz(&self, r: usize) -> Vec3;

    fn triangle_xyz(&self, t: usize) -> Vec3;

    /// Latitude and longitude in degrees.
    fn region_lat_lon(&self, r: usize) -> (f32, f32);

    /// Latitude and longitude in degrees.
    fn triangle_lat_lon(&self, t: usize) -> (f32, f32);

    /// Region whose center is closest to the given point on the sphere.
    fn nearest_region(&self, lat: f32, lon: f32) -> usize;
}

/// Triangle a side belongs to.
pub fn inner_triangle(s: usize) -> usize {
    s / 3
}

/// Convert latitude/longitude in degrees to a point on the unit sphere.
pub fn lat_lon_to_xyz(lat: f32, lon: f32) -> Vec3 {
    let (lat, lon) = (lat.to_radians(), lon.to_radians());
    Vec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Latitude/longitude in degrees of a (not necessarily unit) vector.
pub fn xyz_to_lat_lon(p: Vec3) -> (f32, f32) {
    let p = p.normalize_or_zero();
    let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = p.y.atan2(p.x).to_degrees();
    (lat, lon)
}

/// Angle in radians between two points on the unit sphere.
///
/// The dot product is clamped before `acos` so rounding cannot leave its domain.
pub fn great_circle_distance(a: Vec3, b: Vec3) -> f32 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Half-edge mesh over points on the unit sphere.
#[derive(Clone, Debug)]
pub struct DualMesh {
    side_start: Vec<usize>,
    halfedges: Vec<usize>,
    neighbors: Vec<Vec<usize>>,
    region_tris: Vec<Vec<usize>>,
    region_pos: Vec<Vec3>,
    tri_pos: Vec<Vec3>,
    region_ll: Vec<(f32, f32)>,
    tri_ll: Vec<(f32, f32)>,
    /// `None` only for a mesh without regions.
    index: Option<ImmutableKdTree<f32, 3>>,
}

impl DualMesh {
    /// Build from generator points and counter-clockwise (outward facing) triangles.
    ///
    /// Points are projected onto the unit sphere. A side without a partner (open mesh)
    /// is its own opposite, so its outer triangle is its inner triangle.
    pub fn from_triangles(points: Vec<Vec3>, triangles: Vec<[usize; 3]>) -> Self {
        let region_pos: Vec<Vec3> = points
            .into_iter()
            .map(|p| p.normalize_or_zero())
            .collect();
        let num_regions = region_pos.len();
        let index = build_index(&region_pos);

        let mut side_start = Vec::with_capacity(triangles.len() * 3);
        for tri in &triangles {
            side_start.extend_from_slice(tri);
        }

        let mut edge_side: HashMap<(usize, usize), usize> =
            HashMap::with_capacity(side_start.len());
        for s in 0..side_start.len() {
            edge_side.insert((side_start[s], side_start[next_side(s)]), s);
        }

        let halfedges: Vec<usize> = (0..side_start.len())
            .map(|s| {
                let (a, b) = (side_start[s], side_start[next_side(s)]);
                edge_side.get(&(b, a)).copied().unwrap_or(s)
            })
            .collect();

        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); num_regions];
        let mut region_tris: Vec<Vec<usize>> = vec![Vec::new(); num_regions];
        for s in 0..side_start.len() {
            let (a, b) = (side_start[s], side_start[next_side(s)]);
            if !neighbors[a].contains(&b) {
                neighbors[a].push(b);
            }
            if !neighbors[b].contains(&a) {
                neighbors[b].push(a);
            }
            region_tris[a].push(inner_triangle(s));
        }

        let tri_pos: Vec<Vec3> = triangles
            .iter()
            .map(|&[a, b, c]| {
                ((region_pos[a] + region_pos[b] + region_pos[c]) / 3.0).normalize_or_zero()
            })
            .collect();

        let region_ll = region_pos.iter().map(|&p| xyz_to_lat_lon(p)).collect();
        let tri_ll = tri_pos.iter().map(|&p| xyz_to_lat_lon(p)).collect();

        Self {
            side_start,
            halfedges,
            neighbors,
            region_tris,
            region_pos,
            tri_pos,
            region_ll,
            tri_ll,
            index,
        }
    }

    /// Regular icosahedron subdivided `subdivisions` times.
    ///
    /// Yields `10 * 4^n + 2` regions and `20 * 4^n` triangles.
    pub fn icosphere(subdivisions: u32) -> Result<Self> {
        if subdivisions > MAX_SUBDIVISIONS {
            return Err(GeoError::ResolutionTooLarge(subdivisions));
        }

        let t = (1.0 + 5.0f32.sqrt()) / 2.0;
        let mut points = vec![
            Vec3::new(-1.0, t, 0.0),
            Vec3::new(1.0, t, 0.0),
            Vec3::new(-1.0, -t, 0.0),
            Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0, t),
            Vec3::new(0.0, 1.0, t),
            Vec3::new(0.0, -1.0, -t),
            Vec3::new(0.0, 1.0, -t),
            Vec3::new(t, 0.0, -1.0),
            Vec3::new(t, 0.0, 1.0),
            Vec3::new(-t, 0.0, -1.0),
            Vec3::new(-t, 0.0, 1.0),
        ];
        for p in points.iter_mut() {
            *p = p.normalize();
        }

        let mut triangles: Vec<[usize; 3]> = vec![
            [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
            [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
            [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
            [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
        ];

        for _ in 0..subdivisions {
            let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
            let mut midpoint = |a: usize, b: usize, points: &mut Vec<Vec3>| -> usize {
                let key = if a < b { (a, b) } else { (b, a) };
                *midpoints.entry(key).or_insert_with(|| {
                    let mid = ((points[a] + points[b]) * 0.5).normalize();
                    points.push(mid);
                    points.len() - 1
                })
            };

            let mut next = Vec::with_capacity(triangles.len() * 4);
            for &[a, b, c] in &triangles {
                let ab = midpoint(a, b, &mut points);
                let bc = midpoint(b, c, &mut points);
                let ca = midpoint(c, a, &mut points);
                next.push([a, ab, ca]);
                next.push([b, bc, ab]);
                next.push([c, ca, bc]);
                next.push([ab, bc, ca]);
            }
            triangles = next;
        }

        Ok(Self::from_triangles(points, triangles))
    }

    /// Six regions: four around the equator plus the two poles.
    ///
    /// Region 0 is +x, 1 is +y, 2 is -x, 3 is -y, 4 is the north pole, 5 the south.
    pub fn octahedron() -> Self {
        let points = vec![
            Vec3::X,
            Vec3::Y,
            Vec3::NEG_X,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        let triangles = vec![
            [0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4],
            [1, 0, 5], [2, 1, 5], [3, 2, 5], [0, 3, 5],
        ];
        Self::from_triangles(points, triangles)
    }

    /// Region a side starts at.
    pub fn side_start_region(&self, s: usize) -> usize {
        self.side_start[s]
    }

    /// Region a side ends at.
    pub fn side_end_region(&self, s: usize) -> usize {
        self.side_start[next_side(s)]
    }
}

fn build_index(points: &[Vec3]) -> Option<ImmutableKdTree<f32, 3>> {
    if points.is_empty() {
        return None;
    }
    let entries: Vec<[f32; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
    Some(ImmutableKdTree::new_from_slice(&entries))
}

fn next_side(s: usize) -> usize {
    if s % 3 == 2 { s - 2 } else { s + 1 }
}

impl SphereMesh for DualMesh {
    fn num_regions(&self) -> usize {
        self.region_pos.len()
    }

    fn num_triangles(&self) -> usize {
        self.tri_pos.len()
    }

    fn region_neighbors(&self, r: usize) -> &[usize] {
        &self.neighbors[r]
    }

    fn region_triangles(&self, r: usize) -> &[usize] {
        &self.region_tris[r]
    }

    fn triangle_regions(&self, t: usize) -> [usize; 3] {
        [self.side_start[3 * t], self.side_start[3 * t + 1], self.side_start[3 * t + 2]]
    }

    fn opposite_side(&self, s: usize) -> usize {
        self.halfedges[s]
    }

    fn region_xyz(&self, r: usize) -> Vec3 {
        self.region_pos[r]
    }

    fn triangle_xyz(&self, t: usize) -> Vec3 {
        self.tri_pos[t]
    }

    fn region_lat_lon(&self, r: usize) -> (f32, f32) {
        self.region_ll[r]
    }

    fn triangle_lat_lon(&self, t: usize) -> (f32, f32) {
        self.tri_ll[t]
    }

    fn nearest_region(&self, lat: f32, lon: f32) -> usize {
        // On the unit sphere the chordal nearest is also the great-circle nearest.
        let p = lat_lon_to_xyz(lat, lon);
        self.index.as_ref().map_or(0, |tree| {
            tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y, p.z]).item as usize
        })
    }
}
