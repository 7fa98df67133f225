//! Multi-source graph distance fields over mesh regions.
//!
//! Distances are hop counts to the nearest seed region. Stop regions act as absorbing
//! barriers: they are never entered, so anything only reachable through them stays at
//! infinity. Stops only block entry; a seed expands even when it is also a stop.
//!
//! The search is breadth-first, but within a wavefront the next region is drawn
//! uniformly at random instead of in circulation order. Every region of a wavefront has
//! the same distance, so the first time a region is reached its distance is final.

use rand::Rng;
use tracing::debug;

use crate::mesh::SphereMesh;

/// Hop distance of every region to the nearest seed.
#[derive(Clone, Debug)]
pub struct DistanceField {
    distances: Vec<f32>,
    stops: Vec<bool>,
}

impl DistanceField {
    /// Compute a fresh field from `seeds`, never crossing `stops`.
    pub fn compute<M, R>(mesh: &M, seeds: &[usize], stops: &[usize], rng: &mut R) -> Self
    where
        M: SphereMesh + ?Sized,
        R: Rng,
    {
        let n = mesh.num_regions();
        let mut is_stop = vec![false; n];
        for &r in stops {
            is_stop[r] = true;
        }

        let mut field = Self {
            distances: vec![f32::INFINITY; n],
            stops: is_stop,
        };
        field.propagate(mesh, seeds, rng);
        field
    }

    /// Re-seed `seeds` at distance 0 and propagate wherever that strictly improves the
    /// current field.
    ///
    /// This never retracts distances: regions that were close to a seed which is no
    /// longer wanted keep their old values. Use [`DistanceField::rebuild`] when seeds
    /// have been removed.
    pub fn add_seeds<M, R>(&mut self, mesh: &M, seeds: &[usize], rng: &mut R)
    where
        M: SphereMesh + ?Sized,
        R: Rng,
    {
        self.propagate(mesh, seeds, rng);
    }

    /// Discard the current field and recompute it from `seeds` with the same stops.
    pub fn rebuild<M, R>(&mut self, mesh: &M, seeds: &[usize], rng: &mut R)
    where
        M: SphereMesh + ?Sized,
        R: Rng,
    {
        self.distances.fill(f32::INFINITY);
        self.propagate(mesh, seeds, rng);
    }

    fn propagate<M, R>(&mut self, mesh: &M, seeds: &[usize], rng: &mut R)
    where
        M: SphereMesh + ?Sized,
        R: Rng,
    {
        let mut frontier: Vec<usize> = seeds.to_vec();
        frontier.sort_unstable();
        frontier.dedup();
        for &r in &frontier {
            self.distances[r] = 0.0;
        }

        let mut next: Vec<usize> = Vec::new();
        let mut relaxed = 0usize;
        while !frontier.is_empty() {
            while !frontier.is_empty() {
                let pick = rng.gen_range(0..frontier.len());
                let current = frontier.swap_remove(pick);
                let candidate = self.distances[current] + 1.0;
                for &neighbor in mesh.region_neighbors(current) {
                    if !self.stops[neighbor] && candidate < self.distances[neighbor] {
                        self.distances[neighbor] = candidate;
                        next.push(neighbor);
                        relaxed += 1;
                    }
                }
            }
            std::mem::swap(&mut frontier, &mut next);
        }

        debug!(seeds = seeds.len(), relaxed, "distance field propagated");
    }

    pub fn get(&self, r: usize) -> f32 {
        self.distances[r]
    }

    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    pub fn into_distances(self) -> Vec<f32> {
        self.distances
    }
}

/// Convenience wrapper returning just the distances.
pub fn distance_field<M, R>(mesh: &M, seeds: &[usize], stops: &[usize], rng: &mut R) -> Vec<f32>
where
    M: SphereMesh + ?Sized,
    R: Rng,
{
    DistanceField::compute(mesh, seeds, stops, rng).into_distances()
}

/// Work queue whose next element is drawn uniformly from the unprocessed suffix.
///
/// The processed prefix is dropped once it grows past `compact_after` entries.
pub(crate) struct ShuffleQueue {
    items: Vec<usize>,
    head: usize,
    compact_after: usize,
}

impl ShuffleQueue {
    pub(crate) fn new(compact_after: usize) -> Self {
        Self {
            items: Vec::new(),
            head: 0,
            compact_after: compact_after.max(1),
        }
    }

    pub(crate) fn push(&mut self, r: usize) {
        self.items.push(r);
    }

    pub(crate) fn pop<R: Rng>(&mut self, rng: &mut R) -> Option<usize> {
        if self.head >= self.items.len() {
            return None;
        }
        let pick = rng.gen_range(self.head..self.items.len());
        self.items.swap(self.head, pick);
        let r = self.items[self.head];
        self.head += 1;

        if self.head > self.compact_after {
            self.items.drain(..self.head);
            self.head = 0;
        }
        Some(r)
    }

    #[cfg(test)]
    pub(crate) fn capacity_in_use(&self) -> usize {
        self.items.len()
    }
}
