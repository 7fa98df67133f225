use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::SphereMesh;

/// Unique identifier for a tectonic plate: the id of the region it grew from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlateId(pub usize);

impl PlateId {
    /// The seed region, which always belongs to its own plate.
    pub fn seed_region(self) -> usize {
        self.0
    }
}

/// Type of tectonic plate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateType {
    /// Oceanic plates are denser and sit lower.
    Oceanic,
    /// Continental plates are less dense and sit higher.
    Continental,
}

/// A tectonic plate with its properties.
#[derive(Clone, Debug)]
pub struct Plate {
    pub id: PlateId,
    pub plate_type: PlateType,
    /// Unit direction of movement, or zero for a degenerate (stationary) plate.
    pub velocity: Vec3,
}

impl Plate {
    pub fn new(id: PlateId, velocity: Vec3) -> Self {
        Self {
            id,
            plate_type: PlateType::Continental,
            velocity,
        }
    }

    pub fn is_ocean(&self) -> bool {
        self.plate_type == PlateType::Oceanic
    }
}

const NO_SLOT: u32 = u32::MAX;

/// Partition of the mesh regions into plates.
#[derive(Clone, Debug)]
pub struct Plates {
    /// Owning plate of every region.
    pub region_plate: Vec<PlateId>,
    plates: Vec<Plate>,
    /// Position in `plates` for seed regions, `NO_SLOT` elsewhere.
    slot: Vec<u32>,
}

impl Plates {
    /// Bundle a finished assignment. Every plate id must be a region id.
    pub fn new(region_plate: Vec<PlateId>, plates: Vec<Plate>) -> Self {
        let mut slot = vec![NO_SLOT; region_plate.len()];
        for (i, plate) in plates.iter().enumerate() {
            slot[plate.id.seed_region()] = i as u32;
        }
        Self {
            region_plate,
            plates,
            slot,
        }
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    pub fn plates(&self) -> &[Plate] {
        &self.plates
    }

    pub(crate) fn plates_mut(&mut self) -> &mut [Plate] {
        &mut self.plates
    }

    pub fn plate(&self, id: PlateId) -> &Plate {
        &self.plates[self.slot[id.seed_region()] as usize]
    }

    pub fn plate_of(&self, r: usize) -> &Plate {
        self.plate(self.region_plate[r])
    }

    pub fn is_ocean(&self, id: PlateId) -> bool {
        self.plate(id).is_ocean()
    }

    pub fn region_is_ocean(&self, r: usize) -> bool {
        self.plate_of(r).is_ocean()
    }

    /// Ids of the oceanic plates, in plate order.
    pub fn ocean_plates(&self) -> impl Iterator<Item = PlateId> + '_ {
        self.plates.iter().filter(|p| p.is_ocean()).map(|p| p.id)
    }

    /// Whether `r` is the seed its plate grew from.
    pub fn is_seed(&self, r: usize) -> bool {
        self.region_plate[r].seed_region() == r
    }

    /// Number of regions owned by each plate, in plate order.
    pub fn region_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.plates.len()];
        for id in &self.region_plate {
            counts[self.slot[id.seed_region()] as usize] += 1;
        }
        counts
    }

    /// Regions with at least one neighbor on another plate.
    pub fn boundary_regions<M: SphereMesh + ?Sized>(&self, mesh: &M) -> Vec<usize> {
        (0..self.region_plate.len())
            .filter(|&r| {
                let mine = self.region_plate[r];
                mesh.region_neighbors(r).iter().any(|&n| self.region_plate[n] != mine)
            })
            .collect()
    }
}
