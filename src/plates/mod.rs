pub mod collision;
pub mod compression;
pub mod generation;
pub mod types;

pub use collision::{find_collisions, pick_volcanoes, BoundaryRole, Collisions, Compression};
pub use compression::propagate_compression;
pub use generation::{classify_oceans, generate_plates};
pub use types::{Plate, PlateId, PlateType, Plates};
