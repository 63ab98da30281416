//! Domain model shared by the rt3d crates: meshes, result fields, dense
//! attributes and the result-archive interface.

pub mod field;
pub mod mesh;
pub mod repository;

pub use field::{DenseAttribute, ResultField, ResultLocation};
pub use mesh::{Element, ElementShape, Mesh, MeshStatistics, Node};
pub use repository::{MemoryRepository, Physics, Quantity, ResultRepository};
