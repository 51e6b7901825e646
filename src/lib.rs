pub mod error;
pub mod math;
pub mod mesh;
pub mod morph;
pub mod operations;
pub mod topology;

pub use error::{MorphError, Result};
pub use mesh::TriangleMesh;
pub use morph::{Corner, Morph};
