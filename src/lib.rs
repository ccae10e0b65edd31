pub mod descriptors;
pub mod error;
pub mod export;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod pipeline;
pub mod sampling;
pub mod tessellation;
pub mod topology;

pub use error::{Result, ShapeIndexError};
