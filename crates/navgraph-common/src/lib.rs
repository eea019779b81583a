//! Common utilities and data structures shared across the navgraph crates

mod vector;

pub use vector::*;

/// Represents a 3D position. X/Y are horizontal, Z is up.
pub type Vec3 = glam::Vec3;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("bad mesh magic number: {0:#010x}")]
    WrongMagic(u32),

    #[error("unsupported mesh version: {0}")]
    WrongVersion(u32),

    #[error("mesh contains no areas")]
    EmptyMesh,

    #[error("mesh file not found: {}", .0.display())]
    MissingFile(std::path::PathBuf),

    #[error("graph error: {0}")]
    Graph(String),

    #[error("pathfinding failed: {0}")]
    Pathfinding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for navgraph operations
pub type Result<T> = std::result::Result<T, Error>;
