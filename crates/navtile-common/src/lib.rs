//! Common utilities and data structures shared by the navtile crates

mod bounds;

pub use bounds::Bounds;

/// Error types for tile baking
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("empty source mesh: {0}")]
    EmptyMesh(String),

    #[error("invalid source mesh: {0}")]
    InvalidMesh(String),

    #[error("invalid off-mesh connection {index}: {reason}")]
    InvalidConnection { index: usize, reason: String },
}

/// Result type for tile baking operations
pub type Result<T> = std::result::Result<T, Error>;
