//! Utility modules for Quiver.

pub mod varint;

// Re-export commonly used types
pub use varint::*;
