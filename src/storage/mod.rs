//! Storage layer for Quiver.
//!
//! Growable byte buffers that posting lists are written into and read back
//! from.

pub mod buffer;

pub use buffer::{Buffer, BufferReader, BufferWriter};
