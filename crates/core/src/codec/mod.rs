//! Codec modules for PDF stream compression and encryption.
//!
//! This module contains:
//! - `arcfour`: RC4 encryption
//! - `flate`: pooled zlib compression

pub mod arcfour;
pub mod flate;

pub use arcfour::Arcfour;
pub use flate::{BufferPool, PooledBuffer};
