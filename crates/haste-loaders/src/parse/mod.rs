//! Content parsers consumed by the loaders.

pub mod commonjs;
pub mod css;
pub mod docblock;
pub mod image_size;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

pub use image_size::{ImageSize, image_size};

/// Approximate transfer size: the deflated length of `source`.
pub fn network_size(source: &str) -> std::io::Result<u64> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(source.as_bytes())?;
    Ok(encoder.finish()?.len() as u64)
}
