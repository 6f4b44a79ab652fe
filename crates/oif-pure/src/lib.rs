//! Pure Rust decoding of IRAF OIF images (`.imh` header + `.pix` pixel file),
//! with export to FITS.

pub mod config;
pub mod discover;
pub mod endian;
pub mod error;
pub mod fits;
pub mod header;
pub mod image;
pub mod io;
pub mod keyword;
pub mod layout;
pub mod magic;
pub mod pixel;
pub mod value;

#[cfg(test)]
mod fixtures;

pub use config::DecodeOptions;
pub use error::{Error, Result};
pub use fits::{Exporter, FitsExporter, BLOCK_SIZE, CARD_SIZE};
pub use image::NormalizedImage;
pub use io::load_image;
