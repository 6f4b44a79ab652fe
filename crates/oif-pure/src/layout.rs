//! Fixed byte offsets of the OIF header and pixel-file layouts.
//!
//! All integer fields are 32 bits wide. Each dimension array reserves seven
//! integer slots; at most [`MAX_STORED_DIMS`] are read, and only `ndim` used.

use core::ops::Range;

use crate::magic::Version;

/// Number of axis lengths stored in every OIF header.
pub const MAX_STORED_DIMS: usize = 6;

/// Seconds between the Unix epoch and the IRAF 1980-01-01 epoch (approx.).
pub const EPOCH_1980: i64 = 10 * (3600 * 24 * 36525) / 100;

/// Offsets shared by header files and pixel-file headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryOffsets {
    pub pixel_type: usize,
    pub ndim: usize,
    pub dims: usize,
    pub pdims: usize,
}

/// Layout of an `.imh` header file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    /// Length of the fixed region; the metadata block follows it.
    pub fixed_len: usize,
    pub geometry: GeometryOffsets,
    pub timestamp: usize,
    pub title: Range<usize>,
    pub history: Range<usize>,
}

/// Layout of a `.pix` pixel file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelLayout {
    /// Length of the pixel-file header; pixel data starts here.
    pub data_offset: usize,
    pub geometry: GeometryOffsets,
    /// Offset of the explicit swap indicator (V2 only).
    pub swap_indicator: Option<usize>,
}

pub const V1_HEADER: HeaderLayout = HeaderLayout {
    fixed_len: 2052,
    geometry: GeometryOffsets {
        pixel_type: 16,
        ndim: 20,
        dims: 24,
        pdims: 52,
    },
    timestamp: 108,
    title: 732..888,
    history: 892..2048,
};

pub const V2_HEADER: HeaderLayout = HeaderLayout {
    fixed_len: 2046,
    geometry: GeometryOffsets {
        pixel_type: 10,
        ndim: 18,
        dims: 22,
        pdims: 50,
    },
    timestamp: 106,
    title: 638..718,
    history: 990..2048,
};

pub const V1_PIXEL: PixelLayout = PixelLayout {
    data_offset: 1024,
    geometry: GeometryOffsets {
        pixel_type: 16,
        ndim: 20,
        dims: 24,
        pdims: 52,
    },
    swap_indicator: None,
};

pub const V2_PIXEL: PixelLayout = PixelLayout {
    data_offset: 2048,
    geometry: GeometryOffsets {
        pixel_type: 10,
        ndim: 18,
        dims: 22,
        pdims: 50,
    },
    swap_indicator: Some(14),
};

impl HeaderLayout {
    pub fn for_version(version: Version) -> &'static HeaderLayout {
        match version {
            Version::V1 => &V1_HEADER,
            Version::V2 => &V2_HEADER,
        }
    }
}

impl PixelLayout {
    pub fn for_version(version: Version) -> &'static PixelLayout {
        match version {
            Version::V1 => &V1_PIXEL,
            Version::V2 => &V2_PIXEL,
        }
    }
}
