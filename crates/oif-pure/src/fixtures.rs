//! Synthetic OIF buffers for unit tests.

use crate::endian::Endian;
use crate::layout::{GeometryOffsets, HeaderLayout, PixelLayout};
use crate::magic::{
    Version, V1_HEADER_MAGIC_BE, V1_HEADER_MAGIC_LE, V1_PIXEL_MAGIC_BE, V1_PIXEL_MAGIC_LE,
    V2_HEADER_MAGIC, V2_PIXEL_MAGIC,
};

pub struct FixtureGeometry {
    pub code: i32,
    pub dims: Vec<i32>,
    pub pdims: Vec<i32>,
}

impl FixtureGeometry {
    pub fn new(code: i32, dims: &[i32], pdims: &[i32]) -> Self {
        FixtureGeometry {
            code,
            dims: dims.to_vec(),
            pdims: pdims.to_vec(),
        }
    }
}

fn put_i32(buf: &mut [u8], off: usize, val: i32, endian: Endian) {
    let bytes = match endian {
        Endian::Big => val.to_be_bytes(),
        Endian::Little => val.to_le_bytes(),
    };
    buf[off..off + 4].copy_from_slice(&bytes);
}

fn put_geometry(buf: &mut [u8], offsets: &GeometryOffsets, geom: &FixtureGeometry, e: Endian) {
    put_i32(buf, offsets.pixel_type, geom.code, e);
    put_i32(buf, offsets.ndim, geom.dims.len() as i32, e);
    for (i, (&d, &p)) in geom.dims.iter().zip(&geom.pdims).enumerate() {
        put_i32(buf, offsets.dims + 4 * i, d, e);
        put_i32(buf, offsets.pdims + 4 * i, p, e);
    }
}

/// A complete `.imh` buffer with the given user-area lines, each
/// newline-terminated.
pub fn header_file(
    version: Version,
    endian: Endian,
    geom: &FixtureGeometry,
    title: &str,
    lines: &[&str],
) -> Vec<u8> {
    let layout = HeaderLayout::for_version(version);
    let mut buf = vec![0u8; layout.fixed_len];
    match (version, endian) {
        (Version::V1, Endian::Big) => buf[..10].copy_from_slice(V1_HEADER_MAGIC_BE),
        (Version::V1, Endian::Little) => buf[..10].copy_from_slice(V1_HEADER_MAGIC_LE),
        (Version::V2, _) => buf[..5].copy_from_slice(V2_HEADER_MAGIC),
    }
    put_geometry(&mut buf, &layout.geometry, geom, endian);
    put_i32(&mut buf, layout.timestamp, 1000, endian);

    let start = layout.title.start;
    match version {
        Version::V1 => {
            for (i, ch) in title.bytes().enumerate() {
                let pair = match endian {
                    Endian::Big => [0, ch],
                    Endian::Little => [ch, 0],
                };
                buf[start + 2 * i..start + 2 * i + 2].copy_from_slice(&pair);
            }
        }
        Version::V2 => buf[start..start + title.len()].copy_from_slice(title.as_bytes()),
    }

    for line in lines {
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }
    buf
}

/// A complete `.pix` buffer: fixed header followed by `data`.
pub fn pixel_file(
    version: Version,
    endian: Endian,
    geom: &FixtureGeometry,
    swap_indicator: i32,
    data: &[u8],
) -> Vec<u8> {
    let layout = PixelLayout::for_version(version);
    let mut buf = vec![0u8; layout.data_offset];
    match (version, endian) {
        (Version::V1, Endian::Big) => buf[..10].copy_from_slice(V1_PIXEL_MAGIC_BE),
        (Version::V1, Endian::Little) => buf[..10].copy_from_slice(V1_PIXEL_MAGIC_LE),
        (Version::V2, _) => buf[..5].copy_from_slice(V2_PIXEL_MAGIC),
    }
    put_geometry(&mut buf, &layout.geometry, geom, endian);
    if let Some(off) = layout.swap_indicator {
        put_i32(&mut buf, off, swap_indicator, endian);
    }
    buf.extend_from_slice(data);
    buf
}
