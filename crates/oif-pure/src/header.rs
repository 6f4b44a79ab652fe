//! OIF `.imh` header decoding.

use crate::config::DecodeOptions;
use crate::endian::Endian;
use crate::error::{Error, Result};
use crate::layout::{GeometryOffsets, HeaderLayout, EPOCH_1980};
use crate::magic::{detect, Detection, FileRole, Version};

// ── Pixel types ──

/// IRAF pixel type codes.
pub const TY_SHORT: i32 = 3;
pub const TY_INT: i32 = 4;
pub const TY_LONG: i32 = 5;
pub const TY_REAL: i32 = 6;
pub const TY_DOUBLE: i32 = 7;
pub const TY_USHORT: i32 = 11;

/// Element type of an OIF pixel array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    Int16,
    UInt16,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    /// Map an IRAF pixel type code; `None` if the code is not supported.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            TY_SHORT => Some(PixelType::Int16),
            TY_USHORT => Some(PixelType::UInt16),
            TY_INT | TY_LONG => Some(PixelType::Int32),
            TY_REAL => Some(PixelType::Float32),
            TY_DOUBLE => Some(PixelType::Float64),
            _ => None,
        }
    }

    /// Size of each element in bytes.
    pub const fn byte_width(self) -> usize {
        match self {
            PixelType::Int16 | PixelType::UInt16 => 2,
            PixelType::Int32 | PixelType::Float32 => 4,
            PixelType::Float64 => 8,
        }
    }
}

/// IRAF name of a pixel type code (`short`, `real`, ...).
pub fn pixel_type_name(code: i32) -> &'static str {
    match code {
        TY_SHORT => "short",
        TY_USHORT => "ushort",
        TY_INT => "int",
        TY_LONG => "long",
        TY_REAL => "real",
        TY_DOUBLE => "double",
        _ => "unknown",
    }
}

// ── Geometry ──

/// Pixel type and axis lengths shared by header and pixel files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    pub pixel_type: PixelType,
    /// The raw IRAF code, kept so `int` and `long` stay distinguishable.
    pub pixel_code: i32,
    /// Logical axis lengths, one per dimension.
    pub dims: Vec<usize>,
    /// Physical (storage) axis lengths, one per dimension.
    pub pdims: Vec<usize>,
}

impl Geometry {
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements in the physical storage, or `None` if the count
    /// overflows `usize`.
    pub fn physical_len(&self) -> Option<usize> {
        self.pdims.iter().try_fold(1usize, |acc, &p| acc.checked_mul(p))
    }

    /// Read and validate the geometry fields at `offsets`.
    ///
    /// `malformed` builds the error for inconsistent fields, so header and
    /// pixel files report through their own error kinds. `bytes` must cover
    /// the physical dims array.
    pub(crate) fn read(
        bytes: &[u8],
        offsets: &GeometryOffsets,
        endian: Endian,
        malformed: fn(String) -> Error,
    ) -> Result<Self> {
        let read = |off: usize| endian.read_i32(&bytes[off..off + 4]);

        let pixel_code = read(offsets.pixel_type);
        let pixel_type = PixelType::from_code(pixel_code).ok_or_else(|| {
            malformed(format!(
                "pixel-type code {pixel_code} not in known set"
            ))
        })?;

        let ndim = read(offsets.ndim);
        if ndim < 1 {
            return Err(malformed(format!("ndim {ndim} out of range")));
        }
        if ndim > 2 {
            return Err(Error::UnsupportedDimensionality(ndim));
        }

        let mut dims = Vec::with_capacity(ndim as usize);
        let mut pdims = Vec::with_capacity(ndim as usize);
        for axis in 0..ndim as usize {
            let dim = read(offsets.dims + 4 * axis);
            let pdim = read(offsets.pdims + 4 * axis);
            if dim < 0 || pdim < 0 {
                return Err(malformed(format!(
                    "negative length on axis {}: dims {dim}, pdims {pdim}",
                    axis + 1
                )));
            }
            if dim > pdim {
                return Err(malformed(format!(
                    "logical length {dim} exceeds physical length {pdim} on axis {}",
                    axis + 1
                )));
            }
            dims.push(dim as usize);
            pdims.push(pdim as usize);
        }

        Ok(Geometry {
            pixel_type,
            pixel_code,
            dims,
            pdims,
        })
    }
}

// ── Header decoding ──

/// The full contents of an `.imh` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    bytes: Vec<u8>,
}

impl RawHeader {
    pub fn new(bytes: Vec<u8>) -> Self {
        RawHeader { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A decoded OIF image header.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedHeader {
    pub version: Version,
    /// Byte order of the header integers.
    pub endian: Endian,
    pub geometry: Geometry,
    pub title: String,
    pub history: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Lines of the free-text user area, in file order.
    pub metadata_lines: Vec<String>,
}

impl DecodedHeader {
    /// Detect the file type of `raw` and decode it.
    pub fn from_raw(raw: &RawHeader, options: &DecodeOptions) -> Result<Self> {
        decode_header(raw, detect(raw.as_bytes(), options.force_swap))
    }

    pub fn ndim(&self) -> usize {
        self.geometry.ndim()
    }
}

fn malformed_header(msg: String) -> Error {
    Error::MalformedHeader(msg)
}

/// Remove every NUL byte.
pub(crate) fn strip_nulls(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().copied().filter(|&b| b != 0).collect()
}

/// V1 strings are two bytes per character; a double NUL marks the end.
fn v1_string(bytes: &[u8]) -> Vec<u8> {
    let end = bytes
        .windows(2)
        .position(|w| w == [0u8, 0u8])
        .unwrap_or(bytes.len());
    strip_nulls(&bytes[..end])
}

/// Decode a header buffer whose magic has already been inspected.
pub fn decode_header(raw: &RawHeader, detection: Detection) -> Result<DecodedHeader> {
    let version = match detection.role {
        FileRole::HeaderV1 => Version::V1,
        FileRole::HeaderV2 => Version::V2,
        FileRole::PixelV1 | FileRole::PixelV2 => {
            return Err(Error::WrongFileRole {
                expected: "header",
                found: detection.role,
            })
        }
        FileRole::Unknown => {
            let bytes = raw.as_bytes();
            return Err(Error::UnrecognizedFormat(
                bytes[..bytes.len().min(crate::magic::MAGIC_LEN)].to_vec(),
            ));
        }
    };

    let layout = HeaderLayout::for_version(version);
    let bytes = raw.as_bytes();
    if bytes.len() < layout.fixed_len {
        return Err(Error::MalformedHeader(format!(
            "truncated: {} bytes, fixed region needs {}",
            bytes.len(),
            layout.fixed_len
        )));
    }

    let endian = detection.endian();
    let geometry = Geometry::read(bytes, &layout.geometry, endian, malformed_header)?;

    let title_bytes = match version {
        Version::V1 => v1_string(&bytes[layout.title.clone()]),
        Version::V2 => strip_nulls(&bytes[layout.title.clone()]),
    };
    let title = String::from_utf8_lossy(&title_bytes).into_owned();

    let history_end = layout.history.end.min(bytes.len());
    let mut history_bytes = strip_nulls(&bytes[layout.history.start..history_end]);
    history_bytes.retain(|&b| b != b'\n');
    let history = String::from_utf8_lossy(&history_bytes).into_owned();

    let delta = endian.read_i32(&bytes[layout.timestamp..layout.timestamp + 4]);
    let timestamp = i64::from(delta) + EPOCH_1980;

    let metadata_lines = split_user_area(&bytes[layout.fixed_len..], version)?;

    log::debug!(
        "header {:?} ({}): title {:?}, pixtype {} ({:?}), ndim {}, dims {:?}, pdims {:?}",
        detection.role,
        endian,
        title,
        geometry.pixel_code,
        geometry.pixel_type,
        geometry.ndim(),
        geometry.dims,
        geometry.pdims
    );
    log::debug!(
        "header date {timestamp}, history {history:?}, {} metadata lines",
        metadata_lines.len()
    );

    Ok(DecodedHeader {
        version,
        endian,
        geometry,
        title,
        history,
        timestamp,
        metadata_lines,
    })
}

/// Split the user area into text lines.
///
/// V1 user areas end with a record delimiter, so the element after the last
/// newline is dropped; V2 keeps every element.
fn split_user_area(area: &[u8], version: Version) -> Result<Vec<String>> {
    let area = strip_nulls(area);
    let mut pieces: Vec<&[u8]> = area.split(|&b| b == b'\n').collect();
    if version == Version::V1 {
        pieces.pop();
    }
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            String::from_utf8(piece.to_vec()).map_err(|_| {
                Error::MalformedHeader(format!(
                    "metadata line {} is not valid UTF-8",
                    i + 1
                ))
            })
        })
        .collect()
}
