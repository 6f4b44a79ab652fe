//! OIF file-type detection from leading magic bytes.

use crate::endian::Endian;

/// Number of leading bytes inspected by [`detect`].
pub const MAGIC_LEN: usize = 10;

/// V1 header magic: "imhdr" as big-endian UTF-16.
pub const V1_HEADER_MAGIC_BE: &[u8; MAGIC_LEN] = b"\x00i\x00m\x00h\x00d\x00r";
/// V1 header magic: "imhdr" as little-endian UTF-16.
pub const V1_HEADER_MAGIC_LE: &[u8; MAGIC_LEN] = b"i\x00m\x00h\x00d\x00r\x00";
/// V1 pixel magic: "impix" as big-endian UTF-16.
pub const V1_PIXEL_MAGIC_BE: &[u8; MAGIC_LEN] = b"\x00i\x00m\x00p\x00i\x00x";
/// V1 pixel magic: "impix" as little-endian UTF-16.
pub const V1_PIXEL_MAGIC_LE: &[u8; MAGIC_LEN] = b"i\x00m\x00p\x00i\x00x\x00";
/// V2 header magic prefix (byte order independent).
pub const V2_HEADER_MAGIC: &[u8; 5] = b"imhv2";
/// V2 pixel magic prefix (byte order independent).
pub const V2_PIXEL_MAGIC: &[u8; 5] = b"impv2";

/// Structural version of an OIF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V1,
    V2,
}

/// The kind of OIF file identified by its magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    HeaderV1,
    PixelV1,
    HeaderV2,
    PixelV2,
    Unknown,
}

impl FileRole {
    /// Structural version, or `None` for [`FileRole::Unknown`].
    pub fn version(self) -> Option<Version> {
        match self {
            FileRole::HeaderV1 | FileRole::PixelV1 => Some(Version::V1),
            FileRole::HeaderV2 | FileRole::PixelV2 => Some(Version::V2),
            FileRole::Unknown => None,
        }
    }

    pub fn is_header(self) -> bool {
        matches!(self, FileRole::HeaderV1 | FileRole::HeaderV2)
    }

    pub fn is_pixel(self) -> bool {
        matches!(self, FileRole::PixelV1 | FileRole::PixelV2)
    }
}

impl core::fmt::Display for FileRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            FileRole::HeaderV1 => "V1 header",
            FileRole::PixelV1 => "V1 pixel",
            FileRole::HeaderV2 => "V2 header",
            FileRole::PixelV2 => "V2 pixel",
            FileRole::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Result of inspecting a buffer's magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub role: FileRole,
    /// Whether integers in this file differ from host byte order. For V2
    /// files this is provisional; pixel order comes from the pixel header.
    pub needs_swap: bool,
}

impl Detection {
    /// Byte order of the fixed-header integers.
    pub fn endian(self) -> Endian {
        Endian::from_swap(self.needs_swap)
    }
}

/// Identify the OIF file type of `buf` from its first [`MAGIC_LEN`] bytes.
///
/// `force_swap` inverts whatever swap decision the magic implies. Buffers
/// shorter than [`MAGIC_LEN`] or with unknown magic yield
/// [`FileRole::Unknown`]; callers must treat that as fatal.
pub fn detect(buf: &[u8], force_swap: bool) -> Detection {
    let Some(magic) = buf.get(..MAGIC_LEN) else {
        return Detection {
            role: FileRole::Unknown,
            needs_swap: false,
        };
    };

    let host = Endian::native();
    let (role, needs_swap) = if magic == V1_HEADER_MAGIC_BE {
        (FileRole::HeaderV1, host != Endian::Big)
    } else if magic == V1_PIXEL_MAGIC_BE {
        (FileRole::PixelV1, host != Endian::Big)
    } else if magic == V1_HEADER_MAGIC_LE {
        (FileRole::HeaderV1, host != Endian::Little)
    } else if magic == V1_PIXEL_MAGIC_LE {
        (FileRole::PixelV1, host != Endian::Little)
    } else if magic.starts_with(V2_HEADER_MAGIC) {
        (FileRole::HeaderV2, host == Endian::Little)
    } else if magic.starts_with(V2_PIXEL_MAGIC) {
        (FileRole::PixelV2, host == Endian::Little)
    } else {
        return Detection {
            role: FileRole::Unknown,
            needs_swap: false,
        };
    };

    Detection {
        role,
        needs_swap: needs_swap ^ force_swap,
    }
}
