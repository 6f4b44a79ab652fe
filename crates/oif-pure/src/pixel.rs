//! OIF `.pix` pixel-file decoding.
//!
//! A pixel file starts with a fixed header that repeats the image geometry,
//! followed by the physical pixel array in row-major order. Decoding resolves
//! the byte order, reinterprets the payload as the declared element type and
//! crops the physical storage down to the logical image.

use ndarray::{s, Array1, Array2, ArrayD};

use crate::config::DecodeOptions;
use crate::endian::{decode_elements, Endian, SwapBytes};
use crate::error::{Error, Result};
use crate::header::{Geometry, PixelType};
use crate::layout::PixelLayout;
use crate::magic::{detect, Detection, FileRole, Version, MAGIC_LEN};

/// The full contents of a `.pix` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPixelFile {
    bytes: Vec<u8>,
}

impl RawPixelFile {
    pub fn new(bytes: Vec<u8>) -> Self {
        RawPixelFile { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The fixed header at the start of a pixel file.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelFileHeader {
    pub version: Version,
    /// Byte order of the header integers.
    pub endian: Endian,
    pub geometry: Geometry,
    /// Byte order of the pixel values.
    pub pixel_endian: Endian,
    /// Raw V2 swap indicator (1 means the pixels are byte-swapped).
    pub swap_indicator: Option<i32>,
    /// Offset of the first pixel byte.
    pub data_offset: usize,
}

/// Typed, cropped pixel values.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    I16(ArrayD<i16>),
    U16(ArrayD<u16>),
    I32(ArrayD<i32>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

/// Mean, minimum and maximum of a pixel array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Logical pixel array of one image.
///
/// The shape is `[dims0]` for 1-D images and `[dims0, dims1]` for 2-D
/// images, i.e. the first index runs along the first OIF axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pixel_type: PixelType,
    data: PixelData,
}

impl PixelBuffer {
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        match &self.data {
            PixelData::I16(a) => a.shape(),
            PixelData::U16(a) => a.shape(),
            PixelData::I32(a) => a.shape(),
            PixelData::F32(a) => a.shape(),
            PixelData::F64(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summary statistics, or `None` for an empty image.
    pub fn stats(&self) -> Option<PixelStats> {
        match &self.data {
            PixelData::I16(a) => stats_of(a.iter().map(|&v| f64::from(v))),
            PixelData::U16(a) => stats_of(a.iter().map(|&v| f64::from(v))),
            PixelData::I32(a) => stats_of(a.iter().map(|&v| f64::from(v))),
            PixelData::F32(a) => stats_of(a.iter().map(|&v| f64::from(v))),
            PixelData::F64(a) => stats_of(a.iter().copied()),
        }
    }
}

fn stats_of(values: impl Iterator<Item = f64>) -> Option<PixelStats> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        count += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }
    (count > 0).then(|| PixelStats {
        mean: sum / count as f64,
        min,
        max,
    })
}

fn malformed_pixels(msg: String) -> Error {
    Error::MalformedPixelData(msg)
}

/// Decode the fixed header of a pixel file whose magic has been inspected.
///
/// V1 pixels share the byte order of the pixel-file integers. V2 pixels are
/// big-endian unless the stored swap indicator is 1. A forced swap inverts
/// the V2 pixel order as well; for V1 it is already part of `detection`.
pub fn decode_pixel_header(
    raw: &RawPixelFile,
    detection: Detection,
    options: &DecodeOptions,
) -> Result<PixelFileHeader> {
    let bytes = raw.as_bytes();
    let version = match detection.role {
        FileRole::PixelV1 => Version::V1,
        FileRole::PixelV2 => Version::V2,
        FileRole::HeaderV1 | FileRole::HeaderV2 => {
            return Err(Error::WrongFileRole {
                expected: "pixel",
                found: detection.role,
            })
        }
        FileRole::Unknown => {
            return Err(Error::UnrecognizedFormat(
                bytes[..bytes.len().min(MAGIC_LEN)].to_vec(),
            ))
        }
    };

    let layout = PixelLayout::for_version(version);
    if bytes.len() < layout.data_offset {
        return Err(Error::MalformedPixelData(format!(
            "truncated: {} bytes, pixel header needs {}",
            bytes.len(),
            layout.data_offset
        )));
    }

    let endian = detection.endian();
    let geometry = Geometry::read(bytes, &layout.geometry, endian, malformed_pixels)?;

    let (pixel_endian, swap_indicator) = match layout.swap_indicator {
        None => (endian, None),
        Some(off) => {
            let indicator = endian.read_i32(&bytes[off..off + 4]);
            let order = if indicator == 1 {
                Endian::Little
            } else {
                Endian::Big
            };
            let order = if options.force_swap {
                order.flipped()
            } else {
                order
            };
            (order, Some(indicator))
        }
    };

    log::debug!(
        "pixfile {:?} ({}): pixtype {}, ndim {}, dims {:?}, pdims {:?}, pixels {}",
        detection.role,
        endian,
        geometry.pixel_code,
        geometry.ndim(),
        geometry.dims,
        geometry.pdims,
        pixel_endian
    );

    Ok(PixelFileHeader {
        version,
        endian,
        geometry,
        pixel_endian,
        swap_indicator,
        data_offset: layout.data_offset,
    })
}

/// Reconstruct the logical pixel array from a physical pixel payload.
///
/// `data` holds `geometry.pdims` elements in row-major order (first axis
/// fastest). For 2-D images the storage is viewed as a `(pdims1, pdims0)`
/// matrix, transposed, and cropped to the top-left `dims0 × dims1` block.
pub fn decode_pixels(data: &[u8], geometry: &Geometry, order: Endian) -> Result<PixelBuffer> {
    let ndim = geometry.ndim();
    if ndim > 2 {
        return Err(Error::UnsupportedDimensionality(ndim as i32));
    }
    if ndim == 0 || geometry.pdims.len() != ndim {
        return Err(Error::MalformedPixelData(format!(
            "inconsistent geometry: dims {:?}, pdims {:?}",
            geometry.dims,
            geometry.pdims
        )));
    }

    let width = geometry.pixel_type.byte_width();
    if data.len() % width != 0 {
        return Err(Error::MalformedPixelData(format!(
            "{} bytes is not a whole number of {}-byte {:?} pixels",
            data.len(),
            width,
            geometry.pixel_type
        )));
    }
    let needed = geometry
        .physical_len()
        .and_then(|n| n.checked_mul(width))
        .ok_or_else(|| Error::MalformedPixelData(String::from("physical size overflows")))?;
    if data.len() < needed {
        return Err(Error::MalformedPixelData(format!(
            "expected {needed} bytes for physical dims {:?}, found {}",
            geometry.pdims,
            data.len()
        )));
    }
    if data.len() > needed {
        log::debug!("ignoring {} trailing pixel bytes", data.len() - needed);
    }
    let data = &data[..needed];

    let pixel_data = match geometry.pixel_type {
        PixelType::Int16 => PixelData::I16(crop(data, geometry, order)?),
        PixelType::UInt16 => PixelData::U16(crop(data, geometry, order)?),
        PixelType::Int32 => PixelData::I32(crop(data, geometry, order)?),
        PixelType::Float32 => PixelData::F32(crop(data, geometry, order)?),
        PixelType::Float64 => PixelData::F64(crop(data, geometry, order)?),
    };

    Ok(PixelBuffer {
        pixel_type: geometry.pixel_type,
        data: pixel_data,
    })
}

fn crop<T: SwapBytes>(data: &[u8], geometry: &Geometry, order: Endian) -> Result<ArrayD<T>> {
    let values: Vec<T> = decode_elements(data, order);
    let dims = &geometry.dims;
    let pdims = &geometry.pdims;

    match dims.len() {
        1 => {
            let mut values = values;
            values.truncate(dims[0]);
            Ok(Array1::from_vec(values).into_dyn())
        }
        2 => {
            let physical = Array2::from_shape_vec((pdims[1], pdims[0]), values)
                .map_err(|e| Error::MalformedPixelData(e.to_string()))?;
            let logical = physical.t().slice(s![..dims[0], ..dims[1]]).as_standard_layout().into_owned();
            Ok(logical.into_dyn())
        }
        n => Err(Error::UnsupportedDimensionality(n as i32)),
    }
}

/// A decoded pixel file.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelFile {
    pub header: PixelFileHeader,
    pub pixels: PixelBuffer,
}

impl PixelFile {
    /// Detect, decode and crop a complete pixel file.
    pub fn from_raw(raw: &RawPixelFile, options: &DecodeOptions) -> Result<Self> {
        let detection = detect(raw.as_bytes(), options.force_swap);
        let header = decode_pixel_header(raw, detection, options)?;
        let data = &raw.as_bytes()[header.data_offset..];
        let pixels = decode_pixels(data, &header.geometry, header.pixel_endian)?;
        if let Some(stats) = pixels.stats() {
            log::debug!(
                "pixels {:?} shape {:?}: min {} max {}",
                pixels.pixel_type(),
                pixels.shape(),
                stats.min,
                stats.max
            );
        }
        Ok(PixelFile { header, pixels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::encode_be;
    use crate::fixtures::{pixel_file, FixtureGeometry};
    use crate::header::{TY_INT, TY_REAL, TY_SHORT, TY_USHORT};

    fn geometry(pixel_type: PixelType, dims: &[usize], pdims: &[usize]) -> Geometry {
        Geometry {
            pixel_type,
            pixel_code: 0,
            dims: dims.to_vec(),
            pdims: pdims.to_vec(),
        }
    }

    fn i32_array(buf: &PixelBuffer) -> &ArrayD<i32> {
        match buf.data() {
            PixelData::I32(a) => a,
            other => panic!("expected I32, got {other:?}"),
        }
    }

    #[test]
    fn crop_selects_top_left_block_after_transpose() {
        // Physical 4 wide x 3 high, logical 3 x 2, values 0..11 row-major.
        let values: Vec<i32> = (0..12).collect();
        let g = geometry(PixelType::Int32, &[3, 2], &[4, 3]);
        let buf = decode_pixels(&encode_be(&values), &g, Endian::Big).unwrap();
        let arr = i32_array(&buf);

        assert_eq!(arr.shape(), &[3, 2]);
        assert_eq!(arr[[0, 0]], 0);
        assert_eq!(arr[[2, 1]], 6);
        for x in 0..3 {
            for y in 0..2 {
                assert_eq!(arr[[x, y]], (y * 4 + x) as i32, "at ({x}, {y})");
            }
        }
        // Padding column 3 and padding row 2 never appear.
        assert!(!arr.iter().any(|&v| v == 3 || v == 7 || v >= 8));
    }

    #[test]
    fn crop_one_dimensional() {
        let values: Vec<i16> = vec![5, 6, 7, 8, 9];
        let g = geometry(PixelType::Int16, &[3], &[5]);
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let buf = decode_pixels(&bytes, &g, Endian::Little).unwrap();
        match buf.data() {
            PixelData::I16(a) => assert_eq!(a.iter().copied().collect::<Vec<_>>(), vec![5, 6, 7]),
            other => panic!("expected I16, got {other:?}"),
        }
        assert_eq!(buf.shape(), &[3]);
    }

    #[test]
    fn three_dimensions_rejected() {
        let g = geometry(PixelType::Int16, &[2, 2, 2], &[2, 2, 2]);
        let err = decode_pixels(&[0u8; 16], &g, Endian::Big).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDimensionality(3)));
    }

    #[test]
    fn physical_size_overflow_is_malformed() {
        let big = i32::MAX as usize;
        let g = geometry(PixelType::Float64, &[1, 1], &[big, big]);
        let err = decode_pixels(&[0u8; 8], &g, Endian::Big).unwrap_err();
        match err {
            Error::MalformedPixelData(msg) => assert_eq!(msg, "physical size overflows"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_payload_is_malformed() {
        let g = geometry(PixelType::Float32, &[2, 2], &[2, 2]);
        let err = decode_pixels(&[0u8; 12], &g, Endian::Big).unwrap_err();
        assert!(matches!(err, Error::MalformedPixelData(_)));
    }

    #[test]
    fn partial_element_is_malformed() {
        let g = geometry(PixelType::Float64, &[1], &[1]);
        let err = decode_pixels(&[0u8; 12], &g, Endian::Big).unwrap_err();
        assert!(err.to_string().contains("whole number"));
    }

    #[test]
    fn trailing_elements_ignored() {
        let g = geometry(PixelType::Int32, &[2], &[2]);
        let buf = decode_pixels(&encode_be(&[1_i32, 2, 3, 4]), &g, Endian::Big).unwrap();
        assert_eq!(i32_array(&buf).iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn v1_little_endian_file() {
        let fg = FixtureGeometry::new(TY_USHORT, &[2, 2], &[2, 2]);
        let data: Vec<u8> = [1u16, 2, 3, 65535].iter().flat_map(|v| v.to_le_bytes()).collect();
        let raw = RawPixelFile::new(pixel_file(Version::V1, Endian::Little, &fg, 0, &data));
        let pf = PixelFile::from_raw(&raw, &DecodeOptions::default()).unwrap();
        assert_eq!(pf.header.version, Version::V1);
        assert_eq!(pf.header.pixel_endian, Endian::Little);
        assert_eq!(pf.header.swap_indicator, None);
        match pf.pixels.data() {
            PixelData::U16(a) => {
                assert_eq!(a[[0, 0]], 1);
                assert_eq!(a[[1, 0]], 2);
                assert_eq!(a[[0, 1]], 3);
                assert_eq!(a[[1, 1]], 65535);
            }
            other => panic!("expected U16, got {other:?}"),
        }
    }

    #[test]
    fn v2_swap_indicator_selects_order() {
        let fg = FixtureGeometry::new(TY_REAL, &[2], &[2]);

        let be: Vec<u8> = [1.5f32, -2.0].iter().flat_map(|v| v.to_be_bytes()).collect();
        let raw = RawPixelFile::new(pixel_file(Version::V2, Endian::Big, &fg, 0, &be));
        let pf = PixelFile::from_raw(&raw, &DecodeOptions::default()).unwrap();
        assert_eq!(pf.header.pixel_endian, Endian::Big);
        assert_eq!(pf.header.swap_indicator, Some(0));
        assert_eq!(pf.pixels.data(), &PixelData::F32(ndarray::arr1(&[1.5f32, -2.0]).into_dyn()));

        let le: Vec<u8> = [1.5f32, -2.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let raw = RawPixelFile::new(pixel_file(Version::V2, Endian::Big, &fg, 1, &le));
        let pf = PixelFile::from_raw(&raw, &DecodeOptions::default()).unwrap();
        assert_eq!(pf.header.pixel_endian, Endian::Little);
        assert_eq!(pf.pixels.data(), &PixelData::F32(ndarray::arr1(&[1.5f32, -2.0]).into_dyn()));
    }

    #[test]
    fn force_swap_on_v2_inverts_pixel_order() {
        let fg = FixtureGeometry::new(TY_SHORT, &[1], &[1]);
        // Header integers written little-endian so the forced swap reads them correctly.
        let raw = RawPixelFile::new(pixel_file(Version::V2, Endian::Little, &fg, 0, &[0x01, 0x02]));
        let opts = DecodeOptions::new().with_force_swap(true);
        let pf = PixelFile::from_raw(&raw, &opts).unwrap();
        assert_eq!(pf.header.endian, Endian::Little);
        assert_eq!(pf.header.pixel_endian, Endian::Little);
        assert_eq!(pf.pixels.data(), &PixelData::I16(ndarray::arr1(&[0x0201i16]).into_dyn()));
    }

    #[test]
    fn header_file_is_wrong_role() {
        let mut bytes = vec![0u8; 4096];
        bytes[..5].copy_from_slice(b"imhv2");
        let err = PixelFile::from_raw(&RawPixelFile::new(bytes), &DecodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::WrongFileRole { expected: "pixel", .. }));
    }

    #[test]
    fn truncated_pixel_header() {
        let fg = FixtureGeometry::new(TY_INT, &[1], &[1]);
        let mut bytes = pixel_file(Version::V2, Endian::Big, &fg, 0, &[]);
        bytes.truncate(100);
        let err = PixelFile::from_raw(&RawPixelFile::new(bytes), &DecodeOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn stats_over_logical_pixels() {
        let g = geometry(PixelType::Int32, &[2, 1], &[3, 1]);
        let buf = decode_pixels(&encode_be(&[2_i32, 4, 100]), &g, Endian::Big).unwrap();
        let stats = buf.stats().unwrap();
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.mean, 3.0);

        let empty = geometry(PixelType::Int32, &[0], &[0]);
        let buf = decode_pixels(&[], &empty, Endian::Big).unwrap();
        assert!(buf.is_empty());
        assert!(buf.stats().is_none());
    }
}
