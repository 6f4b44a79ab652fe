//! Reading `.imh`/`.pix` pairs from disk.

use std::path::Path;

use crate::config::DecodeOptions;
use crate::discover::{find_companion, has_extension, HEADER_EXTENSION, PIXEL_EXTENSION};
use crate::error::{Error, Result};
use crate::header::{DecodedHeader, RawHeader};
use crate::image::NormalizedImage;
use crate::keyword::translate_lines;
use crate::pixel::{PixelFile, RawPixelFile};

fn read_with_extension(path: &Path, expected: &'static str) -> Result<Vec<u8>> {
    if !has_extension(path, expected) {
        return Err(Error::UnexpectedExtension { expected }.in_file(path));
    }
    std::fs::read(path).map_err(|e| Error::from(e).in_file(path))
}

/// Read a whole `.imh` file.
pub fn read_header_file(path: &Path) -> Result<RawHeader> {
    read_with_extension(path, HEADER_EXTENSION).map(RawHeader::new)
}

/// Read a whole `.pix` file.
pub fn read_pixel_file(path: &Path) -> Result<RawPixelFile> {
    read_with_extension(path, PIXEL_EXTENSION).map(RawPixelFile::new)
}

/// Load the header at `header_path` together with its companion pixel file.
pub fn load_image(header_path: &Path, options: &DecodeOptions) -> Result<NormalizedImage> {
    let raw_header = read_header_file(header_path)?;
    let pixel_path = find_companion(header_path).map_err(|e| e.in_file(header_path))?;
    let raw_pixels = read_pixel_file(&pixel_path)?;

    let header =
        DecodedHeader::from_raw(&raw_header, options).map_err(|e| e.in_file(header_path))?;
    let pixel_file =
        PixelFile::from_raw(&raw_pixels, options).map_err(|e| e.in_file(&pixel_path))?;

    let hg = &header.geometry;
    let pg = &pixel_file.header.geometry;
    if hg.pixel_type != pg.pixel_type || hg.dims != pg.dims || hg.pdims != pg.pdims {
        log::warn!(
            "{}: header geometry {:?} {:?}/{:?} differs from pixel file {:?} {:?}/{:?}",
            header_path.display(),
            hg.pixel_type,
            hg.dims,
            hg.pdims,
            pg.pixel_type,
            pg.dims,
            pg.pdims
        );
    }

    let entries = translate_lines(&header.metadata_lines);
    let image = NormalizedImage::assemble(header, entries, pixel_file.pixels);
    Ok(match header_path.file_name() {
        Some(name) => image.with_source_name(name.to_string_lossy()),
        None => image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::{encode_be, Endian};
    use crate::fixtures::{header_file, pixel_file, FixtureGeometry};
    use crate::header::{TY_LONG, TY_SHORT};
    use crate::magic::Version;
    use crate::pixel::PixelData;

    #[test]
    fn rejects_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.fits");
        std::fs::write(&path, b"x").unwrap();
        let err = read_header_file(&path).unwrap_err();
        assert!(matches!(err.kind(), Error::UnexpectedExtension { expected: "imh" }));
        assert!(err.to_string().starts_with(&path.display().to_string()));
        let err = read_pixel_file(&path).unwrap_err();
        assert!(matches!(err.kind(), Error::UnexpectedExtension { expected: "pix" }));
    }

    #[test]
    fn loads_v2_pair() {
        let dir = tempfile::tempdir().unwrap();
        let fg = FixtureGeometry::new(TY_LONG, &[2, 1], &[2, 1]);
        let hdr = dir.path().join("flat.imh");
        std::fs::write(
            &hdr,
            header_file(Version::V2, Endian::Big, &fg, "flat", &["GAIN    = 2.5"]),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("flat.pix"),
            pixel_file(Version::V2, Endian::Big, &fg, 0, &encode_be(&[7_i32, 9])),
        )
        .unwrap();

        let image = load_image(&hdr, &DecodeOptions::default()).unwrap();
        assert_eq!(image.source_name(), Some("flat.imh"));
        assert_eq!(image.header().title, "flat");
        assert_eq!(image.entries()[0].key, "GAIN");
        match image.pixels().data() {
            PixelData::I32(a) => assert_eq!(a.iter().copied().collect::<Vec<_>>(), vec![7, 9]),
            other => panic!("unexpected pixel data: {other:?}"),
        }
    }

    #[test]
    fn pixel_errors_name_the_pixel_file() {
        let dir = tempfile::tempdir().unwrap();
        let fg = FixtureGeometry::new(TY_SHORT, &[4], &[4]);
        let hdr = dir.path().join("short.imh");
        let pix = dir.path().join("short.pix");
        std::fs::write(&hdr, header_file(Version::V1, Endian::Little, &fg, "", &[])).unwrap();
        std::fs::write(
            &pix,
            pixel_file(Version::V1, Endian::Little, &fg, 0, &[0u8; 4]),
        )
        .unwrap();

        let err = load_image(&hdr, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err.kind(), Error::MalformedPixelData(_)));
        match err {
            Error::File { path, .. } => assert_eq!(path, pix),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_companion_names_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let fg = FixtureGeometry::new(TY_SHORT, &[1], &[1]);
        let hdr = dir.path().join("alone.imh");
        std::fs::write(&hdr, header_file(Version::V2, Endian::Big, &fg, "", &[])).unwrap();
        let err = load_image(&hdr, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err.kind(), Error::MissingCompanionFile(_)));
        match err {
            Error::File { path, .. } => assert_eq!(path, hdr),
            other => panic!("unexpected error: {other}"),
        }
    }
}
