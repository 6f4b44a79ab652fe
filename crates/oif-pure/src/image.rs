//! Assembly of a decoded header, its metadata and its pixels into one image.

use crate::header::{pixel_type_name, DecodedHeader};
use crate::keyword::MetadataEntry;
use crate::pixel::{PixelBuffer, PixelStats};

/// A fully decoded OIF image, ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    header: DecodedHeader,
    entries: Vec<MetadataEntry>,
    pixels: PixelBuffer,
    source_name: Option<String>,
}

impl NormalizedImage {
    /// Combine the outputs of the header, keyword and pixel decoders.
    pub fn assemble(
        header: DecodedHeader,
        entries: Vec<MetadataEntry>,
        pixels: PixelBuffer,
    ) -> Self {
        NormalizedImage {
            header,
            entries,
            pixels,
            source_name: None,
        }
    }

    /// Record the name of the file this image was read from.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn header(&self) -> &DecodedHeader {
        &self.header
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// One-line description of the image: `[dims][type]  title`.
    pub fn describe(&self) -> String {
        let dims = self
            .pixels
            .shape()
            .iter()
            .map(|d| format!("{d}"))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "[{}][{}]\t{}",
            dims,
            pixel_type_name(self.header.geometry.pixel_code),
            self.header.title
        )
    }

    pub fn stats(&self) -> Option<PixelStats> {
        self.pixels.stats()
    }
}
