//! FITS export of normalized OIF images.
//!
//! Card images, header blocks and big-endian data segments are produced by
//! `fitsio-pure`. This module decides which cards an OIF image turns into:
//! the primary structure, the translated user area and a provenance note.

use std::path::Path;

use fitsio_pure::block::padded_byte_len;
use fitsio_pure::header::{format_card, format_end_card, Card};
use fitsio_pure::image::{
    serialize_image_f32, serialize_image_f64, serialize_image_i16, serialize_image_i32,
};
use fitsio_pure::primary::build_primary_header;
use fitsio_pure::value::Value as FitsValue;
use ndarray::ArrayD;

pub use fitsio_pure::block::{BLOCK_SIZE, CARD_SIZE};

use crate::config::DecodeOptions;
use crate::error::{Error, Result};
use crate::image::NormalizedImage;
use crate::keyword::MetadataEntry;
use crate::pixel::{PixelBuffer, PixelData};
use crate::value::Value;

/// Keywords written by the exporter itself; user-area entries may not set them.
const STRUCTURAL_KEYWORDS: [&str; 7] = ["SIMPLE", "BITPIX", "NAXIS", "EXTEND", "BZERO", "BSCALE", "END"];

/// Characters of string content that fit between the quotes of one card.
const STRING_CAPACITY: usize = 68;

/// Free-text width of a commentary card.
const COMMENTARY_WIDTH: usize = 72;

fn keyword_bytes(name: &str) -> [u8; 8] {
    let mut buf = [b' '; 8];
    for (dst, src) in buf.iter_mut().zip(name.bytes()) {
        *dst = src;
    }
    buf
}

fn value_card(keyword: &str, value: FitsValue, comment: Option<&str>) -> Card {
    Card {
        keyword: keyword_bytes(keyword),
        value: Some(value),
        comment: comment.map(String::from),
    }
}

fn commentary_card(keyword: &str, text: &str) -> Card {
    Card {
        keyword: keyword_bytes(keyword),
        value: None,
        comment: Some(String::from(text)),
    }
}

fn fits_value(value: &Value) -> FitsValue {
    match value {
        Value::Logical(b) => FitsValue::Logical(*b),
        Value::Integer(n) => FitsValue::Integer(*n),
        Value::Float(x) => FitsValue::Float(*x),
        Value::String(s) => FitsValue::String(s.clone()),
    }
}

/// Normalize a user-area key into a FITS keyword.
///
/// Keys are upper-cased; anything longer than 8 characters or containing
/// characters outside `A-Z 0-9 - _` is rejected, as are the structural
/// keywords the exporter writes itself.
pub fn fits_keyword(key: &str) -> Result<String> {
    let upper = key.to_ascii_uppercase();
    let valid_chars = upper
        .bytes()
        .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_'));
    if upper.is_empty() || upper.len() > 8 || !valid_chars {
        return Err(Error::InvalidKeyword(String::from(key)));
    }
    let structural = STRUCTURAL_KEYWORDS.contains(&upper.as_str())
        || upper
            .strip_prefix("NAXIS")
            .is_some_and(|n| n.bytes().all(|b| b.is_ascii_digit()));
    if structural {
        return Err(Error::InvalidKeyword(String::from(key)));
    }
    Ok(upper)
}

/// Whether a string value fits on one card once embedded quotes are doubled.
pub fn fits_in_one_card(s: &str) -> bool {
    s.len() + s.matches('\'').count() <= STRING_CAPACITY
}

/// Split commentary text into pieces that each fit on one card.
pub fn commentary_chunks(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return vec![text];
    }
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let mut cut = rest.len().min(COMMENTARY_WIDTH);
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// BITPIX for a pixel buffer, and whether the unsigned 16-bit offset applies.
fn bitpix(pixels: &PixelBuffer) -> (i64, bool) {
    match pixels.data() {
        PixelData::I16(_) => (16, false),
        PixelData::U16(_) => (16, true),
        PixelData::I32(_) => (32, false),
        PixelData::F32(_) => (-32, false),
        PixelData::F64(_) => (-64, false),
    }
}

/// The structural cards describing `pixels`.
pub fn primary_cards(pixels: &PixelBuffer) -> Result<Vec<Card>> {
    let (bitpix, unsigned) = bitpix(pixels);
    let mut cards = build_primary_header(bitpix, pixels.shape())?;
    cards.push(value_card("EXTEND", FitsValue::Logical(true), None));
    if unsigned {
        cards.push(value_card(
            "BZERO",
            FitsValue::Integer(32768),
            Some("offset data range to that of unsigned short"),
        ));
        cards.push(value_card("BSCALE", FitsValue::Integer(1), Some("default scaling factor")));
    }
    Ok(cards)
}

/// Header blocks for `cards`: the card images, END, then space padding.
pub fn header_bytes(cards: &[Card]) -> Vec<u8> {
    let mut out: Vec<u8> = cards.iter().flat_map(|c| format_card(c)).collect();
    out.extend_from_slice(&format_end_card());
    out.resize(padded_byte_len(out.len()), b' ');
    out
}

/// The array in FITS order: the first logical axis varies fastest.
fn fits_order<T: Copy>(array: &ArrayD<T>) -> Vec<T> {
    array.t().iter().copied().collect()
}

/// Block-padded big-endian data segment for `pixels`.
///
/// Unsigned 16-bit values are shifted into the signed range; the BZERO card
/// written by [`primary_cards`] restores them.
pub fn data_bytes(pixels: &PixelBuffer) -> Vec<u8> {
    match pixels.data() {
        PixelData::I16(a) => serialize_image_i16(&fits_order(a)),
        PixelData::U16(a) => {
            let shifted: Vec<i16> = a.t().iter().map(|&v| (v ^ 0x8000) as i16).collect();
            serialize_image_i16(&shifted)
        }
        PixelData::I32(a) => serialize_image_i32(&fits_order(a)),
        PixelData::F32(a) => serialize_image_f32(&fits_order(a)),
        PixelData::F64(a) => serialize_image_f64(&fits_order(a)),
    }
}

/// Something that can persist a [`NormalizedImage`].
pub trait Exporter {
    fn export(&self, image: &NormalizedImage, path: &Path) -> Result<()>;
}

/// Writes images as single-HDU FITS files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitsExporter {
    options: DecodeOptions,
}

impl FitsExporter {
    pub fn new(options: DecodeOptions) -> Self {
        FitsExporter { options }
    }

    fn report(&self, msg: &str) {
        if self.options.warn {
            log::warn!("{msg}");
        } else {
            log::debug!("{msg}");
        }
    }

    /// Every header card for `image`, in output order.
    pub fn cards(&self, image: &NormalizedImage) -> Result<Vec<Card>> {
        let mut cards = primary_cards(image.pixels())?;
        for entry in image.entries() {
            self.apply_entry(&mut cards, entry);
        }
        let source = image.source_name().unwrap_or("unknown");
        cards.push(commentary_card("HISTORY", &format!("New copy of {source}")));
        Ok(cards)
    }

    /// Commentary entries append; keyed entries replace an earlier card with
    /// the same keyword or append a new one.
    fn apply_entry(&self, cards: &mut Vec<Card>, entry: &MetadataEntry) {
        if entry.is_commentary() {
            let keyword = if entry.key.is_empty() { "COMMENT" } else { &entry.key };
            let text = match &entry.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            for chunk in commentary_chunks(&text) {
                cards.push(commentary_card(keyword, chunk));
            }
            return;
        }

        let keyword = match fits_keyword(&entry.key) {
            Ok(k) => k,
            Err(e) => {
                self.report(&format!("skipping {:?}: {e}", entry.key));
                return;
            }
        };
        if let Value::String(s) = &entry.value {
            if !fits_in_one_card(s) {
                self.report(&format!("value of {keyword} truncated to one card"));
            }
        }

        let comment = (!entry.comment.is_empty()).then_some(entry.comment.as_str());
        let card = value_card(&keyword, fits_value(&entry.value), comment);
        match cards.iter_mut().find(|c| c.keyword == card.keyword) {
            Some(existing) => *existing = card,
            None => cards.push(card),
        }
    }

    /// Encode `image` as a complete FITS file in memory.
    pub fn to_bytes(&self, image: &NormalizedImage) -> Result<Vec<u8>> {
        let mut out = header_bytes(&self.cards(image)?);
        out.extend_from_slice(&data_bytes(image.pixels()));
        Ok(out)
    }
}

impl Exporter for FitsExporter {
    fn export(&self, image: &NormalizedImage, path: &Path) -> Result<()> {
        let bytes = self.to_bytes(image).map_err(|e| e.in_file(path))?;
        std::fs::write(path, bytes).map_err(|e| Error::from(e).in_file(path))
    }
}
