use std::path::PathBuf;

use thiserror::Error;

use crate::magic::FileRole;

/// All errors that can occur while decoding or exporting OIF images.
#[derive(Debug, Error)]
pub enum Error {
    /// The leading bytes match none of the known OIF magic patterns.
    #[error("unrecognized OIF format (magic bytes {0:02x?})")]
    UnrecognizedFormat(Vec<u8>),
    /// A header decoder was handed a pixel file, or vice versa.
    #[error("expected {expected} file, found {found}")]
    WrongFileRole {
        expected: &'static str,
        found: FileRole,
    },
    /// A fixed-offset header field is inconsistent or out of range.
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    /// The pixel payload does not agree with the declared geometry.
    #[error("malformed pixel data: {0}")]
    MalformedPixelData(String),
    /// Only 1-D and 2-D images are supported.
    #[error("unsupported dimensionality: ndim {0} (only 1 or 2 supported)")]
    UnsupportedDimensionality(i32),
    /// The companion `.pix` (or `.imh`) file could not be located.
    #[error("missing companion file: {0}")]
    MissingCompanionFile(PathBuf),
    /// A file was passed with the wrong extension for its role.
    #[error("unexpected file extension (expected .{expected})")]
    UnexpectedExtension { expected: &'static str },
    /// A metadata key that cannot be written as a FITS keyword.
    #[error("invalid FITS keyword: {0:?}")]
    InvalidKeyword(String),
    /// The FITS writer rejected the image structure.
    #[error("FITS encoding error: {0}")]
    Fits(#[from] fitsio_pure::Error),
    /// An I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Any of the above, tagged with the file that caused it.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the offending file path to this error.
    ///
    /// Errors that already carry a path are returned unchanged.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Error::File { .. } => self,
            other => Error::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping any file tagging.
    pub fn kind(&self) -> &Error {
        match self {
            Error::File { source, .. } => source.kind(),
            other => other,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
