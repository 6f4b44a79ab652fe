//! Decode options threaded explicitly through every pipeline stage.

/// Options that change how OIF files are decoded and exported.
///
/// The core keeps no process-wide state; callers build one of these and pass
/// it down. It is `Copy`, so independent file pairs can be decoded in
/// parallel from the same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Invert the byte order inferred from the magic bytes (and, for V2
    /// pixel files, from the stored swap indicator).
    pub force_swap: bool,
    /// Report FITS keyword validation problems at `warn` level instead of
    /// `debug`.
    pub warn: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force_swap(mut self, force_swap: bool) -> Self {
        self.force_swap = force_swap;
        self
    }

    pub fn with_warnings(mut self, warn: bool) -> Self {
        self.warn = warn;
        self
    }
}
