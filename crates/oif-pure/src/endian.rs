//! Byte-order resolution for OIF data.
//!
//! OIF files may be written in either byte order. The order of header
//! integers is inferred from the magic bytes; V2 pixel files additionally
//! carry their own swap indicator. This module turns a "needs swap" flag into
//! a concrete [`Endian`] and provides bulk element conversion to and from
//! native order.

use bytemuck::{pod_collect_to_vec, Pod};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// A concrete byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    /// The byte order of the host running this code.
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Endian::Little
        } else {
            Endian::Big
        }
    }

    /// The opposite byte order.
    pub const fn flipped(self) -> Self {
        match self {
            Endian::Big => Endian::Little,
            Endian::Little => Endian::Big,
        }
    }

    /// Host order, or the opposite of host order when `needs_swap` is set.
    pub const fn from_swap(needs_swap: bool) -> Self {
        if needs_swap {
            Self::native().flipped()
        } else {
            Self::native()
        }
    }

    /// Returns `true` if data in this order must be swapped to be read natively.
    pub fn is_swapped(self) -> bool {
        self != Self::native()
    }

    /// Read a signed 32-bit integer from the first 4 bytes of `buf`.
    ///
    /// # Panics
    /// Panics if `buf` is shorter than 4 bytes.
    #[inline]
    pub fn read_i32(self, buf: &[u8]) -> i32 {
        match self {
            Endian::Big => BigEndian::read_i32(buf),
            Endian::Little => LittleEndian::read_i32(buf),
        }
    }
}

impl core::fmt::Display for Endian {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Endian::Big => write!(f, "big-endian"),
            Endian::Little => write!(f, "little-endian"),
        }
    }
}

/// Element types that can be byte-swapped in place.
pub trait SwapBytes: Pod {
    fn swap_bytes(self) -> Self;
}

macro_rules! impl_swap_int {
    ($($t:ty),*) => {
        $(impl SwapBytes for $t {
            #[inline]
            fn swap_bytes(self) -> Self {
                <$t>::swap_bytes(self)
            }
        })*
    };
}

impl_swap_int!(i16, u16, i32, u32, i64, u64);

impl SwapBytes for f32 {
    #[inline]
    fn swap_bytes(self) -> Self {
        f32::from_bits(self.to_bits().swap_bytes())
    }
}

impl SwapBytes for f64 {
    #[inline]
    fn swap_bytes(self) -> Self {
        f64::from_bits(self.to_bits().swap_bytes())
    }
}

/// Reinterpret `bytes` as elements stored in `order` and return them in
/// native order.
///
/// The returned vector is properly aligned regardless of the alignment of
/// `bytes`. Any trailing bytes that do not form a whole element are dropped;
/// callers validate lengths first.
pub fn decode_elements<T: SwapBytes>(bytes: &[u8], order: Endian) -> Vec<T> {
    let width = core::mem::size_of::<T>();
    let whole = bytes.len() - bytes.len() % width;
    let mut values: Vec<T> = pod_collect_to_vec(&bytes[..whole]);
    if order.is_swapped() {
        for v in &mut values {
            *v = v.swap_bytes();
        }
    }
    values
}

/// Encode native-order elements as big-endian bytes.
pub fn encode_be<T: SwapBytes>(values: &[T]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(core::mem::size_of_val(values));
    let swap = Endian::Big.is_swapped();
    for &v in values {
        let v = if swap { v.swap_bytes() } else { v };
        out.extend_from_slice(bytemuck::bytes_of(&v));
    }
    out
}
