//! Byte-order selection for binary objects.

/// The endianness, or byte order, used to encode multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    /// Big-endian (most-significant-byte first).
    Big,
    /// Little-endian (least-significant-byte first).
    Little,
}

impl Endian {
    /// The native endianness of the target architecture.
    ///
    /// **Warning** - This should not be used for cross-platform I/O in
    /// general. While dealing with native-endian bytes is marginally more
    /// efficient, it may cause incompatibilities if the data is shared
    /// between multiple devices where the native byte orders are different.
    pub const fn native() -> Self {
        #[cfg(target_endian = "big")]
        let endian = Self::Big;

        #[cfg(target_endian = "little")]
        let endian = Self::Little;

        endian
    }

    /// "Network-endian", an alias for big-endian, the default endianness.
    pub const fn network() -> Self {
        Self::Big
    }
}

impl Default for Endian {
    /// (Network- / Big-endian) The default endianness used to encode
    /// multi-byte values.
    fn default() -> Self {
        Self::network()
    }
}
