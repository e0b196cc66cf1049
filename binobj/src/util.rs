//! Utilities that aren't part of the "core" of binobj, but may be useful in
//! reducing boilerplate.

use crate::{BinaryObject, Endian, Error};

#[doc(inline)]
pub use crate::magic_bytes;

macro_rules! endian_wrappers {
    ($($(#[$attr:meta])* $name:ident: $endian:expr,)*) => {$(
        $(#[$attr])*
        #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name<T>(pub T);

        impl<T> BinaryObject for $name<T>
        where
            T: BinaryObject,
        {
            const MIN_BYTE_COUNT: usize = T::MIN_BYTE_COUNT;

            fn byte_count(&self) -> usize {
                self.0.byte_count()
            }

            fn write_bytes(&self, _endian: Endian, buf: &mut [u8]) -> Result<usize, Error> {
                self.0.write_bytes($endian, buf)
            }

            fn read_bytes(_endian: Endian, buf: &[u8]) -> Result<(Self, usize), Error> {
                let (value, consumed) = T::read_bytes($endian, buf)?;
                Ok((Self(value), consumed))
            }
        }

        impl<T> From<T> for $name<T> {
            fn from(value: T) -> Self {
                Self(value)
            }
        }

        impl<T> $name<T> {
            /// Unwraps and returns the inner `T` value.
            pub fn into_inner(self) -> T {
                self.0
            }
        }
    )*}
}

endian_wrappers! {
    /// Little-endian wrapper type.
    ///
    /// Encodes and decodes the inner value in little-endian order,
    /// regardless of the byte order requested by the caller. Useful for
    /// formats that mix byte orders within one object.
    ///
    /// # Example
    ///
    /// ```
    /// use binobj::{BinaryObject, Endian};
    /// use binobj::util::LittleEndian;
    ///
    /// type Uint = LittleEndian<u32>;
    ///
    /// let x: Uint = 0xdeadbeef.into();
    /// let bytes = x.to_vec(Endian::Big).unwrap();
    ///
    /// assert_eq!(bytes, &[0xef, 0xbe, 0xad, 0xde]);
    /// ```
    LittleEndian: Endian::Little,

    /// Big-endian wrapper type.
    ///
    /// Encodes and decodes the inner value in big-endian order, regardless
    /// of the byte order requested by the caller.
    ///
    /// # Example
    ///
    /// ```
    /// use binobj::{BinaryObject, Endian};
    /// use binobj::util::BigEndian;
    ///
    /// type Uint = BigEndian<u32>;
    ///
    /// let x: Uint = 0xdeadbeef.into();
    /// let bytes = x.to_vec(Endian::Little).unwrap();
    ///
    /// assert_eq!(bytes, &[0xde, 0xad, 0xbe, 0xef]);
    /// ```
    BigEndian: Endian::Big,
}
