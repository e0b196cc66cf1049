//! Fixed-layout binary object encoding and decoding.
//!
//! A *binary object* is a value that knows its own encoded byte length and
//! can write itself to, and read itself from, a contiguous byte buffer in a
//! chosen byte order. The [`BinaryObject`] trait captures that contract, and
//! the derive macro of the same name generates implementations for structs
//! and fieldless enums from their declared fields.

#![warn(missing_docs)]

pub mod endian;
pub mod util;

#[cfg(feature = "derive")]
pub mod derive;

mod error;
mod macros;

pub use self::endian::Endian;
pub use self::error::Error;

#[cfg(feature = "derive")]
pub use binobj_derive::BinaryObject;

use std::convert::TryFrom;
use std::mem;

/// A type with a deterministic binary layout.
///
/// Implementations are expected to be *symmetric*: for any value within its
/// declared constraints, `read_bytes` applied to the output of `write_bytes`
/// yields an equal value, and `byte_count` equals the number of bytes
/// actually written.
pub trait BinaryObject: Sized {
    /// The fewest bytes any value of this type can occupy when encoded.
    ///
    /// `read_bytes` fails without consuming anything when given a buffer
    /// shorter than this.
    const MIN_BYTE_COUNT: usize;

    /// Returns the exact number of bytes `write_bytes` will produce for
    /// this value.
    fn byte_count(&self) -> usize;

    /// Writes this value to the start of `buf` in the given byte order.
    ///
    /// Returns the number of bytes written. If `buf` is too short for the
    /// whole value, an error is returned before any byte of `buf` is
    /// modified.
    fn write_bytes(&self, endian: Endian, buf: &mut [u8]) -> Result<usize, Error>;

    /// Reads a value from the start of `buf` in the given byte order.
    ///
    /// Returns the value together with the number of bytes consumed.
    fn read_bytes(endian: Endian, buf: &[u8]) -> Result<(Self, usize), Error>;

    /// Encodes this value into a freshly allocated byte vector.
    fn to_vec(&self, endian: Endian) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; self.byte_count()];
        let written = self.write_bytes(endian, &mut buf)?;
        buf.truncate(written);
        Ok(buf)
    }
}

macro_rules! impl_primitive {
    ($($t:ty)*) => {$(
        impl BinaryObject for $t {
            const MIN_BYTE_COUNT: usize = mem::size_of::<$t>();

            fn byte_count(&self) -> usize {
                mem::size_of::<$t>()
            }

            fn write_bytes(&self, endian: Endian, buf: &mut [u8]) -> Result<usize, Error> {
                let bytes = match endian {
                    Endian::Big => self.to_be_bytes(),
                    Endian::Little => self.to_le_bytes(),
                };
                let available = buf.len();
                let dst = buf
                    .get_mut(..bytes.len())
                    .ok_or_else(|| Error::insufficient_buffer(bytes.len(), available))?;
                dst.copy_from_slice(&bytes);
                Ok(bytes.len())
            }

            fn read_bytes(endian: Endian, buf: &[u8]) -> Result<(Self, usize), Error> {
                let mut bytes = [0u8; mem::size_of::<$t>()];
                let src = buf
                    .get(..bytes.len())
                    .ok_or_else(|| Error::insufficient_buffer(bytes.len(), buf.len()))?;
                bytes.copy_from_slice(src);
                let value = match endian {
                    Endian::Big => Self::from_be_bytes(bytes),
                    Endian::Little => Self::from_le_bytes(bytes),
                };
                Ok((value, bytes.len()))
            }
        }
    )*}
}

impl_primitive! {
    u8 u16 u32 u64 u128 i8 i16 i32 i64 i128 f32 f64
}

impl BinaryObject for bool {
    const MIN_BYTE_COUNT: usize = 1;

    fn byte_count(&self) -> usize {
        1
    }

    fn write_bytes(&self, endian: Endian, buf: &mut [u8]) -> Result<usize, Error> {
        (*self as u8).write_bytes(endian, buf)
    }

    fn read_bytes(endian: Endian, buf: &[u8]) -> Result<(Self, usize), Error> {
        let (byte, consumed) = u8::read_bytes(endian, buf)?;
        match byte {
            0 => Ok((false, consumed)),
            1 => Ok((true, consumed)),
            _ => Err(Error::new(format!(
                "invalid byte value for boolean: expected 0 or 1, got {:?}",
                byte
            ))),
        }
    }
}

impl<T, const N: usize> BinaryObject for [T; N]
where
    T: BinaryObject,
{
    const MIN_BYTE_COUNT: usize = N * T::MIN_BYTE_COUNT;

    fn byte_count(&self) -> usize {
        self.iter().map(BinaryObject::byte_count).sum()
    }

    fn write_bytes(&self, endian: Endian, buf: &mut [u8]) -> Result<usize, Error> {
        let needed = self.byte_count();
        if buf.len() < needed {
            return Err(Error::insufficient_buffer(needed, buf.len()));
        }
        let mut offset = 0;
        for elem in self {
            offset += elem.write_bytes(endian, &mut buf[offset..])?;
        }
        Ok(offset)
    }

    fn read_bytes(endian: Endian, buf: &[u8]) -> Result<(Self, usize), Error> {
        if buf.len() < Self::MIN_BYTE_COUNT {
            return Err(Error::insufficient_buffer(Self::MIN_BYTE_COUNT, buf.len()));
        }
        let mut offset = 0;
        let mut elems = Vec::with_capacity(N);
        for _ in 0..N {
            let (value, consumed) = T::read_bytes(endian, &buf[offset..])?;
            offset += consumed;
            elems.push(value);
        }
        match <[T; N]>::try_from(elems) {
            Ok(array) => Ok((array, offset)),
            Err(_) => unreachable!("element count matches array length"),
        }
    }
}
