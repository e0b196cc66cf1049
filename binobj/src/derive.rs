//! The `BinaryObject` derive macro.
//!
//! **Note:** The macro itself is not contained in this module; it is at the
//! top level of the crate. This module is used to document it.
//!
//! The derive walks the declared fields of a struct in order, classifies the
//! binary representation of each one, and generates `byte_count`,
//! `write_bytes` and `read_bytes` routines for an exact, deterministic byte
//! layout. Runs of fixed-width fields are laid out back to back with
//! compile-time offsets; variable-length fields (length-prefixed or
//! remainder-consuming collections, nested binary objects) form boundaries
//! whose lengths are computed from earlier field values at run time.
//!
//! Fieldless enums are also supported; they encode as their declared
//! primitive backing type.
//!
//! # Field type shapes
//!
//! - Primitive scalars (`bool`, `u8`..`u128`, `i8`..`i128`, `f32`, `f64`)
//!   occupy their natural width.
//! - `[T; N]` is a fixed array; its element count comes from the type.
//! - `Vec<T>`, `Box<[T]>` and `VecDeque<T>` are variable-length
//!   collections. Without an annotation they consume every byte remaining
//!   in the buffer, so such a field must be declared last.
//! - Any other named type is assumed to implement [`BinaryObject`] itself
//!   and is delegated to byte-for-byte ("nested object").
//!
//! `usize` and `isize` are rejected: their width is not portable.
//!
//! [`BinaryObject`]: crate::BinaryObject
//!
//! # Field Attributes
//!
//! - **`ignore`** - The field takes no part in the binary layout. When
//!   decoding, it is filled with `Default::default()`.
//!
//! - **`byte_length = n`** - Store an unsigned integer scalar in `n` bytes
//!   instead of its natural width. The low-order bytes are kept; decoding
//!   zero-extends.
//!
//! - **`element_count = n`** - The collection holds exactly `n` elements,
//!   making its byte length a compile-time constant. Writing a collection
//!   of a different length is an error.
//!
//! - **`element_count = "field"`** - The element count is supplied by the
//!   named field, which must be a previously declared integer scalar of
//!   width 1, 2 or 4. The classic length-prefix idiom:
//!
//! ```
//! use binobj::{BinaryObject, Endian};
//!
//! #[derive(Debug, PartialEq, BinaryObject)]
//! struct LengthPrefixedBytes {
//!     len: u16,
//!     #[binobj(element_count = "len")]
//!     bytes: Vec<u8>,
//! }
//!
//! let value = LengthPrefixedBytes {
//!     len: 3,
//!     bytes: vec![0xaa, 0xbb, 0xcc],
//! };
//! assert_eq!(
//!     value.to_vec(Endian::Big).unwrap(),
//!     &[0x00, 0x03, 0xaa, 0xbb, 0xcc],
//! );
//! ```
//!
//! - **`min_element_count = n`** - With `element_count = "field"`, the
//!   referenced count is a total and `n` of it is guaranteed, so only the
//!   elements beyond the floor are stored. With `read_remaining` (or a bare
//!   trailing collection), decoding fails unless at least `n` elements are
//!   present.
//!
//! - **`read_remaining`** - The collection consumes every byte left in the
//!   buffer when decoding, and contributes all of its elements when
//!   encoding. This is the default for unannotated collections; the
//!   explicit form exists to combine with `min_element_count` and to make
//!   the intent visible.
//!
//! When both `element_count` and `byte_length` appear on the same
//! collection, `element_count` wins and the `byte_length` is ignored.
//!
//! # Container Attributes
//!
//! - **`crate_path`** - Specify a custom path to the `binobj` crate. If you
//!   use the `binobj` crate under a different name, this must be set to
//!   that path for the derive to successfully compile.
//!
//! - **`constant = n`** - Assert that the type's layout is fully constant
//!   with a total of exactly `n` bytes. A variable-length field, or a
//!   different total, is a compile error.
//!
//! - **`repr = "u8"`** (enums, required) - The primitive backing type a
//!   fieldless enum encodes as.
//!
//! # Variant Attributes
//!
//! - **`id = "expr"`** (required) - The backing-type value that encodes
//!   this variant, and that selects it when decoding:
//!
//! ```
//! use binobj::{BinaryObject, Endian};
//!
//! #[derive(Debug, PartialEq, BinaryObject)]
//! #[binobj(repr = "u8")]
//! enum Opcode {
//!     #[binobj(id = "0x01")]
//!     Connect,
//!     #[binobj(id = "0x02")]
//!     Disconnect,
//! }
//!
//! assert_eq!(Opcode::Disconnect.to_vec(Endian::Big).unwrap(), &[0x02]);
//! ```
