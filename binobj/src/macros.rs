/// Defines a type that encodes and decodes as a constant byte string.
///
/// When decoding, the bytes read will be compared against the given string,
/// and an error will be returned if there is a mismatch.
///
/// # Example
///
/// ```
/// use binobj::{BinaryObject, Endian};
/// use binobj::util::magic_bytes;
///
/// // creates a `pub struct Foo;` and a `struct Bar;`:
/// magic_bytes! {
///     #[derive(Debug)]
///     pub Foo(b"FOO");
///
///     #[derive(Debug)]
///     Bar(b"BAR");
/// }
///
/// let bytes = Foo.to_vec(Endian::Big).unwrap();
/// assert_eq!(bytes, b"FOO");
///
/// assert!(Foo::read_bytes(Endian::Big, &bytes).is_ok());
/// assert!(Bar::read_bytes(Endian::Big, &bytes).is_err());
/// ```
#[macro_export]
macro_rules! magic_bytes {
    ($($(#[$attr:meta])* $vis:vis $name:ident($bytes:expr);)*) => {$(
        $(#[$attr])*
        $vis struct $name;

        impl $crate::BinaryObject for $name {
            const MIN_BYTE_COUNT: usize = ($bytes).len();

            fn byte_count(&self) -> usize {
                ($bytes).len()
            }

            fn write_bytes(
                &self,
                _endian: $crate::Endian,
                buf: &mut [u8],
            ) -> Result<usize, $crate::Error> {
                let magic: &[u8] = $bytes;
                let available = buf.len();
                let dst = buf.get_mut(..magic.len()).ok_or_else(|| {
                    $crate::Error::insufficient_buffer(magic.len(), available)
                })?;
                dst.copy_from_slice(magic);
                Ok(magic.len())
            }

            fn read_bytes(
                _endian: $crate::Endian,
                buf: &[u8],
            ) -> Result<(Self, usize), $crate::Error> {
                let magic: &[u8] = $bytes;
                let src = buf.get(..magic.len()).ok_or_else(|| {
                    $crate::Error::insufficient_buffer(magic.len(), buf.len())
                })?;
                if src != magic {
                    return Err($crate::Error::new(format!(
                        "magic bytes mismatch: expected {:x?}, got {:x?}",
                        magic, src,
                    )));
                }
                Ok((Self, magic.len()))
            }
        }
    )*}
}
