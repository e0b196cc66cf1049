//! Input descriptors and the classified field model.
//!
//! The analysis pipeline works on its own description of a type's members,
//! not on `syn`'s AST directly: the input adapter reduces each declared
//! field to a [`MemberDescriptor`] up front, and everything after that is
//! plain data. `syn` types are carried along only as opaque handles for the
//! renderer.

use std::fmt;

/// A known fixed-width scalar type.
///
/// This is the primitive width table: every scalar the layout engine can
/// place in a constant block, with its byte width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    U64,
    I64,
    F64,
    U128,
    I128,
}

impl Primitive {
    /// Looks up a primitive by its Rust type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "u8" => Self::U8,
            "i8" => Self::I8,
            "u16" => Self::U16,
            "i16" => Self::I16,
            "u32" => Self::U32,
            "i32" => Self::I32,
            "f32" => Self::F32,
            "u64" => Self::U64,
            "i64" => Self::I64,
            "f64" => Self::F64,
            "u128" => Self::U128,
            "i128" => Self::I128,
            _ => return None,
        })
    }

    /// The natural encoded byte width.
    pub fn width(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::U128 | Self::I128 => 16,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Bool | Self::F32 | Self::F64)
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64 | Self::U128)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F64 => "f64",
            Self::U128 => "u128",
            Self::I128 => "i128",
        };
        f.write_str(name)
    }
}

/// The classification-relevant shape of a declared type.
#[derive(Debug, Clone)]
pub enum TypeShape {
    /// A scalar from the primitive width table.
    Primitive(Primitive),
    /// `[T; N]` with a literal length.
    Array { elem: ElementShape, elem_ty: syn::Type, len: usize },
    /// `Box<[T]>`.
    Slice { elem: ElementShape, elem_ty: syn::Type },
    /// `Vec<T>`.
    Vec { elem: ElementShape, elem_ty: syn::Type },
    /// `VecDeque<T>`.
    Deque { elem: ElementShape, elem_ty: syn::Type },
    /// Any other named type; assumed to carry the `BinaryObject` contract.
    Nested,
    /// A shape the layout engine cannot represent; holds the reason.
    Unsupported(String),
}

/// The shape of a collection's element type.
#[derive(Debug, Clone, Copy)]
pub enum ElementShape {
    Primitive(Primitive),
    Nested,
}

/// The layout annotations read off one field.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    pub ignore: bool,
    pub byte_length: Option<usize>,
    pub element_count: Option<Count>,
    pub min_element_count: Option<usize>,
    pub read_remaining: bool,
}

/// An `element_count` value: either a literal or the name of the field
/// that supplies the count at decode time.
#[derive(Debug, Clone)]
pub enum Count {
    Literal(usize),
    Member(String),
}

/// One declared member of the source type, as supplied by the host.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    /// Unique name; positional fields are named `field_0`, `field_1`, ...
    pub name: String,
    /// How the member is accessed on `self`.
    pub member: syn::Member,
    /// The declared type, verbatim, for rendering.
    pub ty: syn::Type,
    /// The declared type, reduced for classification.
    pub shape: TypeShape,
    /// Whether the member can be assigned after construction.
    pub settable: bool,
    pub annotations: Annotations,
}

/// A designated constructor, as supplied by the host.
#[derive(Debug, Clone)]
pub struct ConstructorDescriptor {
    pub params: Vec<ParamDescriptor>,
}

/// One constructor parameter.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub name: String,
    pub ty: syn::Type,
}

/// Which collection idiom a field uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Scalar,
    FixedArray,
    MemorySlice,
    DynamicList,
    GeneralIterable,
}

impl CollectionKind {
    /// True for kinds whose element count is not fixed by the type itself.
    pub fn is_variable_collection(self) -> bool {
        matches!(
            self,
            Self::MemorySlice | Self::DynamicList | Self::GeneralIterable
        )
    }
}

/// What one element of a field encodes as.
#[derive(Debug, Clone)]
pub enum Element {
    /// A table scalar. `width` is the encoded width, which differs from
    /// `prim.width()` when a `byte_length` annotation truncates it.
    Primitive { prim: Primitive, width: usize },
    /// Delegates to the element type's own `BinaryObject` contract.
    Nested,
}

impl Element {
    pub fn primitive_width(&self) -> Option<usize> {
        match self {
            Self::Primitive { width, .. } => Some(*width),
            Self::Nested => None,
        }
    }
}

/// How a field's byte length is determined. Exactly one policy per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Byte length is a compile-time literal: `total` bytes holding
    /// `count` elements (1 for scalars).
    Constant { total: usize, count: usize },
    /// Element count is read from the field at index `source` at decode
    /// time; only the elements beyond `floor` are stored.
    MemberDriven { source: usize, floor: usize },
    /// Consumes all bytes remaining in the buffer, with a floor on the
    /// element count.
    Remainder { min_elements: usize },
    /// Length is the nested type's own business. `count` is `Some(n)` for
    /// a collection of `n` nested elements, `None` when the whole field
    /// delegates in one call.
    Nested { count: Option<usize> },
}

/// A classified field: the unit the planner and binder consume.
///
/// Constructed once during classification and immutable thereafter.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub member: syn::Member,
    /// Local binding used for this field's decoded value.
    pub local: syn::Ident,
    pub ty: syn::Type,
    /// Element type for collections; equal to `ty` for scalars.
    pub elem_ty: syn::Type,
    pub collection: CollectionKind,
    pub element: Element,
    pub policy: LengthPolicy,
    pub settable: bool,
}
