//! Derive input adapters.
//!
//! Bridges `darling`'s view of the derive input to the descriptor model the
//! analysis pipeline consumes. This is the only module that knows which
//! attribute spellings exist; past this point everything is
//! [`MemberDescriptor`]s and [`TypeShape`]s.

use crate::model::{
    Annotations, ConstructorDescriptor, Count, ElementShape, MemberDescriptor, ParamDescriptor,
    Primitive, TypeShape,
};
use darling::ast::{Fields, Style};
use darling::{FromField, FromMeta, FromVariant};

/// One field of the deriving type, with its `#[binobj(..)]` annotations.
#[derive(Debug, FromField)]
#[darling(attributes(binobj))]
pub struct FieldReceiver {
    pub ident: Option<syn::Ident>,
    pub ty: syn::Type,

    /// Exclude the field from the binary layout entirely.
    #[darling(default)]
    pub ignore: bool,

    /// Encode only the low-order `n` bytes of an unsigned integer scalar.
    #[darling(default)]
    pub byte_length: Option<usize>,

    /// Element count of a collection: a literal, or the name of an earlier
    /// field read at decode time.
    #[darling(default)]
    pub element_count: Option<Count>,

    /// Floor on the element count of a variable-length collection.
    #[darling(default)]
    pub min_element_count: Option<usize>,

    /// Consume every byte remaining in the buffer.
    #[darling(default)]
    pub read_remaining: bool,
}

/// One variant of a deriving enum. Variants must be fieldless and carry an
/// `id` expression of the enum's declared `repr` type.
#[derive(Debug, FromVariant)]
#[darling(attributes(binobj))]
pub struct VariantReceiver {
    pub ident: syn::Ident,
    pub fields: Fields<FieldReceiver>,
    pub id: Option<syn::LitStr>,
}

impl FromMeta for Count {
    fn from_value(value: &syn::Lit) -> darling::Result<Self> {
        match value {
            syn::Lit::Int(int) => int
                .base10_parse()
                .map(Self::Literal)
                .map_err(|err| darling::Error::custom(err).with_span(int)),
            syn::Lit::Str(name) => Ok(Self::Member(name.value())),
            other => Err(darling::Error::unexpected_lit_type(other)),
        }
    }
}

/// Reduces a declared type to its classification-relevant shape.
///
/// Never fails: a type the layout engine cannot represent comes back as
/// [`TypeShape::Unsupported`] with the reason, and the classifier turns
/// that into a field-level warning.
pub fn parse_shape(ty: &syn::Type) -> TypeShape {
    match ty {
        syn::Type::Paren(inner) => parse_shape(&inner.elem),
        syn::Type::Group(inner) => parse_shape(&inner.elem),
        syn::Type::Array(array) => parse_array_shape(array),
        syn::Type::Path(path) => parse_path_shape(path),
        syn::Type::Reference(_) => {
            TypeShape::Unsupported("a serialized value cannot borrow".into())
        }
        syn::Type::Ptr(_) => TypeShape::Unsupported("raw pointers cannot be serialized".into()),
        syn::Type::Tuple(_) => {
            TypeShape::Unsupported("tuples have no defined binary layout".into())
        }
        syn::Type::Slice(_) => {
            TypeShape::Unsupported("bare slices are unsized; use `Box<[T]>` or `Vec<T>`".into())
        }
        _ => TypeShape::Unsupported("type is not representable in a binary layout".into()),
    }
}

fn parse_array_shape(array: &syn::TypeArray) -> TypeShape {
    let len = match &array.len {
        syn::Expr::Lit(expr) => match &expr.lit {
            syn::Lit::Int(int) => match int.base10_parse::<usize>() {
                Ok(len) => len,
                Err(_) => {
                    return TypeShape::Unsupported("array length is out of range".into());
                }
            },
            _ => return TypeShape::Unsupported("array length must be an integer literal".into()),
        },
        _ => return TypeShape::Unsupported("array length must be an integer literal".into()),
    };
    match element_shape(&array.elem) {
        Some(elem) => TypeShape::Array {
            elem,
            elem_ty: (*array.elem).clone(),
            len,
        },
        None => TypeShape::Unsupported("array element type is not representable".into()),
    }
}

fn parse_path_shape(path: &syn::TypePath) -> TypeShape {
    let segment = match path.path.segments.last() {
        Some(segment) => segment,
        None => return TypeShape::Unsupported("empty type path".into()),
    };
    let name = segment.ident.to_string();

    if let Some(prim) = Primitive::from_name(&name) {
        return TypeShape::Primitive(prim);
    }

    match name.as_str() {
        "usize" | "isize" => {
            TypeShape::Unsupported("pointer-sized integers have no portable byte width".into())
        }
        "Option" => {
            TypeShape::Unsupported("optional fields have no binary representation".into())
        }
        "Vec" => match generic_type_arg(segment) {
            Some(elem_ty) => match element_shape(elem_ty) {
                Some(elem) => TypeShape::Vec {
                    elem,
                    elem_ty: elem_ty.clone(),
                },
                None => TypeShape::Unsupported("element type is not representable".into()),
            },
            None => TypeShape::Unsupported("`Vec` requires one type argument".into()),
        },
        "VecDeque" => match generic_type_arg(segment) {
            Some(elem_ty) => match element_shape(elem_ty) {
                Some(elem) => TypeShape::Deque {
                    elem,
                    elem_ty: elem_ty.clone(),
                },
                None => TypeShape::Unsupported("element type is not representable".into()),
            },
            None => TypeShape::Unsupported("`VecDeque` requires one type argument".into()),
        },
        "Box" => match generic_type_arg(segment) {
            Some(syn::Type::Slice(slice)) => match element_shape(&slice.elem) {
                Some(elem) => TypeShape::Slice {
                    elem,
                    elem_ty: (*slice.elem).clone(),
                },
                None => TypeShape::Unsupported("element type is not representable".into()),
            },
            _ => TypeShape::Unsupported("only `Box<[T]>` is supported for boxed fields".into()),
        },
        _ => TypeShape::Nested,
    }
}

fn generic_type_arg(segment: &syn::PathSegment) -> Option<&syn::Type> {
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    }
}

fn element_shape(ty: &syn::Type) -> Option<ElementShape> {
    match parse_shape(ty) {
        TypeShape::Primitive(prim) => Some(ElementShape::Primitive(prim)),
        TypeShape::Nested => Some(ElementShape::Nested),
        _ => None,
    }
}

/// Converts the received fields to member descriptors in declaration order.
///
/// Named fields are settable; positional fields are not and must go through
/// the tuple constructor. Positional fields are named `field_0`, `field_1`,
/// and so on, matching their constructor parameters.
pub fn member_descriptors(fields: &Fields<FieldReceiver>) -> Vec<MemberDescriptor> {
    let settable = fields.style == Style::Struct;
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let (name, member) = match &field.ident {
                Some(ident) => (ident.to_string(), syn::Member::Named(ident.clone())),
                None => (
                    format!("field_{}", index),
                    syn::Member::Unnamed(syn::Index::from(index)),
                ),
            };
            MemberDescriptor {
                name,
                member,
                shape: parse_shape(&field.ty),
                ty: field.ty.clone(),
                settable,
                annotations: Annotations {
                    ignore: field.ignore,
                    byte_length: field.byte_length,
                    element_count: field.element_count.clone(),
                    min_element_count: field.min_element_count,
                    read_remaining: field.read_remaining,
                },
            }
        })
        .collect()
}

/// The positional constructor of a tuple struct: one parameter per
/// non-ignored member, in declaration order.
pub fn tuple_constructor(members: &[MemberDescriptor]) -> ConstructorDescriptor {
    ConstructorDescriptor {
        params: members
            .iter()
            .filter(|member| !member.annotations.ignore)
            .map(|member| ParamDescriptor {
                name: member.name.clone(),
                ty: member.ty.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn shape(ty: syn::Type) -> TypeShape {
        parse_shape(&ty)
    }

    #[test]
    fn primitives_resolve_by_name() {
        assert!(matches!(
            shape(parse_quote!(u16)),
            TypeShape::Primitive(Primitive::U16)
        ));
        assert!(matches!(
            shape(parse_quote!(bool)),
            TypeShape::Primitive(Primitive::Bool)
        ));
        assert!(matches!(
            shape(parse_quote!(f64)),
            TypeShape::Primitive(Primitive::F64)
        ));
    }

    #[test]
    fn collections_resolve_by_last_segment() {
        assert!(matches!(shape(parse_quote!(Vec<u8>)), TypeShape::Vec { .. }));
        assert!(matches!(
            shape(parse_quote!(std::collections::VecDeque<u16>)),
            TypeShape::Deque { .. }
        ));
        assert!(matches!(
            shape(parse_quote!(Box<[u32]>)),
            TypeShape::Slice { .. }
        ));
        assert!(matches!(
            shape(parse_quote!([i8; 12])),
            TypeShape::Array { len: 12, .. }
        ));
    }

    #[test]
    fn unknown_paths_are_nested() {
        assert!(matches!(shape(parse_quote!(Header)), TypeShape::Nested));
        assert!(matches!(
            shape(parse_quote!(crate::wire::Header)),
            TypeShape::Nested
        ));
    }

    #[test]
    fn collections_of_nested_elements_are_allowed() {
        match shape(parse_quote!(Vec<Header>)) {
            TypeShape::Vec { elem, .. } => assert!(matches!(elem, ElementShape::Nested)),
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn unrepresentable_types_carry_a_reason() {
        let types: Vec<syn::Type> = vec![
            parse_quote!(usize),
            parse_quote!(&'a [u8]),
            parse_quote!((u8, u16)),
            parse_quote!(Option<u8>),
            parse_quote!(Box<u8>),
            parse_quote!(Vec<Vec<u8>>),
        ];
        for ty in types {
            match parse_shape(&ty) {
                TypeShape::Unsupported(reason) => assert!(!reason.is_empty()),
                other => panic!("expected unsupported, got {:?}", other),
            }
        }
    }

    #[test]
    fn count_parses_literals_and_member_names() {
        let literal = Count::from_value(&parse_quote!(4)).unwrap();
        assert!(matches!(literal, Count::Literal(4)));
        let member = Count::from_value(&parse_quote!("length")).unwrap();
        assert!(matches!(member, Count::Member(name) if name == "length"));
        assert!(Count::from_value(&parse_quote!(4.5)).is_err());
    }
}
