//! Field classification.
//!
//! Walks the declared members in order and determines, for each one, its
//! collection kind, element representation and length policy. Fields whose
//! types cannot be represented are dropped with a warning; the rest of the
//! type is still processed. Classification is strictly left to right
//! because member references may only look backward.

use crate::diag::{Code, Diagnostics};
use crate::model::{
    Annotations, CollectionKind, Count, Element, ElementShape, Field, LengthPolicy,
    MemberDescriptor, TypeShape,
};
use crate::resolve::{resolve_reference, ResolveError};
use quote::format_ident;

/// The outcome of classifying a whole member list.
pub struct Classified {
    pub fields: Vec<Field>,
    pub diagnostics: Diagnostics,
}

/// Classifies every member in declaration order. Ignored members are
/// skipped; unsupported members are dropped with a warning.
pub fn classify_fields(members: &[MemberDescriptor]) -> Classified {
    let mut fields = Vec::new();
    let mut diagnostics = Diagnostics::new();
    for member in members {
        if member.annotations.ignore {
            continue;
        }
        if let Some(field) = classify(member, &fields, &mut diagnostics) {
            fields.push(field);
        }
    }
    Classified {
        fields,
        diagnostics,
    }
}

fn classify(
    member: &MemberDescriptor,
    classified: &[Field],
    diagnostics: &mut Diagnostics,
) -> Option<Field> {
    let name = member.name.as_str();
    let ann = &member.annotations;

    let (collection, elem_shape, elem_ty) = match &member.shape {
        TypeShape::Primitive(prim) => (
            CollectionKind::Scalar,
            ElementShape::Primitive(*prim),
            member.ty.clone(),
        ),
        TypeShape::Nested => (CollectionKind::Scalar, ElementShape::Nested, member.ty.clone()),
        TypeShape::Array { elem, elem_ty, .. } => {
            (CollectionKind::FixedArray, *elem, elem_ty.clone())
        }
        TypeShape::Slice { elem, elem_ty } => {
            (CollectionKind::MemorySlice, *elem, elem_ty.clone())
        }
        TypeShape::Vec { elem, elem_ty } => {
            (CollectionKind::DynamicList, *elem, elem_ty.clone())
        }
        TypeShape::Deque { elem, elem_ty } => {
            (CollectionKind::GeneralIterable, *elem, elem_ty.clone())
        }
        TypeShape::Unsupported(reason) => {
            diagnostics.warning(
                Code::UnsupportedType,
                Some(name),
                format!(
                    "type has no binary representation ({}); field dropped",
                    reason
                ),
            );
            return None;
        }
    };

    let policy = match collection {
        CollectionKind::Scalar => classify_scalar(name, ann, elem_shape, diagnostics),
        CollectionKind::FixedArray => {
            let len = match &member.shape {
                TypeShape::Array { len, .. } => *len,
                _ => unreachable!("fixed array shape"),
            };
            classify_fixed_array(name, ann, elem_shape, len, diagnostics)
        }
        _ => classify_collection(name, ann, elem_shape, classified, diagnostics)?,
    };

    let element = match elem_shape {
        ElementShape::Primitive(prim) => {
            let width = match &policy {
                // byte_length may have truncated a scalar's width
                LengthPolicy::Constant { total, count } if collection == CollectionKind::Scalar => {
                    debug_assert_eq!(*count, 1);
                    *total
                }
                _ => prim.width(),
            };
            Element::Primitive { prim, width }
        }
        ElementShape::Nested => Element::Nested,
    };

    Some(Field {
        name: member.name.clone(),
        member: member.member.clone(),
        local: format_ident!("__binobj_{}", name),
        ty: member.ty.clone(),
        elem_ty,
        collection,
        element,
        policy,
        settable: member.settable,
    })
}

fn classify_scalar(
    name: &str,
    ann: &Annotations,
    elem: ElementShape,
    diagnostics: &mut Diagnostics,
) -> LengthPolicy {
    if ann.element_count.is_some() {
        diagnostics.warning(
            Code::UnsupportedAnnotation,
            Some(name),
            "`element_count` does not apply to a scalar field; annotation ignored",
        );
    }
    if ann.read_remaining {
        diagnostics.warning(
            Code::UnsupportedAnnotation,
            Some(name),
            "`read_remaining` does not apply to a scalar field; annotation ignored",
        );
    }
    if ann.min_element_count.is_some() {
        diagnostics.warning(
            Code::UnsupportedAnnotation,
            Some(name),
            "`min_element_count` does not apply to a scalar field; annotation ignored",
        );
    }

    match elem {
        ElementShape::Primitive(prim) => {
            let mut width = prim.width();
            if let Some(n) = ann.byte_length {
                if prim.is_unsigned_integer() && n >= 1 && n <= prim.width() {
                    width = n;
                } else {
                    diagnostics.warning(
                        Code::UnsupportedAnnotation,
                        Some(name),
                        format!(
                            "`byte_length = {}` must name between 1 and {} bytes of an \
                             unsigned integer; annotation ignored",
                            n,
                            prim.width()
                        ),
                    );
                }
            }
            LengthPolicy::Constant {
                total: width,
                count: 1,
            }
        }
        ElementShape::Nested => {
            if ann.byte_length.is_some() {
                diagnostics.warning(
                    Code::UnsupportedAnnotation,
                    Some(name),
                    "`byte_length` cannot override a nested object's own length; \
                     annotation ignored",
                );
            }
            LengthPolicy::Nested { count: None }
        }
    }
}

fn classify_fixed_array(
    name: &str,
    ann: &Annotations,
    elem: ElementShape,
    len: usize,
    diagnostics: &mut Diagnostics,
) -> LengthPolicy {
    for (present, what) in &[
        (ann.byte_length.is_some(), "`byte_length`"),
        (ann.element_count.is_some(), "`element_count`"),
        (ann.min_element_count.is_some(), "`min_element_count`"),
        (ann.read_remaining, "`read_remaining`"),
    ] {
        if *present {
            diagnostics.warning(
                Code::UnsupportedAnnotation,
                Some(name),
                format!(
                    "{} does not apply to a fixed array, whose element count comes \
                     from its type; annotation ignored",
                    what
                ),
            );
        }
    }

    match elem {
        ElementShape::Primitive(prim) => LengthPolicy::Constant {
            total: len * prim.width(),
            count: len,
        },
        // the whole array delegates elementwise in one call
        ElementShape::Nested => LengthPolicy::Nested { count: None },
    }
}

fn classify_collection(
    name: &str,
    ann: &Annotations,
    elem: ElementShape,
    classified: &[Field],
    diagnostics: &mut Diagnostics,
) -> Option<LengthPolicy> {
    if ann.byte_length.is_some() {
        // element_count (explicit or inferred) takes precedence over
        // byte_length on a collection; see the derive docs.
        diagnostics.warning(
            Code::UnsupportedAnnotation,
            Some(name),
            "`byte_length` does not apply to a collection; annotation ignored",
        );
    }

    match &ann.element_count {
        Some(Count::Literal(count)) => {
            if ann.read_remaining {
                diagnostics.warning(
                    Code::UnsupportedAnnotation,
                    Some(name),
                    "`read_remaining` conflicts with a literal `element_count`; \
                     annotation ignored",
                );
            }
            if ann.min_element_count.is_some() {
                diagnostics.warning(
                    Code::UnsupportedAnnotation,
                    Some(name),
                    "`min_element_count` has no effect with a literal `element_count`; \
                     annotation ignored",
                );
            }
            Some(match elem {
                ElementShape::Primitive(prim) => LengthPolicy::Constant {
                    total: count * prim.width(),
                    count: *count,
                },
                ElementShape::Nested => LengthPolicy::Nested {
                    count: Some(*count),
                },
            })
        }
        Some(Count::Member(source_name)) => {
            if ann.read_remaining {
                diagnostics.warning(
                    Code::UnsupportedAnnotation,
                    Some(name),
                    "`read_remaining` conflicts with a member-driven `element_count`; \
                     annotation ignored",
                );
            }
            match resolve_reference(source_name, classified) {
                Ok(source) => Some(LengthPolicy::MemberDriven {
                    source,
                    floor: ann.min_element_count.unwrap_or(0),
                }),
                Err(ResolveError::Missing) => {
                    diagnostics.error(
                        Code::ReferenceTargetMissing,
                        Some(name),
                        format!(
                            "`element_count` references `{}`, which is not a field \
                             declared earlier in the type",
                            source_name
                        ),
                    );
                    None
                }
                Err(ResolveError::WrongType { found }) => {
                    diagnostics.error(
                        Code::ReferenceTargetWrongType,
                        Some(name),
                        format!(
                            "`element_count` references `{}`, which must be an integer \
                             scalar of 1, 2 or 4 bytes, but is {}",
                            source_name, found
                        ),
                    );
                    None
                }
            }
        }
        None => Some(LengthPolicy::Remainder {
            min_elements: ann.min_element_count.unwrap_or(0),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Code;
    use crate::input::parse_shape;
    use crate::model::Primitive;
    use syn::parse_quote;

    fn member(name: &str, ty: syn::Type, annotations: Annotations) -> MemberDescriptor {
        MemberDescriptor {
            name: name.into(),
            member: syn::Member::Named(format_ident!("{}", name)),
            shape: parse_shape(&ty),
            ty,
            settable: true,
            annotations,
        }
    }

    fn count_of(name: &str) -> Annotations {
        Annotations {
            element_count: Some(Count::Member(name.into())),
            ..Annotations::default()
        }
    }

    #[test]
    fn scalar_defaults_to_natural_width() {
        let out = classify_fields(&[member("x", parse_quote!(u32), Annotations::default())]);
        assert!(!out.diagnostics.has_errors());
        assert_eq!(
            out.fields[0].policy,
            LengthPolicy::Constant { total: 4, count: 1 }
        );
        assert_eq!(out.fields[0].collection, CollectionKind::Scalar);
    }

    #[test]
    fn unannotated_collection_defaults_to_remainder() {
        let out = classify_fields(&[member("rest", parse_quote!(Vec<u16>), Annotations::default())]);
        assert_eq!(
            out.fields[0].policy,
            LengthPolicy::Remainder { min_elements: 0 }
        );
        assert_eq!(out.fields[0].collection, CollectionKind::DynamicList);
    }

    #[test]
    fn collection_shapes_map_to_kinds() {
        let out = classify_fields(&[
            member("a", parse_quote!([u8; 4]), Annotations::default()),
            member("b", parse_quote!(Box<[u8]>), Annotations::default()),
            member("c", parse_quote!(VecDeque<u8>), Annotations::default()),
        ]);
        // a remainder field not in last position is the planner's problem,
        // not the classifier's
        assert_eq!(out.fields[0].collection, CollectionKind::FixedArray);
        assert_eq!(out.fields[1].collection, CollectionKind::MemorySlice);
        assert_eq!(out.fields[2].collection, CollectionKind::GeneralIterable);
    }

    #[test]
    fn fixed_array_length_comes_from_type() {
        let out = classify_fields(&[member("a", parse_quote!([u16; 3]), Annotations::default())]);
        assert_eq!(
            out.fields[0].policy,
            LengthPolicy::Constant { total: 6, count: 3 }
        );
    }

    #[test]
    fn member_driven_count_resolves_backward() {
        let out = classify_fields(&[
            member("len", parse_quote!(u8), Annotations::default()),
            member("value", parse_quote!(Vec<u8>), count_of("len")),
        ]);
        assert!(!out.diagnostics.has_errors());
        assert_eq!(
            out.fields[1].policy,
            LengthPolicy::MemberDriven { source: 0, floor: 0 }
        );
    }

    #[test]
    fn forward_reference_is_an_error() {
        let out = classify_fields(&[
            member("value", parse_quote!(Vec<u8>), count_of("len")),
            member("len", parse_quote!(u8), Annotations::default()),
        ]);
        assert!(out.diagnostics.has_errors());
        assert!(out.diagnostics.codes().contains(&Code::ReferenceTargetMissing));
        // the dependent field is dropped, the source survives
        assert_eq!(out.fields.len(), 1);
        assert_eq!(out.fields[0].name, "len");
    }

    #[test]
    fn reference_to_float_is_a_wrong_type_error() {
        let out = classify_fields(&[
            member("len", parse_quote!(f32), Annotations::default()),
            member("value", parse_quote!(Vec<u8>), count_of("len")),
        ]);
        assert!(out
            .diagnostics
            .codes()
            .contains(&Code::ReferenceTargetWrongType));
    }

    #[test]
    fn ignore_skips_without_diagnostics() {
        let ann = Annotations {
            ignore: true,
            ..Annotations::default()
        };
        let out = classify_fields(&[member("cache", parse_quote!(String), ann)]);
        assert!(out.fields.is_empty());
        assert!(out.diagnostics.codes().is_empty());
    }

    #[test]
    fn unsupported_type_warns_and_drops() {
        let out = classify_fields(&[
            member("p", parse_quote!(usize), Annotations::default()),
            member("q", parse_quote!(u8), Annotations::default()),
        ]);
        assert!(!out.diagnostics.has_errors());
        assert!(out.diagnostics.codes().contains(&Code::UnsupportedType));
        assert_eq!(out.fields.len(), 1);
        assert_eq!(out.fields[0].name, "q");
    }

    #[test]
    fn byte_length_truncates_unsigned_scalars() {
        let ann = Annotations {
            byte_length: Some(3),
            ..Annotations::default()
        };
        let out = classify_fields(&[member("x", parse_quote!(u32), ann)]);
        assert_eq!(
            out.fields[0].policy,
            LengthPolicy::Constant { total: 3, count: 1 }
        );
        match &out.fields[0].element {
            Element::Primitive { width, .. } => assert_eq!(*width, 3),
            other => panic!("unexpected element: {:?}", other),
        }
    }

    #[test]
    fn byte_length_on_signed_scalar_is_ignored_with_warning() {
        let ann = Annotations {
            byte_length: Some(2),
            ..Annotations::default()
        };
        let out = classify_fields(&[member("x", parse_quote!(i32), ann)]);
        assert!(out.diagnostics.codes().contains(&Code::UnsupportedAnnotation));
        assert_eq!(
            out.fields[0].policy,
            LengthPolicy::Constant { total: 4, count: 1 }
        );
    }

    #[test]
    fn element_count_beats_byte_length_on_collections() {
        let ann = Annotations {
            byte_length: Some(10),
            element_count: Some(Count::Literal(3)),
            ..Annotations::default()
        };
        let out = classify_fields(&[member("v", parse_quote!(Vec<u16>), ann)]);
        assert!(out.diagnostics.codes().contains(&Code::UnsupportedAnnotation));
        assert_eq!(
            out.fields[0].policy,
            LengthPolicy::Constant { total: 6, count: 3 }
        );
    }

    #[test]
    fn nested_collection_with_literal_count() {
        let ann = Annotations {
            element_count: Some(Count::Literal(2)),
            ..Annotations::default()
        };
        let out = classify_fields(&[member("v", parse_quote!(Vec<Inner>), ann)]);
        assert_eq!(out.fields[0].policy, LengthPolicy::Nested { count: Some(2) });
    }

    #[test]
    fn min_element_count_feeds_remainder_floor() {
        let ann = Annotations {
            read_remaining: true,
            min_element_count: Some(2),
            ..Annotations::default()
        };
        let out = classify_fields(&[member("rest", parse_quote!(Vec<u16>), ann)]);
        assert_eq!(
            out.fields[0].policy,
            LengthPolicy::Remainder { min_elements: 2 }
        );
    }
}
