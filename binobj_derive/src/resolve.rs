//! Cross-field reference resolution.
//!
//! An `element_count = "name"` annotation names the field that supplies a
//! collection's element count at decode time. Resolution only ever looks
//! backward, over the fields classified so far, which enforces the
//! "referenced field is declared strictly earlier" rule structurally.

use crate::model::{CollectionKind, Element, Field, LengthPolicy};

/// Why a reference failed to resolve. The two causes surface as distinct
/// diagnostics so the user knows whether to fix the name or the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No earlier field has the given name.
    Missing,
    /// The named field exists but cannot supply an element count; holds a
    /// description of what was found.
    WrongType { found: String },
}

/// Resolves `name` against the fields classified so far, returning the
/// index of the referenced field.
///
/// A valid length source is a fixed-width scalar integer of 1, 2 or 4
/// bytes. Floats, `bool`, collections and nested objects are rejected.
pub fn resolve_reference(name: &str, classified: &[Field]) -> Result<usize, ResolveError> {
    let index = classified
        .iter()
        .position(|field| field.name == name)
        .ok_or(ResolveError::Missing)?;
    let field = &classified[index];

    if field.collection != CollectionKind::Scalar {
        return Err(ResolveError::WrongType {
            found: "a collection".into(),
        });
    }
    // the element check comes first: a nested scalar never has a constant
    // policy, and the name of its kind is the more useful description
    match &field.element {
        Element::Nested => {
            return Err(ResolveError::WrongType {
                found: "a nested object".into(),
            });
        }
        Element::Primitive { prim, .. } if !(prim.is_integer() && prim.width() <= 4) => {
            return Err(ResolveError::WrongType {
                found: format!("`{}`", prim),
            });
        }
        Element::Primitive { .. } => {}
    }
    if !matches!(field.policy, LengthPolicy::Constant { .. }) {
        return Err(ResolveError::WrongType {
            found: "a field without a fixed width".into(),
        });
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Primitive;
    use quote::format_ident;
    use syn::parse_quote;

    fn scalar(name: &str, prim: Primitive) -> Field {
        let ty: syn::Type = syn::parse_str(&prim.to_string()).unwrap();
        Field {
            name: name.into(),
            member: syn::Member::Named(format_ident!("{}", name)),
            local: format_ident!("__binobj_{}", name),
            ty: ty.clone(),
            elem_ty: ty,
            collection: CollectionKind::Scalar,
            element: Element::Primitive {
                prim,
                width: prim.width(),
            },
            policy: LengthPolicy::Constant {
                total: prim.width(),
                count: 1,
            },
            settable: true,
        }
    }

    fn nested(name: &str) -> Field {
        let ty: syn::Type = parse_quote!(Inner);
        Field {
            name: name.into(),
            member: syn::Member::Named(format_ident!("{}", name)),
            local: format_ident!("__binobj_{}", name),
            ty: ty.clone(),
            elem_ty: ty,
            collection: CollectionKind::Scalar,
            element: Element::Nested,
            policy: LengthPolicy::Nested { count: None },
            settable: true,
        }
    }

    #[test]
    fn resolves_earlier_integer_scalars() {
        let fields = vec![scalar("len", Primitive::U16), scalar("tag", Primitive::I8)];
        assert_eq!(resolve_reference("len", &fields), Ok(0));
        assert_eq!(resolve_reference("tag", &fields), Ok(1));
    }

    #[test]
    fn missing_name_is_distinct_from_wrong_type() {
        let fields = vec![scalar("len", Primitive::U16)];
        assert_eq!(resolve_reference("size", &fields), Err(ResolveError::Missing));
    }

    #[test]
    fn rejects_floats_bools_and_wide_integers() {
        let fields = vec![
            scalar("f", Primitive::F32),
            scalar("b", Primitive::Bool),
            scalar("wide", Primitive::U64),
        ];
        for name in &["f", "b", "wide"] {
            match resolve_reference(name, &fields) {
                Err(ResolveError::WrongType { .. }) => {}
                other => panic!("expected wrong-type error for {}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn rejects_scalars_without_a_fixed_width() {
        let mut field = scalar("len", Primitive::U16);
        field.policy = LengthPolicy::Nested { count: None };
        match resolve_reference("len", &[field]) {
            Err(ResolveError::WrongType { found }) => {
                assert!(found.contains("fixed width"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn rejects_nested_objects() {
        let fields = vec![nested("inner")];
        match resolve_reference("inner", &fields) {
            Err(ResolveError::WrongType { found }) => {
                assert!(found.contains("nested"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
