//! Constructor binding.
//!
//! Decides how each classified field gets its value back when a decoded
//! instance is reconstructed: supplied to a designated constructor
//! parameter, or assigned to a settable member afterwards. A field that can
//! be populated neither way is dropped from the plan entirely, so the byte
//! layout stays identical on the read and write sides.

use crate::diag::{Code, Diagnostics};
use crate::model::{ConstructorDescriptor, Field};
use quote::ToTokens;

/// How one field is populated during reconstruction.
///
/// Constructor parameters are declared in member order, so a
/// constructor-bound field's argument position is simply its position
/// among the bound fields; no separate ordinal is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Passed to the designated constructor.
    Constructor,
    /// Assigned to the member after construction.
    Member,
}

/// Per-field bindings, aligned with the classified field list. `None`
/// marks a field dropped for being unbindable.
#[derive(Debug, Clone)]
pub struct BindingPlan {
    pub bindings: Vec<Option<Binding>>,
}

impl BindingPlan {
    pub fn live(&self) -> Vec<bool> {
        self.bindings.iter().map(Option::is_some).collect()
    }
}

/// Matches fields against the designated constructor, if any.
///
/// Parameters match fields by case-insensitive name and compatible type
/// (identical, or the parameter is an `Option` of the field's type). Every
/// parameter must bind to exactly one field; fields left over must be
/// settable or they are dropped with a warning.
pub fn bind(
    fields: &[Field],
    constructor: Option<&ConstructorDescriptor>,
) -> (BindingPlan, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mut bindings: Vec<Option<Binding>> = vec![None; fields.len()];
    let mut constructor_bound = vec![false; fields.len()];

    if let Some(constructor) = constructor {
        for param in &constructor.params {
            let matches: Vec<usize> = fields
                .iter()
                .enumerate()
                .filter(|(_, field)| {
                    field.name.eq_ignore_ascii_case(&param.name)
                        && types_compatible(&param.ty, &field.ty)
                })
                .map(|(index, _)| index)
                .collect();

            match matches.as_slice() {
                [] => {
                    diagnostics.error(
                        Code::ConstructorParameterUnmatched,
                        Some(&param.name),
                        "constructor parameter matches no field by name and type",
                    );
                }
                [index] => {
                    if constructor_bound[*index] {
                        diagnostics.error(
                            Code::DuplicateBinding,
                            Some(&param.name),
                            format!(
                                "field `{}` is already bound to an earlier constructor \
                                 parameter",
                                fields[*index].name
                            ),
                        );
                    } else {
                        constructor_bound[*index] = true;
                        bindings[*index] = Some(Binding::Constructor);
                    }
                }
                many => {
                    let names: Vec<&str> =
                        many.iter().map(|&index| fields[index].name.as_str()).collect();
                    diagnostics.error(
                        Code::DuplicateBinding,
                        Some(&param.name),
                        format!(
                            "constructor parameter matches more than one field: {}",
                            names.join(", ")
                        ),
                    );
                }
            }
        }
    }

    for (index, field) in fields.iter().enumerate() {
        if bindings[index].is_some() {
            continue;
        }
        if field.settable {
            bindings[index] = Some(Binding::Member);
        } else {
            diagnostics.warning(
                Code::UnbindableField,
                Some(&field.name),
                "field is neither constructor-supplied nor settable; it is excluded \
                 from the binary layout",
            );
        }
    }

    (BindingPlan { bindings }, diagnostics)
}

/// Identical types, or `param` is an `Option` wrapping the field type.
/// Compared textually; the host hands us verbatim declared types.
fn types_compatible(param: &syn::Type, field: &syn::Type) -> bool {
    let field_tokens = field.to_token_stream().to_string();
    if param.to_token_stream().to_string() == field_tokens {
        return true;
    }
    if let syn::Type::Path(path) = param {
        if let Some(segment) = path.path.segments.last() {
            if segment.ident == "Option" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                        return inner.to_token_stream().to_string() == field_tokens;
                    }
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_fields;
    use crate::model::{Annotations, MemberDescriptor, ParamDescriptor};
    use quote::format_ident;
    use syn::parse_quote;

    fn member(name: &str, ty: syn::Type, settable: bool) -> MemberDescriptor {
        MemberDescriptor {
            name: name.into(),
            member: syn::Member::Named(format_ident!("{}", name)),
            shape: crate::input::parse_shape(&ty),
            ty,
            settable,
            annotations: Annotations::default(),
        }
    }

    fn param(name: &str, ty: syn::Type) -> ParamDescriptor {
        ParamDescriptor {
            name: name.into(),
            ty,
        }
    }

    fn fields_of(members: &[MemberDescriptor]) -> Vec<Field> {
        let classified = classify_fields(members);
        assert!(!classified.diagnostics.has_errors());
        classified.fields
    }

    #[test]
    fn no_constructor_binds_settable_members() {
        let fields = fields_of(&[member("a", parse_quote!(u8), true)]);
        let (plan, diagnostics) = bind(&fields, None);
        assert!(!diagnostics.has_errors());
        assert_eq!(plan.bindings, vec![Some(Binding::Member)]);
    }

    #[test]
    fn parameters_match_case_insensitively() {
        let fields = fields_of(&[
            member("Length", parse_quote!(u16), false),
            member("Payload", parse_quote!(Vec<u8>), false),
        ]);
        let constructor = ConstructorDescriptor {
            params: vec![
                param("length", parse_quote!(u16)),
                param("payload", parse_quote!(Vec<u8>)),
            ],
        };
        let (plan, diagnostics) = bind(&fields, Some(&constructor));
        assert!(!diagnostics.has_errors());
        assert_eq!(
            plan.bindings,
            vec![Some(Binding::Constructor), Some(Binding::Constructor)]
        );
    }

    #[test]
    fn option_wrapped_parameter_is_compatible() {
        let fields = fields_of(&[member("tag", parse_quote!(u8), false)]);
        let constructor = ConstructorDescriptor {
            params: vec![param("tag", parse_quote!(Option<u8>))],
        };
        let (plan, diagnostics) = bind(&fields, Some(&constructor));
        assert!(!diagnostics.has_errors());
        assert_eq!(plan.bindings, vec![Some(Binding::Constructor)]);
    }

    #[test]
    fn unmatched_parameter_is_a_hard_error() {
        let fields = fields_of(&[member("a", parse_quote!(u8), true)]);
        let constructor = ConstructorDescriptor {
            params: vec![param("missing", parse_quote!(u8))],
        };
        let (_, diagnostics) = bind(&fields, Some(&constructor));
        assert!(diagnostics.has_errors());
        assert!(diagnostics
            .codes()
            .contains(&Code::ConstructorParameterUnmatched));
    }

    #[test]
    fn wrong_typed_parameter_does_not_match() {
        let fields = fields_of(&[member("a", parse_quote!(u8), true)]);
        let constructor = ConstructorDescriptor {
            params: vec![param("a", parse_quote!(u32))],
        };
        let (_, diagnostics) = bind(&fields, Some(&constructor));
        assert!(diagnostics
            .codes()
            .contains(&Code::ConstructorParameterUnmatched));
    }

    #[test]
    fn ambiguous_match_is_a_duplicate_binding() {
        let fields = fields_of(&[
            member("len", parse_quote!(u8), false),
            member("Len", parse_quote!(u8), false),
        ]);
        let constructor = ConstructorDescriptor {
            params: vec![param("LEN", parse_quote!(u8))],
        };
        let (_, diagnostics) = bind(&fields, Some(&constructor));
        assert!(diagnostics.codes().contains(&Code::DuplicateBinding));
    }

    #[test]
    fn two_parameters_cannot_bind_one_field() {
        let fields = fields_of(&[member("len", parse_quote!(u8), false)]);
        let constructor = ConstructorDescriptor {
            params: vec![param("len", parse_quote!(u8)), param("LEN", parse_quote!(u8))],
        };
        let (_, diagnostics) = bind(&fields, Some(&constructor));
        assert!(diagnostics.codes().contains(&Code::DuplicateBinding));
    }

    #[test]
    fn unbindable_field_is_dropped_with_a_warning() {
        let fields = fields_of(&[
            member("a", parse_quote!(u8), true),
            member("b", parse_quote!(u8), false),
        ]);
        let (plan, diagnostics) = bind(&fields, None);
        assert!(!diagnostics.has_errors());
        assert!(diagnostics.codes().contains(&Code::UnbindableField));
        assert_eq!(plan.bindings, vec![Some(Binding::Member), None]);
        assert_eq!(plan.live(), vec![true, false]);
    }
}
