//! Derive macro for the `binobj::BinaryObject` trait.
//!
//! The macro runs a small analysis pipeline over the deriving type:
//! classification reduces each field to a collection kind and length
//! policy, binding decides how decoded values repopulate the type, and
//! planning lays the live fields out as constant blocks and variable
//! slots. Rendering then spells the plan out as an `impl`.
//!
//! Problems found along the way are collected, not thrown one at a time:
//! warnings drop the offending field and generation continues, while any
//! error aborts the whole impl and reports everything at once.

use darling::{ast, Error, FromDeriveInput};
use proc_macro2::TokenStream;
use quote::format_ident;
use std::collections::HashMap;
use syn::{parse_macro_input, parse_quote, DeriveInput};

mod bind;
mod classify;
mod diag;
mod input;
mod model;
mod plan;
mod render;
mod resolve;

use crate::bind::bind;
use crate::classify::classify_fields;
use crate::diag::{Diagnostics, Severity};
use crate::input::{member_descriptors, tuple_constructor, FieldReceiver, VariantReceiver};
use crate::model::{Field, MemberDescriptor, Primitive};
use crate::plan::plan;
use crate::render::{
    render_enum, render_struct, EnumInput, Reconstruct, StructInput, StructStyle,
};

#[proc_macro_derive(BinaryObject, attributes(binobj))]
pub fn derive_binary_object(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    ContainerReceiver::from_derive_input(&input)
        .and_then(|receiver| receiver.expand())
        .unwrap_or_else(|error| error.write_errors())
        .into()
}

#[derive(FromDeriveInput)]
#[darling(attributes(binobj))]
struct ContainerReceiver {
    ident: syn::Ident,
    generics: syn::Generics,
    data: ast::Data<VariantReceiver, FieldReceiver>,

    #[darling(default)]
    crate_path: Option<syn::Path>,

    /// Asserts that every value of the type encodes to exactly this many
    /// bytes.
    #[darling(default)]
    constant: Option<usize>,

    /// Backing integer type of a fieldless enum, e.g. `repr = "u16"`.
    #[darling(default)]
    repr: Option<String>,
}

impl ContainerReceiver {
    fn expand(&self) -> Result<TokenStream, Error> {
        let crate_path = self
            .crate_path
            .clone()
            .unwrap_or_else(|| parse_quote!(binobj));
        match &self.data {
            ast::Data::Struct(fields) => self.expand_struct(fields, &crate_path),
            ast::Data::Enum(variants) => self.expand_enum(variants, &crate_path),
        }
    }

    fn expand_struct(
        &self,
        fields: &ast::Fields<FieldReceiver>,
        crate_path: &syn::Path,
    ) -> Result<TokenStream, Error> {
        if self.repr.is_some() {
            return Err(Error::custom("`repr` applies only to enums").with_span(&self.ident));
        }

        let members = member_descriptors(fields);
        let style = match fields.style {
            ast::Style::Struct => StructStyle::Named,
            ast::Style::Tuple => StructStyle::Tuple,
            ast::Style::Unit => StructStyle::Unit,
        };
        let constructor = match style {
            StructStyle::Tuple => Some(tuple_constructor(&members)),
            _ => None,
        };

        let mut diagnostics = Diagnostics::new();
        let classified = classify_fields(&members);
        diagnostics.extend(classified.diagnostics);

        let (binding_plan, bind_diagnostics) = bind(&classified.fields, constructor.as_ref());
        diagnostics.extend(bind_diagnostics);
        let live = binding_plan.live();

        let (layout, plan_diagnostics) = plan(&classified.fields, &live, self.constant);
        diagnostics.extend(plan_diagnostics);

        if diagnostics.has_errors() {
            return Err(self.collect_errors(fields, &diagnostics));
        }

        let reconstruct = reconstruct_list(&members, &classified.fields, &live);
        Ok(render_struct(&StructInput {
            ident: &self.ident,
            generics: &self.generics,
            crate_path,
            style,
            fields: &classified.fields,
            live: &live,
            plan: &layout,
            reconstruct: &reconstruct,
        }))
    }

    fn expand_enum(
        &self,
        variants: &[VariantReceiver],
        crate_path: &syn::Path,
    ) -> Result<TokenStream, Error> {
        let repr_name = match &self.repr {
            Some(name) => name.clone(),
            None => {
                return Err(Error::custom(
                    "deriving `BinaryObject` on an enum requires `#[binobj(repr = \"...\")]`",
                )
                .with_span(&self.ident));
            }
        };
        let repr = match Primitive::from_name(&repr_name) {
            Some(prim) if prim.is_integer() => prim,
            _ => {
                return Err(Error::custom(format!(
                    "`repr = \"{}\"` is not a fixed-width integer type",
                    repr_name
                ))
                .with_span(&self.ident));
            }
        };
        if variants.is_empty() {
            return Err(
                Error::custom("cannot derive `BinaryObject` for an empty enum")
                    .with_span(&self.ident),
            );
        }

        let mut errors = Vec::new();
        if let Some(constant) = self.constant {
            if constant != repr.width() {
                errors.push(
                    Error::custom(format!(
                        "declared constant length {} does not match the {}-byte repr",
                        constant,
                        repr.width()
                    ))
                    .with_span(&self.ident),
                );
            }
        }

        let mut ids = Vec::new();
        for variant in variants {
            if variant.fields.style != ast::Style::Unit {
                errors.push(
                    Error::custom("enum variants with fields are not supported")
                        .with_span(&variant.ident),
                );
                continue;
            }
            match &variant.id {
                Some(lit) => match lit.parse::<syn::Expr>() {
                    Ok(expr) => ids.push((variant.ident.clone(), expr)),
                    Err(error) => errors.push(from_syn_error(error)),
                },
                None => errors.push(
                    Error::custom("enum variant requires `#[binobj(id = \"...\")]`")
                        .with_span(&variant.ident),
                ),
            }
        }
        if !errors.is_empty() {
            return Err(Error::multiple(errors));
        }

        let repr_ty = format_ident!("{}", repr_name);
        Ok(render_enum(&EnumInput {
            ident: &self.ident,
            generics: &self.generics,
            crate_path,
            repr,
            repr_ty: &repr_ty,
            variants: &ids,
        }))
    }

    /// Maps the collected error diagnostics onto `darling` errors, spanned
    /// at the offending field where one can be named.
    fn collect_errors(
        &self,
        fields: &ast::Fields<FieldReceiver>,
        diagnostics: &Diagnostics,
    ) -> Error {
        let spans: HashMap<String, &syn::Ident> = fields
            .iter()
            .filter_map(|field| field.ident.as_ref())
            .map(|ident| (ident.to_string(), ident))
            .collect();

        Error::multiple(
            diagnostics
                .iter()
                .filter(|diagnostic| diagnostic.severity == Severity::Error)
                .map(|diagnostic| {
                    let error = Error::custom(diagnostic);
                    match diagnostic.subject.as_ref().and_then(|name| spans.get(name)) {
                        Some(ident) => error.with_span(ident),
                        None => error.with_span(&self.ident),
                    }
                })
                .collect(),
        )
    }
}

/// Pairs every original member with its value source at reconstruction
/// time. Ignored and dropped members come back as `Default::default()`.
fn reconstruct_list(
    members: &[MemberDescriptor],
    fields: &[Field],
    live: &[bool],
) -> Vec<Reconstruct> {
    members
        .iter()
        .map(|member| {
            match fields.iter().position(|field| field.name == member.name) {
                Some(index) if live[index] => Reconstruct::Live {
                    member: member.member.clone(),
                    field: index,
                },
                _ => Reconstruct::Defaulted {
                    member: member.member.clone(),
                },
            }
        })
        .collect()
}

fn from_syn_error(err: syn::Error) -> Error {
    Error::custom(&err).with_span(&err.span())
}
