//! Plan rendering.
//!
//! Turns a layout plan and its reconstruction info into the
//! `impl BinaryObject` token stream. Rendering is deliberately mechanical:
//! every layout decision was already made by the planner, and this module
//! only spells it out as code.

use crate::model::{CollectionKind, Element, Field, LengthPolicy, Primitive};
use crate::plan::{BlockEntry, LayoutPlan, LengthExpr, MinTerm, Segment, VariableSlot};
use proc_macro2::TokenStream;
use quote::quote;

/// How the type's construction expression is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructStyle {
    Named,
    Tuple,
    Unit,
}

/// One original member of the type, in declaration order, and where its
/// value comes from when a decoded instance is rebuilt.
pub enum Reconstruct {
    /// Populated from the decoded local of the classified field at this
    /// index.
    Live { member: syn::Member, field: usize },
    /// Ignored or dropped from the plan; filled with `Default::default()`.
    Defaulted { member: syn::Member },
}

/// Everything the renderer needs for one struct.
pub struct StructInput<'a> {
    pub ident: &'a syn::Ident,
    pub generics: &'a syn::Generics,
    pub crate_path: &'a syn::Path,
    pub style: StructStyle,
    pub fields: &'a [Field],
    pub live: &'a [bool],
    pub plan: &'a LayoutPlan,
    pub reconstruct: &'a [Reconstruct],
}

pub fn render_struct(input: &StructInput) -> TokenStream {
    let ident = input.ident;
    let path = input.crate_path;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let min_expr = min_tokens(&input.plan.min_terms, path);
    let length_expr = expr_tokens(&input.plan.length, input.fields, path);
    let validations = write_validations(input);
    let write_segments: Vec<TokenStream> = input
        .plan
        .segments
        .iter()
        .map(|segment| write_segment(segment, input))
        .collect();
    let read_segments: Vec<TokenStream> = input
        .plan
        .segments
        .iter()
        .map(|segment| read_segment(segment, input))
        .collect();
    let construct = construct_tokens(input);

    quote! {
        #[allow(unused_variables, unused_mut, unused_parens)]
        impl #impl_generics #path::BinaryObject for #ident #ty_generics #where_clause {
            const MIN_BYTE_COUNT: usize = #min_expr;

            fn byte_count(&self) -> usize {
                #length_expr
            }

            fn write_bytes(
                &self,
                endian: #path::Endian,
                buf: &mut [u8],
            ) -> Result<usize, #path::Error> {
                #( #validations )*
                let needed = #path::BinaryObject::byte_count(self);
                if buf.len() < needed {
                    return Err(#path::Error::insufficient_buffer(needed, buf.len()));
                }
                let mut offset = 0usize;
                #( #write_segments )*
                Ok(offset)
            }

            fn read_bytes(
                endian: #path::Endian,
                buf: &[u8],
            ) -> Result<(Self, usize), #path::Error> {
                if buf.len() < <Self as #path::BinaryObject>::MIN_BYTE_COUNT {
                    return Err(#path::Error::insufficient_buffer(
                        <Self as #path::BinaryObject>::MIN_BYTE_COUNT,
                        buf.len(),
                    ));
                }
                let mut offset = 0usize;
                #( #read_segments )*
                Ok((#construct, offset))
            }
        }
    }
}

fn min_tokens(terms: &[MinTerm], path: &syn::Path) -> TokenStream {
    let parts = terms.iter().map(|term| match term {
        MinTerm::Literal(n) => quote!(#n),
        MinTerm::NestedMin { ty, count } => {
            quote!(#count * <#ty as #path::BinaryObject>::MIN_BYTE_COUNT)
        }
    });
    quote!(0usize #( + #parts )*)
}

fn expr_tokens(expr: &LengthExpr, fields: &[Field], path: &syn::Path) -> TokenStream {
    match expr {
        LengthExpr::Literal(n) => quote!(#n),
        LengthExpr::FieldRef(index) => {
            let field = &fields[*index];
            let member = &field.member;
            let ty = &field.ty;
            // a negative length value is caught by write_bytes; byte_count
            // itself stays infallible
            quote! {
                match <usize as ::std::convert::TryFrom<#ty>>::try_from(self.#member) {
                    Ok(count) => count,
                    Err(_) => 0,
                }
            }
        }
        LengthExpr::Mul(a, b) => {
            let a = expr_tokens(a, fields, path);
            let b = expr_tokens(b, fields, path);
            quote!((#a * #b))
        }
        LengthExpr::Add(a, b) => {
            let a = expr_tokens(a, fields, path);
            let b = expr_tokens(b, fields, path);
            quote!((#a + #b))
        }
        LengthExpr::Sub(a, b) => {
            let a = expr_tokens(a, fields, path);
            let b = expr_tokens(b, fields, path);
            quote!((#a).saturating_sub(#b))
        }
        LengthExpr::NestedLen(index) => {
            let field = &fields[*index];
            let member = &field.member;
            match field.collection {
                CollectionKind::Scalar | CollectionKind::FixedArray => {
                    quote!(#path::BinaryObject::byte_count(&self.#member))
                }
                _ => quote! {
                    self.#member
                        .iter()
                        .map(|elem| #path::BinaryObject::byte_count(elem))
                        .sum::<usize>()
                },
            }
        }
        LengthExpr::RemainderLen(index) => {
            let field = &fields[*index];
            let member = &field.member;
            let width = field
                .element
                .primitive_width()
                .expect("remainder length term requires a primitive element");
            quote!((self.#member.len() * #width))
        }
    }
}

/// Checks emitted at the top of `write_bytes`, before any byte is written:
/// every declared count must agree with the in-memory collection.
fn write_validations(input: &StructInput) -> Vec<TokenStream> {
    let path = input.crate_path;
    let mut out = Vec::new();
    for (index, field) in input.fields.iter().enumerate() {
        if !input.live[index] {
            continue;
        }
        let member = &field.member;
        match &field.policy {
            LengthPolicy::Constant { count, .. }
                if field.collection.is_variable_collection() =>
            {
                let msg = format!(
                    "field `{}`: expected {} elements, found {{}}",
                    field.name, count
                );
                out.push(quote! {
                    if self.#member.len() != #count {
                        return Err(#path::Error::new(format!(#msg, self.#member.len())));
                    }
                });
            }
            LengthPolicy::Nested { count: Some(count) } => {
                let msg = format!(
                    "field `{}`: expected {} elements, found {{}}",
                    field.name, count
                );
                out.push(quote! {
                    if self.#member.len() != #count {
                        return Err(#path::Error::new(format!(#msg, self.#member.len())));
                    }
                });
            }
            LengthPolicy::MemberDriven { source, floor } => {
                let source_field = &input.fields[*source];
                let source_member = &source_field.member;
                let underflow = format!(
                    "field `{}`: length field `{}` is below the declared minimum of {}",
                    field.name, source_field.name, floor
                );
                let mismatch = format!(
                    "field `{}`: length field `{}` declares {{}} stored elements, found {{}}",
                    field.name, source_field.name
                );
                out.push(quote! {
                    {
                        let declared: usize =
                            ::std::convert::TryFrom::try_from(self.#source_member)?;
                        let expected = declared
                            .checked_sub(#floor)
                            .ok_or_else(|| #path::Error::new(#underflow))?;
                        if self.#member.len() != expected {
                            return Err(#path::Error::new(format!(
                                #mismatch,
                                expected,
                                self.#member.len(),
                            )));
                        }
                    }
                });
            }
            LengthPolicy::Remainder { min_elements } if *min_elements > 0 => {
                let min = *min_elements;
                let msg = format!(
                    "field `{}`: at least {} elements required, found {{}}",
                    field.name, min
                );
                out.push(quote! {
                    if self.#member.len() < #min {
                        return Err(#path::Error::new(format!(#msg, self.#member.len())));
                    }
                });
            }
            _ => {}
        }
    }
    out
}

fn write_segment(segment: &Segment, input: &StructInput) -> TokenStream {
    match segment {
        Segment::Constant(block) => {
            let total = block.total;
            let stmts = block
                .entries
                .iter()
                .map(|entry| write_block_entry(entry, input));
            quote! {
                #( #stmts )*
                offset += #total;
            }
        }
        Segment::Variable(slot) => write_variable(slot, input),
    }
}

fn write_block_entry(entry: &BlockEntry, input: &StructInput) -> TokenStream {
    let path = input.crate_path;
    let field = &input.fields[entry.field];
    let member = &field.member;
    let off = entry.offset;
    let total = match &field.policy {
        LengthPolicy::Constant { total, .. } => *total,
        other => unreachable!("non-constant field {:?} in a constant block", other),
    };

    if let Element::Primitive { prim, width } = &field.element {
        // byte_length truncation bypasses the primitive's own codec
        if field.collection == CollectionKind::Scalar && *width != prim.width() {
            return truncated_write(field, prim, *width, off, path);
        }
    }

    match field.collection {
        CollectionKind::Scalar | CollectionKind::FixedArray => {
            let end = off + total;
            quote! {
                #path::BinaryObject::write_bytes(
                    &self.#member,
                    endian,
                    &mut buf[offset + #off..offset + #end],
                )?;
            }
        }
        _ => {
            let width = field
                .element
                .primitive_width()
                .expect("constant-length collections hold primitive elements");
            quote! {
                {
                    let mut elem_offset = offset + #off;
                    for elem in self.#member.iter() {
                        elem_offset += #path::BinaryObject::write_bytes(
                            elem,
                            endian,
                            &mut buf[elem_offset..elem_offset + #width],
                        )?;
                    }
                }
            }
        }
    }
}

fn truncated_write(
    field: &Field,
    prim: &Primitive,
    width: usize,
    off: usize,
    path: &syn::Path,
) -> TokenStream {
    let member = &field.member;
    let natural = prim.width();
    let high = natural - width;
    quote! {
        match endian {
            #path::Endian::Little => {
                let bytes = self.#member.to_le_bytes();
                buf[offset + #off..offset + #off + #width].copy_from_slice(&bytes[..#width]);
            }
            #path::Endian::Big => {
                let bytes = self.#member.to_be_bytes();
                buf[offset + #off..offset + #off + #width].copy_from_slice(&bytes[#high..]);
            }
        }
    }
}

fn write_variable(slot: &VariableSlot, input: &StructInput) -> TokenStream {
    let path = input.crate_path;
    let field = &input.fields[slot.field];
    let member = &field.member;
    match &field.policy {
        LengthPolicy::Nested { count: None } => quote! {
            offset += #path::BinaryObject::write_bytes(&self.#member, endian, &mut buf[offset..])?;
        },
        _ => quote! {
            for elem in self.#member.iter() {
                offset += #path::BinaryObject::write_bytes(elem, endian, &mut buf[offset..])?;
            }
        },
    }
}

fn read_segment(segment: &Segment, input: &StructInput) -> TokenStream {
    let path = input.crate_path;
    match segment {
        Segment::Constant(block) => {
            let total = block.total;
            let stmts = block
                .entries
                .iter()
                .map(|entry| read_block_entry(entry, input));
            quote! {
                if buf.len() - offset < #total {
                    return Err(#path::Error::insufficient_buffer(offset + #total, buf.len()));
                }
                #( #stmts )*
                offset += #total;
            }
        }
        Segment::Variable(slot) => read_variable(slot, input),
    }
}

fn read_block_entry(entry: &BlockEntry, input: &StructInput) -> TokenStream {
    let path = input.crate_path;
    let field = &input.fields[entry.field];
    let local = &field.local;
    let ty = &field.ty;
    let off = entry.offset;
    let total = match &field.policy {
        LengthPolicy::Constant { total, .. } => *total,
        other => unreachable!("non-constant field {:?} in a constant block", other),
    };

    if let Element::Primitive { prim, width } = &field.element {
        if field.collection == CollectionKind::Scalar && *width != prim.width() {
            return truncated_read(field, prim, *width, off, path);
        }
    }

    match field.collection {
        CollectionKind::Scalar | CollectionKind::FixedArray => {
            let end = off + total;
            quote! {
                let (#local, _) = <#ty as #path::BinaryObject>::read_bytes(
                    endian,
                    &buf[offset + #off..offset + #end],
                )?;
            }
        }
        _ => {
            let elem_ty = &field.elem_ty;
            let count = match &field.policy {
                LengthPolicy::Constant { count, .. } => *count,
                other => unreachable!("non-constant field {:?} in a constant block", other),
            };
            quote! {
                let #local: #ty = {
                    let mut elems = ::std::vec::Vec::with_capacity(#count);
                    let mut elem_offset = offset + #off;
                    for _ in 0..#count {
                        let (elem, consumed) = <#elem_ty as #path::BinaryObject>::read_bytes(
                            endian,
                            &buf[elem_offset..],
                        )?;
                        elem_offset += consumed;
                        elems.push(elem);
                    }
                    elems.into_iter().collect()
                };
            }
        }
    }
}

fn truncated_read(
    field: &Field,
    prim: &Primitive,
    width: usize,
    off: usize,
    path: &syn::Path,
) -> TokenStream {
    let local = &field.local;
    let ty = &field.ty;
    let natural = prim.width();
    let high = natural - width;
    quote! {
        let #local: #ty = {
            let src = &buf[offset + #off..offset + #off + #width];
            let mut bytes = [0u8; #natural];
            match endian {
                #path::Endian::Little => {
                    bytes[..#width].copy_from_slice(src);
                    <#ty>::from_le_bytes(bytes)
                }
                #path::Endian::Big => {
                    bytes[#high..].copy_from_slice(src);
                    <#ty>::from_be_bytes(bytes)
                }
            }
        };
    }
}

fn read_variable(slot: &VariableSlot, input: &StructInput) -> TokenStream {
    let path = input.crate_path;
    let field = &input.fields[slot.field];
    let local = &field.local;
    let ty = &field.ty;
    let elem_ty = &field.elem_ty;

    match &field.policy {
        LengthPolicy::Nested { count: None } => quote! {
            let (#local, consumed) = <#ty as #path::BinaryObject>::read_bytes(
                endian,
                &buf[offset..],
            )?;
            offset += consumed;
        },
        LengthPolicy::Nested { count: Some(count) } => quote! {
            let #local: #ty = {
                let mut elems = ::std::vec::Vec::with_capacity(#count);
                for _ in 0..#count {
                    let (elem, consumed) = <#elem_ty as #path::BinaryObject>::read_bytes(
                        endian,
                        &buf[offset..],
                    )?;
                    offset += consumed;
                    elems.push(elem);
                }
                elems.into_iter().collect()
            };
        },
        LengthPolicy::MemberDriven { source, floor } => {
            let source_local = &input.fields[*source].local;
            let underflow = format!(
                "field `{}`: length field `{}` is below the declared minimum of {}",
                field.name, input.fields[*source].name, floor
            );
            let body = match &field.element {
                Element::Primitive { width, .. } => quote! {
                    let needed = count * #width;
                    if buf.len() - offset < needed {
                        return Err(#path::Error::insufficient_buffer(
                            offset + needed,
                            buf.len(),
                        ));
                    }
                    let mut elems = ::std::vec::Vec::with_capacity(count);
                },
                Element::Nested => quote! {
                    let mut elems = ::std::vec::Vec::new();
                },
            };
            quote! {
                let #local: #ty = {
                    let declared: usize = ::std::convert::TryFrom::try_from(#source_local)?;
                    let count = declared
                        .checked_sub(#floor)
                        .ok_or_else(|| #path::Error::new(#underflow))?;
                    #body
                    for _ in 0..count {
                        let (elem, consumed) = <#elem_ty as #path::BinaryObject>::read_bytes(
                            endian,
                            &buf[offset..],
                        )?;
                        offset += consumed;
                        elems.push(elem);
                    }
                    elems.into_iter().collect()
                };
            }
        }
        LengthPolicy::Remainder { min_elements } => match &field.element {
            Element::Primitive { width, .. } => {
                let align_msg = format!(
                    "field `{}`: {{}} trailing bytes do not form whole {}-byte elements",
                    field.name, width
                );
                let min_check = if *min_elements > 0 {
                    let min = *min_elements;
                    let msg = format!(
                        "field `{}`: at least {} elements required, found {{}}",
                        field.name, min
                    );
                    quote! {
                        if count < #min {
                            return Err(#path::Error::new(format!(#msg, count)));
                        }
                    }
                } else {
                    quote!()
                };
                quote! {
                    let #local: #ty = {
                        let remaining = buf.len() - offset;
                        if remaining % #width != 0 {
                            return Err(#path::Error::new(format!(
                                #align_msg,
                                remaining % #width,
                            )));
                        }
                        let count = remaining / #width;
                        #min_check
                        let mut elems = ::std::vec::Vec::with_capacity(count);
                        for _ in 0..count {
                            let (elem, consumed) = <#elem_ty as #path::BinaryObject>::read_bytes(
                                endian,
                                &buf[offset..],
                            )?;
                            offset += consumed;
                            elems.push(elem);
                        }
                        elems.into_iter().collect()
                    };
                }
            }
            Element::Nested => {
                let min_check = if *min_elements > 0 {
                    let min = *min_elements;
                    let msg = format!(
                        "field `{}`: at least {} elements required, found {{}}",
                        field.name, min
                    );
                    quote! {
                        if elems.len() < #min {
                            return Err(#path::Error::new(format!(#msg, elems.len())));
                        }
                    }
                } else {
                    quote!()
                };
                quote! {
                    let #local: #ty = {
                        let mut elems = ::std::vec::Vec::new();
                        while offset < buf.len() {
                            let (elem, consumed) = <#elem_ty as #path::BinaryObject>::read_bytes(
                                endian,
                                &buf[offset..],
                            )?;
                            if consumed == 0 {
                                // a zero-length element can never exhaust the buffer
                                break;
                            }
                            offset += consumed;
                            elems.push(elem);
                        }
                        #min_check
                        elems.into_iter().collect()
                    };
                }
            }
        },
        LengthPolicy::Constant { .. } => {
            unreachable!("constant fields never occupy a variable slot")
        }
    }
}

fn construct_tokens(input: &StructInput) -> TokenStream {
    let parts = input.reconstruct.iter().map(|entry| match entry {
        Reconstruct::Live { member, field } => {
            let local = &input.fields[*field].local;
            match member {
                syn::Member::Named(ident) => quote!(#ident: #local),
                syn::Member::Unnamed(_) => quote!(#local),
            }
        }
        Reconstruct::Defaulted { member } => match member {
            syn::Member::Named(ident) => quote!(#ident: ::core::default::Default::default()),
            syn::Member::Unnamed(_) => quote!(::core::default::Default::default()),
        },
    });
    match input.style {
        StructStyle::Named => quote!(Self { #( #parts, )* }),
        StructStyle::Tuple => quote!(Self( #( #parts, )* )),
        StructStyle::Unit => quote!(Self),
    }
}

/// Everything the renderer needs for one fieldless enum.
pub struct EnumInput<'a> {
    pub ident: &'a syn::Ident,
    pub generics: &'a syn::Generics,
    pub crate_path: &'a syn::Path,
    pub repr: Primitive,
    pub repr_ty: &'a syn::Ident,
    pub variants: &'a [(syn::Ident, syn::Expr)],
}

pub fn render_enum(input: &EnumInput) -> TokenStream {
    let ident = input.ident;
    let path = input.crate_path;
    let repr_ty = input.repr_ty;
    let width = input.repr.width();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let write_arms = input
        .variants
        .iter()
        .map(|(variant, id)| quote!(Self::#variant => #id));
    let read_arms = input
        .variants
        .iter()
        .map(|(variant, id)| quote!(value if value == #id => Ok((Self::#variant, consumed))));
    let unknown = format!("unknown discriminant for `{}`: {{:?}}", ident);

    quote! {
        impl #impl_generics #path::BinaryObject for #ident #ty_generics #where_clause {
            const MIN_BYTE_COUNT: usize = #width;

            fn byte_count(&self) -> usize {
                #width
            }

            fn write_bytes(
                &self,
                endian: #path::Endian,
                buf: &mut [u8],
            ) -> Result<usize, #path::Error> {
                let value: #repr_ty = match self {
                    #( #write_arms, )*
                };
                #path::BinaryObject::write_bytes(&value, endian, buf)
            }

            fn read_bytes(
                endian: #path::Endian,
                buf: &[u8],
            ) -> Result<(Self, usize), #path::Error> {
                let (value, consumed) = <#repr_ty as #path::BinaryObject>::read_bytes(endian, buf)?;
                match value {
                    #( #read_arms, )*
                    _ => Err(#path::Error::new(format!(#unknown, value))),
                }
            }
        }
    }
}
