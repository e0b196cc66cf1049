//! Layout planning.
//!
//! Converts the ordered, classified field list into a sequence of segments:
//! maximal runs of fixed-length fields become constant blocks with
//! compile-time offsets, and every variable-length field becomes its own
//! slot. Segments are contiguous; a segment's start offset is the sum of
//! the lengths of all segments before it.

use crate::diag::{Code, Diagnostics};
use crate::model::{CollectionKind, Element, Field, LengthPolicy};

/// A field placed inside a constant block, at a block-relative offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    /// Index into the classified field list.
    pub field: usize,
    /// Byte offset relative to the start of the block.
    pub offset: usize,
}

/// A maximal run of fixed-length fields. Never empty; `total` is the sum
/// of the entries' lengths and is a compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBlock {
    pub entries: Vec<BlockEntry>,
    pub total: usize,
}

/// A single variable-length field forming its own segment boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSlot {
    pub field: usize,
}

/// One contiguous run of the byte layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Constant(ConstantBlock),
    Variable(VariableSlot),
}

/// The whole-object byte length as a small expression tree. Constant
/// segment lengths are folded into a single literal; each variable slot
/// contributes one symbolic term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LengthExpr {
    Literal(usize),
    /// The run-time value of the field at this index, as a count.
    FieldRef(usize),
    Mul(Box<LengthExpr>, Box<LengthExpr>),
    Add(Box<LengthExpr>, Box<LengthExpr>),
    Sub(Box<LengthExpr>, Box<LengthExpr>),
    /// The summed `byte_count` of the field at this index (opaque).
    NestedLen(usize),
    /// The in-memory element count of the field at this index times its
    /// element width (opaque; defined by whatever the collection holds).
    RemainderLen(usize),
}

/// One additive term of the compile-time minimum byte count.
#[derive(Debug, Clone)]
pub enum MinTerm {
    Literal(usize),
    /// `count` times the minimum byte count of `ty`.
    NestedMin { ty: syn::Type, count: usize },
}

/// The ordered segments of a type plus its derived length expressions.
#[derive(Debug, Clone)]
pub struct LayoutPlan {
    pub segments: Vec<Segment>,
    /// Folded sum of every constant block's total.
    pub constant_total: usize,
    /// Whole-object length: `constant_total` plus one term per slot.
    pub length: LengthExpr,
    /// Terms of the smallest length any value of the type can encode to.
    pub min_terms: Vec<MinTerm>,
}

/// The pending constant block while scanning fields.
///
/// An explicit two-state machine so the flush invariant (no empty block is
/// ever pushed) is visible in the types rather than hidden in an `Option`.
enum BlockState {
    Flushed,
    Accumulating(ConstantBlock),
}

impl BlockState {
    fn accumulate(&mut self, field: usize, len: usize) {
        let block = match self {
            Self::Flushed => {
                *self = Self::Accumulating(ConstantBlock {
                    entries: Vec::new(),
                    total: 0,
                });
                match self {
                    Self::Accumulating(block) => block,
                    Self::Flushed => unreachable!(),
                }
            }
            Self::Accumulating(block) => block,
        };
        block.entries.push(BlockEntry {
            field,
            offset: block.total,
        });
        block.total += len;
    }

    fn flush(&mut self, segments: &mut Vec<Segment>) {
        if let Self::Accumulating(block) = std::mem::replace(self, Self::Flushed) {
            assert!(!block.entries.is_empty(), "flushed an empty constant block");
            segments.push(Segment::Constant(block));
        }
    }
}

/// Plans the layout of the live classified fields.
///
/// `live[i]` is false for fields the binder dropped; they take no part in
/// the layout. `declared_constant` is the container-level `constant = n`
/// assertion, if any.
pub fn plan(
    fields: &[Field],
    live: &[bool],
    declared_constant: Option<usize>,
) -> (LayoutPlan, Diagnostics) {
    assert_eq!(fields.len(), live.len());

    let mut diagnostics = Diagnostics::new();
    let mut segments = Vec::new();
    let mut state = BlockState::Flushed;

    let live_indices: Vec<usize> = (0..fields.len()).filter(|&i| live[i]).collect();
    let last_live = live_indices.last().copied();

    for &index in &live_indices {
        let field = &fields[index];
        match &field.policy {
            LengthPolicy::Constant { total, .. } => {
                state.accumulate(index, *total);
            }
            LengthPolicy::MemberDriven { source, .. } => {
                if !live[*source] {
                    diagnostics.error(
                        Code::ReferenceTargetMissing,
                        Some(&field.name),
                        format!(
                            "length source `{}` was removed from the layout",
                            fields[*source].name
                        ),
                    );
                    continue;
                }
                state.flush(&mut segments);
                segments.push(Segment::Variable(VariableSlot { field: index }));
            }
            LengthPolicy::Remainder { .. } => {
                if last_live != Some(index) {
                    diagnostics.error(
                        Code::RemainderNotLast,
                        Some(&field.name),
                        "a remainder-consuming field must be the last field in the type",
                    );
                    continue;
                }
                state.flush(&mut segments);
                segments.push(Segment::Variable(VariableSlot { field: index }));
            }
            LengthPolicy::Nested { .. } => {
                state.flush(&mut segments);
                segments.push(Segment::Variable(VariableSlot { field: index }));
            }
        }
    }
    state.flush(&mut segments);

    let constant_total: usize = segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Constant(block) => Some(block.total),
            Segment::Variable(_) => None,
        })
        .sum();

    let mut length = LengthExpr::Literal(constant_total);
    let mut min_terms = vec![MinTerm::Literal(constant_total)];
    for segment in &segments {
        let slot = match segment {
            Segment::Variable(slot) => slot,
            Segment::Constant(_) => continue,
        };
        let field = &fields[slot.field];
        let term = variable_term(field, slot.field);
        length = LengthExpr::Add(Box::new(length), Box::new(term));
        if let Some(min) = min_term(field) {
            min_terms.push(min);
        }
    }

    if let Some(declared) = declared_constant {
        let variable = segments
            .iter()
            .any(|segment| matches!(segment, Segment::Variable(_)));
        if variable {
            diagnostics.error(
                Code::ConstantLengthMismatch,
                None,
                format!(
                    "type declares a constant length of {} bytes but contains \
                     variable-length fields",
                    declared
                ),
            );
        } else if constant_total != declared {
            diagnostics.error(
                Code::ConstantLengthMismatch,
                None,
                format!(
                    "type declares a constant length of {} bytes but its fields \
                     occupy {}",
                    declared, constant_total
                ),
            );
        }
    }

    (
        LayoutPlan {
            segments,
            constant_total,
            length,
            min_terms,
        },
        diagnostics,
    )
}

/// The symbolic length term one variable slot adds to the whole-object
/// length expression.
fn variable_term(field: &Field, index: usize) -> LengthExpr {
    match (&field.policy, &field.element) {
        (LengthPolicy::MemberDriven { source, floor }, Element::Primitive { width, .. }) => {
            let count = if *floor == 0 {
                LengthExpr::FieldRef(*source)
            } else {
                LengthExpr::Sub(
                    Box::new(LengthExpr::FieldRef(*source)),
                    Box::new(LengthExpr::Literal(*floor)),
                )
            };
            LengthExpr::Mul(Box::new(count), Box::new(LengthExpr::Literal(*width)))
        }
        (LengthPolicy::MemberDriven { .. }, Element::Nested) => LengthExpr::NestedLen(index),
        (LengthPolicy::Remainder { .. }, Element::Primitive { .. }) => {
            LengthExpr::RemainderLen(index)
        }
        (LengthPolicy::Remainder { .. }, Element::Nested) => LengthExpr::NestedLen(index),
        (LengthPolicy::Nested { .. }, _) => LengthExpr::NestedLen(index),
        (LengthPolicy::Constant { .. }, _) => {
            unreachable!("constant fields never occupy a variable slot")
        }
    }
}

/// The minimum-length contribution of one variable slot. Member-driven
/// fields can legitimately hold zero stored elements, so they contribute
/// nothing.
fn min_term(field: &Field) -> Option<MinTerm> {
    match (&field.policy, &field.element) {
        (LengthPolicy::MemberDriven { .. }, _) => None,
        (LengthPolicy::Remainder { min_elements }, Element::Primitive { width, .. }) => {
            Some(MinTerm::Literal(min_elements * width))
        }
        (LengthPolicy::Remainder { min_elements: 0 }, Element::Nested) => None,
        (LengthPolicy::Remainder { min_elements }, Element::Nested) => Some(MinTerm::NestedMin {
            ty: field.elem_ty.clone(),
            count: *min_elements,
        }),
        (LengthPolicy::Nested { count }, _) => {
            let (ty, count) = match count {
                // whole-field delegation: the field type reports its own
                // minimum (covers nested scalars and nested fixed arrays)
                None => (field.ty.clone(), 1),
                Some(n) => (field.elem_ty.clone(), *n),
            };
            if count == 0 {
                None
            } else {
                Some(MinTerm::NestedMin { ty, count })
            }
        }
        (LengthPolicy::Constant { .. }, _) => {
            unreachable!("constant fields never occupy a variable slot")
        }
    }
}
