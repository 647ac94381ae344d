//! Dimension-aware marshalling synthesis
//!
//! A [`MarshalPlan`] resolves every member of a struct to its leaf type and
//! checks that each variable dimension can be sized while decoding.
//! [`synthesize`] walks the plan depth-first, member by member in wire order
//! and axis by axis outermost first, calling into a [`MarshalRenderer`].
//! Backends implement the renderer and supply syntax only; the traversal,
//! and therefore the encode, decode and size semantics, live here.
//!
//! For `values: double[count][3]` the renderer sees:
//!
//! ```text
//! begin_member(values)
//!   variable_array(depth 0, "count")
//!     fixed_array(depth 1, 3)
//!       primitive(double, depth 2)
//!     close_array(depth 1)
//!   close_array(depth 0)
//! end_member(values)
//! ```

use crate::error::ModelError;
use crate::model::{Member, Schema, StructDef};
use crate::types::{Dimension, PrimitiveType, TypeName};

/// Which routine is being synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Encode,
    Decode,
    Size,
}

/// Element type at the bottom of a member's dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf<'a> {
    Primitive(PrimitiveType),
    Struct(&'a TypeName),
}

/// One array axis of a member during traversal
#[derive(Debug, Clone, Copy)]
pub struct Axis<'a> {
    pub member: &'a Member,
    /// Zero for the outermost axis
    pub depth: usize,
    pub dimension: &'a Dimension,
}

impl Axis<'_> {
    /// Whether this is the innermost axis of its member
    pub fn is_innermost(&self) -> bool {
        self.depth + 1 == self.member.dimensions().len()
    }
}

/// A member with its leaf type resolved
#[derive(Debug, Clone)]
pub struct MemberPlan<'a> {
    index: usize,
    member: &'a Member,
    leaf: Leaf<'a>,
}

impl<'a> MemberPlan<'a> {
    /// Position in the struct's wire order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn member(&self) -> &'a Member {
        self.member
    }

    pub fn name(&self) -> &'a str {
        self.member.name()
    }

    pub fn dimensions(&self) -> &'a [Dimension] {
        self.member.dimensions()
    }

    pub fn leaf(&self) -> Leaf<'a> {
        self.leaf
    }

    /// Whether some other member's variable dimension reads this member
    pub fn sizes_another_member(&self, plan: &MarshalPlan<'_>) -> bool {
        plan.members.iter().any(|other| {
            other.dimensions().iter().any(|dim| {
                matches!(dim, Dimension::Variable { size_field } if size_field == self.name())
            })
        })
    }
}

/// Resolved, order-checked traversal plan for one struct
#[derive(Debug, Clone)]
pub struct MarshalPlan<'a> {
    def: &'a StructDef,
    members: Vec<MemberPlan<'a>>,
}

impl<'a> MarshalPlan<'a> {
    /// Resolve the members of `def` against `schema`.
    ///
    /// Members are never reordered: a variable dimension sized by a field
    /// declared later could not be decoded in wire order, so it is rejected.
    pub fn new(def: &'a StructDef, schema: &Schema) -> Result<Self, ModelError> {
        let struct_name = || def.name().full_name();
        let mut members = Vec::with_capacity(def.members().len());

        for (index, member) in def.members().iter().enumerate() {
            let leaf = match member.ty().primitive() {
                Some(primitive) => Leaf::Primitive(primitive),
                None if schema.get(member.ty()).is_some() => Leaf::Struct(member.ty()),
                None => {
                    return Err(ModelError::UnresolvedType {
                        struct_name: struct_name(),
                        member: member.name().to_string(),
                        ty: member.ty().full_name(),
                    });
                }
            };

            for dim in member.dimensions() {
                let Dimension::Variable { size_field } = dim else {
                    continue;
                };
                match def.member_index(size_field) {
                    Some(i) if i < index => {}
                    Some(_) => {
                        return Err(ModelError::SizeFieldDeclaredAfter {
                            struct_name: struct_name(),
                            member: member.name().to_string(),
                            field: size_field.clone(),
                        });
                    }
                    None => {
                        return Err(ModelError::UnknownSizeField {
                            struct_name: struct_name(),
                            member: member.name().to_string(),
                            field: size_field.clone(),
                        });
                    }
                }
            }

            members.push(MemberPlan {
                index,
                member,
                leaf,
            });
        }

        Ok(Self { def, members })
    }

    pub fn struct_def(&self) -> &'a StructDef {
        self.def
    }

    pub fn members(&self) -> &[MemberPlan<'a>] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Syntax hooks called by [`synthesize`]
///
/// Array hooks bracket the traversal of one axis: everything emitted between
/// `fixed_array`/`variable_array` and the matching `close_array` runs once per
/// element of that axis.
pub trait MarshalRenderer {
    fn begin_member(&mut self, _phase: Phase, _member: &MemberPlan<'_>) {}

    /// Open an axis of exactly `size` elements
    fn fixed_array(&mut self, phase: Phase, axis: &Axis<'_>, size: usize);

    /// Open an axis whose length is the current value of `size_field`
    fn variable_array(&mut self, phase: Phase, axis: &Axis<'_>, size_field: &str);

    fn close_array(&mut self, _phase: Phase, _axis: &Axis<'_>) {}

    /// Handle one primitive element found below `depth` axes
    fn primitive(
        &mut self,
        phase: Phase,
        member: &MemberPlan<'_>,
        primitive: PrimitiveType,
        depth: usize,
    );

    /// Handle one struct element found below `depth` axes
    fn struct_ref(&mut self, phase: Phase, member: &MemberPlan<'_>, ty: &TypeName, depth: usize);

    fn end_member(&mut self, _phase: Phase, _member: &MemberPlan<'_>) {}
}

/// Drive `renderer` through the traversal of `plan` for one phase
pub fn synthesize<R>(plan: &MarshalPlan<'_>, phase: Phase, renderer: &mut R)
where
    R: MarshalRenderer + ?Sized,
{
    for member in plan.members() {
        renderer.begin_member(phase, member);
        descend(member, phase, 0, renderer);
        renderer.end_member(phase, member);
    }
}

fn descend<R>(member: &MemberPlan<'_>, phase: Phase, depth: usize, renderer: &mut R)
where
    R: MarshalRenderer + ?Sized,
{
    let Some(dimension) = member.dimensions().get(depth) else {
        match member.leaf() {
            Leaf::Primitive(primitive) => renderer.primitive(phase, member, primitive, depth),
            Leaf::Struct(ty) => renderer.struct_ref(phase, member, ty, depth),
        }
        return;
    };

    let axis = Axis {
        member: member.member(),
        depth,
        dimension,
    };
    match dimension {
        Dimension::Constant { size } => renderer.fixed_array(phase, &axis, *size),
        Dimension::Variable { size_field } => renderer.variable_array(phase, &axis, size_field),
    }
    descend(member, phase, depth + 1, renderer);
    renderer.close_array(phase, &axis);
}
