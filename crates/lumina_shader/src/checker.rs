//! Local type inference over the shader IR.
//!
//! Inference is deliberately shallow: identifiers are opaque external names
//! and have no type unless annotated, struct and opaque operands stop binary
//! inference, and indexing keeps the base type.

use rustc_hash::FxHashMap;

use crate::ir::{Callee, ShaderCodeBuilder, ValueId, ValueKind};
use crate::types::ShaderType;

/// Memoizing type inferrer bound to one builder.
///
/// The IR is append-only and annotations must be applied before checking, so
/// cached results stay valid for the lifetime of the checker.
pub struct ShaderTypeChecker<'b> {
    builder: &'b ShaderCodeBuilder,
    cache: FxHashMap<ValueId, Option<ShaderType>>,
}

impl<'b> ShaderTypeChecker<'b> {
    #[must_use]
    pub fn new(builder: &'b ShaderCodeBuilder) -> Self {
        Self {
            builder,
            cache: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn builder(&self) -> &'b ShaderCodeBuilder {
        self.builder
    }

    /// Type of `value`, or `None` when it cannot be determined locally.
    pub fn infer_type(&mut self, value: ValueId) -> Option<ShaderType> {
        if let Some(cached) = self.cache.get(&value) {
            return cached.clone();
        }
        let inferred = self.infer_uncached(value);
        self.cache.insert(value, inferred.clone());
        inferred
    }

    fn infer_uncached(&mut self, value: ValueId) -> Option<ShaderType> {
        let builder = self.builder;
        let node = builder.value(value);
        if let Some(annotation) = &node.annotation {
            return Some(annotation.clone());
        }

        match &node.kind {
            ValueKind::Literal(constant) => Some(constant.shader_type()),
            ValueKind::Identifier(_) => None,
            ValueKind::Call { callee, .. } => match callee {
                Callee::Function(id) => builder.function(*id).signature.return_type.clone(),
                Callee::Builtin { return_type, .. } => return_type.clone(),
            },
            ValueKind::Unary { operand, .. } => self.infer_type(*operand),
            ValueKind::Binary { op, lhs, rhs } => {
                if op.is_comparison() {
                    return Some(ShaderType::BOOL);
                }
                let lhs = self.infer_type(*lhs)?;
                let rhs = self.infer_type(*rhs)?;
                promote(lhs, rhs)
            }
            ValueKind::MemberAccess { base, member } => {
                let ShaderType::Struct(id) = self.infer_type(*base)? else {
                    return None;
                };
                let member = builder.value(*member).identifier_name()?;
                builder
                    .struct_type(id)
                    .field(member)
                    .map(|field| field.ty.clone())
            }
            ValueKind::ArrayAccess { base, .. } => self.infer_type(*base),
            ValueKind::Conditional {
                if_true, if_false, ..
            } => self
                .infer_type(*if_true)
                .or_else(|| self.infer_type(*if_false)),
        }
    }
}

/// Result type of a non-comparison binary operator on two known types.
fn promote(lhs: ShaderType, rhs: ShaderType) -> Option<ShaderType> {
    let lhs_channels = lhs.channel_count()?;
    let rhs_channels = rhs.channel_count()?;

    // Matrix operand: the right-hand side decides the shape.
    if lhs_channels > 4 || rhs_channels > 4 {
        return Some(rhs);
    }
    if rhs_channels > lhs_channels {
        Some(rhs)
    } else {
        Some(lhs)
    }
}
