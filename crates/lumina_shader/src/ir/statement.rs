//! Statements, blocks, functions and struct declarations.

use super::{BlockId, ValueId};
use crate::types::ShaderType;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Return(Option<ValueId>),
    Assignment { target: ValueId, value: ValueId },
    /// A call evaluated for its side effects.
    Call(ValueId),
    If { condition: ValueId, block: BlockId },
}

/// Ordered statement list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub(crate) statements: Vec<Statement>,
}

impl Block {
    #[inline]
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub parameters: Vec<ShaderType>,
    /// `None` is `void`.
    pub return_type: Option<ShaderType>,
}

impl FunctionSignature {
    #[must_use]
    pub fn new(parameters: Vec<ShaderType>, return_type: Option<ShaderType>) -> Self {
        Self {
            parameters,
            return_type,
        }
    }

    /// `void name()`, the shape of an entry point.
    #[must_use]
    pub fn entry_point() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub signature: FunctionSignature,
    pub body: BlockId,
    /// One identifier value per parameter, in signature order.
    pub parameters: Vec<ValueId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub ty: ShaderType,
    pub name: String,
}

impl StructField {
    #[must_use]
    pub fn new(ty: ShaderType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<StructField>,
}

impl StructType {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
