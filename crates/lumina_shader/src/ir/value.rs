//! Expression nodes.

use smallvec::SmallVec;

use super::{FunctionId, ValueId};
use crate::types::{Constant, ShaderType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Not,
    BitNot,
}

impl UnaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::Not => "!",
            Self::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "&&",
            Self::Or => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
        }
    }

    /// The six comparisons, whose result is always `bool`.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Less
                | Self::Greater
                | Self::LessEqual
                | Self::GreaterEqual
                | Self::Equal
                | Self::NotEqual
        )
    }
}

/// Target of a call expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A function declared in the same builder.
    Function(FunctionId),
    /// A GLSL builtin or external function (`normalize`, `vec4`, `texture`, ...).
    Builtin {
        name: String,
        return_type: Option<ShaderType>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Literal(Constant),
    /// An opaque external name.
    Identifier(String),
    Call {
        callee: Callee,
        args: SmallVec<[ValueId; 4]>,
    },
    Unary {
        op: UnaryOp,
        operand: ValueId,
    },
    Binary {
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// `base.member`; `member` is an identifier value.
    MemberAccess {
        base: ValueId,
        member: ValueId,
    },
    ArrayAccess {
        base: ValueId,
        index: ValueId,
    },
    Conditional {
        condition: ValueId,
        if_true: ValueId,
        if_false: ValueId,
    },
}

/// An expression node plus an optional explicit type.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub kind: ValueKind,
    /// When set, type inference returns it without looking at `kind`.
    pub annotation: Option<ShaderType>,
}

impl Value {
    #[must_use]
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            annotation: None,
        }
    }

    /// Literals and identifiers.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ValueKind::Literal(_) | ValueKind::Identifier(_))
    }

    #[must_use]
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}
