//! Shader intermediate representation
//!
//! The [`ShaderCodeBuilder`] owns every node in index-addressed arenas. All
//! other code refers to nodes through the lightweight ids defined here, so
//! arena growth can never invalidate a reference.
//!
//! Values form a DAG: a new value may only reference values created before
//! it, so sharing is allowed and cycles are impossible.

pub mod builder;
pub mod statement;
pub mod value;

pub use builder::ShaderCodeBuilder;
pub use statement::{Block, Function, FunctionSignature, Statement, StructField, StructType};
pub use value::{BinaryOp, Callee, UnaryOp, Value, ValueKind};

macro_rules! define_ir_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Raw index into the owning arena.
            #[inline]
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_ir_id!(
    /// Handle to a [`Value`] in a builder's arena.
    ValueId
);
define_ir_id!(
    /// Handle to a [`Block`] in a builder's arena.
    BlockId
);
define_ir_id!(
    /// Handle to a [`Function`] in a builder's arena.
    FunctionId
);
define_ir_id!(
    /// Handle to a [`StructType`] declared in a builder.
    StructId
);
