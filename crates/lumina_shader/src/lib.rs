//! Lumina Shader
//!
//! GLSL generation from an in-memory IR:
//!
//! - [`types`]: shader types and literal constants
//! - [`ir`]: value / statement arena and the [`ShaderCodeBuilder`]
//! - [`checker`]: local type inference ([`ShaderTypeChecker`])
//! - [`compiler`]: value, block and function lowering to GLSL text
//! - [`resource`] / [`capability`] / [`interface`]: resources, capability
//!   links and per-shader resource declarations
//! - [`source`]: whole-shader assembly through a minijinja template
//! - [`settings`]: codegen configuration
//!
//! Everything here is single-threaded build-time code without internal
//! synchronization.

pub mod capability;
pub mod checker;
pub mod compiler;
pub mod interface;
pub mod ir;
pub mod resource;
pub mod settings;
pub mod source;
pub mod types;

pub use capability::CapabilityConfig;
pub use checker::ShaderTypeChecker;
pub use compiler::{CompiledValue, ShaderBlockCompiler, ShaderValueCompiler};
pub use interface::{DescriptorBindingInfo, PushConstantRange, ShaderResourceInterfaceBuilder};
pub use ir::{
    BinaryOp, Block, BlockId, Callee, Function, FunctionId, FunctionSignature, ShaderCodeBuilder,
    Statement, StructField, StructId, StructType, UnaryOp, Value, ValueId, ValueKind,
};
pub use resource::{
    DescriptorKind, Resource, ResourceId, ResourceKind, ShaderRequirements, ShaderStages,
};
pub use settings::{CompileMode, ShaderGenSettings};
pub use source::{GeneratedShader, ShaderSourceAssembler};
pub use types::{Constant, OpaqueType, ScalarKind, ShaderType};
