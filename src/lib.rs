#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Lumina
//!
//! Render-graph and shader-generation core of the Lumina engine. This crate
//! re-exports the member crates under one namespace:
//!
//! - [`errors`], [`handle`], [`interner`]: shared core types
//! - [`render`]: stage graph and concurrent draw registry
//! - [`shader`]: shader IR, type checker, GLSL compiler, capability resolver

pub use lumina_core::{errors, handle, interner};
pub use lumina_render as render;
pub use lumina_shader as shader;

pub use lumina_core::{
    Handle, HandleAllocator, HandleRegistry, LuminaError, Pipeline, RenderStage, Result, SubPass,
};
pub use lumina_render::{
    BuiltinStage, BuiltinStages, DrawEnvironment, DrawRegistration, RenderGraph, SceneRegistry,
    UniqueDrawRegistration,
};
pub use lumina_shader::{
    CapabilityConfig, GeneratedShader, ShaderCodeBuilder, ShaderGenSettings,
    ShaderResourceInterfaceBuilder, ShaderSourceAssembler, ShaderType, ShaderTypeChecker,
};
