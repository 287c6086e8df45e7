//! Render stage ordering
//!
//! - [`RenderGraph`]: stages plus "runs before" constraints, cycle-checked on insertion
//! - [`CompiledStages`]: lazy topological order produced by [`RenderGraph::compile`]
//! - [`BuiltinStage`] / [`BuiltinStages`]: the standard frame phases

pub mod graph;
pub mod stage;

pub use graph::{CompiledStages, RenderGraph};
pub use stage::{BuiltinStage, BuiltinStages};
