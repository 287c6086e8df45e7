//! Lumina Render
//!
//! The two structures the frame loop is driven by:
//!
//! - [`graph`]: the render stage dependency graph, compiled once per structural
//!   change into a stage order
//! - [`scene`]: the thread-safe draw registry walked per stage every frame
//!
//! ```rust,ignore
//! for stage in graph.compile() {
//!     registry.invoke_stage(stage, &DrawEnvironment::for_stage(stage, frame), &mut cmd)?;
//! }
//! ```

pub mod graph;
pub mod scene;

pub use graph::{BuiltinStage, BuiltinStages, CompiledStages, RenderGraph};
pub use scene::{DrawEnvironment, DrawFn, DrawRegistration, SceneRegistry, UniqueDrawRegistration};
