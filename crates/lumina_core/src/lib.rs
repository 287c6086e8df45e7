//! Lumina Core
//!
//! Foundational types shared by the Lumina crates:
//!
//! - [`errors`]: the engine-wide [`LuminaError`] and [`Result`] alias
//! - [`handle`]: strongly typed stage / subpass / pipeline handles and their allocators
//! - [`interner`]: owned string interner used for capability names

pub mod errors;
pub mod handle;
pub mod interner;

pub use errors::{LuminaError, Result};
pub use handle::{Handle, HandleAllocator, HandleRegistry, Pipeline, RenderStage, SubPass};
pub use interner::{Interner, Symbol};
