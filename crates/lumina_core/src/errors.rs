//! Error Types
//!
//! This module defines the error type shared by every Lumina crate.
//!
//! # Overview
//!
//! [`LuminaError`] covers the structural failures of the engine core:
//! - Render graph ordering cycles
//! - Draw registry misuse (unknown registrations, out-of-range stages)
//! - Shader IR construction mistakes (no active block, duplicate structs)
//! - Capability linking mistakes
//!
//! All of them are authoring errors: they are raised synchronously to the
//! direct caller and are never recovered internally.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumina_core::errors::{LuminaError, Result};
//!
//! fn build() -> Result<()> {
//!     graph.create_ordering(shadow, opaque)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::handle::RenderStage;

/// The main error type for the Lumina engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LuminaError {
    // ========================================================================
    // Render Graph Errors
    // ========================================================================
    /// Adding `before -> after` would close a cycle.
    #[error("Ordering {before} -> {after} would create a cycle in the render graph")]
    CycleDetected {
        /// Stage that was requested to run first
        before: RenderStage,
        /// Stage that was requested to run afterwards
        after: RenderStage,
    },

    // ========================================================================
    // Scene Registry Errors
    // ========================================================================
    /// Draw invocation for a stage beyond the highest registered stage.
    #[error("Render stage {stage} is out of range (known stages: {known})")]
    StageOutOfRange {
        /// Requested stage
        stage: RenderStage,
        /// Number of stage slots currently known to the registry
        known: usize,
    },

    /// The registration was never issued by this registry or was already removed.
    #[error("Draw registration is unknown or was already removed")]
    UnknownRegistration,

    // ========================================================================
    // Shader IR Errors
    // ========================================================================
    /// A statement was emitted while no block was active.
    #[error("No active block to emit the statement into")]
    NoActiveBlock,

    /// A struct type with this name already exists in the builder.
    #[error("Struct type already declared: {0}")]
    DuplicateStruct(String),

    /// A handle does not refer to an entry of the arena it was used with.
    #[error("Invalid {kind} handle (index: {index})")]
    InvalidHandle {
        /// Kind of arena entry (value, block, function, struct)
        kind: &'static str,
        /// The invalid index
        index: usize,
    },

    // ========================================================================
    // Capability Errors
    // ========================================================================
    /// Capabilities are write-once.
    #[error("Capability already linked: {0}")]
    CapabilityAlreadyLinked(String),

    /// The capability was accessed before being linked.
    #[error("Capability not linked: {0}")]
    CapabilityNotLinked(String),

    /// The resource id does not belong to this capability config.
    #[error("Unknown shader resource: {0}")]
    UnknownResource(usize),

    // ========================================================================
    // Source Assembly Errors
    // ========================================================================
    /// Shader template rendering failed.
    #[error("Shader template error: {0}")]
    Template(String),
}

/// Alias for `Result<T, LuminaError>`.
pub type Result<T> = std::result::Result<T, LuminaError>;
