//! Builtin Stage Definitions
//!
//! `BuiltinStage` names the standard phases of a frame. [`BuiltinStages`]
//! allocates one [`RenderStage`] per phase and chains them in a render graph,
//! so applications can attach custom stages relative to the standard ones.
//!
//! # Stage Overview
//!
//! | Stage | Purpose | Typical Content |
//! |-------|---------|------------------|
//! | `PreProcess` | Resource upload, compute pre-processing | BRDF LUT generation, IBL pre-filtering |
//! | `ShadowMap` | Shadow map rendering | Cascaded shadows, point-light shadows |
//! | `Opaque` | Opaque object rendering | Forward / Deferred rendering |
//! | `Skybox` | Skybox rendering | Environment maps, procedural sky |
//! | `BeforeTransparent` | Work that must see the finished opaque image | Transmission copy |
//! | `Transparent` | Translucent object rendering | Alpha-blended objects |
//! | `PostProcess` | Post-processing effects | ToneMapping, Bloom, FXAA |
//! | `UI` | User interface | Debug overlays |
//!
//! # Example
//!
//! ```ignore
//! let (mut graph, builtin) = RenderGraph::with_builtin_stages(&handles.stages)?;
//! let outline = handles.stages.allocate();
//! graph.create_ordering(builtin[BuiltinStage::Transparent], outline)?;
//! graph.create_ordering(outline, builtin[BuiltinStage::PostProcess])?;
//! ```

use std::ops::Index;

use lumina_core::{HandleAllocator, RenderStage, Result};

use super::graph::RenderGraph;

/// The standard frame phases, in execution order.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[repr(u8)]
pub enum BuiltinStage {
    PreProcess = 0,
    ShadowMap = 1,
    Opaque = 2,
    Skybox = 3,
    BeforeTransparent = 4,
    Transparent = 5,
    PostProcess = 6,
    UI = 7,
}

impl BuiltinStage {
    /// All builtin stages in execution order.
    pub const ALL: [BuiltinStage; 8] = [
        Self::PreProcess,
        Self::ShadowMap,
        Self::Opaque,
        Self::Skybox,
        Self::BeforeTransparent,
        Self::Transparent,
        Self::PostProcess,
        Self::UI,
    ];

    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Stage name (for debugging).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PreProcess => "PreProcess",
            Self::ShadowMap => "ShadowMap",
            Self::Opaque => "Opaque",
            Self::Skybox => "Skybox",
            Self::BeforeTransparent => "BeforeTransparent",
            Self::Transparent => "Transparent",
            Self::PostProcess => "PostProcess",
            Self::UI => "UI",
        }
    }
}

/// Allocated handles of the builtin stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinStages {
    handles: [RenderStage; 8],
}

impl BuiltinStages {
    /// Allocates a handle for each builtin stage.
    pub fn allocate(allocator: &HandleAllocator<RenderStage>) -> Self {
        Self {
            handles: BuiltinStage::ALL.map(|_| allocator.allocate()),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, stage: BuiltinStage) -> RenderStage {
        self.handles[stage.order() as usize]
    }

    /// Reverse lookup of a handle.
    #[must_use]
    pub fn builtin(&self, stage: RenderStage) -> Option<BuiltinStage> {
        self.handles
            .iter()
            .position(|&h| h == stage)
            .map(|i| BuiltinStage::ALL[i])
    }

    /// Inserts every builtin stage into `graph`, chained in execution order.
    pub fn install(&self, graph: &mut RenderGraph) -> Result<()> {
        for pair in self.handles.windows(2) {
            graph.create_ordering(pair[0], pair[1])?;
        }
        Ok(())
    }
}

impl Index<BuiltinStage> for BuiltinStages {
    type Output = RenderStage;

    fn index(&self, stage: BuiltinStage) -> &RenderStage {
        &self.handles[stage.order() as usize]
    }
}

impl RenderGraph {
    /// Creates a graph pre-populated with the chained builtin stages.
    pub fn with_builtin_stages(
        allocator: &HandleAllocator<RenderStage>,
    ) -> Result<(Self, BuiltinStages)> {
        let builtin = BuiltinStages::allocate(allocator);
        let mut graph = Self::with_capacity(BuiltinStage::ALL.len());
        builtin.install(&mut graph)?;
        Ok((graph, builtin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(BuiltinStage::PreProcess < BuiltinStage::ShadowMap);
        assert!(BuiltinStage::ShadowMap < BuiltinStage::Opaque);
        assert!(BuiltinStage::Opaque < BuiltinStage::Skybox);
        assert!(BuiltinStage::Skybox < BuiltinStage::Transparent);
        assert!(BuiltinStage::Transparent < BuiltinStage::PostProcess);
        assert!(BuiltinStage::PostProcess < BuiltinStage::UI);
    }

    #[test]
    fn test_builtin_graph_compiles_in_stage_order() {
        let allocator = HandleAllocator::new();
        let (graph, builtin) = RenderGraph::with_builtin_stages(&allocator).unwrap();

        let order: Vec<_> = graph
            .compile()
            .map(|s| builtin.builtin(s).unwrap())
            .collect();
        assert_eq!(order, BuiltinStage::ALL.to_vec());
    }

    #[test]
    fn test_custom_stage_between_builtins() {
        let allocator = HandleAllocator::new();
        let (mut graph, builtin) = RenderGraph::with_builtin_stages(&allocator).unwrap();
        let outline = allocator.allocate();

        graph
            .create_ordering(builtin[BuiltinStage::Transparent], outline)
            .unwrap();
        graph
            .create_ordering(outline, builtin[BuiltinStage::PostProcess])
            .unwrap();

        let order: Vec<_> = graph.compile().collect();
        let pos = |s| order.iter().position(|&x| x == s).unwrap();
        assert!(pos(builtin[BuiltinStage::Transparent]) < pos(outline));
        assert!(pos(outline) < pos(builtin[BuiltinStage::PostProcess]));
        assert!(
            graph
                .create_ordering(builtin[BuiltinStage::UI], outline)
                .is_err()
        );
    }
}
