//! Draw callback types.

use lumina_core::{Pipeline, RenderStage, SubPass};

/// Context handed to every draw callback.
///
/// The registry never inspects it; it only forwards it (with the bucket keys
/// filled in when walking a whole stage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawEnvironment {
    pub stage: RenderStage,
    /// Render pass index within the stage, assigned by the frame loop.
    pub pass: u32,
    pub subpass: SubPass,
    pub pipeline: Pipeline,
    pub frame_index: u64,
}

impl DrawEnvironment {
    #[must_use]
    pub fn new(stage: RenderStage, subpass: SubPass, pipeline: Pipeline) -> Self {
        Self {
            stage,
            pass: 0,
            subpass,
            pipeline,
            frame_index: 0,
        }
    }

    /// Environment for the start of a stage walk.
    #[must_use]
    pub fn for_stage(stage: RenderStage, frame_index: u64) -> Self {
        Self {
            stage,
            pass: 0,
            subpass: SubPass::new(0),
            pipeline: Pipeline::new(0),
            frame_index,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_pass(self, pass: u32) -> Self {
        Self { pass, ..self }
    }

    #[inline]
    #[must_use]
    pub fn with_bucket(self, subpass: SubPass, pipeline: Pipeline) -> Self {
        Self {
            subpass,
            pipeline,
            ..self
        }
    }
}

/// A registered draw callback.
///
/// `C` is the opaque command-recording handle of the graphics backend; it is
/// passed through untouched.
pub type DrawFn<C> = Box<dyn Fn(&DrawEnvironment, &mut C) + Send + Sync>;
