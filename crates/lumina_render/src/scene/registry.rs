//! Scene Draw Registry
//!
//! `SceneRegistry` routes draw callbacks through a sparse three-level index:
//!
//! ```text
//! stage -> subpass -> pipeline -> [draw callbacks]
//! ```
//!
//! # Concurrency
//!
//! Any thread may register or unregister callbacks while a render thread
//! invokes them. Locking is bucket-granular:
//! - Each level's table is an `RwLock<Vec<Arc<_>>>` that only grows. Slots are
//!   cloned out as `Arc`s, so no outer lock is held while a bucket is touched.
//! - Each pipeline bucket owns an `RwLock` over its callback vector. Invocation
//!   holds the read lock for the whole callback loop, so it runs concurrently
//!   with other buckets but serializes against mutation of the same bucket.
//! - Each subpass owns a `Mutex` over its active-pipeline list. It is only
//!   taken on a bucket's transition into or out of emptiness, and always while
//!   that bucket's write lock is held, so the list never disagrees with the
//!   bucket contents.
//!
//! Callbacks must not register into or unregister from the bucket that is
//! invoking them.
//!
//! # Removal
//!
//! Removal is O(1) via swap-with-last. The moved entry's recorded position is
//! updated in the same critical section. Callback order within a bucket is
//! registration order until the first removal.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use slotmap::SlotMap;

use lumina_core::{Handle, LuminaError, Pipeline, RenderStage, Result, SubPass};

use super::draw::{DrawEnvironment, DrawFn};
use super::registration::{DrawKey, DrawRegistration, UniqueDrawRegistration};

struct DrawEntry<C> {
    key: DrawKey,
    draw: DrawFn<C>,
}

struct BucketEntries<C> {
    draws: Vec<DrawEntry<C>>,
    /// Key -> current index in `draws`.
    positions: SlotMap<DrawKey, usize>,
}

struct PipelineBucket<C> {
    entries: RwLock<BucketEntries<C>>,
}

impl<C> PipelineBucket<C> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(BucketEntries {
                draws: Vec::new(),
                positions: SlotMap::with_key(),
            }),
        }
    }
}

/// Non-empty pipelines of one subpass, in activation order.
#[derive(Default)]
struct ActivePipelines {
    set: FxHashSet<Pipeline>,
    order: Vec<Pipeline>,
}

impl ActivePipelines {
    fn activate(&mut self, pipeline: Pipeline) {
        if self.set.insert(pipeline) {
            self.order.push(pipeline);
        }
    }

    fn deactivate(&mut self, pipeline: Pipeline) {
        if self.set.remove(&pipeline) {
            self.order.retain(|&p| p != pipeline);
        }
    }
}

struct SubpassSlot<C> {
    pipelines: RwLock<Vec<Arc<PipelineBucket<C>>>>,
    active: Mutex<ActivePipelines>,
}

impl<C> SubpassSlot<C> {
    fn new() -> Self {
        Self {
            pipelines: RwLock::new(Vec::new()),
            active: Mutex::new(ActivePipelines::default()),
        }
    }
}

struct StageSlot<C> {
    subpasses: RwLock<Vec<Arc<SubpassSlot<C>>>>,
}

impl<C> StageSlot<C> {
    fn new() -> Self {
        Self {
            subpasses: RwLock::new(Vec::new()),
        }
    }
}

/// Returns the slot at `index`, growing the table if needed.
fn slot_or_grow<T>(table: &RwLock<Vec<Arc<T>>>, index: usize, make: fn() -> T) -> Arc<T> {
    if let Some(slot) = table.read().get(index) {
        return Arc::clone(slot);
    }
    let mut table = table.write();
    if table.len() <= index {
        table.resize_with(index + 1, || Arc::new(make()));
    }
    Arc::clone(&table[index])
}

fn slot<T>(table: &RwLock<Vec<Arc<T>>>, index: usize) -> Option<Arc<T>> {
    table.read().get(index).map(Arc::clone)
}

/// Thread-safe registry of draw callbacks keyed by (stage, subpass, pipeline).
///
/// `C` is the opaque command-recording handle forwarded to callbacks.
pub struct SceneRegistry<C> {
    stages: RwLock<Vec<Arc<StageSlot<C>>>>,
}

impl<C> Default for SceneRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for SceneRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("known_stages", &self.known_stages())
            .finish_non_exhaustive()
    }
}

impl<C> SceneRegistry<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: RwLock::new(Vec::new()),
        }
    }

    /// Pre-creates slots for the first `stages` stage indices.
    #[must_use]
    pub fn with_capacity(stages: usize) -> Self {
        Self {
            stages: RwLock::new((0..stages).map(|_| Arc::new(StageSlot::new())).collect()),
        }
    }

    /// Number of stage slots known to the registry (highest stage index + 1).
    #[must_use]
    pub fn known_stages(&self) -> usize {
        self.stages.read().len()
    }

    fn subpass_slot(&self, stage: RenderStage, subpass: SubPass) -> Option<Arc<SubpassSlot<C>>> {
        let stage_slot = slot(&self.stages, stage.index())?;
        slot(&stage_slot.subpasses, subpass.index())
    }

    fn bucket(
        &self,
        stage: RenderStage,
        subpass: SubPass,
        pipeline: Pipeline,
    ) -> Option<(Arc<SubpassSlot<C>>, Arc<PipelineBucket<C>>)> {
        let subpass_slot = self.subpass_slot(stage, subpass)?;
        let bucket = slot(&subpass_slot.pipelines, pipeline.index())?;
        Some((subpass_slot, bucket))
    }

    /// Adds `draw` to the (stage, subpass, pipeline) bucket.
    pub fn register_draw_function<F>(
        &self,
        stage: RenderStage,
        subpass: SubPass,
        pipeline: Pipeline,
        draw: F,
    ) -> DrawRegistration
    where
        F: Fn(&DrawEnvironment, &mut C) + Send + Sync + 'static,
    {
        let stage_slot = slot_or_grow(&self.stages, stage.index(), StageSlot::new);
        let subpass_slot = slot_or_grow(&stage_slot.subpasses, subpass.index(), SubpassSlot::new);
        let bucket = slot_or_grow(&subpass_slot.pipelines, pipeline.index(), PipelineBucket::new);

        let mut entries = bucket.entries.write();
        let entries = &mut *entries;
        let index = entries.draws.len();
        let key = entries.positions.insert(index);
        entries.draws.push(DrawEntry {
            key,
            draw: Box::new(draw),
        });

        if index == 0 {
            subpass_slot.active.lock().activate(pipeline);
            log::debug!("SceneRegistry: {pipeline} active in {stage}/{subpass}");
        }

        DrawRegistration {
            stage,
            subpass,
            pipeline,
            key,
        }
    }

    /// Like [`register_draw_function`](Self::register_draw_function), but the
    /// callback is unregistered when the returned guard is dropped.
    pub fn register_unique<F>(
        &self,
        stage: RenderStage,
        subpass: SubPass,
        pipeline: Pipeline,
        draw: F,
    ) -> UniqueDrawRegistration<'_, C>
    where
        F: Fn(&DrawEnvironment, &mut C) + Send + Sync + 'static,
    {
        let registration = self.register_draw_function(stage, subpass, pipeline, draw);
        UniqueDrawRegistration::new(self, registration)
    }

    /// Removes a previously registered callback.
    ///
    /// Fails with [`LuminaError::UnknownRegistration`] if the registration was
    /// already removed.
    pub fn unregister_draw_function(&self, registration: DrawRegistration) -> Result<()> {
        let DrawRegistration {
            stage,
            subpass,
            pipeline,
            key,
        } = registration;
        let (subpass_slot, bucket) = self
            .bucket(stage, subpass, pipeline)
            .ok_or(LuminaError::UnknownRegistration)?;

        let mut entries = bucket.entries.write();
        let entries = &mut *entries;
        let index = entries
            .positions
            .remove(key)
            .ok_or(LuminaError::UnknownRegistration)?;
        debug_assert!(entries.draws[index].key == key);

        entries.draws.swap_remove(index);
        if let Some(moved) = entries.draws.get(index) {
            entries.positions[moved.key] = index;
        }

        if entries.draws.is_empty() {
            subpass_slot.active.lock().deactivate(pipeline);
            log::debug!("SceneRegistry: {pipeline} inactive in {stage}/{subpass}");
        }
        Ok(())
    }

    /// Non-empty pipelines of (stage, subpass), in the order they became non-empty.
    #[must_use]
    pub fn iter_pipelines(&self, stage: RenderStage, subpass: SubPass) -> Vec<Pipeline> {
        self.subpass_slot(stage, subpass)
            .map(|slot| slot.active.lock().order.clone())
            .unwrap_or_default()
    }

    /// Subpasses of `stage` that currently have at least one active pipeline.
    #[must_use]
    pub fn iter_subpasses(&self, stage: RenderStage) -> Vec<SubPass> {
        let Some(stage_slot) = slot(&self.stages, stage.index()) else {
            return Vec::new();
        };
        let subpasses = stage_slot.subpasses.read();
        subpasses
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.active.lock().order.is_empty())
            .map(|(i, _)| SubPass::from_raw(i as u32))
            .collect()
    }

    /// Number of callbacks in one bucket.
    #[must_use]
    pub fn len(&self, stage: RenderStage, subpass: SubPass, pipeline: Pipeline) -> usize {
        self.bucket(stage, subpass, pipeline)
            .map_or(0, |(_, bucket)| bucket.entries.read().draws.len())
    }

    /// Returns `true` if the bucket has no callbacks.
    #[must_use]
    pub fn is_empty(&self, stage: RenderStage, subpass: SubPass, pipeline: Pipeline) -> bool {
        self.len(stage, subpass, pipeline) == 0
    }

    /// Calls every callback of one bucket, returning how many ran.
    ///
    /// Fails with [`LuminaError::StageOutOfRange`] if `stage` is beyond the
    /// highest stage the registry knows about. Unpopulated subpasses and
    /// pipelines of a known stage invoke nothing.
    pub fn invoke_draw_functions(
        &self,
        stage: RenderStage,
        subpass: SubPass,
        pipeline: Pipeline,
        env: &DrawEnvironment,
        cmd: &mut C,
    ) -> Result<usize> {
        let stage_slot = self.known_stage(stage)?;
        let Some(subpass_slot) = slot(&stage_slot.subpasses, subpass.index()) else {
            return Ok(0);
        };
        let Some(bucket) = slot(&subpass_slot.pipelines, pipeline.index()) else {
            return Ok(0);
        };

        let entries = bucket.entries.read();
        for entry in &entries.draws {
            (entry.draw)(env, cmd);
        }
        log::trace!(
            "SceneRegistry: invoked {} draws for {stage}/{subpass}/{pipeline}",
            entries.draws.len()
        );
        Ok(entries.draws.len())
    }

    /// Walks every active bucket of `stage`: subpasses in index order, then
    /// pipelines in activation order. Returns the number of callbacks invoked.
    pub fn invoke_stage(&self, stage: RenderStage, env: &DrawEnvironment, cmd: &mut C) -> Result<usize> {
        self.known_stage(stage)?;

        let mut invoked = 0;
        for subpass in self.iter_subpasses(stage) {
            for pipeline in self.iter_pipelines(stage, subpass) {
                let bucket_env = DrawEnvironment {
                    stage,
                    ..env.with_bucket(subpass, pipeline)
                };
                invoked += self.invoke_draw_functions(stage, subpass, pipeline, &bucket_env, cmd)?;
            }
        }
        Ok(invoked)
    }

    fn known_stage(&self, stage: RenderStage) -> Result<Arc<StageSlot<C>>> {
        let stages = self.stages.read();
        stages
            .get(stage.index())
            .map(Arc::clone)
            .ok_or(LuminaError::StageOutOfRange {
                stage,
                known: stages.len(),
            })
    }
}
