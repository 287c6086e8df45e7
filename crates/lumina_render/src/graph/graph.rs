//! Render Stage Graph
//!
//! [`RenderGraph`] stores render stages and the ordering constraints between
//! them, and produces a valid execution order on demand.
//!
//! # Invariants
//! - The dependency relation is acyclic at all times. An ordering that would
//!   close a cycle is rejected by [`RenderGraph::create_ordering`] before any
//!   mutation happens.
//! - [`RenderGraph::compile`] is a pure read. Among mutually unordered stages
//!   the order follows stage insertion order, so the same sequence of
//!   `insert` / `create_ordering` calls always compiles to the same order.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use lumina_core::{LuminaError, RenderStage, Result};

type Dependencies = SmallVec<[usize; 4]>;

/// Directed acyclic graph of render stages.
#[derive(Debug, Default, Clone)]
pub struct RenderGraph {
    /// Stages in insertion order.
    stages: Vec<RenderStage>,
    /// Stage -> slot in `stages`.
    slots: FxHashMap<RenderStage, usize>,
    /// `dependencies[i]` holds the slots that must run strictly before slot `i`.
    dependencies: Vec<Dependencies>,
}

impl RenderGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocates room for `capacity` stages.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stages: Vec::with_capacity(capacity),
            slots: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            dependencies: Vec::with_capacity(capacity),
        }
    }

    /// Adds a stage. Returns `false` if it was already present.
    pub fn insert(&mut self, stage: RenderStage) -> bool {
        if self.slots.contains_key(&stage) {
            return false;
        }
        self.insert_slot(stage);
        true
    }

    fn insert_slot(&mut self, stage: RenderStage) -> usize {
        if let Some(&slot) = self.slots.get(&stage) {
            return slot;
        }
        let slot = self.stages.len();
        self.stages.push(stage);
        self.dependencies.push(Dependencies::new());
        self.slots.insert(stage, slot);
        log::debug!("RenderGraph: inserted {stage}");
        slot
    }

    /// Declares that `before` must execute strictly earlier than `after`.
    ///
    /// Both stages are inserted if unknown. Fails with
    /// [`LuminaError::CycleDetected`] if `after` already (transitively) runs
    /// before `before`; the graph is left untouched in that case.
    pub fn create_ordering(&mut self, before: RenderStage, after: RenderStage) -> Result<()> {
        if before == after || self.depends_on(before, after) {
            log::debug!("RenderGraph: rejected ordering {before} -> {after}");
            return Err(LuminaError::CycleDetected { before, after });
        }

        let before_slot = self.insert_slot(before);
        let after_slot = self.insert_slot(after);

        let deps = &mut self.dependencies[after_slot];
        if !deps.contains(&before_slot) {
            deps.push(before_slot);
            log::debug!("RenderGraph: ordering {before} -> {after}");
        }
        Ok(())
    }

    /// Returns `true` if `dependency` must (transitively) run before `stage`.
    #[must_use]
    pub fn depends_on(&self, stage: RenderStage, dependency: RenderStage) -> bool {
        let (Some(&start), Some(&target)) = (self.slots.get(&stage), self.slots.get(&dependency))
        else {
            return false;
        };

        let mut visited = vec![false; self.stages.len()];
        let mut stack: Vec<usize> = self.dependencies[start].to_vec();
        while let Some(slot) = stack.pop() {
            if slot == target {
                return true;
            }
            if std::mem::replace(&mut visited[slot], true) {
                continue;
            }
            stack.extend_from_slice(&self.dependencies[slot]);
        }
        false
    }

    /// Direct dependencies of `stage`, in the order they were declared.
    pub fn dependencies(&self, stage: RenderStage) -> impl Iterator<Item = RenderStage> + '_ {
        self.slots
            .get(&stage)
            .map(|&slot| self.dependencies[slot].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&slot| self.stages[slot])
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, stage: RenderStage) -> bool {
        self.slots.contains_key(&stage)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stages in insertion order.
    #[inline]
    #[must_use]
    pub fn stages(&self) -> &[RenderStage] {
        &self.stages
    }

    /// Produces a topological order of all stages, lazily.
    ///
    /// Each call returns a fresh iterator reflecting the current edges.
    #[must_use]
    pub fn compile(&self) -> CompiledStages<'_> {
        CompiledStages {
            graph: self,
            visited: vec![false; self.stages.len()],
            stack: Vec::new(),
            next_root: 0,
        }
    }
}

/// Lazy depth-first post-order walk over a [`RenderGraph`].
///
/// Dependencies are visited before their dependents, roots are taken in
/// insertion order.
#[derive(Debug)]
pub struct CompiledStages<'a> {
    graph: &'a RenderGraph,
    visited: Vec<bool>,
    /// (slot, cursor into that slot's dependency list)
    stack: Vec<(usize, usize)>,
    next_root: usize,
}

impl Iterator for CompiledStages<'_> {
    type Item = RenderStage;

    fn next(&mut self) -> Option<RenderStage> {
        loop {
            if let Some((slot, cursor)) = self.stack.last_mut() {
                let deps = &self.graph.dependencies[*slot];
                if let Some(&dep) = deps.get(*cursor) {
                    *cursor += 1;
                    if !self.visited[dep] {
                        self.visited[dep] = true;
                        self.stack.push((dep, 0));
                    }
                    continue;
                }
                let slot = *slot;
                self.stack.pop();
                return Some(self.graph.stages[slot]);
            }

            while self.next_root < self.visited.len() && self.visited[self.next_root] {
                self.next_root += 1;
            }
            if self.next_root == self.visited.len() {
                return None;
            }
            self.visited[self.next_root] = true;
            self.stack.push((self.next_root, 0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stages(n: u32) -> Vec<RenderStage> {
        (0..n).map(RenderStage::new).collect()
    }

    #[test]
    fn test_empty_graph_compiles_to_nothing() {
        let graph = RenderGraph::new();
        assert_eq!(graph.compile().count(), 0);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut graph = RenderGraph::new();
        let s = RenderStage::new(3);
        assert!(graph.insert(s));
        assert!(!graph.insert(s));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_unordered_stages_follow_insertion_order() {
        let s = stages(3);
        let mut graph = RenderGraph::new();
        graph.insert(s[2]);
        graph.insert(s[0]);
        graph.insert(s[1]);
        let order: Vec<_> = graph.compile().collect();
        assert_eq!(order, vec![s[2], s[0], s[1]]);
    }

    #[test]
    fn test_self_ordering_is_a_cycle() {
        let s = RenderStage::new(0);
        let mut graph = RenderGraph::new();
        assert!(graph.create_ordering(s, s).is_err());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_depends_on_is_transitive() {
        let s = stages(3);
        let mut graph = RenderGraph::new();
        graph.create_ordering(s[0], s[1]).unwrap();
        graph.create_ordering(s[1], s[2]).unwrap();
        assert!(graph.depends_on(s[2], s[0]));
        assert!(!graph.depends_on(s[0], s[2]));
        assert_eq!(graph.dependencies(s[2]).collect::<Vec<_>>(), vec![s[1]]);
    }

    #[test]
    fn test_duplicate_edge_is_ignored() {
        let s = stages(2);
        let mut graph = RenderGraph::new();
        graph.create_ordering(s[0], s[1]).unwrap();
        graph.create_ordering(s[0], s[1]).unwrap();
        assert_eq!(graph.dependencies(s[1]).count(), 1);
    }
}
