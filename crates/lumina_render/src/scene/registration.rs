//! Draw registration handles.

use lumina_core::{Pipeline, RenderStage, SubPass};
use slotmap::new_key_type;

use super::registry::SceneRegistry;

new_key_type! {
    /// Generation-checked key of one entry inside a pipeline bucket.
    pub struct DrawKey;
}

/// Identifies one registered draw callback.
///
/// Carries the full bucket path plus a generation-checked key, so removal
/// needs no search and a stale registration can never remove a newer entry.
/// Only meaningful for the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawRegistration {
    pub stage: RenderStage,
    pub subpass: SubPass,
    pub pipeline: Pipeline,
    pub(crate) key: DrawKey,
}

/// Scope-bound registration: unregisters its callback when dropped.
#[must_use = "dropping a UniqueDrawRegistration immediately unregisters the callback"]
pub struct UniqueDrawRegistration<'r, C> {
    registry: &'r SceneRegistry<C>,
    registration: DrawRegistration,
}

impl<'r, C> UniqueDrawRegistration<'r, C> {
    pub(crate) fn new(registry: &'r SceneRegistry<C>, registration: DrawRegistration) -> Self {
        Self {
            registry,
            registration,
        }
    }

    #[inline]
    #[must_use]
    pub fn registration(&self) -> DrawRegistration {
        self.registration
    }

    /// Gives up ownership without unregistering.
    #[must_use]
    pub fn release(self) -> DrawRegistration {
        let registration = self.registration;
        std::mem::forget(self);
        registration
    }
}

impl<C> Drop for UniqueDrawRegistration<'_, C> {
    fn drop(&mut self) {
        if let Err(err) = self.registry.unregister_draw_function(self.registration) {
            log::error!("Failed to unregister scoped draw function: {err}");
        }
    }
}

impl<C> std::fmt::Debug for UniqueDrawRegistration<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniqueDrawRegistration")
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}
