//! Capability configuration.
//!
//! A capability is a named data requirement of a shader fragment, such as
//! `"vertex.world_normal"` or `"material.base_color"`. [`CapabilityConfig`]
//! owns the resources of one shader configuration and maps each capability,
//! once, to the value that provides it plus the resources that value reads.

use lumina_core::{Interner, LuminaError, Result, Symbol};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ir::{ShaderCodeBuilder, ValueId};
use crate::resource::{Resource, ResourceId};

#[derive(Debug)]
struct ResourceEntry {
    resource: Resource,
    accessor_name: String,
    accessor: ValueId,
}

#[derive(Debug, Clone)]
struct CapabilityLink {
    accessor: ValueId,
    resources: SmallVec<[ResourceId; 2]>,
}

/// Append-only resource table plus write-once capability links.
#[derive(Debug, Default)]
pub struct CapabilityConfig {
    names: Interner,
    resources: Vec<ResourceEntry>,
    links: FxHashMap<Symbol, CapabilityLink>,
}

impl CapabilityConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `resource` and creates its accessor identifier in `builder`.
    ///
    /// The accessor name is `res{index}_{name}`, unique within this config.
    pub fn add_resource(&mut self, builder: &mut ShaderCodeBuilder, resource: Resource) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        let accessor_name = format!("res{}_{}", id.index(), resource.name);
        let accessor = match resource.value_type() {
            Some(ty) => builder.make_typed_identifier(accessor_name.clone(), ty),
            None => builder.make_identifier(accessor_name.clone()),
        };
        log::debug!("Added shader resource '{accessor_name}'");
        self.resources.push(ResourceEntry {
            resource,
            accessor_name,
            accessor,
        });
        id
    }

    /// Links `capability` directly to a resource's accessor.
    pub fn link_capability(&mut self, capability: &str, resource: ResourceId) -> Result<()> {
        let accessor = self.entry(resource)?.accessor;
        self.link_capability_with(capability, accessor, [resource])
    }

    /// Links `capability` to an arbitrary value that reads `resources`.
    ///
    /// An empty resource list is valid, for values computed from builtins only.
    pub fn link_capability_with(
        &mut self,
        capability: &str,
        accessor: ValueId,
        resources: impl IntoIterator<Item = ResourceId>,
    ) -> Result<()> {
        let resources = resources.into_iter().collect::<SmallVec<[ResourceId; 2]>>();
        for id in &resources {
            self.entry(*id)?;
        }
        if self.is_linked(capability) {
            return Err(LuminaError::CapabilityAlreadyLinked(capability.to_owned()));
        }

        let symbol = self.names.intern(capability);
        self.links.insert(
            symbol,
            CapabilityLink {
                accessor,
                resources,
            },
        );
        log::debug!("Linked capability '{capability}'");
        Ok(())
    }

    fn link(&self, capability: &str) -> Result<&CapabilityLink> {
        self.names
            .get(capability)
            .and_then(|symbol| self.links.get(&symbol))
            .ok_or_else(|| LuminaError::CapabilityNotLinked(capability.to_owned()))
    }

    /// The value providing `capability`.
    pub fn access_capability(&self, capability: &str) -> Result<ValueId> {
        Ok(self.link(capability)?.accessor)
    }

    /// Resources that `capability` reads. Empty when linked without resources.
    pub fn capability_resources(&self, capability: &str) -> Result<&[ResourceId]> {
        Ok(&self.link(capability)?.resources)
    }

    #[must_use]
    pub fn is_linked(&self, capability: &str) -> bool {
        self.link(capability).is_ok()
    }

    fn entry(&self, id: ResourceId) -> Result<&ResourceEntry> {
        self.resources
            .get(id.index())
            .ok_or(LuminaError::UnknownResource(id.index()))
    }

    pub fn resource(&self, id: ResourceId) -> Result<&Resource> {
        Ok(&self.entry(id)?.resource)
    }

    pub fn accessor_name(&self, id: ResourceId) -> Result<&str> {
        Ok(&self.entry(id)?.accessor_name)
    }

    pub fn resource_accessor(&self, id: ResourceId) -> Result<ValueId> {
        Ok(self.entry(id)?.accessor)
    }

    #[inline]
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Linked capability names, in no particular order.
    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(|symbol| self.names.resolve(*symbol))
    }
}
