//! Resource interface of one generated shader.
//!
//! [`ShaderResourceInterfaceBuilder`] materializes the declarations of the
//! resources a shader actually uses. Each resource is declared the first time
//! it is required and ignored afterwards, so a binding shared by several
//! capabilities appears exactly once in the output.
//!
//! Descriptor set indices are not known here. Declarations reference the
//! `<SET>_DESCRIPTOR_SET_INDEX` macro and the pipeline layout stage defines it.

use std::collections::{BTreeMap, BTreeSet};

use lumina_core::Result;
use rustc_hash::FxHashSet;

use crate::capability::CapabilityConfig;
use crate::ir::{ShaderCodeBuilder, ValueId};
use crate::resource::{DescriptorKind, ResourceId, ResourceKind, ShaderStages};

/// Reflection record of a declared descriptor binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorBindingInfo {
    pub resource: ResourceId,
    pub set: String,
    pub binding: u32,
    pub count: u32,
    pub kind: DescriptorKind,
    pub stages: ShaderStages,
}

/// Byte range covered by all declared push constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantRange {
    pub offset: u32,
    pub size: u32,
    pub stages: ShaderStages,
}

#[derive(Debug, Clone)]
struct PushConstantMember {
    offset: u32,
    size: u32,
    stages: ShaderStages,
    declaration: String,
}

pub struct ShaderResourceInterfaceBuilder<'c> {
    config: &'c CapabilityConfig,
    declared: FxHashSet<ResourceId>,
    declarations: Vec<String>,
    bindings: Vec<DescriptorBindingInfo>,
    push_constants: Vec<PushConstantMember>,
    push_constant_offset: u32,
    extensions: BTreeSet<String>,
    includes: BTreeSet<String>,
    defines: BTreeMap<String, Option<String>>,
}

impl<'c> ShaderResourceInterfaceBuilder<'c> {
    #[must_use]
    pub fn new(config: &'c CapabilityConfig) -> Self {
        Self {
            config,
            declared: FxHashSet::default(),
            declarations: Vec::new(),
            bindings: Vec::new(),
            push_constants: Vec::new(),
            push_constant_offset: 0,
            extensions: BTreeSet::new(),
            includes: BTreeSet::new(),
            defines: BTreeMap::new(),
        }
    }

    /// Declares every resource `capability` reads and returns its accessor.
    pub fn require_capability(
        &mut self,
        builder: &ShaderCodeBuilder,
        capability: &str,
    ) -> Result<ValueId> {
        let config = self.config;
        for &resource in config.capability_resources(capability)? {
            self.require_resource(builder, resource)?;
        }
        config.access_capability(capability)
    }

    /// Declares `id` if it has not been declared yet. Returns whether a new
    /// declaration was emitted.
    pub fn require_resource(&mut self, builder: &ShaderCodeBuilder, id: ResourceId) -> Result<bool> {
        let config = self.config;
        let resource = config.resource(id)?;
        if !self.declared.insert(id) {
            return Ok(false);
        }
        let accessor = config.accessor_name(id)?;

        self.extensions.extend(
            resource
                .implicit_extensions()
                .iter()
                .map(|ext| (*ext).to_owned()),
        );
        self.extensions
            .extend(resource.requirements.extensions.iter().cloned());
        self.includes
            .extend(resource.requirements.includes.iter().cloned());
        for (name, value) in &resource.requirements.defines {
            self.defines.insert(name.clone(), value.clone());
        }

        let declaration = resource.declaration(accessor, builder);
        match &resource.kind {
            ResourceKind::PushConstant { ty } => {
                let size = builder.type_size(ty).unwrap_or_default();
                let offset = self.push_constant_offset;
                self.push_constant_offset += size;
                self.push_constants.push(PushConstantMember {
                    offset,
                    size,
                    stages: resource.stages,
                    declaration: format!("layout(offset = {offset}) {declaration}"),
                });
            }
            ResourceKind::Descriptor {
                set,
                binding,
                kind,
                count,
            } => {
                self.bindings.push(DescriptorBindingInfo {
                    resource: id,
                    set: set.clone(),
                    binding: *binding,
                    count: *count,
                    kind: kind.clone(),
                    stages: resource.stages,
                });
                self.declarations.push(declaration);
            }
            _ => self.declarations.push(declaration),
        }
        log::debug!("Declared shader resource '{accessor}'");
        Ok(true)
    }

    #[inline]
    #[must_use]
    pub fn is_declared(&self, id: ResourceId) -> bool {
        self.declared.contains(&id)
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Non-push-constant declarations in first-use order.
    #[must_use]
    pub fn declarations(&self) -> &[String] {
        &self.declarations
    }

    /// Push-constant member lines with explicit offsets, in first-use order.
    pub fn push_constant_members(&self) -> impl Iterator<Item = &str> {
        self.push_constants.iter().map(|m| m.declaration.as_str())
    }

    /// The whole `layout(push_constant)` block, if any push constant was used.
    #[must_use]
    pub fn push_constant_block(&self) -> Option<String> {
        if self.push_constants.is_empty() {
            return None;
        }
        let mut block = String::from("layout(push_constant) uniform PushConstants {\n");
        for member in self.push_constant_members() {
            block.push_str("    ");
            block.push_str(member);
            block.push('\n');
        }
        block.push_str("};");
        Some(block)
    }

    /// Sorted and deduplicated.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.includes.iter().map(String::as_str)
    }

    /// Later requirements overwrite the value of an existing define.
    pub fn defines(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.defines
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    // ========================================================================
    // Reflection
    // ========================================================================

    #[must_use]
    pub fn descriptor_bindings(&self) -> &[DescriptorBindingInfo] {
        &self.bindings
    }

    /// Names of the descriptor sets referenced so far, sorted.
    #[must_use]
    pub fn descriptor_sets(&self) -> Vec<&str> {
        self.bindings
            .iter()
            .map(|b| b.set.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn push_constant_range(&self) -> Option<PushConstantRange> {
        let first = self.push_constants.first()?;
        let last = self.push_constants.last()?;
        Some(PushConstantRange {
            offset: first.offset,
            size: last.offset + last.size - first.offset,
            stages: self
                .push_constants
                .iter()
                .fold(ShaderStages::empty(), |acc, m| acc | m.stages),
        })
    }
}
