//! Shader-visible resources.
//!
//! A [`Resource`] is one physical binding a generated shader can declare:
//! a descriptor, a push constant member, a stage input, a ray payload or a
//! hit attribute. Resources carry the preprocessor requirements their
//! declaration needs.

use std::fmt::Write as _;

use bitflags::bitflags;

use crate::ir::{ShaderCodeBuilder, StructField};
use crate::types::{OpaqueType, ShaderType};

bitflags! {
    /// Pipeline stages a resource is visible to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStages: u32 {
        const VERTEX       = 1 << 0;
        const FRAGMENT     = 1 << 1;
        const COMPUTE      = 1 << 2;
        const RAYGEN       = 1 << 3;
        const MISS         = 1 << 4;
        const CLOSEST_HIT  = 1 << 5;
        const ANY_HIT      = 1 << 6;
        const INTERSECTION = 1 << 7;

        const ALL_GRAPHICS = Self::VERTEX.bits() | Self::FRAGMENT.bits();
        const ALL_RAY_TRACING = Self::RAYGEN.bits()
            | Self::MISS.bits()
            | Self::CLOSEST_HIT.bits()
            | Self::ANY_HIT.bits()
            | Self::INTERSECTION.bits();
    }
}

/// Opaque index of a resource inside a
/// [`CapabilityConfig`](crate::capability::CapabilityConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u32);

impl ResourceId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Preprocessor needs of a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderRequirements {
    pub extensions: Vec<String>,
    pub includes: Vec<String>,
    /// `#define NAME [VALUE]`
    pub defines: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorKind {
    /// std140 uniform block.
    UniformBuffer { fields: Vec<StructField> },
    /// std430 buffer block.
    StorageBuffer {
        fields: Vec<StructField>,
        read_only: bool,
    },
    CombinedImageSampler(OpaqueType),
    /// `image2D` with a format qualifier such as `rgba8`.
    StorageImage { format: String },
    AccelerationStructure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// Bound through a descriptor set named by `set` (for example `"MATERIAL"`).
    Descriptor {
        set: String,
        binding: u32,
        kind: DescriptorKind,
        /// Array length, 1 for a single binding.
        count: u32,
    },
    PushConstant { ty: ShaderType },
    Input {
        location: u32,
        ty: ShaderType,
        flat: bool,
    },
    RayPayload {
        location: u32,
        ty: ShaderType,
        /// `rayPayloadInEXT` rather than `rayPayloadEXT`.
        incoming: bool,
    },
    HitAttribute { ty: ShaderType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Human-readable name, used as the suffix of the accessor name.
    pub name: String,
    pub kind: ResourceKind,
    pub stages: ShaderStages,
    pub requirements: ShaderRequirements,
}

const RAY_TRACING_EXTENSION: &str = "GL_EXT_ray_tracing";

impl Resource {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            stages: ShaderStages::ALL_GRAPHICS,
            requirements: ShaderRequirements::default(),
        }
    }

    fn descriptor(set: &str, binding: u32, name: impl Into<String>, kind: DescriptorKind) -> Self {
        Self::new(
            name,
            ResourceKind::Descriptor {
                set: set.to_owned(),
                binding,
                kind,
                count: 1,
            },
        )
    }

    #[must_use]
    pub fn uniform_buffer(
        set: &str,
        binding: u32,
        name: impl Into<String>,
        fields: Vec<StructField>,
    ) -> Self {
        Self::descriptor(set, binding, name, DescriptorKind::UniformBuffer { fields })
    }

    #[must_use]
    pub fn storage_buffer(
        set: &str,
        binding: u32,
        name: impl Into<String>,
        fields: Vec<StructField>,
        read_only: bool,
    ) -> Self {
        Self::descriptor(
            set,
            binding,
            name,
            DescriptorKind::StorageBuffer { fields, read_only },
        )
    }

    #[must_use]
    pub fn sampler(set: &str, binding: u32, name: impl Into<String>, ty: OpaqueType) -> Self {
        Self::descriptor(set, binding, name, DescriptorKind::CombinedImageSampler(ty))
    }

    #[must_use]
    pub fn storage_image(
        set: &str,
        binding: u32,
        name: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self::descriptor(
            set,
            binding,
            name,
            DescriptorKind::StorageImage {
                format: format.into(),
            },
        )
    }

    #[must_use]
    pub fn acceleration_structure(set: &str, binding: u32, name: impl Into<String>) -> Self {
        Self::descriptor(set, binding, name, DescriptorKind::AccelerationStructure)
            .with_stages(ShaderStages::ALL_RAY_TRACING)
    }

    #[must_use]
    pub fn push_constant(name: impl Into<String>, ty: ShaderType) -> Self {
        Self::new(name, ResourceKind::PushConstant { ty })
    }

    #[must_use]
    pub fn input(location: u32, name: impl Into<String>, ty: ShaderType) -> Self {
        Self::new(
            name,
            ResourceKind::Input {
                location,
                ty,
                flat: false,
            },
        )
        .with_stages(ShaderStages::FRAGMENT)
    }

    #[must_use]
    pub fn ray_payload(
        location: u32,
        name: impl Into<String>,
        ty: ShaderType,
        incoming: bool,
    ) -> Self {
        Self::new(
            name,
            ResourceKind::RayPayload {
                location,
                ty,
                incoming,
            },
        )
        .with_stages(ShaderStages::ALL_RAY_TRACING)
    }

    #[must_use]
    pub fn hit_attribute(name: impl Into<String>, ty: ShaderType) -> Self {
        Self::new(name, ResourceKind::HitAttribute { ty })
            .with_stages(ShaderStages::CLOSEST_HIT | ShaderStages::ANY_HIT | ShaderStages::INTERSECTION)
    }

    // === Builder-style modifiers ===

    #[must_use]
    pub fn with_stages(mut self, stages: ShaderStages) -> Self {
        self.stages = stages;
        self
    }

    /// Array length of a descriptor binding. Ignored for other kinds.
    #[must_use]
    pub fn with_count(mut self, n: u32) -> Self {
        if let ResourceKind::Descriptor { count, .. } = &mut self.kind {
            *count = n;
        }
        self
    }

    /// Marks a stage input `flat`. Ignored for other kinds.
    #[must_use]
    pub fn with_flat(mut self) -> Self {
        if let ResourceKind::Input { flat, .. } = &mut self.kind {
            *flat = true;
        }
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.requirements.extensions.push(extension.into());
        self
    }

    #[must_use]
    pub fn with_include(mut self, include: impl Into<String>) -> Self {
        self.requirements.includes.push(include.into());
        self
    }

    #[must_use]
    pub fn with_define(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.requirements.defines.push((name.into(), value));
        self
    }

    // === Queries ===

    /// Type of the accessor value, when the declaration introduces a typed
    /// variable. Buffer blocks have none.
    #[must_use]
    pub fn value_type(&self) -> Option<ShaderType> {
        match &self.kind {
            ResourceKind::Descriptor { kind, .. } => match kind {
                DescriptorKind::CombinedImageSampler(opaque) => Some(ShaderType::Opaque(*opaque)),
                DescriptorKind::StorageImage { .. } => {
                    Some(ShaderType::Opaque(OpaqueType::Image2D))
                }
                DescriptorKind::AccelerationStructure => {
                    Some(ShaderType::Opaque(OpaqueType::AccelerationStructure))
                }
                DescriptorKind::UniformBuffer { .. } | DescriptorKind::StorageBuffer { .. } => None,
            },
            ResourceKind::PushConstant { ty }
            | ResourceKind::Input { ty, .. }
            | ResourceKind::RayPayload { ty, .. }
            | ResourceKind::HitAttribute { ty } => Some(ty.clone()),
        }
    }

    #[must_use]
    pub fn is_push_constant(&self) -> bool {
        matches!(self.kind, ResourceKind::PushConstant { .. })
    }

    /// Extensions implied by the resource kind itself.
    #[must_use]
    pub fn implicit_extensions(&self) -> &'static [&'static str] {
        match &self.kind {
            ResourceKind::Descriptor {
                kind: DescriptorKind::AccelerationStructure,
                ..
            }
            | ResourceKind::RayPayload { .. }
            | ResourceKind::HitAttribute { .. } => &[RAY_TRACING_EXTENSION],
            _ => &[],
        }
    }

    /// GLSL declaration using `accessor` as the variable name.
    ///
    /// Push constants are declared as members of the shared push-constant
    /// block and are rendered by
    /// [`ShaderResourceInterfaceBuilder`](crate::interface::ShaderResourceInterfaceBuilder);
    /// this returns only the member line for them, without offset.
    #[must_use]
    pub fn declaration(&self, accessor: &str, builder: &ShaderCodeBuilder) -> String {
        match &self.kind {
            ResourceKind::Descriptor {
                set,
                binding,
                kind,
                count,
            } => {
                let layout = format!("set = {set}_DESCRIPTOR_SET_INDEX, binding = {binding}");
                let array = if *count > 1 {
                    format!("[{count}]")
                } else {
                    String::new()
                };
                match kind {
                    DescriptorKind::UniformBuffer { fields } => format!(
                        "layout({layout}, std140) uniform {accessor}_block {{\n{}}} {accessor}{array};",
                        block_members(fields, builder)
                    ),
                    DescriptorKind::StorageBuffer { fields, read_only } => format!(
                        "layout({layout}, std430) {}buffer {accessor}_block {{\n{}}} {accessor}{array};",
                        if *read_only { "readonly " } else { "" },
                        block_members(fields, builder)
                    ),
                    DescriptorKind::CombinedImageSampler(opaque) => format!(
                        "layout({layout}) uniform {} {accessor}{array};",
                        opaque.glsl_name()
                    ),
                    DescriptorKind::StorageImage { format } => format!(
                        "layout({layout}, {format}) uniform {} {accessor}{array};",
                        OpaqueType::Image2D.glsl_name()
                    ),
                    DescriptorKind::AccelerationStructure => format!(
                        "layout({layout}) uniform {} {accessor}{array};",
                        OpaqueType::AccelerationStructure.glsl_name()
                    ),
                }
            }
            ResourceKind::PushConstant { ty } => {
                format!("{} {accessor};", builder.type_name(ty))
            }
            ResourceKind::Input { location, ty, flat } => format!(
                "layout(location = {location}) {}in {} {accessor};",
                if *flat { "flat " } else { "" },
                builder.type_name(ty)
            ),
            ResourceKind::RayPayload {
                location,
                ty,
                incoming,
            } => format!(
                "layout(location = {location}) {} {} {accessor};",
                if *incoming {
                    "rayPayloadInEXT"
                } else {
                    "rayPayloadEXT"
                },
                builder.type_name(ty)
            ),
            ResourceKind::HitAttribute { ty } => {
                format!("hitAttributeEXT {} {accessor};", builder.type_name(ty))
            }
        }
    }
}

fn block_members(fields: &[StructField], builder: &ShaderCodeBuilder) -> String {
    let mut out = String::new();
    for field in fields {
        let _ = writeln!(out, "    {} {};", builder.type_name(&field.ty), field.name);
    }
    out
}
