//! Shader types and literal constants.
//!
//! [`ShaderType`] is the type vocabulary of the IR. Struct types are declared
//! in a [`ShaderCodeBuilder`](crate::ir::ShaderCodeBuilder) and referenced by
//! [`StructId`]; their names are resolved through the builder.

use std::borrow::Cow;

use glam::{IVec2, IVec3, IVec4, Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::ir::StructId;

/// Scalar component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
    Double,
}

impl ScalarKind {
    #[must_use]
    pub const fn glsl_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Prefix of the vector type family (`ivec3`, `dvec2`, ...).
    #[must_use]
    pub const fn vector_prefix(self) -> &'static str {
        match self {
            Self::Bool => "b",
            Self::Int => "i",
            Self::Uint => "u",
            Self::Float => "",
            Self::Double => "d",
        }
    }

    /// Natural byte size of one component.
    #[must_use]
    pub const fn byte_size(self) -> u32 {
        match self {
            Self::Double => 8,
            _ => 4,
        }
    }
}

/// Opaque handle types. They cannot take part in arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpaqueType {
    Sampler2D,
    Sampler2DArray,
    Sampler2DShadow,
    SamplerCube,
    Sampler3D,
    Image2D,
    AccelerationStructure,
}

impl OpaqueType {
    #[must_use]
    pub const fn glsl_name(self) -> &'static str {
        match self {
            Self::Sampler2D => "sampler2D",
            Self::Sampler2DArray => "sampler2DArray",
            Self::Sampler2DShadow => "sampler2DShadow",
            Self::SamplerCube => "samplerCube",
            Self::Sampler3D => "sampler3D",
            Self::Image2D => "image2D",
            Self::AccelerationStructure => "accelerationStructureEXT",
        }
    }
}

/// Type of an IR value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Scalar(ScalarKind),
    /// Vector with 2 to 4 components.
    Vector(ScalarKind, u8),
    /// Float matrix.
    Matrix { columns: u8, rows: u8 },
    Struct(StructId),
    Opaque(OpaqueType),
}

impl ShaderType {
    pub const BOOL: Self = Self::Scalar(ScalarKind::Bool);
    pub const INT: Self = Self::Scalar(ScalarKind::Int);
    pub const UINT: Self = Self::Scalar(ScalarKind::Uint);
    pub const FLOAT: Self = Self::Scalar(ScalarKind::Float);
    pub const DOUBLE: Self = Self::Scalar(ScalarKind::Double);
    pub const VEC2: Self = Self::Vector(ScalarKind::Float, 2);
    pub const VEC3: Self = Self::Vector(ScalarKind::Float, 3);
    pub const VEC4: Self = Self::Vector(ScalarKind::Float, 4);
    pub const IVEC2: Self = Self::Vector(ScalarKind::Int, 2);
    pub const IVEC3: Self = Self::Vector(ScalarKind::Int, 3);
    pub const IVEC4: Self = Self::Vector(ScalarKind::Int, 4);
    pub const MAT3: Self = Self::Matrix { columns: 3, rows: 3 };
    pub const MAT4: Self = Self::Matrix { columns: 4, rows: 4 };

    /// Number of scalar channels, `None` for structs and opaque types.
    ///
    /// Matrices report `columns * rows`, so every matrix larger than 2x2
    /// reports more than 4 channels.
    #[must_use]
    pub fn channel_count(&self) -> Option<u32> {
        match *self {
            Self::Scalar(_) => Some(1),
            Self::Vector(_, n) => Some(u32::from(n)),
            Self::Matrix { columns, rows } => Some(u32::from(columns) * u32::from(rows)),
            Self::Struct(_) | Self::Opaque(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(_))
    }

    #[inline]
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque(_))
    }

    /// GLSL spelling of non-struct types. Structs need the declaring builder,
    /// see [`ShaderCodeBuilder::type_name`](crate::ir::ShaderCodeBuilder::type_name).
    #[must_use]
    pub fn builtin_name(&self) -> Option<Cow<'static, str>> {
        match *self {
            Self::Scalar(kind) => Some(kind.glsl_name().into()),
            Self::Vector(kind, n) => Some(format!("{}vec{n}", kind.vector_prefix()).into()),
            Self::Matrix { columns, rows } if columns == rows => Some(format!("mat{columns}").into()),
            Self::Matrix { columns, rows } => Some(format!("mat{columns}x{rows}").into()),
            Self::Opaque(opaque) => Some(opaque.glsl_name().into()),
            Self::Struct(_) => None,
        }
    }

    /// Natural byte size of non-struct, non-opaque types. No alignment padding.
    #[must_use]
    pub fn builtin_size(&self) -> Option<u32> {
        match *self {
            Self::Scalar(kind) => Some(kind.byte_size()),
            Self::Vector(kind, n) => Some(kind.byte_size() * u32::from(n)),
            Self::Matrix { columns, rows } => Some(4 * u32::from(columns) * u32::from(rows)),
            Self::Struct(_) | Self::Opaque(_) => None,
        }
    }
}

/// A literal constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Bool(bool),
    Int(i32),
    Uint(u32),
    Float(f32),
    Double(f64),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

/// GLSL has no literal for NaN or infinity, so those are spelled as
/// constant divisions.
fn non_finite_literal(v: f64, suffix: &str) -> Option<String> {
    if v.is_nan() {
        Some(format!("(0.0{suffix} / 0.0{suffix})"))
    } else if v.is_infinite() {
        let sign = if v.is_sign_negative() { "-" } else { "" };
        Some(format!("({sign}1.0{suffix} / 0.0{suffix})"))
    } else {
        None
    }
}

fn float_literal(v: f32) -> String {
    non_finite_literal(f64::from(v), "").unwrap_or_else(|| format!("{v:?}"))
}

fn double_literal(v: f64) -> String {
    non_finite_literal(v, "lf").unwrap_or_else(|| format!("{v:?}lf"))
}

fn float_list(values: &[f32]) -> String {
    values
        .iter()
        .map(|&v| float_literal(v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn int_list(values: &[i32]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Constant {
    /// Intrinsic type of the literal.
    #[must_use]
    pub fn shader_type(&self) -> ShaderType {
        match self {
            Self::Bool(_) => ShaderType::BOOL,
            Self::Int(_) => ShaderType::INT,
            Self::Uint(_) => ShaderType::UINT,
            Self::Float(_) => ShaderType::FLOAT,
            Self::Double(_) => ShaderType::DOUBLE,
            Self::Vec2(_) => ShaderType::VEC2,
            Self::Vec3(_) => ShaderType::VEC3,
            Self::Vec4(_) => ShaderType::VEC4,
            Self::IVec2(_) => ShaderType::IVEC2,
            Self::IVec3(_) => ShaderType::IVEC3,
            Self::IVec4(_) => ShaderType::IVEC4,
            Self::Mat3(_) => ShaderType::MAT3,
            Self::Mat4(_) => ShaderType::MAT4,
        }
    }

    /// GLSL source spelling.
    #[must_use]
    pub fn to_glsl(&self) -> String {
        match *self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Uint(u) => format!("{u}u"),
            Self::Float(f) => float_literal(f),
            Self::Double(d) => double_literal(d),
            Self::Vec2(v) => format!("vec2({})", float_list(&v.to_array())),
            Self::Vec3(v) => format!("vec3({})", float_list(&v.to_array())),
            Self::Vec4(v) => format!("vec4({})", float_list(&v.to_array())),
            Self::IVec2(v) => format!("ivec2({})", int_list(&v.to_array())),
            Self::IVec3(v) => format!("ivec3({})", int_list(&v.to_array())),
            Self::IVec4(v) => format!("ivec4({})", int_list(&v.to_array())),
            Self::Mat3(m) => format!("mat3({})", float_list(&m.to_cols_array())),
            Self::Mat4(m) => format!("mat4({})", float_list(&m.to_cols_array())),
        }
    }
}

macro_rules! impl_constant_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Constant {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_constant_from!(
    bool => Bool,
    i32 => Int,
    u32 => Uint,
    f32 => Float,
    f64 => Double,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    IVec2 => IVec2,
    IVec3 => IVec3,
    IVec4 => IVec4,
    Mat3 => Mat3,
    Mat4 => Mat4,
);
