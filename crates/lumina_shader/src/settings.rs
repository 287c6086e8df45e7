//! Shader Generation Settings
//!
//! [`ShaderGenSettings`] controls how IR is lowered to GLSL text.
//!
//! ```rust,ignore
//! use lumina_shader::{CompileMode, ShaderGenSettings};
//!
//! // Debug-friendly output: every expression inlined, no banner.
//! let settings = ShaderGenSettings {
//!     compile_mode: CompileMode::InlineAll,
//!     emit_banner: false,
//!     ..Default::default()
//! };
//! ```

// ---------------------------------------------------------------------------
// CompileMode
// ---------------------------------------------------------------------------

/// How sub-expressions are lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompileMode {
    /// Every typed, non-leaf value is hoisted into a temporary once and the
    /// temporary is reused wherever the same value appears again.
    #[default]
    Default,
    /// Every sub-expression is written inline, repeated if shared.
    InlineAll,
}

// ---------------------------------------------------------------------------
// ShaderGenSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderGenSettings {
    /// Number written after `#version`.
    pub glsl_version: u32,

    pub compile_mode: CompileMode,

    /// Spaces per nesting level.
    pub indent_width: usize,

    /// Prefix of hoisted temporaries; the counter is appended.
    ///
    /// Must not collide with resource accessor names or function parameters
    /// (`arg0`, `arg1`, ...).
    pub temp_prefix: String,

    /// Prepend an "auto-generated" comment to assembled shaders.
    pub emit_banner: bool,
}

impl Default for ShaderGenSettings {
    fn default() -> Self {
        Self {
            glsl_version: 460,
            compile_mode: CompileMode::Default,
            indent_width: 4,
            temp_prefix: "_t".to_owned(),
            emit_banner: true,
        }
    }
}

impl ShaderGenSettings {
    #[must_use]
    pub fn with_compile_mode(mut self, mode: CompileMode) -> Self {
        self.compile_mode = mode;
        self
    }

    #[must_use]
    pub fn with_glsl_version(mut self, version: u32) -> Self {
        self.glsl_version = version;
        self
    }

    #[must_use]
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    #[must_use]
    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_banner(mut self, emit: bool) -> Self {
        self.emit_banner = emit;
        self
    }

    /// Indentation string for `depth` nesting levels.
    #[inline]
    #[must_use]
    pub fn indent(&self, depth: usize) -> String {
        " ".repeat(self.indent_width * depth)
    }
}
