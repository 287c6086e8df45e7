//! Whole-shader source assembly.
//!
//! Combines the requirements and declarations collected by a
//! [`ShaderResourceInterfaceBuilder`] with the structs and functions of a
//! [`ShaderCodeBuilder`], and renders them through a minijinja template in
//! GLSL declaration order:
//!
//! `#version` → extensions → defines → includes → structs → resources →
//! push constants → prototypes → function bodies.
//!
//! Prototypes come first so functions may call each other regardless of
//! creation order.

use lumina_core::{LuminaError, Result};
use minijinja::Environment;
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_128;

use crate::compiler::ShaderBlockCompiler;
use crate::interface::ShaderResourceInterfaceBuilder;
use crate::ir::ShaderCodeBuilder;
use crate::settings::ShaderGenSettings;

const TEMPLATE_NAME: &str = "shader.glsl";
const TEMPLATE_SOURCE: &str = include_str!("templates/shader.glsl");
const INCLUDE_EXTENSION: &str = "GL_GOOGLE_include_directive";

/// Rendered shader text plus its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedShader {
    pub source: String,
    /// xxh3-128 of `source`, usable as a module cache key.
    pub hash: u128,
}

#[derive(Serialize)]
struct ShaderContext<'a> {
    banner: bool,
    version: u32,
    extensions: Vec<&'a str>,
    defines: Vec<String>,
    includes: Vec<&'a str>,
    structs: Vec<String>,
    declarations: &'a [String],
    push_constants: Option<String>,
    prototypes: Vec<String>,
    functions: Vec<String>,
}

/// Owns the template environment; create one per generation context.
pub struct ShaderSourceAssembler {
    env: Environment<'static>,
    settings: ShaderGenSettings,
}

impl ShaderSourceAssembler {
    pub fn new(settings: ShaderGenSettings) -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template(TEMPLATE_NAME, TEMPLATE_SOURCE)
            .map_err(|e| LuminaError::Template(e.to_string()))?;
        Ok(Self { env, settings })
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ShaderGenSettings {
        &self.settings
    }

    /// Renders every struct and function of `builder` plus the resources
    /// declared in `interface`.
    pub fn assemble(
        &self,
        builder: &ShaderCodeBuilder,
        interface: &ShaderResourceInterfaceBuilder<'_>,
    ) -> Result<GeneratedShader> {
        let mut extensions = interface.extensions().collect::<Vec<_>>();
        let includes = interface.includes().collect::<Vec<_>>();
        if !includes.is_empty() && !extensions.contains(&INCLUDE_EXTENSION) {
            extensions.push(INCLUDE_EXTENSION);
        }

        let defines = interface
            .defines()
            .map(|(name, value)| match value {
                Some(value) => format!("{name} {value}"),
                None => name.to_owned(),
            })
            .collect();

        let indent = self.settings.indent(1);
        let structs = builder
            .struct_types()
            .map(|(_, def)| {
                let mut text = format!("struct {} {{\n", def.name);
                for field in &def.fields {
                    text.push_str(&format!(
                        "{indent}{} {};\n",
                        builder.type_name(&field.ty),
                        field.name
                    ));
                }
                text.push_str("};");
                text
            })
            .collect();

        let mut compiler = ShaderBlockCompiler::new(builder, &self.settings);
        let mut prototypes = Vec::new();
        let mut functions = Vec::new();
        for (id, function) in builder.functions() {
            if function.name != "main" {
                prototypes.push(compiler.compile_prototype(id));
            }
            functions.push(compiler.compile_function(id));
        }

        let ctx = ShaderContext {
            banner: self.settings.emit_banner,
            version: self.settings.glsl_version,
            extensions,
            defines,
            includes,
            structs,
            declarations: interface.declarations(),
            push_constants: interface.push_constant_block(),
            prototypes,
            functions,
        };

        let source = self
            .env
            .get_template(TEMPLATE_NAME)
            .and_then(|template| template.render(&ctx))
            .map_err(|e| LuminaError::Template(e.to_string()))?;
        let hash = xxh3_128(source.as_bytes());
        log::debug!("Assembled shader ({} bytes, hash {hash:032x})", source.len());

        Ok(GeneratedShader { source, hash })
    }
}
