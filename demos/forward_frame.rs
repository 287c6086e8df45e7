//! Forward frame demo.
//!
//! Builds the builtin stage graph, registers a handful of draw callbacks from
//! worker threads, walks one frame, and prints a generated fragment shader.
//!
//! Run with `RUST_LOG=debug cargo run --example forward_frame`.

use std::thread;

use lumina::shader::{FunctionSignature, OpaqueType, Resource, StructField};
use lumina::{
    BuiltinStage, CapabilityConfig, DrawEnvironment, HandleRegistry, RenderGraph, SceneRegistry,
    ShaderCodeBuilder, ShaderGenSettings, ShaderResourceInterfaceBuilder, ShaderSourceAssembler,
    ShaderType,
};

/// Stand-in for a GPU command encoder.
#[derive(Debug, Default)]
struct CommandLog {
    commands: Vec<String>,
}

fn main() -> lumina::Result<()> {
    env_logger::init();

    // === Frame structure ===
    let handles = HandleRegistry::new();
    let (graph, builtin) = RenderGraph::with_builtin_stages(&handles.stages)?;
    let main_pass = handles.subpasses.allocate();
    let lit = handles.pipelines.allocate();
    let unlit = handles.pipelines.allocate();

    let registry = SceneRegistry::<CommandLog>::with_capacity(graph.len());
    thread::scope(|s| {
        for mesh in 0..4u32 {
            let registry = &registry;
            let stage = if mesh % 2 == 0 {
                builtin[BuiltinStage::Opaque]
            } else {
                builtin[BuiltinStage::Transparent]
            };
            let pipeline = if mesh < 2 { lit } else { unlit };
            s.spawn(move || {
                registry
                    .register_draw_function(stage, main_pass, pipeline, move |env, recorder: &mut CommandLog| {
                        recorder.commands.push(format!("draw mesh {mesh} in {} ({:?})", env.stage, env.pipeline));
                    })
            });
        }
    });

    let mut recorder = CommandLog::default();
    let mut invoked = 0;
    for stage in graph.compile() {
        let env = DrawEnvironment::for_stage(stage, 0);
        invoked += registry.invoke_stage(stage, &env, &mut recorder)?;
    }
    log::info!("Frame 0 invoked {invoked} draw callbacks");
    for command in &recorder.commands {
        println!("{command}");
    }

    // === Fragment shader ===
    let mut builder = ShaderCodeBuilder::new();
    let mut config = CapabilityConfig::new();
    let material = config.add_resource(
        &mut builder,
        Resource::uniform_buffer(
            "MATERIAL",
            0,
            "material",
            vec![
                StructField::new(ShaderType::VEC4, "base_color"),
                StructField::new(ShaderType::FLOAT, "roughness"),
            ],
        ),
    );
    let albedo = config.add_resource(
        &mut builder,
        Resource::sampler("MATERIAL", 1, "albedo", OpaqueType::Sampler2D),
    );
    let uv = config.add_resource(&mut builder, Resource::input(0, "uv", ShaderType::VEC2));

    let base_color = {
        let block = config.resource_accessor(material)?;
        let color = builder.make_member_access(block, "base_color");
        builder.annotate_type(color, ShaderType::VEC4)?;
        let tex = config.resource_accessor(albedo)?;
        let coords = config.resource_accessor(uv)?;
        let sample = builder.make_builtin_call("texture", Some(ShaderType::VEC4), [tex, coords]);
        builder.make_mul(color, sample)
    };
    config.link_capability_with("material.base_color", base_color, [material, albedo, uv])?;

    let mut interface = ShaderResourceInterfaceBuilder::new(&config);
    let color = interface.require_capability(&builder, "material.base_color")?;

    let main = builder.make_or_get_function("main", FunctionSignature::entry_point());
    builder.start_function(main)?;
    let out = builder.make_identifier("outColor");
    builder.make_assignment(out, color)?;
    builder.end_block()?;

    let assembler = ShaderSourceAssembler::new(ShaderGenSettings::default())?;
    let shader = assembler.assemble(&builder, &interface)?;
    println!("\n{}", shader.source);
    println!("// source hash: {:032x}", shader.hash);

    Ok(())
}
