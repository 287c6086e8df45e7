//! Render graph and draw registry benchmarks.
//!
//! Run with `cargo bench --bench render_graph_bench`.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use lumina::{
    DrawEnvironment, HandleAllocator, Pipeline, RenderGraph, RenderStage, SceneRegistry, SubPass,
};

/// Layered graph: every stage depends on two stages of the previous layer.
fn layered_graph(layers: usize, width: usize) -> RenderGraph {
    let allocator = HandleAllocator::<RenderStage>::new();
    let stages = (0..layers * width)
        .map(|_| allocator.allocate())
        .collect::<Vec<_>>();
    let mut graph = RenderGraph::with_capacity(stages.len());
    for layer in 1..layers {
        for i in 0..width {
            let after = stages[layer * width + i];
            let prev = (layer - 1) * width;
            graph.create_ordering(stages[prev + i], after).ok();
            graph.create_ordering(stages[prev + (i + 1) % width], after).ok();
        }
    }
    graph
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_graph_compile");
    for &(layers, width) in &[(4, 4), (16, 8), (64, 16)] {
        let graph = layered_graph(layers, width);
        group.bench_with_input(
            BenchmarkId::from_parameter(layers * width),
            &graph,
            |b, graph| b.iter(|| black_box(graph.compile().count())),
        );
    }
    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let registry = SceneRegistry::<u64>::new();
    let stage = RenderStage::new(0);
    for sp in 0..4 {
        for pl in 0..32 {
            for _ in 0..8 {
                registry.register_draw_function(
                    stage,
                    SubPass::new(sp),
                    Pipeline::new(pl),
                    |env: &DrawEnvironment, acc: &mut u64| *acc += env.frame_index,
                );
            }
        }
    }

    c.bench_function("scene_registry_invoke_stage_1024", |b| {
        let env = DrawEnvironment::for_stage(stage, 1);
        b.iter(|| {
            let mut acc = 0u64;
            registry.invoke_stage(stage, &env, &mut acc).ok();
            black_box(acc)
        });
    });

    c.bench_function("scene_registry_register_unregister", |b| {
        let (subpass, pipeline) = (SubPass::new(0), Pipeline::new(0));
        b.iter(|| {
            let reg = registry.register_draw_function(stage, subpass, pipeline, |_, _| {});
            registry.unregister_draw_function(black_box(reg)).ok();
        });
    });
}

criterion_group!(benches, bench_compile, bench_registry);
criterion_main!(benches);
