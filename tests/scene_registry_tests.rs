//! Scene Registry Tests
//!
//! Tests for:
//! - Register / unregister round trips over many buckets
//! - Concurrent registration into one bucket
//! - Concurrent registration, removal and invocation on different buckets
//! - Concurrent registration and swap-removal inside one bucket
//! - Stage walks and scoped registrations

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use lumina::{
    DrawEnvironment, DrawRegistration, HandleRegistry, LuminaError, Pipeline, RenderStage,
    SceneRegistry, SubPass,
};

/// Recording handle used by the tests: a log of which callback ran.
type Commands = Vec<(u32, u32, u32)>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn env(stage: RenderStage, subpass: SubPass, pipeline: Pipeline) -> DrawEnvironment {
    DrawEnvironment::new(stage, subpass, pipeline)
}

// ============================================================================
// Registration Round Trip
// ============================================================================

#[test]
fn register_then_unregister_all_leaves_registry_empty() {
    let registry = SceneRegistry::<Commands>::new();
    let mut registrations: Vec<DrawRegistration> = Vec::new();

    for st in 0..3 {
        for sp in 0..3 {
            for pl in 0..4 {
                let (stage, subpass, pipeline) =
                    (RenderStage::new(st), SubPass::new(sp), Pipeline::new(pl));
                for _ in 0..2 {
                    registrations.push(registry.register_draw_function(
                        stage,
                        subpass,
                        pipeline,
                        move |_, cmd: &mut Commands| cmd.push((st, sp, pl)),
                    ));
                }
            }
        }
    }
    assert_eq!(registry.len(RenderStage::new(1), SubPass::new(2), Pipeline::new(3)), 2);

    // Remove in an order unrelated to registration order.
    registrations.sort_by_key(|r| (r.pipeline, std::cmp::Reverse(r.subpass), r.stage));
    for registration in registrations {
        registry.unregister_draw_function(registration).unwrap();
    }

    let mut cmd = Commands::new();
    for st in 0..3 {
        for sp in 0..3 {
            let (stage, subpass) = (RenderStage::new(st), SubPass::new(sp));
            assert!(registry.iter_pipelines(stage, subpass).is_empty());
            for pl in 0..4 {
                let pipeline = Pipeline::new(pl);
                assert!(registry.is_empty(stage, subpass, pipeline));
                let ran = registry
                    .invoke_draw_functions(stage, subpass, pipeline, &env(stage, subpass, pipeline), &mut cmd)
                    .unwrap();
                assert_eq!(ran, 0);
            }
        }
        assert!(registry.iter_subpasses(RenderStage::new(st)).is_empty());
    }
    assert!(cmd.is_empty());
}

#[test]
fn swap_removal_keeps_remaining_callbacks() {
    let registry = SceneRegistry::<Commands>::new();
    let (stage, subpass, pipeline) = (RenderStage::new(0), SubPass::new(0), Pipeline::new(0));

    let regs = (0..4)
        .map(|i| {
            registry.register_draw_function(stage, subpass, pipeline, move |_, cmd: &mut Commands| {
                cmd.push((i, 0, 0));
            })
        })
        .collect::<Vec<_>>();
    registry.unregister_draw_function(regs[1]).unwrap();

    let mut cmd = Commands::new();
    registry
        .invoke_draw_functions(stage, subpass, pipeline, &env(stage, subpass, pipeline), &mut cmd)
        .unwrap();
    // The last entry moved into the freed slot.
    assert_eq!(cmd, vec![(0, 0, 0), (3, 0, 0), (2, 0, 0)]);

    // The moved entry can still be removed through its own registration.
    registry.unregister_draw_function(regs[3]).unwrap();
    assert_eq!(registry.len(stage, subpass, pipeline), 2);
}

#[test]
fn double_unregister_fails() {
    let registry = SceneRegistry::<Commands>::new();
    let reg = registry.register_draw_function(
        RenderStage::new(0),
        SubPass::new(0),
        Pipeline::new(0),
        |_, _| {},
    );

    registry.unregister_draw_function(reg).unwrap();
    assert_eq!(
        registry.unregister_draw_function(reg),
        Err(LuminaError::UnknownRegistration)
    );
}

#[test]
fn invoke_beyond_known_stages_fails() {
    let registry = SceneRegistry::<Commands>::new();
    registry.register_draw_function(RenderStage::new(1), SubPass::new(0), Pipeline::new(0), |_, _| {});

    let (stage, subpass, pipeline) = (RenderStage::new(5), SubPass::new(0), Pipeline::new(0));
    let err = registry
        .invoke_draw_functions(stage, subpass, pipeline, &env(stage, subpass, pipeline), &mut Vec::new())
        .unwrap_err();
    assert_eq!(err, LuminaError::StageOutOfRange { stage, known: 2 });

    // Stage 0 is below the highest known stage: empty, not an error.
    let stage = RenderStage::new(0);
    assert_eq!(
        registry
            .invoke_draw_functions(stage, subpass, pipeline, &env(stage, subpass, pipeline), &mut Vec::new())
            .unwrap(),
        0
    );
}

#[test]
fn pipelines_listed_in_activation_order() {
    let registry = SceneRegistry::<Commands>::new();
    let (stage, subpass) = (RenderStage::new(0), SubPass::new(0));

    let p7 = registry.register_draw_function(stage, subpass, Pipeline::new(7), |_, _| {});
    registry.register_draw_function(stage, subpass, Pipeline::new(2), |_, _| {});
    registry.register_draw_function(stage, subpass, Pipeline::new(7), |_, _| {});
    registry.register_draw_function(stage, subpass, Pipeline::new(4), |_, _| {});

    assert_eq!(
        registry.iter_pipelines(stage, subpass),
        vec![Pipeline::new(7), Pipeline::new(2), Pipeline::new(4)]
    );

    // Pipeline 7 still has one callback after removing the first.
    registry.unregister_draw_function(p7).unwrap();
    assert_eq!(registry.iter_pipelines(stage, subpass).len(), 3);
    assert!(registry.iter_pipelines(stage, SubPass::new(9)).is_empty());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_registration_into_same_bucket() {
    const THREADS: usize = 16;
    let registry = SceneRegistry::<usize>::new();
    let (stage, subpass, pipeline) = (RenderStage::new(2), SubPass::new(1), Pipeline::new(3));

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                registry.register_draw_function(stage, subpass, pipeline, |_, calls: &mut usize| {
                    *calls += 1;
                });
            });
        }
    });

    let mut calls = 0;
    let ran = registry
        .invoke_draw_functions(stage, subpass, pipeline, &env(stage, subpass, pipeline), &mut calls)
        .unwrap();
    assert_eq!(ran, THREADS);
    assert_eq!(calls, THREADS);
    assert_eq!(registry.iter_pipelines(stage, subpass), vec![pipeline]);
}

#[test]
fn concurrent_churn_while_drawing() {
    const WORKERS: u32 = 8;
    const ROUNDS: usize = 200;
    let registry = SceneRegistry::<usize>::with_capacity(1);
    let stage = RenderStage::new(0);
    let total = Arc::new(AtomicUsize::new(0));

    thread::scope(|s| {
        for worker in 0..WORKERS {
            let registry = &registry;
            s.spawn(move || {
                let (subpass, pipeline) = (SubPass::new(worker % 2), Pipeline::new(worker));
                for _ in 0..ROUNDS {
                    let reg = registry.register_draw_function(stage, subpass, pipeline, |_, n: &mut usize| {
                        *n += 1;
                    });
                    registry.unregister_draw_function(reg).unwrap();
                }
            });
        }

        let total = Arc::clone(&total);
        let registry = &registry;
        s.spawn(move || {
            for frame in 0..ROUNDS as u64 {
                let mut n = 0;
                registry
                    .invoke_stage(stage, &DrawEnvironment::for_stage(stage, frame), &mut n)
                    .unwrap();
                total.fetch_add(n, Ordering::Relaxed);
            }
        });
    });

    for sp in 0..2 {
        assert!(registry.iter_pipelines(stage, SubPass::new(sp)).is_empty());
    }
    // Every draw that ran belonged to a registration that existed at the time.
    assert!(total.load(Ordering::Relaxed) <= WORKERS as usize * ROUNDS);
}

#[test]
fn concurrent_churn_inside_one_bucket_keeps_positions_consistent() {
    init_logger();
    const WORKERS: usize = 8;
    const ROUNDS: usize = 500;
    let registry = SceneRegistry::<Vec<u32>>::new();
    let (stage, subpass, pipeline) = (RenderStage::new(1), SubPass::new(0), Pipeline::new(4));

    let survivor = registry.register_draw_function(stage, subpass, pipeline, |_, cmd| cmd.push(7));

    thread::scope(|s| {
        for _ in 0..WORKERS {
            let registry = &registry;
            s.spawn(move || {
                for _ in 0..ROUNDS {
                    let a = registry.register_draw_function(stage, subpass, pipeline, |_, cmd| cmd.push(0));
                    let b = registry.register_draw_function(stage, subpass, pipeline, |_, cmd| cmd.push(0));
                    // Removing `a` first moves another entry into its slot.
                    registry.unregister_draw_function(a).unwrap();
                    registry.unregister_draw_function(b).unwrap();
                }
            });
        }

        let registry = &registry;
        s.spawn(move || {
            for _ in 0..ROUNDS {
                let mut cmd = Vec::new();
                registry
                    .invoke_draw_functions(stage, subpass, pipeline, &env(stage, subpass, pipeline), &mut cmd)
                    .unwrap();
                assert_eq!(cmd.iter().filter(|&&tag| tag == 7).count(), 1);
            }
        });
    });

    assert_eq!(registry.len(stage, subpass, pipeline), 1);
    assert_eq!(registry.iter_pipelines(stage, subpass), vec![pipeline]);

    let mut cmd = Vec::new();
    registry
        .invoke_draw_functions(stage, subpass, pipeline, &env(stage, subpass, pipeline), &mut cmd)
        .unwrap();
    assert_eq!(cmd, vec![7]);

    registry.unregister_draw_function(survivor).unwrap();
    assert!(registry.iter_pipelines(stage, subpass).is_empty());
}

// ============================================================================
// Stage Walk & Scoped Registration
// ============================================================================

#[test]
fn invoke_stage_walks_subpasses_then_pipelines() {
    init_logger();
    let handles = HandleRegistry::new();
    let stage = handles.stages.allocate();
    let (sp0, sp1) = (handles.subpasses.allocate(), handles.subpasses.allocate());
    let (pa, pb) = (handles.pipelines.allocate(), handles.pipelines.allocate());
    let registry = SceneRegistry::<Vec<String>>::new();

    let record = |tag: &'static str| {
        move |env: &DrawEnvironment, cmd: &mut Vec<String>| {
            cmd.push(format!(
                "{tag}@{}:{:?}/{:?}#{}",
                env.pass, env.subpass, env.pipeline, env.frame_index
            ));
        }
    };
    registry.register_draw_function(stage, sp1, pa, record("late"));
    registry.register_draw_function(stage, sp0, pb, record("b"));
    registry.register_draw_function(stage, sp0, pa, record("a"));

    let mut cmd = Vec::new();
    let ran = registry
        .invoke_stage(stage, &DrawEnvironment::for_stage(stage, 9).with_pass(2), &mut cmd)
        .unwrap();

    assert_eq!(ran, 3);
    assert_eq!(
        cmd,
        vec![
            "b@2:SubPass(0)/Pipeline(1)#9",
            "a@2:SubPass(0)/Pipeline(0)#9",
            "late@2:SubPass(1)/Pipeline(0)#9",
        ]
    );
}

#[test]
fn unique_registration_unregisters_on_drop() {
    let registry = SceneRegistry::<Commands>::new();
    let (stage, subpass, pipeline) = (RenderStage::new(0), SubPass::new(0), Pipeline::new(0));

    {
        let _guard = registry.register_unique(stage, subpass, pipeline, |_, _| {});
        assert_eq!(registry.len(stage, subpass, pipeline), 1);
    }
    assert!(registry.is_empty(stage, subpass, pipeline));

    let kept = registry
        .register_unique(stage, subpass, pipeline, |_, _| {})
        .release();
    assert_eq!(registry.len(stage, subpass, pipeline), 1);
    registry.unregister_draw_function(kept).unwrap();
}
