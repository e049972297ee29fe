mod common;

use std::f32::consts::TAU;

use frame_core::FrameError;
use frame_core::ResizeError;
use frame_core::frame_renderer::FrameOutcome;
use frame_core::headless::HeadlessFaults;
use frame_core::presentation_surface::ResizeOutcome;
use frame_core::resource_state::ResourceState;
use frame_core::scene::PerObjectConstants;

const DT: f32 = 1.0 / 60.0;

#[test]
fn steady_frame_rotates_presents_once_and_drains() {
    let mut app = common::start("steady");
    app.update(DT);
    let outcome = app.render().unwrap();

    assert_eq!(outcome, FrameOutcome::Presented { fence_value: 1 });
    assert!((app.constants().rotation - DT).abs() < 1e-6);
    assert_eq!(app.sync().completed_value(), app.sync().submitted_value());

    let stats = app.device().gpu().stats();
    assert_eq!(stats.presents, 1);
    assert_eq!(stats.clears, 1);
    assert_eq!(stats.draws.len(), 1);
    assert_eq!(stats.draws[0].vertex_count, 3);
    assert!(stats.violations.is_empty(), "{:?}", stats.violations);
}

#[test]
fn gpu_reads_the_constants_of_its_own_frame() {
    let mut app = common::start("own_constants");
    app.update(DT);
    app.render().unwrap();
    let first = app.constants();
    app.update(DT);
    app.render().unwrap();
    let second = app.constants();

    let draws = app.device().gpu().stats().draws;
    assert_eq!(draws[0].constants, bytemuck::bytes_of(&first));
    assert_eq!(draws[1].constants, bytemuck::bytes_of(&second));
    assert_ne!(draws[0].constants, draws[1].constants);
}

#[test]
fn rotation_wraps_after_a_full_turn() {
    let mut app = common::start("wrap");
    for _ in 0..7 {
        app.update(1.0);
    }
    app.render().unwrap();
    let expected = 7.0_f32.rem_euclid(TAU);
    assert!((app.constants().rotation - expected).abs() < 1e-4);
    assert!(app.constants().rotation < TAU);
}

#[test]
fn transitions_pair_up_and_buffers_alternate() {
    let mut app = common::start("pairing");
    let mut indices = Vec::new();
    for _ in 0..5 {
        indices.push(app.surface().current_index().unwrap());
        app.update(DT);
        app.render().unwrap();
        assert_eq!(app.surface().current_state(), Some(ResourceState::Present));
    }
    assert_eq!(indices, vec![0, 1, 0, 1, 0]);

    let stats = app.device().gpu().stats();
    assert_eq!(stats.transitions_to_render_target, 5);
    assert_eq!(stats.transitions_to_present, 5);
    assert_eq!(stats.presents, 5);
    assert_eq!(app.frames_presented(), 5);
    assert_ne!(stats.draws[0].target, stats.draws[1].target);
    assert_eq!(stats.draws[0].target, stats.draws[2].target);
}

#[test]
fn zero_size_resize_is_ignored() {
    let mut app = common::start("zero_resize");
    app.render().unwrap();
    let submitted = app.sync().submitted_value();

    assert_eq!(app.on_resize(0, 0).unwrap(), ResizeOutcome::Ignored);
    assert_eq!(app.on_resize(0, 480).unwrap(), ResizeOutcome::Ignored);
    assert_eq!(app.surface().width(), common::WIDTH);
    assert_eq!(app.surface().height(), common::HEIGHT);
    assert_eq!(app.sync().submitted_value(), submitted);
    assert_eq!(app.device().gpu().stats().resizes, 0);

    assert!(matches!(
        app.render().unwrap(),
        FrameOutcome::Presented { .. }
    ));
}

#[test]
fn resize_happens_on_an_idle_gpu() {
    let mut app = common::start("resize_idle");
    app.update(DT);
    app.render().unwrap();
    let generation = app.surface().view_generation();

    assert_eq!(app.on_resize(1024, 768).unwrap(), ResizeOutcome::Resized);
    assert_eq!(app.surface().width(), 1024);
    assert_eq!(app.surface().height(), 768);
    assert_eq!(app.surface().view_generation(), generation + 1);
    assert_eq!(app.surface().current_index(), Some(0));

    let stats = app.device().gpu().stats();
    assert_eq!(stats.resizes, 1);
    let snapshot = stats.fence_at_last_resize.unwrap();
    assert_eq!(snapshot.completed, snapshot.submitted);
    assert_eq!(stats.textures_released_while_busy, 0);

    app.update(DT);
    app.render().unwrap();
    let stats = app.device().gpu().stats();
    assert_eq!(stats.presents, 2);
    assert!(stats.violations.is_empty(), "{:?}", stats.violations);
}

#[test]
fn repeated_resize_to_same_size_is_a_no_op() {
    let mut app = common::start("resize_same");
    assert_eq!(app.on_resize(1024, 768).unwrap(), ResizeOutcome::Resized);
    let submitted = app.sync().submitted_value();
    assert_eq!(app.on_resize(1024, 768).unwrap(), ResizeOutcome::Unchanged);
    assert_eq!(app.sync().submitted_value(), submitted);
    assert_eq!(app.device().gpu().stats().resizes, 1);
}

#[test]
fn rejected_resize_pauses_until_next_good_resize() {
    let mut app = common::start("resize_rejected");
    app.device().gpu().set_faults(HeadlessFaults {
        fail_resize: true,
        ..Default::default()
    });

    let err = app.on_resize(1024, 768).unwrap_err();
    assert!(matches!(err, ResizeError::Rejected { width: 1024, height: 768, .. }));
    assert!(app.surface().is_paused());
    assert_eq!(app.surface().width(), common::WIDTH);
    assert_eq!(app.render().unwrap(), FrameOutcome::Skipped);
    assert_eq!(app.device().gpu().stats().presents, 0);

    app.device().gpu().set_faults(HeadlessFaults::default());
    // Same size as before the failure still recreates the views.
    assert_eq!(
        app.on_resize(common::WIDTH, common::HEIGHT).unwrap(),
        ResizeOutcome::Resized
    );
    assert!(!app.surface().is_paused());
    assert!(matches!(
        app.render().unwrap(),
        FrameOutcome::Presented { .. }
    ));
}

#[test]
fn failed_submit_drops_one_frame_only() {
    let mut app = common::start("submit_fault");
    app.render().unwrap();

    app.device().gpu().set_faults(HeadlessFaults {
        fail_execute: true,
        ..Default::default()
    });
    assert!(matches!(app.render(), Err(FrameError::Submit(_))));
    assert_eq!(app.surface().current_state(), Some(ResourceState::Present));
    assert_eq!(app.sync().completed_value(), app.sync().submitted_value());

    app.device().gpu().set_faults(HeadlessFaults::default());
    assert!(matches!(
        app.render().unwrap(),
        FrameOutcome::Presented { .. }
    ));
    let stats = app.device().gpu().stats();
    assert_eq!(stats.presents, 2);
    assert!(stats.violations.is_empty(), "{:?}", stats.violations);
}

#[test]
fn failed_present_leaves_surface_presentable() {
    let mut app = common::start("present_fault");
    app.device().gpu().set_faults(HeadlessFaults {
        fail_present: true,
        ..Default::default()
    });
    assert!(matches!(app.render(), Err(FrameError::Present(_))));
    assert_eq!(app.frames_presented(), 0);
    assert_eq!(app.surface().current_state(), Some(ResourceState::Present));
    assert!(app.device().gpu().is_idle());

    app.device().gpu().set_faults(HeadlessFaults::default());
    app.render().unwrap();
    assert_eq!(app.frames_presented(), 1);
    let stats = app.device().gpu().stats();
    assert_eq!(
        stats.transitions_to_render_target,
        stats.transitions_to_present
    );
    assert!(stats.violations.is_empty(), "{:?}", stats.violations);
}

#[test]
fn drop_drains_before_releasing_gpu_objects() {
    let mut app = common::start("drop");
    app.update(DT);
    app.render().unwrap();
    let gpu = app.device().gpu().clone();
    drop(app);

    assert!(gpu.is_idle());
    let stats = gpu.stats();
    assert_eq!(stats.textures_released_while_busy, 0);
    assert_eq!(stats.live_pipelines, 0);
    assert_eq!(stats.live_root_signatures, 0);
    assert!(stats.violations.is_empty(), "{:?}", stats.violations);
}

fn drawn_rotations(app: &common::App) -> Vec<f32> {
    app.device()
        .gpu()
        .stats()
        .draws
        .iter()
        .map(|draw| bytemuck::pod_read_unaligned::<PerObjectConstants>(&draw.constants).rotation)
        .collect()
}

fn assert_steps(rotations: &[f32], steps: &[f32]) {
    assert_eq!(rotations.len(), steps.len() + 1, "{rotations:?}");
    for (pair, step) in rotations.windows(2).zip(steps) {
        assert!(
            (pair[1] - pair[0] - step).abs() < 1e-6,
            "expected step {step} in {rotations:?}"
        );
    }
}

#[test]
fn consecutive_frames_advance_by_one_step() {
    let mut app = common::start("consecutive_steps");
    for _ in 0..3 {
        app.update(DT);
        app.render().unwrap();
    }
    let rotations = drawn_rotations(&app);
    assert!((rotations[0] - DT).abs() < 1e-6);
    assert_steps(&rotations, &[DT, DT]);
}

#[test]
fn dropped_submit_skips_its_rotation() {
    let mut app = common::start("dropped_submit_steps");
    app.update(DT);
    app.render().unwrap();

    app.device().gpu().set_faults(HeadlessFaults {
        fail_execute: true,
        ..Default::default()
    });
    app.update(DT);
    assert!(matches!(app.render(), Err(FrameError::Submit(_))));

    app.device().gpu().set_faults(HeadlessFaults::default());
    app.update(DT);
    app.render().unwrap();

    assert_steps(&drawn_rotations(&app), &[2.0 * DT]);
}

#[test]
fn failed_present_still_draws_its_rotation() {
    let mut app = common::start("failed_present_steps");
    app.update(DT);
    app.render().unwrap();

    app.device().gpu().set_faults(HeadlessFaults {
        fail_present: true,
        ..Default::default()
    });
    app.update(DT);
    assert!(matches!(app.render(), Err(FrameError::Present(_))));

    app.device().gpu().set_faults(HeadlessFaults::default());
    app.update(DT);
    app.render().unwrap();

    assert_steps(&drawn_rotations(&app), &[DT, DT]);
}
