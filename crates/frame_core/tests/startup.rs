mod common;

use frame_core::SpinningTriangle;
use frame_core::desc::AdapterKind;
use frame_core::error::StartupStage;
use frame_core::headless::Headless;
use frame_core::headless::HeadlessFaults;
use frame_core::headless::HeadlessWindow;
use frame_core::resource_state::ResourceState;

#[test]
fn starts_on_hardware_adapter_with_idle_gpu() {
    let app = common::start("hardware");
    assert_eq!(app.adapter(), AdapterKind::Hardware);
    assert_eq!(app.surface().width(), common::WIDTH);
    assert_eq!(app.surface().height(), common::HEIGHT);
    assert!(!app.surface().is_paused());
    assert_eq!(app.surface().current_state(), Some(ResourceState::Present));
    assert_eq!(app.sync().submitted_value(), 0);
    assert_eq!(app.frames_presented(), 0);

    let stats = app.device().gpu().stats();
    assert_eq!(stats.live_pipelines, 1);
    assert_eq!(stats.live_root_signatures, 1);
    assert_eq!(stats.presents, 0);
}

#[test]
fn falls_back_to_software_adapter_once() {
    let app = common::start_with(
        "fallback",
        HeadlessFaults {
            no_hardware_adapter: true,
            ..Default::default()
        },
    );
    assert_eq!(app.adapter(), AdapterKind::Software);
}

#[test]
fn warp_flag_skips_hardware_adapter() {
    let mut config = common::config("warp");
    config.use_warp_device = true;
    let app = SpinningTriangle::<Headless>::init(
        &Headless::default(),
        HeadlessWindow(1),
        common::WIDTH,
        common::HEIGHT,
        &config,
    )
    .unwrap();
    assert_eq!(app.adapter(), AdapterKind::Software);
}

#[test]
fn no_adapter_at_all_fails_at_device_stage() {
    let faults = HeadlessFaults {
        no_hardware_adapter: true,
        no_software_adapter: true,
        ..Default::default()
    };
    let err = SpinningTriangle::<Headless>::init(
        &Headless::with_faults(faults),
        HeadlessWindow(1),
        common::WIDTH,
        common::HEIGHT,
        &common::config("no_adapter"),
    )
    .err()
    .unwrap();
    assert_eq!(err.stage, StartupStage::Device);
}

#[test]
fn missing_shader_fails_at_pipeline_stage() {
    let mut config = common::config("missing_shader");
    config.pixel_shader = "does_not_exist.cso".to_owned();
    let err = SpinningTriangle::<Headless>::init(
        &Headless::default(),
        HeadlessWindow(1),
        common::WIDTH,
        common::HEIGHT,
        &config,
    )
    .err()
    .unwrap();
    assert_eq!(err.stage, StartupStage::Pipeline);
    assert!(err.to_string().contains("pipeline"), "{err}");
}

#[test]
fn rejected_pipeline_fails_at_pipeline_stage() {
    let faults = HeadlessFaults {
        reject_pipeline: true,
        ..Default::default()
    };
    let backend = Headless::with_faults(faults);
    let err = SpinningTriangle::<Headless>::init(
        &backend,
        HeadlessWindow(1),
        common::WIDTH,
        common::HEIGHT,
        &common::config("rejected_pipeline"),
    )
    .err()
    .unwrap();
    assert_eq!(err.stage, StartupStage::Pipeline);
}
