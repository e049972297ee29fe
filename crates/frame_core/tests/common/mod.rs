use std::path::PathBuf;

use frame_core::RendererConfig;
use frame_core::SpinningTriangle;
use frame_core::headless::Headless;
use frame_core::headless::HeadlessFaults;
use frame_core::headless::HeadlessWindow;
use frame_core::headless::write_shader_binaries;

pub type App = SpinningTriangle<Headless>;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

pub fn shader_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("frame_core_integration")
        .join(format!("{name}_{}", std::process::id()));
    write_shader_binaries(&dir).unwrap();
    dir
}

pub fn config(name: &str) -> RendererConfig {
    RendererConfig {
        shader_dir: shader_dir(name),
        ..RendererConfig::default()
    }
}

pub fn start(name: &str) -> SpinningTriangle<Headless> {
    start_with(name, HeadlessFaults::default())
}

pub fn start_with(name: &str, faults: HeadlessFaults) -> SpinningTriangle<Headless> {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
    SpinningTriangle::<Headless>::init(
        &Headless::with_faults(faults),
        HeadlessWindow(1),
        WIDTH,
        HEIGHT,
        &config(name),
    )
    .unwrap()
}
