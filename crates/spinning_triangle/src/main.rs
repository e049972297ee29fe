//! Windowed spinning triangle on Direct3D 12.
//!
//! Shaders are loaded from `<exeDir>/shaders`. The build script compiles
//! `shaders/*.hlsl` there when `fxc` is on `PATH`; otherwise build them by
//! hand and point `--shader-dir` at the result:
//!
//! ```text
//! fxc /T vs_5_0 /E main /Fo vertex12.cso shaders/vertex12.hlsl
//! fxc /T ps_5_0 /E main /Fo pixel12.cso shaders/pixel12.hlsl
//! ```

#[cfg(windows)]
pub mod create_window;
#[cfg(windows)]
pub mod window_class;
pub mod window_placement;
pub mod windy_error;

use frame_core::RendererConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;
use windy_error::MyResult;

#[cfg(windows)]
pub fn main() -> MyResult<()> {
    init()?;
    let config = RendererConfig::from_env();
    windows_main::run(&config)
}

#[cfg(not(windows))]
pub fn main() -> MyResult<()> {
    init()?;
    let config = RendererConfig::from_env();
    info!(?config, "Parsed configuration");
    Err(eyre::eyre!("spinning_triangle needs Direct3D 12 and only runs on Windows").into())
}

fn init() -> MyResult<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_target(false)
        .init();
    info!("Ahoy, world!");
    Ok(())
}

#[cfg(windows)]
mod windows_main {
    use std::time::Instant;

    use frame_core::RendererConfig;
    use frame_core::SpinningTriangle;
    use frame_core::d3d12::D3d12;
    use tracing::error;
    use tracing::info;
    use tracing::warn;
    use widestring::U16CString;
    use windows::Win32::Foundation::*;
    use windows::Win32::System::LibraryLoader::*;
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::PCWSTR;
    use windows::core::w;

    use crate::create_window::create_window;
    use crate::window_class::WindowEvent;
    use crate::window_class::WindowEvents;
    use crate::window_class::create_window_class_struct;
    use crate::window_class::register_window_class;
    use crate::windy_error::MyResult;

    pub fn run(config: &RendererConfig) -> MyResult<()> {
        let our_module = get_handle_to_file_used_to_create_the_calling_process()?;
        let window_class = create_window_class_struct(our_module)?;
        register_window_class(&window_class)?;

        let events = Box::new(WindowEvents::default());
        let title = U16CString::from_str_truncate(config.window_title());
        let hwnd = create_window(
            our_module,
            config.window_size,
            PCWSTR(title.as_ptr()),
            &events,
        )?;

        let (width, height) = config.window_size;
        let backend = D3d12::new(config.debug_layer);
        let mut app = match SpinningTriangle::init(&backend, hwnd, width, height, config) {
            Ok(app) => app,
            Err(e) => {
                error!("Startup failed: {e:?}");
                show_startup_error(hwnd, &e.to_string());
                return Err(e.into());
            }
        };
        info!(adapter = app.adapter().name(), "Renderer ready");

        unsafe { _ = ShowWindow(hwnd, SW_SHOW) };

        let mut last_frame = Instant::now();
        loop {
            let mut message = MSG::default();
            if unsafe { PeekMessageW(&mut message, None, 0, 0, PM_REMOVE) }.into() {
                if message.message == WM_QUIT {
                    break;
                }
                unsafe {
                    _ = TranslateMessage(&message);
                    DispatchMessageW(&message);
                }
                continue;
            }

            while let Some(event) = events.pop() {
                match event {
                    WindowEvent::Resized { width, height } => {
                        if let Err(e) = app.on_resize(width, height) {
                            warn!("Resize to {width}x{height} failed: {e}");
                        }
                    }
                }
            }

            let now = Instant::now();
            app.update((now - last_frame).as_secs_f32());
            last_frame = now;
            if let Err(e) = app.render() {
                warn!("Dropped frame: {e}");
            }
        }

        info!(frames = app.frames_presented(), "Shutting down");
        Ok(())
    }

    fn show_startup_error(hwnd: HWND, message: &str) {
        let text = U16CString::from_str_truncate(message);
        unsafe {
            MessageBoxW(
                Some(hwnd),
                PCWSTR(text.as_ptr()),
                w!("Spinning Triangle"),
                MB_OK | MB_ICONERROR,
            )
        };
    }

    fn get_handle_to_file_used_to_create_the_calling_process() -> MyResult<HMODULE> {
        let mut out = Default::default();
        unsafe { GetModuleHandleExW(Default::default(), None, &mut out)? };
        Ok(out)
    }
}
