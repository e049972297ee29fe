use windows::Win32::Foundation::*;
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::*;

use crate::window_class;
use crate::window_class::WindowEvents;
use crate::window_placement::centered_origin;
use crate::windy_error::MyResult;

/// Creates a window whose client area is `client_size`, centered on the
/// primary display. `events` must outlive the window.
pub fn create_window(
    our_module: HMODULE,
    client_size: (u32, u32),
    title: PCWSTR,
    events: &WindowEvents,
) -> MyResult<HWND> {
    let mut window_rect = RECT {
        left: 0,
        top: 0,
        right: client_size.0 as i32,
        bottom: client_size.1 as i32,
    };
    unsafe { AdjustWindowRect(&mut window_rect, WS_OVERLAPPEDWINDOW, false)? };
    let window_size = (
        window_rect.right - window_rect.left,
        window_rect.bottom - window_rect.top,
    );
    let screen_size = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    let (x, y) = centered_origin(screen_size, window_size);

    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            window_class::ID,
            title,
            WS_OVERLAPPEDWINDOW,
            x,
            y,
            window_size.0,
            window_size.1,
            None,
            None,
            Some(our_module.into()),
            Some(events as *const WindowEvents as _),
        )
    }?;
    Ok(hwnd)
}
