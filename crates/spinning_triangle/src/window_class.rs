use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::debug;
use windows::Win32::Foundation::*;
use windows::Win32::UI::Input::KeyboardAndMouse::VK_ESCAPE;
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::*;

use crate::windy_error::MyResult;

pub const ID: PCWSTR = w!("SpinningTriangleWindow");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// New client area size. Minimize is not reported.
    Resized { width: u32, height: u32 },
}

/// Events the window procedure hands to the main loop. One queue per
/// window, reachable through `GWLP_USERDATA`.
#[derive(Default)]
pub struct WindowEvents {
    queue: RefCell<VecDeque<WindowEvent>>,
}

impl WindowEvents {
    pub fn pop(&self) -> Option<WindowEvent> {
        self.queue.borrow_mut().pop_front()
    }

    fn push(&self, event: WindowEvent) {
        self.queue.borrow_mut().push_back(event);
    }
}

pub fn create_window_class_struct(instance: HMODULE) -> MyResult<WNDCLASSEXW> {
    let wc = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wndproc),
        hInstance: instance.into(),
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW)? },
        lpszClassName: ID,
        ..Default::default()
    };
    Ok(wc)
}

pub fn register_window_class(class: &WNDCLASSEXW) -> MyResult<()> {
    let atom = unsafe { RegisterClassExW(class) };
    if atom == 0 {
        let error = unsafe { GetLastError() };
        return Err(eyre::eyre!("RegisterClassExW failed: {error:?}").into());
    }
    Ok(())
}

fn handle(
    window: HWND,
    events: &WindowEvents,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> bool {
    match message {
        WM_SIZE => {
            if wparam.0 as u32 != SIZE_MINIMIZED {
                let width = (lparam.0 & 0xffff) as u32;
                let height = ((lparam.0 >> 16) & 0xffff) as u32;
                events.push(WindowEvent::Resized { width, height });
            }
            true
        }
        WM_KEYDOWN if wparam.0 == VK_ESCAPE.0 as usize => {
            debug!("Escape pressed, closing window");
            if let Err(e) = unsafe { DestroyWindow(window) } {
                debug!("DestroyWindow failed: {e}");
            }
            true
        }
        WM_DESTROY => {
            unsafe {
                SetWindowLongPtrW(window, GWLP_USERDATA, 0);
                PostQuitMessage(0);
            }
            true
        }
        _ => false,
    }
}

extern "system" fn wndproc(window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if message == WM_CREATE {
        unsafe {
            let create_struct: &CREATESTRUCTW = &*(lparam.0 as *const CREATESTRUCTW);
            SetWindowLongPtrW(window, GWLP_USERDATA, create_struct.lpCreateParams as _);
        }
        return LRESULT(0);
    }

    let user_data = unsafe { GetWindowLongPtrW(window, GWLP_USERDATA) };
    // Messages can arrive before WM_CREATE or after WM_DESTROY.
    let handled = match std::ptr::NonNull::new(user_data as *mut WindowEvents) {
        Some(events) => handle(window, unsafe { events.as_ref() }, message, wparam, lparam),
        None => false,
    };

    if handled {
        LRESULT(0)
    } else {
        unsafe { DefWindowProcW(window, message, wparam, lparam) }
    }
}
