//! `WM_CLIPBOARDUPDATE` listener on a message-only window.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use once_cell::sync::OnceCell;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::DataExchange::{AddClipboardFormatListener, RemoveClipboardFormatListener};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging as wm;

use crate::app::Message;

static NOTIFY: OnceCell<Sender<Message>> = OnceCell::new();

unsafe extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if msg == wm::WM_CLIPBOARDUPDATE {
        if let Some(tx) = NOTIFY.get() {
            let _ = tx.send(Message::ClipboardChanged);
        }
        return LRESULT(0);
    }
    wm::DefWindowProcW(hwnd, msg, wparam, lparam)
}

/// Starts the listener thread. Returns false if it could not be registered,
/// in which case the caller should poll instead.
pub fn spawn_change_listener(tx: Sender<Message>) -> bool {
    if NOTIFY.set(tx).is_err() {
        log::warn!("clipboard listener already running");
        return false;
    }
    let (ready_tx, ready_rx) = mpsc::channel::<bool>();

    thread::spawn(move || unsafe {
        let class_name = w!("TransPasteClipboardListener");
        let hinstance: HINSTANCE = match GetModuleHandleW(PCWSTR::null()) {
            Ok(module) => module.into(),
            Err(e) => {
                log::error!("GetModuleHandleW failed: {}", e);
                let _ = ready_tx.send(false);
                return;
            }
        };
        let class = wm::WNDCLASSW {
            lpfnWndProc: Some(wndproc),
            hInstance: hinstance,
            lpszClassName: class_name,
            ..Default::default()
        };
        if wm::RegisterClassW(&class) == 0 {
            log::error!("RegisterClassW failed for clipboard listener");
            let _ = ready_tx.send(false);
            return;
        }
        let hwnd = match wm::CreateWindowExW(
            wm::WINDOW_EX_STYLE(0),
            class_name,
            w!(""),
            wm::WINDOW_STYLE(0),
            0,
            0,
            0,
            0,
            wm::HWND_MESSAGE,
            wm::HMENU::default(),
            hinstance,
            None,
        ) {
            Ok(hwnd) => hwnd,
            Err(e) => {
                log::error!("CreateWindowExW failed for clipboard listener: {}", e);
                let _ = ready_tx.send(false);
                return;
            }
        };
        if let Err(e) = AddClipboardFormatListener(hwnd) {
            log::error!("AddClipboardFormatListener FAILED: {}", e);
            let _ = wm::DestroyWindow(hwnd);
            let _ = ready_tx.send(false);
            return;
        }
        log::info!("AddClipboardFormatListener OK (listener thread)");
        let _ = ready_tx.send(true);

        loop {
            let mut msg = wm::MSG::default();
            let got = wm::GetMessageW(&mut msg, HWND(std::ptr::null_mut()), 0, 0);
            if got.0 == -1 || got.0 == 0 {
                log::warn!("GetMessageW returned {}, stopping clipboard listener", got.0);
                break;
            }
            let _ = wm::TranslateMessage(&msg);
            wm::DispatchMessageW(&msg);
        }
        let _ = RemoveClipboardFormatListener(hwnd);
        let _ = wm::DestroyWindow(hwnd);
    });

    ready_rx.recv_timeout(Duration::from_secs(2)).unwrap_or(false)
}
