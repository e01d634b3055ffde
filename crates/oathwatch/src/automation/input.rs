//! Skill key presses delivered to the game window.
//!
//! Keys are posted to the window's message queue, so the window does not
//! need focus and several clients can be driven at once.

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::shutdown::ShutdownSignal;

/// Virtual-key code of F1; F2..F12 follow contiguously.
const VK_F1: u16 = 0x70;
const SKILL_SLOTS: u8 = 12;

/// One of the twelve skill bar keys, F1 through F12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkillKey(u8);

impl SkillKey {
    /// `slot` 0 is F1, 11 is F12.
    pub fn from_slot(slot: u8) -> Result<Self> {
        if slot >= SKILL_SLOTS {
            return Err(Error::InvalidSkillSlot(slot));
        }
        Ok(Self(slot))
    }

    pub fn slot(self) -> u8 {
        self.0
    }

    pub fn virtual_key(self) -> u16 {
        VK_F1 + self.0 as u16
    }
}

impl fmt::Display for SkillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0 + 1)
    }
}

/// Something that can press a key in one game client.
pub trait KeyInput {
    fn press(&self, key: SkillKey) -> Result<()>;
}

/// Press each key in turn, pausing `delay` after every successful press.
///
/// Stops at the first key that fails and returns how many were pressed.
/// A triggered `signal` also ends the combo early.
pub fn run_combo<K: KeyInput + ?Sized>(
    input: &K,
    keys: &[SkillKey],
    delay: Duration,
    signal: &ShutdownSignal,
) -> usize {
    let mut pressed = 0;
    for &key in keys {
        if let Err(e) = input.press(key) {
            warn!("Skill combo interrupted at {}: {}", key, e);
            break;
        }
        pressed += 1;
        if signal.wait(delay) {
            debug!("Skill combo cancelled after {}", key);
            break;
        }
    }
    pressed
}

#[cfg(target_os = "windows")]
pub use windows_impl::{WindowKeyInput, find_window_by_pid};

#[cfg(target_os = "windows")]
mod windows_impl {
    use std::cell::Cell;
    use std::thread;
    use std::time::Duration;

    use tracing::{debug, info};
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowThreadProcessId, IsWindowVisible, PostMessageW, WM_KEYDOWN, WM_KEYUP,
    };

    use super::{KeyInput, SkillKey};
    use crate::error::{Error, Result};
    use crate::memory::layout::timing::KEY_HOLD_MS;

    thread_local! {
        static FOUND_HWND: Cell<Option<isize>> = const { Cell::new(None) };
    }

    /// First visible top-level window owned by `target_pid`, as a raw handle value.
    pub fn find_window_by_pid(target_pid: u32) -> Result<isize> {
        FOUND_HWND.with(|cell| cell.set(None));
        // SAFETY: the callback only reads the pid behind LPARAM, which
        // outlives the EnumWindows call.
        unsafe {
            // EnumWindows reports an error when the callback stops early
            let _ = EnumWindows(Some(enum_callback), LPARAM(&target_pid as *const u32 as isize));
        }
        FOUND_HWND
            .with(|cell| cell.take())
            .ok_or_else(|| Error::ProcessNotFound(format!("no visible window for pid {}", target_pid)))
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let target_pid = unsafe { *(lparam.0 as *const u32) };
        let mut window_pid: u32 = 0;
        unsafe { GetWindowThreadProcessId(hwnd, Some(&mut window_pid)) };

        if window_pid == target_pid && unsafe { IsWindowVisible(hwnd) }.as_bool() {
            FOUND_HWND.with(|cell| cell.set(Some(hwnd.0 as isize)));
            return BOOL(0);
        }
        BOOL(1)
    }

    /// Posts key down/up pairs to one process's main window.
    #[derive(Debug)]
    pub struct WindowKeyInput {
        pid: u32,
        hwnd: isize,
    }

    impl WindowKeyInput {
        pub fn for_process(pid: u32) -> Result<Self> {
            let hwnd = find_window_by_pid(pid)?;
            info!("Key input for pid {} targets window {:#x}", pid, hwnd);
            Ok(Self { pid, hwnd })
        }

        pub fn pid(&self) -> u32 {
            self.pid
        }

        /// Look the window up again after the client recreates it.
        pub fn refresh(&mut self) -> Result<()> {
            self.hwnd = find_window_by_pid(self.pid)?;
            Ok(())
        }

        fn post(&self, message: u32, key: SkillKey) -> Result<()> {
            let hwnd = HWND(self.hwnd as *mut _);
            // SAFETY: posting to a stale handle fails cleanly.
            unsafe { PostMessageW(hwnd, message, WPARAM(key.virtual_key() as usize), LPARAM(0)) }
                .map_err(|e| Error::InputFailed(format!("PostMessageW {} failed: {}", key, e)))
        }
    }

    impl KeyInput for WindowKeyInput {
        fn press(&self, key: SkillKey) -> Result<()> {
            debug!("Pressing {} (vk {:#x}) on window {:#x}", key, key.virtual_key(), self.hwnd);
            self.post(WM_KEYDOWN, key)?;
            thread::sleep(Duration::from_millis(KEY_HOLD_MS));
            self.post(WM_KEYUP, key)
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub_impl::{WindowKeyInput, find_window_by_pid};

#[cfg(not(target_os = "windows"))]
mod stub_impl {
    use super::{KeyInput, SkillKey};
    use crate::error::{Error, Result};

    pub fn find_window_by_pid(_target_pid: u32) -> Result<isize> {
        Err(Error::Unsupported("window lookup is only supported on Windows".to_string()))
    }

    #[derive(Debug)]
    pub struct WindowKeyInput {
        pid: u32,
    }

    impl WindowKeyInput {
        pub fn for_process(pid: u32) -> Result<Self> {
            find_window_by_pid(pid).map(|_| Self { pid })
        }

        pub fn pid(&self) -> u32 {
            self.pid
        }

        pub fn refresh(&mut self) -> Result<()> {
            find_window_by_pid(self.pid).map(|_| ())
        }
    }

    impl KeyInput for WindowKeyInput {
        fn press(&self, _key: SkillKey) -> Result<()> {
            Err(Error::Unsupported("key input is only supported on Windows".to_string()))
        }
    }
}
