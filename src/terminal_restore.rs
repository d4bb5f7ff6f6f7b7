//! Raw mode and alternate screen bookkeeping so the shell is usable again after
//! a normal exit, an error return, or a panic.

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::{
    io::{self, Write},
    panic,
    sync::{
        atomic::{AtomicBool, Ordering},
        OnceLock,
    },
};

static RAW_MODE_ENABLED: AtomicBool = AtomicBool::new(false);
static ALT_SCREEN_ENABLED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

/// Restores the terminal when dropped. The panic hook shares the same flags, so
/// restoring twice is harmless.
pub struct TerminalRestoreGuard {
    _private: (),
}

impl TerminalRestoreGuard {
    /// Switch to raw mode on the alternate screen with the cursor hidden.
    pub fn enter(stdout: &mut impl Write) -> io::Result<Self> {
        install_terminal_panic_hook();
        let guard = Self { _private: () };
        enable_raw_mode()?;
        RAW_MODE_ENABLED.store(true, Ordering::SeqCst);
        execute!(stdout, EnterAlternateScreen, Hide)?;
        ALT_SCREEN_ENABLED.store(true, Ordering::SeqCst);
        Ok(guard)
    }
}

impl Drop for TerminalRestoreGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

pub fn restore_terminal() {
    if RAW_MODE_ENABLED.swap(false, Ordering::SeqCst) {
        let _ = disable_raw_mode();
    }
    let mut stdout = io::stdout();
    if ALT_SCREEN_ENABLED.swap(false, Ordering::SeqCst) {
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
    let _ = execute!(stdout, Show);
    let _ = stdout.flush();
}

fn install_terminal_panic_hook() {
    PANIC_HOOK_INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal();
            crate::log_panic(info);
            let thread = std::thread::current();
            crate::log_debug(&format!(
                "panic on thread {}",
                thread.name().unwrap_or("unnamed")
            ));
            previous(info);
        }));
    });
}
