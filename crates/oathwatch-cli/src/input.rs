use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use oathwatch::ShutdownSignal;
use tracing::debug;

/// Spawn a thread that triggers `shutdown` on Esc, q or Ctrl+C.
///
/// The thread exits on its own once the signal fires from anywhere else.
pub fn spawn_keyboard_monitor(shutdown: Arc<ShutdownSignal>) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!("Keyboard monitor started");

        while !shutdown.is_shutdown() {
            if event::poll(Duration::from_millis(100)).unwrap_or(false)
                && let Ok(Event::Key(key_event)) = event::read()
                && should_shutdown(&key_event)
            {
                debug!("Shutdown key pressed: {:?}", key_event.code);
                shutdown.trigger();
                break;
            }
        }

        debug!("Keyboard monitor stopped");
    })
}

fn should_shutdown(event: &KeyEvent) -> bool {
    match event.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => true,
        // raw terminal mode can swallow SIGINT
        KeyCode::Char('c') => event.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        assert!(should_shutdown(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(should_shutdown(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(should_shutdown(&KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT)));
        assert!(should_shutdown(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_other_keys_are_ignored() {
        assert!(!should_shutdown(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!should_shutdown(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(!should_shutdown(&KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE)));
    }
}
