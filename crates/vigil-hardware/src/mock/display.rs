//! Recording display and chime for tests.

use crate::traits::{Chime, DisplayDevice};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A screen the controller asked the display to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    IdlePrompt { masked_len: usize },
    Granted,
    Rejected,
}

/// Display that records every call instead of drawing.
#[derive(Debug)]
pub struct MockDisplay {
    events: Arc<Mutex<Vec<DisplayEvent>>>,
}

impl MockDisplay {
    pub fn new() -> (Self, MockDisplayHandle) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: Arc::clone(&events),
            },
            MockDisplayHandle { events },
        )
    }

    fn record(&self, event: DisplayEvent) {
        self.events.lock().push(event);
    }
}

impl DisplayDevice for MockDisplay {
    fn show_idle_prompt(&mut self, masked_len: usize) {
        self.record(DisplayEvent::IdlePrompt { masked_len });
    }

    fn show_granted(&mut self) {
        self.record(DisplayEvent::Granted);
    }

    fn show_rejected(&mut self) {
        self.record(DisplayEvent::Rejected);
    }
}

/// Inspection handle for a [`MockDisplay`].
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    events: Arc<Mutex<Vec<DisplayEvent>>>,
}

impl MockDisplayHandle {
    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    /// The most recent screen, if anything was shown.
    pub fn last(&self) -> Option<DisplayEvent> {
        self.events.lock().last().copied()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<DisplayEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

/// Chime that counts how often it was played.
#[derive(Debug)]
pub struct MockChime {
    plays: Arc<AtomicUsize>,
}

impl MockChime {
    pub fn new() -> (Self, MockChimeHandle) {
        let plays = Arc::new(AtomicUsize::new(0));
        (
            Self {
                plays: Arc::clone(&plays),
            },
            MockChimeHandle { plays },
        )
    }
}

impl Chime for MockChime {
    fn play_welcome(&mut self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct MockChimeHandle {
    plays: Arc<AtomicUsize>,
}

impl MockChimeHandle {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_display_records_in_order() {
        let (mut display, handle) = MockDisplay::new();

        display.show_idle_prompt(0);
        display.show_idle_prompt(3);
        display.show_rejected();
        display.show_granted();

        assert_eq!(
            handle.events(),
            vec![
                DisplayEvent::IdlePrompt { masked_len: 0 },
                DisplayEvent::IdlePrompt { masked_len: 3 },
                DisplayEvent::Rejected,
                DisplayEvent::Granted,
            ]
        );
        assert_eq!(handle.last(), Some(DisplayEvent::Granted));
    }

    #[test]
    fn test_mock_display_take_drains() {
        let (mut display, handle) = MockDisplay::new();
        display.show_granted();

        assert_eq!(handle.take().len(), 1);
        assert!(handle.events().is_empty());
        assert_eq!(handle.last(), None);
    }

    #[test]
    fn test_mock_chime_counts_plays() {
        let (mut chime, handle) = MockChime::new();
        chime.play_welcome();
        chime.play_welcome();
        assert_eq!(handle.plays(), 2);
    }
}
