//! Swipe-to-reveal-delete gesture state for the notes list.
//!
//! At most one item is being slid and at most one item is revealed. A new
//! touch on another item or a click outside the list collapses the
//! revealed item.

/// Horizontal travel, in pixels, before a swipe counts
pub const SWIPE_THRESHOLD: f64 = 50.0;

/// What a click on a list item should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The item was revealed; the click only collapsed it
    Collapsed,
    /// Navigate to the note
    Open(String),
}

#[derive(Debug, Default, Clone)]
pub struct SwipeTracker {
    /// Item under the finger and where the touch started
    sliding: Option<(String, f64)>,
    /// Item whose delete action is showing
    revealed: Option<String>,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch_start(&mut self, note_id: &str, x: f64) {
        if self.revealed.as_deref() != Some(note_id) {
            self.revealed = None;
        }
        self.sliding = Some((note_id.to_string(), x));
    }

    pub fn touch_move(&mut self, note_id: &str, x: f64) {
        let Some((sliding_id, start_x)) = &self.sliding else {
            return;
        };
        if sliding_id != note_id {
            return;
        }

        let dx = x - start_x;
        if dx > SWIPE_THRESHOLD {
            self.revealed = Some(note_id.to_string());
        } else if dx < -SWIPE_THRESHOLD {
            if self.revealed.as_deref() == Some(note_id) {
                self.revealed = None;
            }
            self.sliding = None;
        }
    }

    pub fn touch_end(&mut self) {
        self.sliding = None;
    }

    pub fn click_item(&mut self, note_id: &str) -> ClickOutcome {
        if self.revealed.as_deref() == Some(note_id) {
            self.revealed = None;
            ClickOutcome::Collapsed
        } else {
            self.revealed = None;
            ClickOutcome::Open(note_id.to_string())
        }
    }

    pub fn click_outside(&mut self) {
        self.revealed = None;
    }

    /// Drop any state about an item that left the list
    pub fn forget(&mut self, note_id: &str) {
        if self.revealed.as_deref() == Some(note_id) {
            self.revealed = None;
        }
        if matches!(&self.sliding, Some((id, _)) if id == note_id) {
            self.sliding = None;
        }
    }

    pub fn is_revealed(&self, note_id: &str) -> bool {
        self.revealed.as_deref() == Some(note_id)
    }

    pub fn revealed(&self) -> Option<&str> {
        self.revealed.as_deref()
    }

    pub fn sliding(&self) -> Option<&str> {
        self.sliding.as_ref().map(|(id, _)| id.as_str())
    }
}
