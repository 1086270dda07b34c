//! 16x2 character LCD renderer.
//!
//! [`LcdDisplay`] turns the controller's display calls into the two text rows
//! of an HD44780-style module behind an I2C backpack. The rows are kept in a
//! frame buffer that an [`LcdView`] can read from another task, which is how
//! the operator console shows the screen.
//!
//! # Examples
//!
//! ```
//! use vigil_controller::LcdDisplay;
//! use vigil_hardware::DisplayDevice;
//!
//! let mut lcd = LcdDisplay::new();
//! let view = lcd.view();
//!
//! lcd.show_idle_prompt(3);
//! assert_eq!(view.line(0).trim_end(), "Enter password:");
//! assert_eq!(view.line(1).trim_end(), "***");
//!
//! lcd.show_rejected();
//! assert_eq!(view.line(0).trim(), "Incorrect");
//! assert_eq!(view.line(1).trim(), "password");
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use vigil_hardware::DisplayDevice;

/// Number of rows on the module.
pub const LCD_LINES: usize = 2;

/// Characters per row.
pub const LCD_COLUMNS: usize = 16;

pub const PROMPT_TEXT: &str = "Enter password:";
pub const GRANTED_TEXT: &str = "Access granted";
pub const REJECTED_TEXT: (&str, &str) = ("Incorrect", "password");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Left,
    /// Extra space goes on the right if the padding is odd.
    Center,
}

type Frame = Arc<Mutex<[String; LCD_LINES]>>;

/// Character LCD implementing [`DisplayDevice`].
#[derive(Debug)]
pub struct LcdDisplay {
    frame: Frame,
}

impl LcdDisplay {
    /// Create a blank 16x2 display.
    pub fn new() -> Self {
        let blank = " ".repeat(LCD_COLUMNS);
        Self {
            frame: Arc::new(Mutex::new([blank.clone(), blank])),
        }
    }

    /// A read-only view of the frame buffer.
    pub fn view(&self) -> LcdView {
        LcdView {
            frame: Arc::clone(&self.frame),
        }
    }

    fn draw(&mut self, top: (&str, Alignment), bottom: (&str, Alignment)) {
        let top = align_text(top.0, LCD_COLUMNS, top.1);
        let bottom = align_text(bottom.0, LCD_COLUMNS, bottom.1);
        debug!(top = %top.trim_end(), bottom = %bottom.trim_end(), "LCD");
        *self.frame.lock() = [top, bottom];
    }
}

impl Default for LcdDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayDevice for LcdDisplay {
    fn show_idle_prompt(&mut self, masked_len: usize) {
        let stars = "*".repeat(masked_len);
        self.draw((PROMPT_TEXT, Alignment::Left), (&stars, Alignment::Left));
    }

    fn show_granted(&mut self) {
        self.draw((GRANTED_TEXT, Alignment::Center), ("", Alignment::Left));
    }

    fn show_rejected(&mut self) {
        self.draw(
            (REJECTED_TEXT.0, Alignment::Center),
            (REJECTED_TEXT.1, Alignment::Center),
        );
    }
}

/// Shared read access to an [`LcdDisplay`] frame.
#[derive(Debug, Clone)]
pub struct LcdView {
    frame: Frame,
}

impl LcdView {
    /// One row, padded to the display width. Out-of-range rows are empty.
    pub fn line(&self, line: usize) -> String {
        self.frame.lock().get(line).cloned().unwrap_or_default()
    }

    /// Both rows inside a box, for terminal output.
    pub fn render(&self) -> String {
        let frame = self.frame.lock();
        let width = frame.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let border = format!("+{}+", "-".repeat(width));
        let mut out = border.clone();
        for row in frame.iter() {
            out.push_str(&format!("\n|{row}|"));
        }
        out.push('\n');
        out.push_str(&border);
        out
    }
}

/// Pad `text` to `width` characters, cutting it if it is longer.
fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();
    if char_count >= width {
        return text.chars().take(width).collect();
    }

    let padding = width - char_count;
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Center => {
            let left_pad = padding / 2;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(padding - left_pad))
        }
    }
}
