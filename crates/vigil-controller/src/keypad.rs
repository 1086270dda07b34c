//! Bounded buffer for keys typed before `#`.

use vigil_core::constants::KEYPAD_MAX_LENGTH;

/// Keys entered since the last submit or clear.
///
/// Holds at most `capacity` keys. Keys pressed while the buffer is full are
/// dropped, so a long burst cannot push earlier keys out.
///
/// # Examples
///
/// ```
/// use vigil_controller::KeypadBuffer;
///
/// let mut buffer = KeypadBuffer::new(4);
/// for key in "123456".chars() {
///     buffer.push(key);
/// }
/// assert_eq!(buffer.as_str(), "1234");
/// assert_eq!(buffer.masked(), "****");
///
/// assert_eq!(buffer.take(), "1234");
/// assert!(buffer.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypadBuffer {
    keys: String,
    capacity: usize,
}

impl KeypadBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: String::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a key. Returns `false` if the buffer was full and the key was dropped.
    pub fn push(&mut self, key: char) -> bool {
        if self.is_full() {
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Return the buffered keys and leave the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.keys)
    }

    pub fn as_str(&self) -> &str {
        &self.keys
    }

    /// One `*` per buffered key.
    pub fn masked(&self) -> String {
        "*".repeat(self.len())
    }

    pub fn len(&self) -> usize {
        self.keys.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for KeypadBuffer {
    fn default() -> Self {
        Self::new(KEYPAD_MAX_LENGTH)
    }
}
