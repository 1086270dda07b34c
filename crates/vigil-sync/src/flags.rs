//! Remotely controlled feature flags.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use vigil_core::FeatureFlag;

/// One enable bit per [`FeatureFlag`].
///
/// Workers read the flags lock-free on every tick. Only the
/// [`StatusPoller`](crate::StatusPoller) writes them at runtime; code outside
/// this crate can only choose the initial values.
///
/// # Examples
///
/// ```
/// use vigil_core::FeatureFlag;
/// use vigil_sync::FeatureFlags;
///
/// let flags = FeatureFlags::new().with(FeatureFlag::Alarm, false);
/// assert!(!flags.is_enabled(FeatureFlag::Alarm));
/// assert!(flags.is_enabled(FeatureFlag::Keypad));
/// ```
pub struct FeatureFlags {
    bits: [AtomicBool; FeatureFlag::ALL.len()],
}

impl FeatureFlags {
    /// Every feature enabled.
    pub fn new() -> Self {
        Self {
            bits: std::array::from_fn(|_| AtomicBool::new(true)),
        }
    }

    /// Set the initial value of one flag.
    #[must_use]
    pub fn with(self, flag: FeatureFlag, enabled: bool) -> Self {
        self.set(flag, enabled);
        self
    }

    #[inline]
    pub fn is_enabled(&self, flag: FeatureFlag) -> bool {
        self.bits[flag.index()].load(Ordering::Acquire)
    }

    /// Current value of every flag, in poll order.
    pub fn snapshot(&self) -> [(FeatureFlag, bool); FeatureFlag::ALL.len()] {
        FeatureFlag::ALL.map(|flag| (flag, self.is_enabled(flag)))
    }

    /// Store a new value. Returns the previous one.
    pub(crate) fn set(&self, flag: FeatureFlag, enabled: bool) -> bool {
        self.bits[flag.index()].swap(enabled, Ordering::AcqRel)
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FeatureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (flag, enabled) in self.snapshot() {
            map.entry(&flag.wire_name(), &enabled);
        }
        map.finish()
    }
}
