//! Local network link state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the network link is currently up.
///
/// Consulted before every remote operation, so it must be cheap and must not
/// block.
pub trait ConnectivityProbe: Send + Sync {
    fn is_up(&self) -> bool;
}

/// Link state shared between the network driver and the controller.
///
/// The wifi driver (or a test) flips the state with [`set_up`](Self::set_up);
/// every clone observes the change.
///
/// # Examples
///
/// ```
/// use vigil_sync::{ConnectivityProbe, LinkState};
///
/// let link = LinkState::new(false);
/// let probe = link.clone();
///
/// link.set_up(true);
/// assert!(probe.is_up());
/// ```
#[derive(Debug, Clone)]
pub struct LinkState {
    up: Arc<AtomicBool>,
}

impl LinkState {
    pub fn new(up: bool) -> Self {
        Self {
            up: Arc::new(AtomicBool::new(up)),
        }
    }

    /// Update the link state. Returns the previous state.
    pub fn set_up(&self, up: bool) -> bool {
        self.up.swap(up, Ordering::SeqCst)
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityProbe for LinkState {
    fn is_up(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_state_shared_between_clones() {
        let link = LinkState::default();
        let other = link.clone();
        assert!(other.is_up());

        assert!(link.set_up(false));
        assert!(!other.is_up());
        assert!(!link.set_up(true));
    }
}
