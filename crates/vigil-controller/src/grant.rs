//! Access grants shared between the input and sensor workers.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use vigil_core::AccessSource;

/// An access grant from one credential source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGrant {
    pub source: AccessSource,
    pub granted_at: Instant,
}

impl AccessGrant {
    /// `true` while less than `timeout` has passed since the grant.
    #[inline]
    pub fn is_active(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.granted_at) < timeout
    }
}

/// One grant slot per [`AccessSource`].
///
/// The input worker writes grants and the sensor worker asks whether any is
/// active to decide if the door may be open. The lock only guards the two
/// slots and is never held across an `.await`.
#[derive(Debug)]
pub struct GrantBoard {
    slots: Mutex<[Option<AccessGrant>; 2]>,
    timeout: Duration,
}

impl GrantBoard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Mutex::new([None; 2]),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Record a grant, replacing any grant from the same source.
    ///
    /// Returns the replaced grant.
    pub fn grant(&self, source: AccessSource, now: Instant) -> Option<AccessGrant> {
        self.slots.lock()[source.index()].replace(AccessGrant {
            source,
            granted_at: now,
        })
    }

    /// The recorded grant for `source`, expired or not.
    pub fn get(&self, source: AccessSource) -> Option<AccessGrant> {
        self.slots.lock()[source.index()]
    }

    pub fn is_active(&self, source: AccessSource, now: Instant) -> bool {
        self.get(source)
            .is_some_and(|grant| grant.is_active(now, self.timeout))
    }

    /// `true` if a grant from either source is active.
    pub fn any_active(&self, now: Instant) -> bool {
        self.slots
            .lock()
            .iter()
            .flatten()
            .any(|grant| grant.is_active(now, self.timeout))
    }

    /// Remove every grant that has timed out and return the sources removed.
    pub fn expire(&self, now: Instant) -> Vec<AccessSource> {
        let mut slots = self.slots.lock();
        let mut expired = Vec::new();
        for slot in slots.iter_mut() {
            if let Some(grant) = *slot
                && !grant.is_active(now, self.timeout)
            {
                expired.push(grant.source);
                *slot = None;
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_grant_active_until_timeout() {
        let board = GrantBoard::new(TIMEOUT);
        let t0 = Instant::now();
        board.grant(AccessSource::Keypad, t0);

        assert!(board.is_active(AccessSource::Keypad, t0));
        assert!(board.is_active(AccessSource::Keypad, t0 + Duration::from_millis(4_999)));
        assert!(!board.is_active(AccessSource::Keypad, t0 + TIMEOUT));
        assert!(!board.is_active(AccessSource::Rfid, t0));
    }

    #[test]
    fn test_sources_are_independent() {
        let board = GrantBoard::new(TIMEOUT);
        let t0 = Instant::now();
        board.grant(AccessSource::Keypad, t0);
        board.grant(AccessSource::Rfid, t0 + Duration::from_secs(3));

        let expired = board.expire(t0 + TIMEOUT);
        assert_eq!(expired, vec![AccessSource::Keypad]);
        assert!(board.any_active(t0 + TIMEOUT));
        assert!(board.get(AccessSource::Keypad).is_none());

        let expired = board.expire(t0 + Duration::from_secs(8));
        assert_eq!(expired, vec![AccessSource::Rfid]);
        assert!(!board.any_active(t0 + Duration::from_secs(8)));
    }

    #[test]
    fn test_regrant_refreshes_timestamp() {
        let board = GrantBoard::new(TIMEOUT);
        let t0 = Instant::now();
        board.grant(AccessSource::Rfid, t0);
        let previous = board.grant(AccessSource::Rfid, t0 + Duration::from_secs(4));

        assert_eq!(previous.map(|g| g.granted_at), Some(t0));
        assert!(board.expire(t0 + TIMEOUT).is_empty());
        assert!(board.is_active(AccessSource::Rfid, t0 + Duration::from_secs(8)));
    }

    #[test]
    fn test_expire_is_idempotent() {
        let board = GrantBoard::new(TIMEOUT);
        let t0 = Instant::now();
        board.grant(AccessSource::Keypad, t0);

        assert_eq!(board.expire(t0 + TIMEOUT).len(), 1);
        assert!(board.expire(t0 + TIMEOUT * 2).is_empty());
    }
}
