//! Keypad and card access decisions.
//!
//! [`AccessController`] is owned by the input worker. It turns key presses and
//! card reads into grants on the shared [`GrantBoard`], drives the display and
//! chime, and reports every access event to the remote store:
//!
//! | Event | Remote write |
//! |-------|--------------|
//! | correct code + `#` | `keypad=1` |
//! | wrong code + `#` | nothing |
//! | authorized card | `rfid=1` |
//! | unknown or malformed card | `rfid=0` |
//! | grant times out | `<source>=0` |
//!
//! Decisions never wait on the remote store: a grant is recorded before the
//! write is attempted and stands whatever the write's outcome.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use vigil_core::config::{ControllerConfig, CredentialsConfig};
use vigil_core::{AccessSource, CardUid, FeatureFlag};
use vigil_hardware::{CardData, Chime, DisplayDevice, KeypadInput};
use vigil_sync::{FeatureFlags, RemoteSyncChannel, SyncGuard};

use crate::grant::GrantBoard;
use crate::keypad::KeypadBuffer;

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Keypad disabled or rejection message still showing.
    Ignored,
    /// Key appended to the buffer.
    Buffered,
    /// Buffer full, key dropped.
    Dropped,
    /// Buffer cleared with `*`.
    Cleared,
    /// Submitted code matched.
    Granted,
    /// Submitted code did not match.
    Rejected,
}

/// What a card read did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardOutcome {
    /// RFID disabled.
    Ignored,
    Granted,
    Denied,
}

/// Access-grant lifecycle for the keypad and the card reader.
pub struct AccessController<C> {
    guard: Arc<SyncGuard<C>>,
    flags: Arc<FeatureFlags>,
    grants: Arc<GrantBoard>,
    display: Box<dyn DisplayDevice>,
    chime: Box<dyn Chime>,
    credentials: CredentialsConfig,
    buffer: KeypadBuffer,
    rejection_dwell: Duration,
    rejected_until: Option<Instant>,
}

impl<C: RemoteSyncChannel> AccessController<C> {
    /// Create a controller and draw the idle prompt.
    pub fn new(
        config: &ControllerConfig,
        guard: Arc<SyncGuard<C>>,
        flags: Arc<FeatureFlags>,
        grants: Arc<GrantBoard>,
        mut display: Box<dyn DisplayDevice>,
        chime: Box<dyn Chime>,
    ) -> Self {
        display.show_idle_prompt(0);
        Self {
            guard,
            flags,
            grants,
            display,
            chime,
            credentials: config.credentials.clone(),
            buffer: KeypadBuffer::default(),
            rejection_dwell: config.timing.rejection_dwell(),
            rejected_until: None,
        }
    }

    /// Handle one key from the keypad.
    pub async fn on_key_press(&mut self, key: KeypadInput, now: Instant) -> KeyOutcome {
        if !self.flags.is_enabled(FeatureFlag::Keypad) {
            trace!("Keypad disabled, ignoring key");
            return KeyOutcome::Ignored;
        }
        if self.is_rejecting(now) {
            trace!("Rejection message showing, ignoring key");
            return KeyOutcome::Ignored;
        }

        debug!("Key pressed: {}", key.to_char());
        match key {
            KeypadInput::Star => {
                self.buffer.clear();
                self.display.show_idle_prompt(0);
                KeyOutcome::Cleared
            }
            KeypadInput::Hash => self.submit(now).await,
            _ => {
                if self.buffer.push(key.to_char()) {
                    self.display.show_idle_prompt(self.buffer.len());
                    KeyOutcome::Buffered
                } else {
                    KeyOutcome::Dropped
                }
            }
        }
    }

    async fn submit(&mut self, now: Instant) -> KeyOutcome {
        let entered = self.buffer.take();
        if self.credentials.keypad_code.matches(&entered) {
            self.grant(AccessSource::Keypad, now).await;
            KeyOutcome::Granted
        } else {
            info!("Incorrect keypad code");
            self.rejected_until = Some(now + self.rejection_dwell);
            self.display.show_rejected();
            KeyOutcome::Rejected
        }
    }

    /// Handle one card presented to the reader.
    pub async fn on_card_read(&mut self, card: &CardData, now: Instant) -> CardOutcome {
        if !self.flags.is_enabled(FeatureFlag::Rfid) {
            trace!("RFID disabled, ignoring card");
            return CardOutcome::Ignored;
        }

        let authorized = match CardUid::from_bytes(&card.uid) {
            Ok(uid) => {
                debug!(%uid, read_at = %card.timestamp, "Card read");
                self.credentials.is_card_authorized(&uid)
            }
            Err(e) => {
                warn!(uid = %card.uid_hex(), "Unreadable card: {}", e);
                false
            }
        };

        if authorized {
            self.grant(AccessSource::Rfid, now).await;
            CardOutcome::Granted
        } else {
            info!("Card not authorized");
            let _ = self.guard.write(FeatureFlag::Rfid, false).await;
            CardOutcome::Denied
        }
    }

    async fn grant(&mut self, source: AccessSource, now: Instant) {
        self.grants.grant(source, now);
        self.buffer.clear();
        self.rejected_until = None;
        info!("Access granted via {}", source);

        self.display.show_granted();
        self.chime.play_welcome();
        let _ = self.guard.write(source.signal(), true).await;
    }

    /// Expire timed-out grants and end an elapsed rejection dwell.
    ///
    /// Writes `<source>=0` for each expired grant. The idle prompt comes back
    /// only once no grant from either source remains. Returns the sources
    /// whose grants expired.
    pub async fn tick(&mut self, now: Instant) -> Vec<AccessSource> {
        if let Some(until) = self.rejected_until
            && now >= until
        {
            self.rejected_until = None;
            if self.grants.any_active(now) {
                self.display.show_granted();
            } else {
                self.display.show_idle_prompt(self.buffer.len());
            }
        }

        let expired = self.grants.expire(now);
        for source in &expired {
            info!("Access via {} expired", source);
            let _ = self.guard.write(source.signal(), false).await;
        }

        if !expired.is_empty() && !self.grants.any_active(now) && !self.is_rejecting(now) {
            self.buffer.clear();
            self.display.show_idle_prompt(0);
        }
        expired
    }

    /// `true` while the wrong-code message is on screen.
    pub fn is_rejecting(&self, now: Instant) -> bool {
        self.rejected_until.is_some_and(|until| now < until)
    }

    /// Number of keys currently buffered.
    pub fn buffered_keys(&self) -> usize {
        self.buffer.len()
    }

    pub fn grants(&self) -> &Arc<GrantBoard> {
        &self.grants
    }
}

impl<C> std::fmt::Debug for AccessController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessController")
            .field("buffered_keys", &self.buffer.len())
            .field("rejected_until", &self.rejected_until)
            .field("grants", &self.grants)
            .finish_non_exhaustive()
    }
}
