//! Worker tasks and their lifecycle.
//!
//! [`Controller::start`] spawns three tasks into a `JoinSet`:
//!
//! | Task | Period | Work |
//! |------|--------|------|
//! | input worker | `timing.worker_period` | drain keypad, poll reader, expire grants |
//! | sensor worker | `timing.worker_period` | one [`SensorMonitor::sample`] pass |
//! | poll driver | `timing.poll_driver_period` | one [`StatusPoller::poll`] |
//!
//! The tasks share only the [`SyncGuard`], the [`FeatureFlags`] and the
//! [`GrantBoard`]. Device errors are logged and never end a task; a device
//! that reports itself disconnected is no longer polled.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use vigil_core::config::ControllerConfig;
use vigil_hardware::{Chime, DisplayDevice, HardwareError, KeypadDevice, RfidDevice};
use vigil_sync::{
    ConnectivityProbe, FeatureFlags, RemoteSyncChannel, StatusPoller, SyncGuard, SyncStats,
};

use crate::access::AccessController;
use crate::grant::GrantBoard;
use crate::sensors::{SensorInputs, SensorMonitor};

/// Devices owned by the input worker.
pub struct InputDevices {
    pub keypad: Box<dyn KeypadDevice>,
    pub rfid: Box<dyn RfidDevice>,
    pub display: Box<dyn DisplayDevice>,
    pub chime: Box<dyn Chime>,
}

/// A fully wired controller, ready to start.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use vigil_controller::{Controller, InputDevices, LcdDisplay, SensorInputs};
/// use vigil_core::ControllerConfig;
/// use vigil_hardware::mock::*;
/// use vigil_sync::{LinkState, MockRemoteStore};
///
/// # async fn example() {
/// let (keypad, _keys) = MockKeypad::new();
/// let (rfid, _cards) = MockRfid::new();
/// let (chime, _) = MockChime::new();
/// let (motion, _) = MockDigitalInput::new(false);
/// let (vibration, _) = MockAnalogInput::new(0);
/// let (magnetic, _) = MockDigitalInput::new(false);
/// let (alarm, _) = MockAlarm::new();
/// let (store, _remote) = MockRemoteStore::new();
///
/// let controller = Controller::new(
///     ControllerConfig::default(),
///     store,
///     Arc::new(LinkState::new(true)),
///     InputDevices {
///         keypad: Box::new(keypad),
///         rfid: Box::new(rfid),
///         display: Box::new(LcdDisplay::new()),
///         chime: Box::new(chime),
///     },
///     SensorInputs {
///         motion: Box::new(motion),
///         vibration: Box::new(vibration),
///         magnetic: Box::new(magnetic),
///         alarm: Box::new(alarm),
///     },
/// );
///
/// let handle = controller.start();
/// // ...
/// handle.shutdown().await;
/// # }
/// ```
pub struct Controller<C> {
    config: ControllerConfig,
    guard: Arc<SyncGuard<C>>,
    flags: Arc<FeatureFlags>,
    grants: Arc<GrantBoard>,
    inputs: InputDevices,
    sensors: SensorInputs,
}

impl<C: RemoteSyncChannel> Controller<C> {
    pub fn new(
        config: ControllerConfig,
        channel: C,
        probe: Arc<dyn ConnectivityProbe>,
        inputs: InputDevices,
        sensors: SensorInputs,
    ) -> Self {
        let grants = Arc::new(GrantBoard::new(config.timing.grant_timeout()));
        Self {
            guard: Arc::new(SyncGuard::new(channel, probe)),
            flags: Arc::new(FeatureFlags::new()),
            grants,
            config,
            inputs,
            sensors,
        }
    }

    /// Replace the initial feature flags (all enabled by default).
    #[must_use]
    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = Arc::new(flags);
        self
    }

    /// Spawn the workers onto the current tokio runtime.
    pub fn start(self) -> ControllerHandle<C> {
        let timing = &self.config.timing;
        let worker_period = timing.worker_period();
        let driver_period = timing.poll_driver_period();

        let InputDevices {
            keypad,
            rfid,
            display,
            chime,
        } = self.inputs;

        let access = AccessController::new(
            &self.config,
            Arc::clone(&self.guard),
            Arc::clone(&self.flags),
            Arc::clone(&self.grants),
            display,
            chime,
        );
        let monitor = SensorMonitor::new(
            &self.config,
            Arc::clone(&self.guard),
            Arc::clone(&self.flags),
            Arc::clone(&self.grants),
            self.sensors,
        );
        let poller = StatusPoller::new(
            Arc::clone(&self.guard),
            Arc::clone(&self.flags),
            timing.poll_interval(),
        );

        let mut tasks = JoinSet::new();
        tasks.spawn(input_worker(access, keypad, rfid, worker_period));
        tasks.spawn(sensor_worker(monitor, worker_period));
        tasks.spawn(poll_driver(poller, driver_period));
        info!("Controller started");

        ControllerHandle {
            tasks,
            guard: self.guard,
            flags: self.flags,
            grants: self.grants,
        }
    }
}

/// Handle to a running controller.
pub struct ControllerHandle<C> {
    tasks: JoinSet<()>,
    guard: Arc<SyncGuard<C>>,
    flags: Arc<FeatureFlags>,
    grants: Arc<GrantBoard>,
}

impl<C: RemoteSyncChannel> ControllerHandle<C> {
    pub fn flags(&self) -> &Arc<FeatureFlags> {
        &self.flags
    }

    pub fn grants(&self) -> &Arc<GrantBoard> {
        &self.grants
    }

    pub fn sync_stats(&self) -> SyncStats {
        self.guard.stats()
    }

    /// `true` while at least one worker is still running.
    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Stop every worker and wait for them to finish.
    ///
    /// A worker that panicked is logged; shutdown itself does not fail.
    pub async fn shutdown(mut self) {
        self.tasks.abort_all();

        let mut panics = 0usize;
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result
                && e.is_panic()
            {
                panics += 1;
                error!("Worker panicked: {}", e);
            }
        }

        if panics == 0 {
            info!("Controller stopped");
        } else {
            warn!(panics, "Controller stopped after worker panics");
        }
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Log a device error. Returns `true` if the device should be polled again.
fn keep_polling(device: &str, err: &HardwareError) -> bool {
    if err.is_disconnected() {
        error!("{} disconnected, no longer polled: {}", device, err);
        false
    } else {
        warn!("{} read failed: {}", device, err);
        true
    }
}

async fn input_worker<C: RemoteSyncChannel>(
    mut access: AccessController<C>,
    keypad: Box<dyn KeypadDevice>,
    rfid: Box<dyn RfidDevice>,
    period: Duration,
) {
    debug!(keypad = %keypad.info(), rfid = %rfid.info(), "Input worker running");
    let mut keypad = Some(keypad);
    let mut rfid = Some(rfid);
    let mut ticker = ticker(period);

    loop {
        ticker.tick().await;

        while let Some(device) = keypad.as_mut() {
            match device.try_read_input() {
                Ok(Some(key)) => {
                    access.on_key_press(key, Instant::now()).await;
                }
                Ok(None) => break,
                Err(e) => {
                    if !keep_polling("Keypad", &e) {
                        keypad = None;
                    }
                    break;
                }
            }
        }

        if let Some(device) = rfid.as_mut() {
            match device.try_read_card() {
                Ok(Some(card)) => {
                    access.on_card_read(&card, Instant::now()).await;
                }
                Ok(None) => {}
                Err(e) => {
                    if !keep_polling("RFID reader", &e) {
                        rfid = None;
                    }
                }
            }
        }

        access.tick(Instant::now()).await;
    }
}

async fn sensor_worker<C: RemoteSyncChannel>(mut monitor: SensorMonitor<C>, period: Duration) {
    debug!("Sensor worker running");
    let mut ticker = ticker(period);
    loop {
        ticker.tick().await;
        monitor.sample(Instant::now()).await;
    }
}

async fn poll_driver<C: RemoteSyncChannel>(mut poller: StatusPoller<C>, period: Duration) {
    debug!("Status poll driver running");
    let mut ticker = ticker(period);
    loop {
        ticker.tick().await;
        poller.poll(Instant::now()).await;
    }
}
