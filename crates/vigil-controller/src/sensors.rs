//! Enclosure sensor sampling and the local alarm.
//!
//! One [`SensorMonitor::sample`] call is one pass of the sensor worker:
//!
//! 1. **Motion**, at most once per motion interval: report `motion`.
//! 2. **Vibration**: report a hit at or above the vibration threshold and,
//!    with the siren enabled, sound the buzzer from the lower arming threshold.
//! 3. **Magnetic contact**, only while nobody has been let in: report
//!    `magnetic` and, with the siren enabled, sound the buzzer while the door
//!    is open.
//!
//! A sensor whose feature flag is off is not read at all.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};
use vigil_core::FeatureFlag;
use vigil_core::config::ControllerConfig;
use vigil_hardware::{AlarmOutput, AnalogInput, DigitalInput};
use vigil_sync::{FeatureFlags, RemoteSyncChannel, SyncGuard};

use crate::grant::GrantBoard;

/// The sensor pins and buzzer owned by the sensor worker.
pub struct SensorInputs {
    /// PIR output, high while motion is detected.
    pub motion: Box<dyn DigitalInput>,
    /// Piezo vibration sensor on the ADC.
    pub vibration: Box<dyn AnalogInput>,
    /// Reed switch with pull-up, high while the door is open.
    pub magnetic: Box<dyn DigitalInput>,
    pub alarm: Box<dyn AlarmOutput>,
}

/// Readings taken during one [`SensorMonitor::sample`] pass.
///
/// `None` means the sensor was not read on this pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorReport {
    pub motion: Option<bool>,
    pub vibration: Option<u16>,
    pub door_open: Option<bool>,
}

/// Samples the enclosure sensors and drives the buzzer.
pub struct SensorMonitor<C> {
    guard: Arc<SyncGuard<C>>,
    flags: Arc<FeatureFlags>,
    grants: Arc<GrantBoard>,
    inputs: SensorInputs,
    vibration_threshold: u16,
    arming_threshold: u16,
    motion_interval: Duration,
    last_motion: Option<Instant>,
}

impl<C: RemoteSyncChannel> SensorMonitor<C> {
    pub fn new(
        config: &ControllerConfig,
        guard: Arc<SyncGuard<C>>,
        flags: Arc<FeatureFlags>,
        grants: Arc<GrantBoard>,
        inputs: SensorInputs,
    ) -> Self {
        Self {
            guard,
            flags,
            grants,
            inputs,
            vibration_threshold: config.sensors.vibration_threshold,
            arming_threshold: config.sensors.arming_threshold(),
            motion_interval: config.timing.motion_sample_interval(),
            last_motion: None,
        }
    }

    /// Run one sampling pass.
    pub async fn sample(&mut self, now: Instant) -> SensorReport {
        let siren = self.flags.is_enabled(FeatureFlag::Alarm);
        if !siren && self.inputs.alarm.is_on() {
            info!("Siren disabled, silencing buzzer");
            self.inputs.alarm.set(false);
        }

        SensorReport {
            motion: self.sample_motion(now).await,
            vibration: self.sample_vibration(siren).await,
            door_open: self.sample_magnetic(siren, now).await,
        }
    }

    async fn sample_motion(&mut self, now: Instant) -> Option<bool> {
        if !self.flags.is_enabled(FeatureFlag::Motion) {
            return None;
        }
        if let Some(last) = self.last_motion
            && now.saturating_duration_since(last) < self.motion_interval
        {
            return None;
        }
        self.last_motion = Some(now);

        let motion = self.inputs.motion.is_high();
        debug!("{}", if motion { "Motion detected" } else { "Motion stopped" });
        let _ = self.guard.write(FeatureFlag::Motion, motion).await;
        Some(motion)
    }

    async fn sample_vibration(&mut self, siren: bool) -> Option<u16> {
        if !self.flags.is_enabled(FeatureFlag::Vibration) {
            return None;
        }

        let amplitude = self.inputs.vibration.read();
        let hit = amplitude >= self.vibration_threshold;
        if hit {
            info!(amplitude, "Vibration hit");
        } else {
            debug!(amplitude, "Vibration amplitude");
        }

        if siren {
            self.inputs.alarm.set(amplitude >= self.arming_threshold);
        }
        let _ = self.guard.write(FeatureFlag::Vibration, hit).await;
        Some(amplitude)
    }

    async fn sample_magnetic(&mut self, siren: bool, now: Instant) -> Option<bool> {
        if !self.flags.is_enabled(FeatureFlag::Magnetic) || self.grants.any_active(now) {
            return None;
        }

        let open = self.inputs.magnetic.is_high();
        if open {
            info!("Door is open");
        } else {
            debug!("Door is closed");
        }

        if siren {
            self.inputs.alarm.set(open);
        }
        let _ = self.guard.write(FeatureFlag::Magnetic, open).await;
        Some(open)
    }

    /// Current buzzer level.
    pub fn alarm_on(&self) -> bool {
        self.inputs.alarm.is_on()
    }
}

impl<C> std::fmt::Debug for SensorMonitor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorMonitor")
            .field("vibration_threshold", &self.vibration_threshold)
            .field("arming_threshold", &self.arming_threshold)
            .field("motion_interval", &self.motion_interval)
            .field("last_motion", &self.last_motion)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use vigil_core::{AccessSource, SyncValue};
    use vigil_hardware::mock::{
        MockAlarm, MockAlarmHandle, MockAnalogInput, MockAnalogInputHandle, MockDigitalInput,
        MockDigitalInputHandle,
    };
    use vigil_sync::{LinkState, MockRemoteStore, MockRemoteStoreHandle};

    struct Rig {
        monitor: SensorMonitor<MockRemoteStore>,
        remote: MockRemoteStoreHandle,
        grants: Arc<GrantBoard>,
        motion: MockDigitalInputHandle,
        vibration: MockAnalogInputHandle,
        door: MockDigitalInputHandle,
        alarm: MockAlarmHandle,
    }

    fn rig_with(flags: FeatureFlags) -> Rig {
        let config = ControllerConfig::default();
        let (store, remote) = MockRemoteStore::new();
        let guard = Arc::new(SyncGuard::new(store, Arc::new(LinkState::new(true))));
        let grants = Arc::new(GrantBoard::new(config.timing.grant_timeout()));

        let (motion_pin, motion) = MockDigitalInput::new(false);
        let (vibration_pin, vibration) = MockAnalogInput::new(0);
        let (door_pin, door) = MockDigitalInput::new(false);
        let (alarm_pin, alarm) = MockAlarm::new();

        let monitor = SensorMonitor::new(
            &config,
            guard,
            Arc::new(flags),
            Arc::clone(&grants),
            SensorInputs {
                motion: Box::new(motion_pin),
                vibration: Box::new(vibration_pin),
                magnetic: Box::new(door_pin),
                alarm: Box::new(alarm_pin),
            },
        );

        Rig {
            monitor,
            remote,
            grants,
            motion,
            vibration,
            door,
            alarm,
        }
    }

    fn rig() -> Rig {
        rig_with(FeatureFlags::new())
    }

    #[tokio::test]
    async fn test_first_pass_reports_every_sensor() {
        let mut rig = rig();
        rig.motion.set_high(true);
        rig.vibration.set(100);

        let report = rig.monitor.sample(Instant::now()).await;
        assert_eq!(
            report,
            SensorReport {
                motion: Some(true),
                vibration: Some(100),
                door_open: Some(false),
            }
        );

        let signals: Vec<_> = rig.remote.writes().iter().map(|w| w.signal).collect();
        assert_eq!(
            signals,
            vec![FeatureFlag::Motion, FeatureFlag::Vibration, FeatureFlag::Magnetic]
        );
    }

    #[tokio::test]
    async fn test_motion_sampled_at_its_own_cadence() {
        let mut rig = rig();
        let t0 = Instant::now();

        assert_eq!(rig.monitor.sample(t0).await.motion, Some(false));
        assert_eq!(
            rig.monitor.sample(t0 + Duration::from_millis(50)).await.motion,
            None
        );
        assert_eq!(
            rig.monitor.sample(t0 + Duration::from_millis(200)).await.motion,
            None
        );
        assert_eq!(
            rig.monitor.sample(t0 + Duration::from_millis(250)).await.motion,
            Some(false)
        );
        assert_eq!(rig.remote.writes_for(FeatureFlag::Motion).len(), 2);
    }

    #[rstest]
    #[case(0, false, false)]
    #[case(3_499, false, false)]
    #[case(3_500, false, true)]
    #[case(3_999, false, true)]
    #[case(4_000, true, true)]
    #[case(4_095, true, true)]
    #[tokio::test]
    async fn test_vibration_thresholds(
        #[case] amplitude: u16,
        #[case] hit: bool,
        #[case] buzzer: bool,
    ) {
        let mut rig = rig_with(FeatureFlags::new().with(FeatureFlag::Magnetic, false));
        rig.vibration.set(amplitude);

        rig.monitor.sample(Instant::now()).await;

        assert_eq!(
            rig.remote.writes_for(FeatureFlag::Vibration),
            vec![SyncValue::from(hit)]
        );
        assert_eq!(rig.alarm.is_on(), buzzer);
    }

    #[tokio::test]
    async fn test_siren_disabled_leaves_buzzer_off() {
        let mut rig = rig_with(FeatureFlags::new().with(FeatureFlag::Alarm, false));
        rig.vibration.set(4_095);
        rig.door.set_high(true);

        let report = rig.monitor.sample(Instant::now()).await;
        assert_eq!(report.door_open, Some(true));
        assert!(!rig.alarm.is_on());
        assert_eq!(
            rig.remote.writes_for(FeatureFlag::Vibration),
            vec![SyncValue::Int(1)]
        );
    }

    #[tokio::test]
    async fn test_open_door_sounds_buzzer() {
        let mut rig = rig_with(FeatureFlags::new().with(FeatureFlag::Vibration, false));
        let t0 = Instant::now();

        rig.door.set_high(true);
        rig.monitor.sample(t0).await;
        assert!(rig.alarm.is_on());
        assert!(rig.monitor.alarm_on());

        rig.door.set_high(false);
        rig.monitor.sample(t0 + Duration::from_millis(50)).await;
        assert!(!rig.alarm.is_on());

        assert_eq!(
            rig.remote.writes_for(FeatureFlag::Magnetic),
            vec![SyncValue::Int(1), SyncValue::Int(0)]
        );
    }

    #[tokio::test]
    async fn test_magnetic_suppressed_while_granted() {
        let mut rig = rig_with(FeatureFlags::new().with(FeatureFlag::Vibration, false));
        let t0 = Instant::now();
        rig.grants.grant(AccessSource::Keypad, t0);
        rig.door.set_high(true);

        let report = rig.monitor.sample(t0 + Duration::from_secs(1)).await;
        assert_eq!(report.door_open, None);
        assert!(!rig.alarm.is_on());
        assert!(rig.remote.writes_for(FeatureFlag::Magnetic).is_empty());

        // Grant timed out: the open door is reported again.
        let report = rig.monitor.sample(t0 + Duration::from_secs(5)).await;
        assert_eq!(report.door_open, Some(true));
        assert!(rig.alarm.is_on());
    }

    #[tokio::test]
    async fn test_disabled_sensors_not_read() {
        let flags = FeatureFlags::new()
            .with(FeatureFlag::Motion, false)
            .with(FeatureFlag::Vibration, false)
            .with(FeatureFlag::Magnetic, false);
        let mut rig = rig_with(flags);

        let report = rig.monitor.sample(Instant::now()).await;
        assert_eq!(report, SensorReport::default());
        assert!(rig.remote.writes().is_empty());
    }
}
