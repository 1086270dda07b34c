//! Vigil - enclosure access-control controller
//!
//! Runs the controller against mock devices and an in-memory remote store,
//! driven by operator commands on stdin. Type `help` for the command list.

mod command;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vigil_controller::{Controller, InputDevices, LcdDisplay, LcdView, SensorInputs};
use vigil_core::{ControllerConfig, VERSION};
use vigil_hardware::mock::*;
use vigil_sync::{LinkState, MockRemoteStore, MockRemoteStoreHandle};

use crate::command::{Command, HELP};

#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version = VERSION)]
#[command(about = "Enclosure access-control controller with simulated devices")]
struct Args {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with the network link down
    #[arg(long)]
    offline: bool,

    /// Increase log verbosity (-v debug, -vv trace). Ignored when RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Operator side of every simulated device.
struct Bench {
    keys: MockKeypadHandle,
    cards: MockRfidHandle,
    motion: MockDigitalInputHandle,
    vibration: MockAnalogInputHandle,
    door: MockDigitalInputHandle,
    alarm: MockAlarmHandle,
    remote: MockRemoteStoreHandle,
    link: LinkState,
    lcd: LcdView,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ControllerConfig::default(),
    };
    info!("Vigil v{}", VERSION);

    let (keypad, keys) = MockKeypad::new();
    let (rfid, cards) = MockRfid::new();
    let (chime, _chime) = MockChime::new();
    let (motion_pin, motion) = MockDigitalInput::new(false);
    let (vibration_pin, vibration) = MockAnalogInput::new(0);
    let (door_pin, door) = MockDigitalInput::new(false);
    let (alarm_pin, alarm) = MockAlarm::new();
    let (store, remote) = MockRemoteStore::with_table(config.remote.table.clone());
    let lcd = LcdDisplay::new();
    let link = LinkState::new(!args.offline);

    let bench = Bench {
        keys,
        cards,
        motion,
        vibration,
        door,
        alarm,
        remote,
        link: link.clone(),
        lcd: lcd.view(),
    };

    let handle = Controller::new(
        config,
        store,
        Arc::new(link),
        InputDevices {
            keypad: Box::new(keypad),
            rfid: Box::new(rfid),
            display: Box::new(lcd),
            chime: Box::new(chime),
        },
        SensorInputs {
            motion: Box::new(motion_pin),
            vibration: Box::new(vibration_pin),
            magnetic: Box::new(door_pin),
            alarm: Box::new(alarm_pin),
        },
    )
    .start();

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(Command::Status) => print_status(&bench, &handle),
            Ok(command) => {
                if let Err(e) = apply(&bench, command).await {
                    warn!("{:#}", e);
                }
            }
            Err(e) => println!("{e:#}"),
        }
    }

    info!("Shutting down");
    handle.shutdown().await;
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn apply(bench: &Bench, command: Command) -> Result<()> {
    match command {
        Command::Keys(keys) => bench.keys.send_keys(&keys).await?,
        Command::Card(uid) => bench.cards.present_card(uid).await?,
        Command::Door { open } => bench.door.set_high(open),
        Command::Motion(on) => bench.motion.set_high(on),
        Command::Vibration(amplitude) => bench.vibration.set(amplitude),
        Command::Remote { feature, enabled } => bench.remote.set_enabled(feature, enabled),
        Command::Wifi { up } => {
            bench.link.set_up(up);
        }
        Command::Help => println!("{HELP}"),
        Command::Status | Command::Quit => {}
    }
    Ok(())
}

fn print_status(bench: &Bench, handle: &vigil_controller::ControllerHandle<MockRemoteStore>) {
    println!("{}", bench.lcd.render());

    let flags: Vec<String> = handle
        .flags()
        .snapshot()
        .iter()
        .map(|(flag, on)| format!("{}={}", flag, if *on { "on" } else { "off" }))
        .collect();
    println!("flags: {}", flags.join(" "));

    let stats = handle.sync_stats();
    println!(
        "buzzer: {}  sync: {} completed, {} skipped, {} failed",
        if bench.alarm.is_on() { "ON" } else { "off" },
        stats.completed,
        stats.skipped,
        stats.failed
    );
}
