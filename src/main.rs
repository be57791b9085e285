//! # Teleop Bridge
//!
//! Drive a dual-arm robot with a standard gamepad.
//!
//! This application maps gamepad inputs to jog, gripper, reset and
//! recording commands for two IP-addressed robot arms, with voice cues
//! confirming every operator action.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use tracing_subscriber;

mod audio;
mod config;
mod control;
mod driver;
mod error;
mod input;

use audio::RodioSink;
use config::Config;
use control::{Controller, LogVisionSystem};
use driver::TcpArmDriver;
use input::snapshot::DeviceSnapshot;
use input::{Gamepad, SnapshotAccumulator};

/// Config file used when no path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Interval between reopen attempts after the gamepad drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Main entry point for the teleop bridge.
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load and validate the config file
///    - Open the gamepad and connect to both arm controllers
///    - Spawn the audio playback thread and the input reader thread
///
/// 2. **Main Loop**
///    - Run one control tick per interval (default 30Hz): normalize the
///      latest gamepad snapshot, dispatch actions in the active mode,
///      issue the tick's jog commands
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop all arm motion
///    - Clean exit
///
/// # Errors
///
/// Returns error if:
/// - The config file is missing or invalid
/// - No gamepad is connected
/// - An arm controller cannot be reached
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Teleop Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;
    info!("Loaded config from {}", config_path);

    let gamepad = Gamepad::open()?;
    info!(
        "Using gamepad '{}' at {}",
        gamepad.name().unwrap_or("unknown"),
        gamepad.device_path()
    );

    let left = Arc::new(
        TcpArmDriver::connect("left", &config.arms.left_ip, config.arms.port).await?,
    );
    let right = Arc::new(
        TcpArmDriver::connect("right", &config.arms.right_ip, config.arms.port).await?,
    );

    let audio = Arc::new(RodioSink::new(&config.audio)?);

    let mut controller = Controller::new(
        &config,
        left,
        right,
        audio,
        Arc::new(LogVisionSystem),
    )?;

    let snapshots = spawn_input_reader(gamepad)?;

    let period = Duration::from_millis(u64::from(1000 / config.settings.tick_rate_hz.max(1)));
    let mut tick_interval = interval(period);

    controller.announce_ready();
    info!(
        "Starting control loop at {}Hz in {} mode",
        config.settings.tick_rate_hz,
        controller.mode().name()
    );
    info!("Press Ctrl+C to exit");

    // Main control loop
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let snapshot = snapshots.borrow().clone();
                controller.tick(&snapshot, period).await;
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                controller.stop_all().await;
                break;
            }
        }
    }

    Ok(())
}

/// Spawns the blocking evdev reader thread.
///
/// `fetch_events` blocks until events arrive, so it lives on its own
/// thread and publishes the accumulated snapshot over a watch channel. On
/// a device error (typically a disconnect) the thread publishes an empty
/// snapshot, releasing every binding, then rescans until the gamepad
/// reappears and resumes reading.
fn spawn_input_reader(mut gamepad: Gamepad) -> Result<watch::Receiver<DeviceSnapshot>> {
    let mut accumulator = SnapshotAccumulator::new();
    let (sender, receiver) = watch::channel(accumulator.snapshot().clone());

    std::thread::Builder::new()
        .name("gamepad".to_string())
        .spawn(move || loop {
            // The reassignment lives outside the match because the event
            // iterator borrows `gamepad` for the whole match expression.
            let read_failed = match gamepad.fetch_events() {
                Ok(events) => {
                    for event in events {
                        accumulator.process_event(&event);
                    }
                    if sender.send(accumulator.snapshot().clone()).is_err() {
                        // Main loop is gone
                        return;
                    }
                    false
                }
                Err(e) => {
                    warn!("Gamepad read failed, releasing all inputs: {}", e);
                    accumulator.clear();
                    if sender.send(accumulator.snapshot().clone()).is_err() {
                        return;
                    }
                    true
                }
            };
            if read_failed {
                gamepad = match reopen_gamepad(&sender) {
                    Some(gamepad) => gamepad,
                    None => return,
                };
            }
        })?;

    Ok(receiver)
}

/// Retries the device scan until the gamepad reappears.
///
/// Returns `None` once the main loop has dropped the receiver, so the
/// reader thread does not outlive shutdown.
fn reopen_gamepad(sender: &watch::Sender<DeviceSnapshot>) -> Option<Gamepad> {
    loop {
        if sender.is_closed() {
            return None;
        }
        match Gamepad::open() {
            Ok(gamepad) => {
                info!(
                    "Gamepad '{}' reconnected at {}",
                    gamepad.name().unwrap_or("unknown"),
                    gamepad.device_path()
                );
                return Some(gamepad);
            }
            Err(e) => {
                debug!("Gamepad reopen failed, retrying: {}", e);
                std::thread::sleep(RECONNECT_DELAY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_tick_period_at_default_rate() {
        // 30Hz gives a 33ms period
        let period_ms = 1000 / 30;
        assert_eq!(period_ms, 33);
    }

    #[test]
    fn test_reopen_stops_once_receiver_is_gone() {
        let (sender, receiver) = watch::channel(DeviceSnapshot::default());
        drop(receiver);

        // With no receiver left the retry loop must bail out instead of
        // scanning for a device forever.
        assert!(reopen_gamepad(&sender).is_none());
    }
}
