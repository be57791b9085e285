//! # Gamepad Module
//!
//! Handles gamepad detection, connection, and input reading over the Linux
//! evdev interface, and folds raw events into an indexed [`DeviceSnapshot`].
//!
//! ## Detection
//!
//! Any device advertising the BTN_SOUTH (gamepad) key capability qualifies;
//! the first match in `/dev/input` order wins. The bindings in the config
//! file address inputs by index, so no vendor-specific handling is needed.
//!
//! ## Index Layout
//!
//! Buttons follow the common joystick ordering:
//!
//! | Index | evdev Code | Typical label |
//! |-------|------------|---------------|
//! | 0 | BTN_SOUTH | Cross / A |
//! | 1 | BTN_EAST | Circle / B |
//! | 2 | BTN_NORTH | Triangle / Y |
//! | 3 | BTN_WEST | Square / X |
//! | 4 | BTN_TL | L1 / LB |
//! | 5 | BTN_TR | R1 / RB |
//! | 6 | BTN_TL2 | L2 click |
//! | 7 | BTN_TR2 | R2 click |
//! | 8 | BTN_SELECT | Share / Back |
//! | 9 | BTN_START | Options / Start |
//! | 10 | BTN_MODE | PS / Guide |
//! | 11 | BTN_THUMBL | L3 |
//! | 12 | BTN_THUMBR | R3 |
//!
//! Axes: 0/1 left stick X/Y, 2/3 right stick X/Y (ABS_Z/ABS_RZ), 4/5 the
//! analog triggers (ABS_RX/ABS_RY). Sticks are normalized to [-1, 1] with
//! 0 at center; triggers rest at 0 and normalize to [0, 1]. Hat 0 is the
//! d-pad, reported as raw (-1/0/1) components.

use std::path::Path;

use evdev::{AbsoluteAxisType, Device, InputEvent, Key};
use tracing::{debug, info};

use crate::error::{Result, TeleopError};
use crate::input::snapshot::DeviceSnapshot;

/// Number of button indices tracked.
pub const BUTTON_COUNT: usize = 13;
/// Number of hats tracked.
pub const HAT_COUNT: usize = 1;
/// Number of axis indices tracked.
pub const AXIS_COUNT: usize = 6;

/// Raw axis value range for sticks and triggers.
const AXIS_MIN: i32 = 0;
/// Raw axis value range for sticks and triggers.
const AXIS_MAX: i32 = 255;
/// Raw stick center value.
const AXIS_CENTER: i32 = 128;

/// An open gamepad handle.
///
/// Wraps the evdev device and remembers the path it was opened from.
pub struct Gamepad {
    device: Device,
    device_path: String,
}

impl Gamepad {
    /// Detect and open the first available gamepad.
    ///
    /// Scans all `/dev/input/event*` devices and picks the first one that
    /// reports the BTN_SOUTH key capability.
    ///
    /// # Errors
    ///
    /// - `GamepadNotFound`: no gamepad present on the system
    /// - `Gamepad`: `/dev/input` missing or unreadable
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(TeleopError::Gamepad(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| TeleopError::Gamepad(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TeleopError::Gamepad(format!("Failed to read directory entry: {}", e)))?;

        // Sort entries for deterministic device selection when multiple gamepads are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            // Only check event* devices
            if let Some(filename) = path.file_name() {
                if !filename.to_string_lossy().starts_with("event") {
                    continue;
                }
            } else {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    let is_gamepad = device
                        .supported_keys()
                        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));

                    debug!(
                        "Found input device: {} (gamepad: {})",
                        path.display(),
                        is_gamepad
                    );

                    if is_gamepad {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found gamepad '{}' at: {}",
                            device.name().unwrap_or("unknown"),
                            device_path
                        );

                        return Ok(Gamepad {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TeleopError::GamepadNotFound)
    }

    /// The `/dev/input/eventX` path this gamepad was opened from.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name from evdev.
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Fetch pending input events from the gamepad.
    ///
    /// # Errors
    ///
    /// Returns `Gamepad` error if fetching fails, typically because the
    /// device disconnected.
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| TeleopError::Gamepad(format!("Failed to fetch events: {}", e)))
    }
}

/// Folds raw evdev events into an indexed snapshot.
///
/// Events only carry changes, so the accumulator keeps the last known value
/// of every input between polls. Not thread-safe; use from a single task.
#[derive(Debug)]
pub struct SnapshotAccumulator {
    snapshot: DeviceSnapshot,
}

impl Default for SnapshotAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: DeviceSnapshot::with_capacity(BUTTON_COUNT, HAT_COUNT, AXIS_COUNT),
        }
    }

    /// The current accumulated snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }

    /// Drops all state back to released/centered, as after a disconnect.
    pub fn clear(&mut self) {
        self.snapshot.clear();
    }

    /// Processes a single evdev event.
    ///
    /// Handles key events (buttons) and absolute axis events (sticks,
    /// triggers, d-pad). Sync and other event types are ignored.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            evdev::InputEventKind::Key(key) => {
                self.process_key_event(key, event.value() != 0);
            }
            evdev::InputEventKind::AbsAxis(axis) => {
                self.process_axis_event(axis, event.value());
            }
            _ => {
                // Ignore sync events and other event types
            }
        }
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        let index = match key {
            Key::BTN_SOUTH => 0,
            Key::BTN_EAST => 1,
            Key::BTN_NORTH => 2,
            Key::BTN_WEST => 3,
            Key::BTN_TL => 4,
            Key::BTN_TR => 5,
            Key::BTN_TL2 => 6,
            Key::BTN_TR2 => 7,
            Key::BTN_SELECT => 8,
            Key::BTN_START => 9,
            Key::BTN_MODE => 10,
            Key::BTN_THUMBL => 11,
            Key::BTN_THUMBR => 12,
            _ => return,
        };
        self.snapshot.buttons[index] = pressed;
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        match axis {
            // Sticks
            AbsoluteAxisType::ABS_X => self.snapshot.axes[0] = normalize_stick(value),
            AbsoluteAxisType::ABS_Y => self.snapshot.axes[1] = normalize_stick(value),
            AbsoluteAxisType::ABS_Z => self.snapshot.axes[2] = normalize_stick(value),
            AbsoluteAxisType::ABS_RZ => self.snapshot.axes[3] = normalize_stick(value),

            // Analog triggers rest at 0
            AbsoluteAxisType::ABS_RX => self.snapshot.axes[4] = normalize_trigger(value),
            AbsoluteAxisType::ABS_RY => self.snapshot.axes[5] = normalize_trigger(value),

            // D-Pad components arrive raw as -1/0/1
            AbsoluteAxisType::ABS_HAT0X => {
                self.snapshot.hats[0].0 = clamp_hat(value);
            }
            AbsoluteAxisType::ABS_HAT0Y => {
                self.snapshot.hats[0].1 = clamp_hat(value);
            }

            _ => {
                // Ignore other axes (gyro, accelerometer, etc.)
            }
        }
    }
}

/// Maps a raw stick value (0-255, 128 center) to [-1, 1].
fn normalize_stick(value: i32) -> f32 {
    let clamped = value.clamp(AXIS_MIN, AXIS_MAX);
    ((clamped - AXIS_CENTER) as f32 / 127.0).clamp(-1.0, 1.0)
}

/// Maps a raw trigger value (0-255, resting at 0) to [0, 1].
fn normalize_trigger(value: i32) -> f32 {
    value.clamp(AXIS_MIN, AXIS_MAX) as f32 / AXIS_MAX as f32
}

fn clamp_hat(value: i32) -> i8 {
    value.clamp(-1, 1) as i8
}
