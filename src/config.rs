//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! The configuration file carries everything the controller consumes at
//! startup: the two arm endpoints, numeric tunables, the control binding
//! table, the reset-pose table and the audio clip paths. All of it is loaded
//! once and treated as read-only afterwards; a malformed or missing required
//! key is a startup-fatal error, never a per-tick one.

use serde::Deserialize;
use serde::de::Error;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, TeleopError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub arms: ArmsConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    pub controls: HashMap<String, RawBinding>,
    pub reset_poses: ResetPosesConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Arm endpoint configuration (one IP-addressed controller per arm)
#[derive(Debug, Deserialize, Clone)]
pub struct ArmsConfig {
    pub left_ip: String,
    pub right_ip: String,

    #[serde(default = "default_arm_port")]
    pub port: u16,

    #[serde(default = "default_gripper_id")]
    pub left_gripper_id: u8,

    #[serde(default = "default_gripper_id")]
    pub right_gripper_id: u8,
}

/// Numeric tunables for speeds, thresholds and timing
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    #[serde(default = "default_xy_speed")]
    pub initial_xy_speed: f64,

    #[serde(default = "default_z_speed")]
    pub initial_z_speed: f64,

    #[serde(default = "default_rpy_speed")]
    pub rpy_speed: f64,

    #[serde(default = "default_speed_increment")]
    pub speed_increment: f64,

    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    #[serde(default = "default_long_press_duration")]
    pub long_press_duration: f64,

    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: f32,

    #[serde(default = "default_gripper_speed")]
    pub gripper_speed: u32,

    #[serde(default = "default_gripper_force")]
    pub gripper_force: u32,

    #[serde(default = "default_reset_speed")]
    pub reset_speed: f64,

    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            initial_xy_speed: default_xy_speed(),
            initial_z_speed: default_z_speed(),
            rpy_speed: default_rpy_speed(),
            speed_increment: default_speed_increment(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            long_press_duration: default_long_press_duration(),
            trigger_threshold: default_trigger_threshold(),
            gripper_speed: default_gripper_speed(),
            gripper_force: default_gripper_force(),
            reset_speed: default_reset_speed(),
            tick_rate_hz: default_tick_rate_hz(),
        }
    }
}

/// A control binding as written in the TOML file.
///
/// `kind` selects the physical input type; `axis` is only meaningful for
/// hats and `threshold` only for analog axes. Resolution into typed
/// descriptors (and the unknown-action / conflict checks) happens in
/// [`crate::input::bindings`].
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RawBinding {
    pub kind: String,
    pub index: usize,

    #[serde(default)]
    pub axis: Option<String>,

    #[serde(default = "default_direction")]
    pub direction: i8,

    #[serde(default)]
    pub threshold: Option<f32>,
}

/// Named reset orientations per arm, RPY triples in degrees
#[derive(Debug, Deserialize, Clone)]
pub struct ResetPosesConfig {
    pub left: HashMap<String, [f64; 3]>,
    pub right: HashMap<String, [f64; 3]>,
}

/// Audio clip paths keyed by cue name
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AudioConfig {
    #[serde(default)]
    pub clips: HashMap<String, String>,
}

// Default value functions
fn default_arm_port() -> u16 { 8055 }
fn default_gripper_id() -> u8 { 9 }

fn default_xy_speed() -> f64 { 40.0 }
fn default_z_speed() -> f64 { 30.0 }
fn default_rpy_speed() -> f64 { 20.0 }
fn default_speed_increment() -> f64 { 5.0 }
fn default_min_speed() -> f64 { 5.0 }
fn default_max_speed() -> f64 { 100.0 }
fn default_long_press_duration() -> f64 { 0.8 }
fn default_trigger_threshold() -> f32 { 0.1 }
fn default_gripper_speed() -> u32 { 150 }
fn default_gripper_force() -> u32 { 100 }
fn default_reset_speed() -> f64 { 50.0 }
fn default_tick_rate_hz() -> u32 { 30 }

fn default_direction() -> i8 { 1 }

fn config_err(msg: impl std::fmt::Display) -> TeleopError {
    TeleopError::Config(toml::de::Error::custom(msg.to_string()))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.fill_axis_thresholds();
        config.validate()?;
        Ok(config)
    }

    /// Axis bindings without an explicit threshold inherit the global
    /// trigger threshold, matching how the controls table is authored.
    fn fill_axis_thresholds(&mut self) {
        for binding in self.controls.values_mut() {
            if binding.kind == "axis" && binding.threshold.is_none() {
                binding.threshold = Some(self.settings.trigger_threshold);
            }
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.arms.left_ip.is_empty() || self.arms.right_ip.is_empty() {
            return Err(config_err("arm IP addresses cannot be empty"));
        }

        let s = &self.settings;

        if s.min_speed <= 0.0 || s.max_speed <= 0.0 || s.min_speed > s.max_speed {
            return Err(config_err("speed bounds must satisfy 0 < min_speed <= max_speed"));
        }

        for (name, value) in [
            ("initial_xy_speed", s.initial_xy_speed),
            ("initial_z_speed", s.initial_z_speed),
            ("rpy_speed", s.rpy_speed),
        ] {
            if value < s.min_speed || value > s.max_speed {
                return Err(config_err(format!(
                    "{} must be within [min_speed, max_speed] ({} to {})",
                    name, s.min_speed, s.max_speed
                )));
            }
        }

        if s.speed_increment <= 0.0 {
            return Err(config_err("speed_increment must be greater than 0"));
        }

        if s.long_press_duration <= 0.0 || s.long_press_duration > 10.0 {
            return Err(config_err("long_press_duration must be between 0 and 10 seconds"));
        }

        if s.trigger_threshold <= 0.0 || s.trigger_threshold > 1.0 {
            return Err(config_err("trigger_threshold must be in (0, 1]"));
        }

        if s.gripper_speed == 0 || s.gripper_force == 0 {
            return Err(config_err("gripper_speed and gripper_force must be greater than 0"));
        }

        if s.reset_speed < s.min_speed || s.reset_speed > s.max_speed {
            return Err(config_err("reset_speed must be within [min_speed, max_speed]"));
        }

        if s.tick_rate_hz == 0 || s.tick_rate_hz > 250 {
            return Err(config_err("tick_rate_hz must be between 1 and 250"));
        }

        for (action, binding) in &self.controls {
            binding.validate(action)?;
        }

        for (side, poses) in [("left", &self.reset_poses.left), ("right", &self.reset_poses.right)] {
            if poses.is_empty() {
                return Err(config_err(format!("reset_poses.{} cannot be empty", side)));
            }
        }

        Ok(())
    }
}

impl RawBinding {
    fn validate(&self, action: &str) -> Result<()> {
        match self.kind.as_str() {
            "button" => {}
            "axis" => {
                // fill_axis_thresholds has run by now, so a threshold is present
                let threshold = self.threshold.unwrap_or(0.0);
                if threshold <= 0.0 || threshold > 1.0 {
                    return Err(config_err(format!(
                        "binding '{}': axis threshold must be in (0, 1]",
                        action
                    )));
                }
            }
            "hat" => match self.axis.as_deref() {
                Some("x") | Some("y") => {}
                _ => {
                    return Err(config_err(format!(
                        "binding '{}': hat bindings need axis = \"x\" or \"y\"",
                        action
                    )))
                }
            },
            other => {
                return Err(config_err(format!(
                    "binding '{}': unknown kind '{}' (expected button, axis or hat)",
                    action, other
                )))
            }
        }

        if self.direction != 1 && self.direction != -1 {
            return Err(config_err(format!(
                "binding '{}': direction must be 1 or -1",
                action
            )));
        }

        Ok(())
    }
}
