//! # Binding Table Module
//!
//! Maps logical action names from the configuration file to physical input
//! descriptors, and resolves them once at load time into a typed table.
//!
//! ## Action Vocabulary
//!
//! | Config key | Action |
//! |------------|--------|
//! | `mode_switch_button` | cycle the control mode |
//! | `speed_increase_alt` / `speed_decrease` | speed ramp up/down |
//! | `gripper_toggle_left` / `gripper_toggle_right` | gripper toggle |
//! | `xyz_<side>_arm_<x\|y\|z>_<pos\|neg>` | Cartesian jog |
//! | `rpy_<side>_arm_<roll\|pitch\|yaw>_<pos\|neg>` | orientation jog |
//! | `reset_<side>_arm[_<pose>_rpy]` | move to a named reset pose |
//! | `vision_start_record` / `vision_stop_record_confirm` / `vision_cancel_record` | vision recording |
//!
//! The same physical input may serve different actions in different modes
//! (the hat axes are reused between XYZ and RPY with sign flips); two actions
//! on the same physical input whose modes can be active at the same time are
//! rejected at load time. An unknown action name or malformed descriptor is
//! also a load error — the table never fails at runtime.

use std::collections::HashMap;
use std::fmt;

use crate::config::RawBinding;
use crate::control::mode::ControlMode;
use crate::error::{Result, TeleopError};
use crate::input::snapshot::DeviceSnapshot;

/// Which arm an action addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmSide {
    Left,
    Right,
}

impl ArmSide {
    /// Lowercase name as used in config keys and log lines.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ArmSide::Left => "left",
            ArmSide::Right => "right",
        }
    }
}

impl fmt::Display for ArmSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Jog axis within a mode: X/Y/Z are Cartesian, Roll/Pitch/Yaw orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JogAxis {
    X,
    Y,
    Z,
    Roll,
    Pitch,
    Yaw,
}

/// Named reset orientation, keying into the reset-pose table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseName {
    Default,
    Forward,
    Backward,
    ToLeft,
    ToRight,
    Up,
    Down,
}

impl PoseName {
    /// Parses the lowercase pose name used in config keys and tables.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(PoseName::Default),
            "forward" => Some(PoseName::Forward),
            "backward" => Some(PoseName::Backward),
            "to_left" => Some(PoseName::ToLeft),
            "to_right" => Some(PoseName::ToRight),
            "up" => Some(PoseName::Up),
            "down" => Some(PoseName::Down),
            _ => None,
        }
    }

    /// Lowercase name as used in the reset-pose table.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PoseName::Default => "default",
            PoseName::Forward => "forward",
            PoseName::Backward => "backward",
            PoseName::ToLeft => "to_left",
            PoseName::ToRight => "to_right",
            PoseName::Up => "up",
            PoseName::Down => "down",
        }
    }
}

/// The shared vocabulary between the input normalizer and its consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalAction {
    /// Cycle the control mode (rising edge only).
    ModeSwitch,
    /// Raise the speed scalars one increment.
    SpeedIncrease,
    /// Lower the speed scalars one increment.
    SpeedDecrease,
    /// Flip the gripper on one arm between open and closed.
    GripperToggle(ArmSide),
    /// Jog one axis of one arm; `sign` is +1 or -1.
    Jog {
        side: ArmSide,
        axis: JogAxis,
        sign: i8,
    },
    /// Move one arm to a named reset pose (RESET mode only).
    Reset { side: ArmSide, pose: PoseName },
    /// Start a vision recording (VISION mode only).
    VisionStartRecord,
    /// Stop the recording and confirm it for processing (VISION mode only).
    VisionStopRecordConfirm,
    /// Cancel the recording (VISION mode only).
    VisionCancelRecord,
}

impl LogicalAction {
    /// The modes in which this action is dispatched.
    ///
    /// Shared actions (gripper, speed) run in every mode except VISION,
    /// where movement and speed controls are suppressed in favor of the
    /// recording actions. The mode switch itself is live everywhere.
    #[must_use]
    pub fn live_modes(&self) -> &'static [ControlMode] {
        const ALL: &[ControlMode] = &[
            ControlMode::Xyz,
            ControlMode::Rpy,
            ControlMode::Vision,
            ControlMode::Reset,
        ];
        const SHARED: &[ControlMode] =
            &[ControlMode::Xyz, ControlMode::Rpy, ControlMode::Reset];
        const XYZ: &[ControlMode] = &[ControlMode::Xyz];
        const RPY: &[ControlMode] = &[ControlMode::Rpy];
        const VISION: &[ControlMode] = &[ControlMode::Vision];
        const RESET: &[ControlMode] = &[ControlMode::Reset];

        match self {
            LogicalAction::ModeSwitch => ALL,
            LogicalAction::SpeedIncrease
            | LogicalAction::SpeedDecrease
            | LogicalAction::GripperToggle(_) => SHARED,
            LogicalAction::Jog { axis, .. } => match axis {
                JogAxis::X | JogAxis::Y | JogAxis::Z => XYZ,
                JogAxis::Roll | JogAxis::Pitch | JogAxis::Yaw => RPY,
            },
            LogicalAction::Reset { .. } => RESET,
            LogicalAction::VisionStartRecord
            | LogicalAction::VisionStopRecordConfirm
            | LogicalAction::VisionCancelRecord => VISION,
        }
    }

    /// Whether this action is dispatched while `mode` is active.
    #[must_use]
    pub fn live_in(&self, mode: ControlMode) -> bool {
        self.live_modes().contains(&mode)
    }

    /// Parse a config key into an action; `None` for unknown names.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "mode_switch_button" => return Some(LogicalAction::ModeSwitch),
            "speed_increase_alt" => return Some(LogicalAction::SpeedIncrease),
            "speed_decrease" => return Some(LogicalAction::SpeedDecrease),
            "gripper_toggle_left" => return Some(LogicalAction::GripperToggle(ArmSide::Left)),
            "gripper_toggle_right" => return Some(LogicalAction::GripperToggle(ArmSide::Right)),
            "vision_start_record" => return Some(LogicalAction::VisionStartRecord),
            "vision_stop_record_confirm" => return Some(LogicalAction::VisionStopRecordConfirm),
            "vision_cancel_record" => return Some(LogicalAction::VisionCancelRecord),
            _ => {}
        }

        if let Some(rest) = name.strip_prefix("xyz_") {
            return Self::parse_jog(rest, &[("x", JogAxis::X), ("y", JogAxis::Y), ("z", JogAxis::Z)]);
        }
        if let Some(rest) = name.strip_prefix("rpy_") {
            return Self::parse_jog(
                rest,
                &[
                    ("roll", JogAxis::Roll),
                    ("pitch", JogAxis::Pitch),
                    ("yaw", JogAxis::Yaw),
                ],
            );
        }
        if let Some(rest) = name.strip_prefix("reset_") {
            return Self::parse_reset(rest);
        }

        None
    }

    /// Parses `<side>_arm_<axis>_<pos|neg>` with the given axis names.
    fn parse_jog(rest: &str, axes: &[(&str, JogAxis)]) -> Option<Self> {
        let (side, rest) = Self::parse_side(rest)?;
        let rest = rest.strip_prefix("arm_")?;

        let (axis_name, sign_name) = rest.rsplit_once('_')?;
        let sign = match sign_name {
            "pos" => 1,
            "neg" => -1,
            _ => return None,
        };
        let axis = axes
            .iter()
            .find(|(name, _)| *name == axis_name)
            .map(|(_, axis)| *axis)?;

        Some(LogicalAction::Jog { side, axis, sign })
    }

    /// Parses `<side>_arm` (default pose) or `<side>_arm_<pose>_rpy`.
    fn parse_reset(rest: &str) -> Option<Self> {
        let (side, rest) = Self::parse_side(rest)?;

        if rest == "arm" {
            return Some(LogicalAction::Reset {
                side,
                pose: PoseName::Default,
            });
        }

        let rest = rest.strip_prefix("arm_")?;
        let pose_name = rest.strip_suffix("_rpy")?;
        let pose = PoseName::parse(pose_name)?;

        Some(LogicalAction::Reset { side, pose })
    }

    fn parse_side(rest: &str) -> Option<(ArmSide, &str)> {
        if let Some(rest) = rest.strip_prefix("left_") {
            Some((ArmSide::Left, rest))
        } else {
            rest.strip_prefix("right_").map(|rest| (ArmSide::Right, rest))
        }
    }
}

/// Hat axis component a binding reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HatAxis {
    X,
    Y,
}

/// Physical input type of a binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindingKind {
    /// A digital button, active while pressed.
    Button,
    /// An analog axis, active while `direction * value > threshold`.
    Axis { threshold: f32 },
    /// One component of a hat, active while it equals `direction`.
    Hat { axis: HatAxis },
}

/// A resolved physical input descriptor. Immutable after load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindingDescriptor {
    pub kind: BindingKind,
    pub index: usize,
    /// +1 or -1; the activating direction for axes and hats.
    pub direction: i8,
}

impl BindingDescriptor {
    /// Whether this binding is active in the given snapshot.
    ///
    /// A value exactly at an axis threshold is inactive; out-of-range
    /// indices read as released/centered and are therefore inactive too.
    #[must_use]
    pub fn is_active(&self, snapshot: &DeviceSnapshot) -> bool {
        match self.kind {
            BindingKind::Button => snapshot.button(self.index),
            BindingKind::Axis { threshold } => {
                f32::from(self.direction) * snapshot.axis(self.index) > threshold
            }
            BindingKind::Hat { axis } => {
                let (x, y) = snapshot.hat(self.index);
                let component = match axis {
                    HatAxis::X => x,
                    HatAxis::Y => y,
                };
                component == self.direction
            }
        }
    }

    /// Jog magnitude while active: 1.0 for buttons and hats, the absolute
    /// axis deflection for analog axes. Zero when inactive.
    #[must_use]
    pub fn magnitude(&self, snapshot: &DeviceSnapshot) -> f32 {
        if !self.is_active(snapshot) {
            return 0.0;
        }
        match self.kind {
            BindingKind::Button | BindingKind::Hat { .. } => 1.0,
            BindingKind::Axis { .. } => snapshot.axis(self.index).abs().min(1.0),
        }
    }

    /// Identity of the physical input this binding reads, used for
    /// same-mode conflict detection. Axis thresholds are not part of the
    /// identity: two thresholds on the same axis direction still collide.
    fn physical_id(&self) -> (u8, usize, i8, u8) {
        let (kind_tag, hat_axis_tag) = match self.kind {
            BindingKind::Button => (0, 0),
            BindingKind::Axis { .. } => (1, 0),
            BindingKind::Hat { axis: HatAxis::X } => (2, 0),
            BindingKind::Hat { axis: HatAxis::Y } => (2, 1),
        };
        (kind_tag, self.index, self.direction, hat_axis_tag)
    }
}

impl TryFrom<&RawBinding> for BindingDescriptor {
    type Error = TeleopError;

    fn try_from(raw: &RawBinding) -> Result<Self> {
        let kind = match raw.kind.as_str() {
            "button" => BindingKind::Button,
            "axis" => BindingKind::Axis {
                threshold: raw.threshold.unwrap_or(0.1),
            },
            "hat" => BindingKind::Hat {
                axis: match raw.axis.as_deref() {
                    Some("x") => HatAxis::X,
                    Some("y") => HatAxis::Y,
                    other => {
                        return Err(TeleopError::Binding(format!(
                            "hat binding needs axis \"x\" or \"y\", got {:?}",
                            other
                        )))
                    }
                },
            },
            other => {
                return Err(TeleopError::Binding(format!("unknown binding kind '{}'", other)))
            }
        };

        Ok(BindingDescriptor {
            kind,
            index: raw.index,
            direction: raw.direction,
        })
    }
}

/// The resolved binding table: one descriptor per logical action.
#[derive(Debug, Clone)]
pub struct BindingTable {
    entries: Vec<(LogicalAction, BindingDescriptor)>,
}

impl BindingTable {
    /// Resolves the raw config controls into a typed table.
    ///
    /// # Errors
    ///
    /// - Unknown action name
    /// - Malformed descriptor
    /// - Two actions on the same physical input whose modes overlap
    pub fn from_config(controls: &HashMap<String, RawBinding>) -> Result<Self> {
        let mut entries = Vec::with_capacity(controls.len());

        // Deterministic resolution order keeps error messages stable.
        let mut names: Vec<&String> = controls.keys().collect();
        names.sort();

        for name in names {
            let action = LogicalAction::parse(name).ok_or_else(|| {
                TeleopError::Binding(format!("unknown action '{}' in controls table", name))
            })?;
            let descriptor = BindingDescriptor::try_from(&controls[name])
                .map_err(|e| TeleopError::Binding(format!("action '{}': {}", name, e)))?;
            entries.push((action, descriptor));
        }

        Self::check_conflicts(&entries)?;

        Ok(Self { entries })
    }

    /// Rejects two actions reading the same physical input in modes that
    /// can be active at the same time. Cross-mode reuse is allowed: XYZ and
    /// RPY may share a hat axis because only one of them is ever live.
    fn check_conflicts(entries: &[(LogicalAction, BindingDescriptor)]) -> Result<()> {
        for (i, (action_a, desc_a)) in entries.iter().enumerate() {
            for (action_b, desc_b) in &entries[i + 1..] {
                if desc_a.physical_id() != desc_b.physical_id() {
                    continue;
                }
                let overlap = action_a
                    .live_modes()
                    .iter()
                    .any(|mode| action_b.live_in(*mode));
                if overlap {
                    return Err(TeleopError::Binding(format!(
                        "{:?} and {:?} map the same physical input in the same mode",
                        action_a, action_b
                    )));
                }
            }
        }
        Ok(())
    }

    /// All resolved (action, descriptor) pairs.
    #[must_use]
    pub fn entries(&self) -> &[(LogicalAction, BindingDescriptor)] {
        &self.entries
    }

    /// Number of bound actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
