//! # Gripper Manager Module
//!
//! Tracks each arm's gripper as Open, Closed, or Inactive and turns toggle
//! presses into `set_gripper` commands. The actual driver call is
//! dispatched by the control loop as a fire-and-forget task; this module
//! only decides what should happen and which cue announces it.
//!
//! Inactive is a latched fault state: a failed gripper command marks the
//! side Inactive, and toggle presses then play `gripper_inactive` without
//! changing anything. There is no operator-side recovery path.

use tracing::warn;

use crate::audio::AudioCue;
use crate::config::{ArmsConfig, SettingsConfig};
use crate::input::bindings::ArmSide;

/// State of one gripper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripperState {
    Open,
    Closed,
    /// Faulted; toggles are refused.
    Inactive,
}

/// A `set_gripper` call the control loop should dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GripperCommand {
    pub side: ArmSide,
    pub gripper_id: u8,
    pub open: bool,
    pub speed: u32,
    pub force: u32,
}

/// What one toggle press produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// `None` when the gripper is Inactive.
    pub command: Option<GripperCommand>,
    pub cue: AudioCue,
}

/// Both grippers plus the configured motion parameters.
#[derive(Debug)]
pub struct GripperManager {
    left: GripperState,
    right: GripperState,
    left_id: u8,
    right_id: u8,
    speed: u32,
    force: u32,
}

impl GripperManager {
    /// Both grippers start Closed.
    #[must_use]
    pub fn new(arms: &ArmsConfig, settings: &SettingsConfig) -> Self {
        Self {
            left: GripperState::Closed,
            right: GripperState::Closed,
            left_id: arms.left_gripper_id,
            right_id: arms.right_gripper_id,
            speed: settings.gripper_speed,
            force: settings.gripper_force,
        }
    }

    #[must_use]
    pub fn state(&self, side: ArmSide) -> GripperState {
        match side {
            ArmSide::Left => self.left,
            ArmSide::Right => self.right,
        }
    }

    fn state_mut(&mut self, side: ArmSide) -> &mut GripperState {
        match side {
            ArmSide::Left => &mut self.left,
            ArmSide::Right => &mut self.right,
        }
    }

    /// Handles one toggle press for `side`.
    ///
    /// Open and Closed flip to the other state and produce a command plus
    /// the matching open/close cue. Inactive produces no command and the
    /// `gripper_inactive` cue.
    pub fn toggle(&mut self, side: ArmSide) -> ToggleOutcome {
        let open = match self.state(side) {
            GripperState::Inactive => {
                return ToggleOutcome {
                    command: None,
                    cue: AudioCue::GripperInactive,
                };
            }
            GripperState::Closed => true,
            GripperState::Open => false,
        };

        *self.state_mut(side) = if open {
            GripperState::Open
        } else {
            GripperState::Closed
        };

        let gripper_id = match side {
            ArmSide::Left => self.left_id,
            ArmSide::Right => self.right_id,
        };

        ToggleOutcome {
            command: Some(GripperCommand {
                side,
                gripper_id,
                open,
                speed: self.speed,
                force: self.force,
            }),
            cue: AudioCue::gripper(side, open),
        }
    }

    /// Latches `side` Inactive after a driver fault.
    pub fn mark_inactive(&mut self, side: ArmSide) {
        if self.state(side) != GripperState::Inactive {
            warn!("Marking {} gripper inactive after driver fault", side);
            *self.state_mut(side) = GripperState::Inactive;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> GripperManager {
        let arms = ArmsConfig {
            left_ip: "192.168.1.10".to_string(),
            right_ip: "192.168.1.11".to_string(),
            port: 8055,
            left_gripper_id: 9,
            right_gripper_id: 7,
        };
        GripperManager::new(&arms, &SettingsConfig::default())
    }

    #[test]
    fn test_toggle_opens_then_closes() {
        let mut manager = manager();
        assert_eq!(manager.state(ArmSide::Left), GripperState::Closed);

        let outcome = manager.toggle(ArmSide::Left);
        let command = outcome.command.unwrap();
        assert!(command.open);
        assert_eq!(command.gripper_id, 9);
        assert_eq!(outcome.cue, AudioCue::LeftOpen);
        assert_eq!(manager.state(ArmSide::Left), GripperState::Open);

        let outcome = manager.toggle(ArmSide::Left);
        assert!(!outcome.command.unwrap().open);
        assert_eq!(outcome.cue, AudioCue::LeftClose);
        assert_eq!(manager.state(ArmSide::Left), GripperState::Closed);
    }

    #[test]
    fn test_sides_are_independent() {
        let mut manager = manager();
        manager.toggle(ArmSide::Left);

        assert_eq!(manager.state(ArmSide::Left), GripperState::Open);
        assert_eq!(manager.state(ArmSide::Right), GripperState::Closed);

        let outcome = manager.toggle(ArmSide::Right);
        let command = outcome.command.unwrap();
        assert_eq!(command.side, ArmSide::Right);
        assert_eq!(command.gripper_id, 7);
        assert_eq!(outcome.cue, AudioCue::RightOpen);
    }

    #[test]
    fn test_command_carries_configured_motion_parameters() {
        let mut manager = manager();
        let command = manager.toggle(ArmSide::Right).command.unwrap();
        assert_eq!(command.speed, 150);
        assert_eq!(command.force, 100);
    }

    #[test]
    fn test_inactive_toggle_is_a_cued_noop() {
        let mut manager = manager();
        manager.mark_inactive(ArmSide::Left);

        let outcome = manager.toggle(ArmSide::Left);
        assert!(outcome.command.is_none());
        assert_eq!(outcome.cue, AudioCue::GripperInactive);
        assert_eq!(manager.state(ArmSide::Left), GripperState::Inactive);

        // Repeated presses stay a no-op
        let outcome = manager.toggle(ArmSide::Left);
        assert!(outcome.command.is_none());
    }

    #[test]
    fn test_inactive_latches_only_the_faulted_side() {
        let mut manager = manager();
        manager.mark_inactive(ArmSide::Right);

        assert!(manager.toggle(ArmSide::Left).command.is_some());
        assert!(manager.toggle(ArmSide::Right).command.is_none());
    }
}
