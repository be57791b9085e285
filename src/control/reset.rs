//! # Reset Sequencer Module
//!
//! Moves an arm to a named orientation without ever blocking the tick
//! loop. Each request spawns a task that drives `move_to_pose` to
//! completion and reports back over a channel; the loop drains outcomes
//! once per tick and plays the success or failure cue.
//!
//! At most one reset is in flight per arm. Further requests for that arm
//! are ignored until the outcome arrives, and a mode switch does not abort
//! the move; its cue plays whenever it lands.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::audio::AudioCue;
use crate::config::ResetPosesConfig;
use crate::driver::{ArmDriver, MoveOutcome};
use crate::error::{Result, TeleopError};
use crate::input::bindings::{ArmSide, PoseName};

/// Read-only pose table, RPY triples in degrees per arm.
#[derive(Debug, Clone)]
pub struct PoseTable {
    left: HashMap<PoseName, [f64; 3]>,
    right: HashMap<PoseName, [f64; 3]>,
}

impl PoseTable {
    /// Resolves the raw config tables into typed pose maps.
    ///
    /// # Errors
    ///
    /// Returns `Binding` for an unknown pose name; a pose on only one arm
    /// is allowed.
    pub fn from_config(config: &ResetPosesConfig) -> Result<Self> {
        Ok(Self {
            left: Self::resolve("left", &config.left)?,
            right: Self::resolve("right", &config.right)?,
        })
    }

    fn resolve(
        side: &str,
        raw: &HashMap<String, [f64; 3]>,
    ) -> Result<HashMap<PoseName, [f64; 3]>> {
        let mut table = HashMap::with_capacity(raw.len());
        for (name, rpy) in raw {
            let pose = PoseName::parse(name).ok_or_else(|| {
                TeleopError::Binding(format!(
                    "unknown pose '{}' in reset_poses.{}",
                    name, side
                ))
            })?;
            table.insert(pose, *rpy);
        }
        Ok(table)
    }

    /// Target RPY for `pose` on `side`, if configured.
    #[must_use]
    pub fn get(&self, side: ArmSide, pose: PoseName) -> Option<[f64; 3]> {
        match side {
            ArmSide::Left => self.left.get(&pose).copied(),
            ArmSide::Right => self.right.get(&pose).copied(),
        }
    }
}

/// Outcome of one completed reset task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOutcome {
    pub side: ArmSide,
    pub success: bool,
}

impl ResetOutcome {
    /// The cue announcing this outcome.
    #[must_use]
    pub fn cue(&self) -> AudioCue {
        AudioCue::reset_outcome(self.side, self.success)
    }
}

/// Dispatches reset moves and tracks what is in flight.
pub struct ResetSequencer {
    poses: PoseTable,
    reset_speed: f64,
    left_in_flight: bool,
    right_in_flight: bool,
    sender: mpsc::UnboundedSender<ResetOutcome>,
    receiver: mpsc::UnboundedReceiver<ResetOutcome>,
}

impl ResetSequencer {
    #[must_use]
    pub fn new(poses: PoseTable, reset_speed: f64) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            poses,
            reset_speed,
            left_in_flight: false,
            right_in_flight: false,
            sender,
            receiver,
        }
    }

    /// Whether `side` has a reset in flight.
    #[must_use]
    pub fn in_flight(&self, side: ArmSide) -> bool {
        match side {
            ArmSide::Left => self.left_in_flight,
            ArmSide::Right => self.right_in_flight,
        }
    }

    fn in_flight_mut(&mut self, side: ArmSide) -> &mut bool {
        match side {
            ArmSide::Left => &mut self.left_in_flight,
            ArmSide::Right => &mut self.right_in_flight,
        }
    }

    /// Starts a reset for `side` unless one is already in flight.
    ///
    /// An unconfigured pose is reported as a failed outcome on the next
    /// drain rather than panicking mid-session.
    pub fn request(&mut self, side: ArmSide, pose: PoseName, driver: Arc<dyn ArmDriver>) {
        if self.in_flight(side) {
            debug!("Ignoring reset for {} arm: one already in flight", side);
            return;
        }

        let Some(rpy) = self.poses.get(side, pose) else {
            warn!("No '{}' pose configured for {} arm", pose.name(), side);
            let _ = self.sender.send(ResetOutcome {
                side,
                success: false,
            });
            *self.in_flight_mut(side) = true;
            return;
        };

        info!(
            "Resetting {} arm to '{}' ({:?}) at {:.0}",
            side,
            pose.name(),
            rpy,
            self.reset_speed
        );
        *self.in_flight_mut(side) = true;

        let sender = self.sender.clone();
        let reset_speed = self.reset_speed;
        tokio::spawn(async move {
            let success = match driver.move_to_pose(rpy, reset_speed).await {
                Ok(MoveOutcome::Success) => true,
                Ok(MoveOutcome::Fail) => false,
                Err(e) => {
                    warn!("Reset move for {} arm failed: {}", side, e);
                    false
                }
            };
            // Receiver only drops on shutdown
            let _ = sender.send(ResetOutcome { side, success });
        });
    }

    /// Collects outcomes that landed since the last tick, clearing the
    /// in-flight flags as they arrive.
    pub fn drain(&mut self) -> Vec<ResetOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.receiver.try_recv() {
            *self.in_flight_mut(outcome.side) = false;
            outcomes.push(outcome);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockArmDriver;
    use std::time::Duration;

    fn pose_table() -> PoseTable {
        let mut left = HashMap::new();
        left.insert("default".to_string(), [180.0, 0.0, 180.0]);
        left.insert("up".to_string(), [90.0, 0.0, 180.0]);
        let mut right = HashMap::new();
        right.insert("default".to_string(), [180.0, 0.0, 0.0]);
        PoseTable::from_config(&ResetPosesConfig { left, right }).unwrap()
    }

    async fn settle() {
        // Let the spawned reset task run to completion
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // ==================== PoseTable Tests ====================

    #[test]
    fn test_pose_table_lookup() {
        let table = pose_table();
        assert_eq!(
            table.get(ArmSide::Left, PoseName::Default),
            Some([180.0, 0.0, 180.0])
        );
        assert_eq!(
            table.get(ArmSide::Right, PoseName::Default),
            Some([180.0, 0.0, 0.0])
        );
        assert_eq!(table.get(ArmSide::Right, PoseName::Up), None);
    }

    #[test]
    fn test_pose_table_rejects_unknown_name() {
        let mut left = HashMap::new();
        left.insert("sideways".to_string(), [0.0, 0.0, 0.0]);
        let config = ResetPosesConfig {
            left,
            right: HashMap::new(),
        };
        assert!(matches!(
            PoseTable::from_config(&config),
            Err(TeleopError::Binding(_))
        ));
    }

    // ==================== Sequencer Tests ====================

    #[tokio::test]
    async fn test_successful_reset_reports_success_cue() {
        let mut driver = MockArmDriver::new();
        driver
            .expect_move_to_pose()
            .withf(|rpy, speed| *rpy == [180.0, 0.0, 180.0] && *speed == 50.0)
            .times(1)
            .returning(|_, _| Ok(MoveOutcome::Success));

        let mut sequencer = ResetSequencer::new(pose_table(), 50.0);
        sequencer.request(ArmSide::Left, PoseName::Default, Arc::new(driver));
        assert!(sequencer.in_flight(ArmSide::Left));

        settle().await;

        let outcomes = sequencer.drain();
        assert_eq!(
            outcomes,
            vec![ResetOutcome {
                side: ArmSide::Left,
                success: true
            }]
        );
        assert_eq!(outcomes[0].cue(), AudioCue::LeftResetSuccess);
        assert!(!sequencer.in_flight(ArmSide::Left));
    }

    #[tokio::test]
    async fn test_failed_move_reports_failure_cue() {
        let mut driver = MockArmDriver::new();
        driver
            .expect_move_to_pose()
            .returning(|_, _| Ok(MoveOutcome::Fail));

        let mut sequencer = ResetSequencer::new(pose_table(), 50.0);
        sequencer.request(ArmSide::Right, PoseName::Default, Arc::new(driver));
        settle().await;

        let outcomes = sequencer.drain();
        assert!(!outcomes[0].success);
        assert_eq!(outcomes[0].cue(), AudioCue::RightResetFail);
    }

    #[tokio::test]
    async fn test_driver_error_counts_as_failure() {
        let mut driver = MockArmDriver::new();
        driver
            .expect_move_to_pose()
            .returning(|_, _| Err(TeleopError::Driver("connection lost".to_string())));

        let mut sequencer = ResetSequencer::new(pose_table(), 50.0);
        sequencer.request(ArmSide::Left, PoseName::Up, Arc::new(driver));
        settle().await;

        assert!(!sequencer.drain()[0].success);
    }

    #[tokio::test]
    async fn test_second_request_ignored_while_in_flight() {
        let mut driver = MockArmDriver::new();
        // Exactly one move despite two requests
        driver
            .expect_move_to_pose()
            .times(1)
            .returning(|_, _| Ok(MoveOutcome::Success));
        let driver = Arc::new(driver);

        let mut sequencer = ResetSequencer::new(pose_table(), 50.0);
        sequencer.request(ArmSide::Left, PoseName::Default, driver.clone());
        sequencer.request(ArmSide::Left, PoseName::Up, driver);

        settle().await;
        assert_eq!(sequencer.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_arms_reset_concurrently() {
        let mut driver = MockArmDriver::new();
        driver
            .expect_move_to_pose()
            .times(2)
            .returning(|_, _| Ok(MoveOutcome::Success));
        let driver = Arc::new(driver);

        let mut sequencer = ResetSequencer::new(pose_table(), 50.0);
        sequencer.request(ArmSide::Left, PoseName::Default, driver.clone());
        sequencer.request(ArmSide::Right, PoseName::Default, driver);
        assert!(sequencer.in_flight(ArmSide::Left));
        assert!(sequencer.in_flight(ArmSide::Right));

        settle().await;
        assert_eq!(sequencer.drain().len(), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_pose_fails_without_driver_call() {
        let driver = MockArmDriver::new(); // no expectations: any call panics

        let mut sequencer = ResetSequencer::new(pose_table(), 50.0);
        sequencer.request(ArmSide::Right, PoseName::Up, Arc::new(driver));

        let outcomes = sequencer.drain();
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].success);
        assert!(!sequencer.in_flight(ArmSide::Right));
    }
}
