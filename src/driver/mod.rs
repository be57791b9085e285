//! # Arm Driver Module
//!
//! The seam between control logic and the physical arms. Each arm gets its
//! own driver instance; the control loop only ever talks through the
//! [`ArmDriver`] trait, so tests run against mocks and the shipped
//! [`tcp::TcpArmDriver`] stays a thin transport.
//!
//! Jogs are velocity commands re-issued every tick; a tick without a jog
//! for an axis leaves that axis stopped. `move_to_pose` is the only
//! blocking-style call and is always issued from a spawned task.

pub mod tcp;

use async_trait::async_trait;

use crate::error::Result;

pub use tcp::TcpArmDriver;

/// Result of a blocking pose move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The arm reached the target pose.
    Success,
    /// The arm rejected or failed the move.
    Fail,
}

/// Commands one robot arm.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArmDriver: Send + Sync {
    /// Velocity jog in Cartesian space. `dx`/`dy`/`dz` are signed direction
    /// components in [-1, 1]; `speed` is mm/s.
    async fn jog_cartesian(&self, dx: f64, dy: f64, dz: f64, speed: f64) -> Result<()>;

    /// Velocity jog in orientation space. Components in [-1, 1]; `speed`
    /// is deg/s.
    async fn jog_orientation(&self, droll: f64, dpitch: f64, dyaw: f64, speed: f64) -> Result<()>;

    /// Halts all motion on this arm immediately.
    async fn stop_motion(&self) -> Result<()>;

    /// Moves to the target RPY orientation (degrees) at `speed`, waiting
    /// for the arm to report the result.
    async fn move_to_pose(&self, rpy: [f64; 3], speed: f64) -> Result<MoveOutcome>;

    /// Opens or closes the gripper with the given motion parameters.
    async fn set_gripper(&self, gripper_id: u8, open: bool, speed: u32, force: u32) -> Result<()>;
}
