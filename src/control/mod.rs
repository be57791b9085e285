//! # Control Module
//!
//! The control logic between normalized input and the arm drivers:
//!
//! - [`mode`] cycles XYZ/RPY/VISION/RESET
//! - [`speed`] keeps the shared, clamped speed scalars
//! - [`gripper`] tracks gripper state per arm
//! - [`reset`] runs pose resets as background tasks
//! - [`vision`] guards the recording flag in VISION mode
//! - [`controller`] ties it all together, one tick at a time

pub mod controller;
pub mod gripper;
pub mod mode;
pub mod reset;
pub mod speed;
pub mod vision;

pub use controller::Controller;
pub use gripper::{GripperManager, GripperState};
pub use mode::{ControlMode, ModeMachine};
pub use reset::{PoseTable, ResetSequencer};
pub use speed::SpeedControl;
pub use vision::{LogVisionSystem, VisionRecorder, VisionSystem};
