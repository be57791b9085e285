//! # Input Module
//!
//! Everything between the physical gamepad and the control logic:
//!
//! - [`gamepad`] opens the evdev device and accumulates raw events
//! - [`snapshot`] is the indexed view of the device at one instant
//! - [`bindings`] resolves config keys into logical actions
//! - [`normalizer`] turns snapshots into per-action edges and hold times

pub mod bindings;
pub mod gamepad;
pub mod normalizer;
pub mod snapshot;

pub use bindings::{ArmSide, BindingTable, JogAxis, LogicalAction, PoseName};
pub use gamepad::{Gamepad, SnapshotAccumulator};
pub use normalizer::{ActionState, InputNormalizer};
pub use snapshot::DeviceSnapshot;
