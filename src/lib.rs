//! # Teleop Bridge Library
//!
//! Drive a dual-arm robot with a standard gamepad.
//!
//! This library provides the core functionality for mapping gamepad inputs
//! to arm jog, gripper, reset and recording commands across four operating
//! modes (XYZ, RPY, VISION, RESET), with voice cues confirming every
//! operator action.

pub mod audio;
pub mod config;
pub mod control;
pub mod driver;
pub mod error;
pub mod input;
