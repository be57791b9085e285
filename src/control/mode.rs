//! # Control Mode Module
//!
//! The four operating modes and the machine that cycles between them.
//! A mode-switch press advances XYZ -> RPY -> VISION -> RESET -> XYZ on the
//! rising edge, announcing each entered mode with its voice cue. Leaving
//! VISION plays no extra cue of its own; the operator hears only the next
//! mode's announcement.

use tracing::info;

use crate::audio::AudioCue;

/// Operating mode of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlMode {
    /// Cartesian jogging.
    Xyz,
    /// Orientation jogging.
    Rpy,
    /// Data-collection recording; arm motion is suppressed.
    Vision,
    /// One-shot moves to named reset poses.
    Reset,
}

impl ControlMode {
    /// The mode entered by one press of the mode-switch button.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            ControlMode::Xyz => ControlMode::Rpy,
            ControlMode::Rpy => ControlMode::Vision,
            ControlMode::Vision => ControlMode::Reset,
            ControlMode::Reset => ControlMode::Xyz,
        }
    }

    /// Voice cue announcing entry into this mode.
    #[must_use]
    pub fn entry_cue(self) -> AudioCue {
        match self {
            ControlMode::Xyz => AudioCue::XyzMode,
            ControlMode::Rpy => AudioCue::RpyMode,
            ControlMode::Vision => AudioCue::VisionEnter,
            ControlMode::Reset => AudioCue::ResetMode,
        }
    }

    /// Uppercase name for log lines.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ControlMode::Xyz => "XYZ",
            ControlMode::Rpy => "RPY",
            ControlMode::Vision => "VISION",
            ControlMode::Reset => "RESET",
        }
    }
}

/// What a mode switch means for the rest of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: ControlMode,
    pub to: ControlMode,
    /// Cue to announce the entered mode.
    pub cue: AudioCue,
}

impl ModeTransition {
    /// True when the transition leaves VISION, which must cancel any
    /// in-flight recording.
    #[must_use]
    pub fn leaves_vision(&self) -> bool {
        self.from == ControlMode::Vision
    }
}

/// Tracks the current mode. Starts in XYZ.
#[derive(Debug)]
pub struct ModeMachine {
    current: ControlMode,
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ControlMode::Xyz,
        }
    }

    /// The active mode.
    #[must_use]
    pub fn current(&self) -> ControlMode {
        self.current
    }

    /// Advances to the next mode and reports the transition.
    pub fn cycle(&mut self) -> ModeTransition {
        let from = self.current;
        self.current = from.next();
        info!("Mode switch: {} -> {}", from.name(), self.current.name());

        ModeTransition {
            from,
            to: self.current,
            cue: self.current.entry_cue(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_order() {
        let mut machine = ModeMachine::new();
        assert_eq!(machine.current(), ControlMode::Xyz);

        assert_eq!(machine.cycle().to, ControlMode::Rpy);
        assert_eq!(machine.cycle().to, ControlMode::Vision);
        assert_eq!(machine.cycle().to, ControlMode::Reset);
        assert_eq!(machine.cycle().to, ControlMode::Xyz);
    }

    #[test]
    fn test_entry_cues() {
        assert_eq!(ControlMode::Xyz.entry_cue(), AudioCue::XyzMode);
        assert_eq!(ControlMode::Rpy.entry_cue(), AudioCue::RpyMode);
        assert_eq!(ControlMode::Vision.entry_cue(), AudioCue::VisionEnter);
        assert_eq!(ControlMode::Reset.entry_cue(), AudioCue::ResetMode);
    }

    #[test]
    fn test_transition_reports_vision_exit() {
        let mut machine = ModeMachine::new();
        machine.cycle(); // RPY
        let into_vision = machine.cycle();
        assert!(!into_vision.leaves_vision());

        let out_of_vision = machine.cycle();
        assert!(out_of_vision.leaves_vision());
        assert_eq!(out_of_vision.to, ControlMode::Reset);
        // Only the entered mode is announced
        assert_eq!(out_of_vision.cue, AudioCue::ResetMode);
    }
}
