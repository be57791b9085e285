//! # Vision Recording Module
//!
//! Guards the data-collection recording state while in VISION mode. The
//! recorder owns a single boolean and the rules around it: starting twice
//! or stopping idle are operator errors announced by their own cues, and
//! leaving VISION mode cancels a recording silently.
//!
//! The actual capture pipeline lives behind [`VisionSystem`]; the shipped
//! implementation only logs, matching a deployment where the vision stack
//! runs as its own process.

use std::sync::Arc;

use tracing::info;

use crate::audio::AudioCue;

/// External recording subsystem.
///
/// Cancelling is expressed as `stop(false)`: stopping and cancelling differ
/// only in whether the episode is kept, so the seam carries one stop call
/// with a keep flag rather than separate stop/cancel methods.
pub trait VisionSystem: Send + Sync {
    /// Begin capturing an episode.
    fn start(&self);
    /// End the episode; `confirm` keeps it, otherwise it is discarded.
    fn stop(&self, confirm: bool);
}

/// Log-only subsystem for deployments where capture runs out of process.
#[derive(Debug, Default)]
pub struct LogVisionSystem;

impl VisionSystem for LogVisionSystem {
    fn start(&self) {
        info!("Vision recording started");
    }

    fn stop(&self, confirm: bool) {
        if confirm {
            info!("Vision recording stopped, episode kept");
        } else {
            info!("Vision recording cancelled, episode discarded");
        }
    }
}

/// The recording flag and its guard rules.
pub struct VisionRecorder {
    system: Arc<dyn VisionSystem>,
    recording: bool,
}

impl VisionRecorder {
    #[must_use]
    pub fn new(system: Arc<dyn VisionSystem>) -> Self {
        Self {
            system,
            recording: false,
        }
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Start request. Starting while already recording changes nothing and
    /// plays the error cue.
    pub fn start(&mut self) -> AudioCue {
        if self.recording {
            return AudioCue::AlreadyRecordingError;
        }
        self.system.start();
        self.recording = true;
        AudioCue::VisionRecordStart
    }

    /// Stop-and-confirm request. Stopping while idle changes nothing and
    /// plays the error cue.
    pub fn stop_confirm(&mut self) -> AudioCue {
        if !self.recording {
            return AudioCue::NotRecordingError;
        }
        self.system.stop(true);
        self.recording = false;
        AudioCue::VisionRecordStop
    }

    /// Cancel request. Cancelling while idle changes nothing and plays the
    /// error cue.
    pub fn cancel(&mut self) -> AudioCue {
        if !self.recording {
            return AudioCue::NotRecordingError;
        }
        self.system.stop(false);
        self.recording = false;
        AudioCue::VisionRecordCancel
    }

    /// Cancels without any cue, as when the operator leaves VISION mode
    /// mid-recording. No-op when idle.
    pub fn cancel_silently(&mut self) {
        if self.recording {
            self.system.stop(false);
            self.recording = false;
        }
    }
}
