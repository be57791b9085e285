//! # Audio Cue Module
//!
//! Short voice clips confirm operator actions: mode switches, gripper
//! toggles, reset outcomes, and recording state changes. Playback is
//! fire-and-forget; overlapping cues mix rather than queue, and a playback
//! failure never disturbs the control loop.
//!
//! The [`AudioSink`] trait is the seam: the real [`RodioSink`] owns the
//! output device on a dedicated thread, while tests capture cues in memory.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use rodio::{Decoder, OutputStream, Source};
use tracing::{debug, warn};

use crate::config::AudioConfig;
use crate::error::{Result, TeleopError};
use crate::input::bindings::ArmSide;

/// Every voice clip the controller can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    XyzMode,
    RpyMode,
    VisionEnter,
    ResetMode,
    LeftOpen,
    LeftClose,
    RightOpen,
    RightClose,
    GripperInactive,
    LeftResetSuccess,
    LeftResetFail,
    RightResetSuccess,
    RightResetFail,
    SystemReady,
    VisionRecordStart,
    VisionRecordStop,
    VisionRecordCancel,
    AlreadyRecordingError,
    NotRecordingError,
}

impl AudioCue {
    /// All cues, for clip-table validation.
    pub const ALL: [AudioCue; 19] = [
        AudioCue::XyzMode,
        AudioCue::RpyMode,
        AudioCue::VisionEnter,
        AudioCue::ResetMode,
        AudioCue::LeftOpen,
        AudioCue::LeftClose,
        AudioCue::RightOpen,
        AudioCue::RightClose,
        AudioCue::GripperInactive,
        AudioCue::LeftResetSuccess,
        AudioCue::LeftResetFail,
        AudioCue::RightResetSuccess,
        AudioCue::RightResetFail,
        AudioCue::SystemReady,
        AudioCue::VisionRecordStart,
        AudioCue::VisionRecordStop,
        AudioCue::VisionRecordCancel,
        AudioCue::AlreadyRecordingError,
        AudioCue::NotRecordingError,
    ];

    /// The key under `[audio.clips]` naming this cue's file.
    #[must_use]
    pub fn config_key(self) -> &'static str {
        match self {
            AudioCue::XyzMode => "xyz_mode",
            AudioCue::RpyMode => "rpy_mode",
            AudioCue::VisionEnter => "vision_enter",
            AudioCue::ResetMode => "reset_mode",
            AudioCue::LeftOpen => "left_open",
            AudioCue::LeftClose => "left_close",
            AudioCue::RightOpen => "right_open",
            AudioCue::RightClose => "right_close",
            AudioCue::GripperInactive => "gripper_inactive",
            AudioCue::LeftResetSuccess => "left_reset_success",
            AudioCue::LeftResetFail => "left_reset_fail",
            AudioCue::RightResetSuccess => "right_reset_success",
            AudioCue::RightResetFail => "right_reset_fail",
            AudioCue::SystemReady => "system_ready",
            AudioCue::VisionRecordStart => "vision_record_start",
            AudioCue::VisionRecordStop => "vision_record_stop",
            AudioCue::VisionRecordCancel => "vision_record_cancel",
            AudioCue::AlreadyRecordingError => "already_recording_error",
            AudioCue::NotRecordingError => "not_recording_error",
        }
    }

    /// Gripper open/close cue for one arm.
    #[must_use]
    pub fn gripper(side: ArmSide, open: bool) -> Self {
        match (side, open) {
            (ArmSide::Left, true) => AudioCue::LeftOpen,
            (ArmSide::Left, false) => AudioCue::LeftClose,
            (ArmSide::Right, true) => AudioCue::RightOpen,
            (ArmSide::Right, false) => AudioCue::RightClose,
        }
    }

    /// Reset outcome cue for one arm.
    #[must_use]
    pub fn reset_outcome(side: ArmSide, success: bool) -> Self {
        match (side, success) {
            (ArmSide::Left, true) => AudioCue::LeftResetSuccess,
            (ArmSide::Left, false) => AudioCue::LeftResetFail,
            (ArmSide::Right, true) => AudioCue::RightResetSuccess,
            (ArmSide::Right, false) => AudioCue::RightResetFail,
        }
    }
}

/// Plays cues without blocking the caller.
pub trait AudioSink: Send + Sync {
    fn play(&self, cue: AudioCue);
}

/// Rodio-backed sink.
///
/// The output stream must live on one thread for its whole lifetime, so a
/// dedicated playback thread owns it and receives cues over a channel. Each
/// cue is decoded and mixed into the stream without waiting for the previous
/// one to finish.
pub struct RodioSink {
    sender: mpsc::Sender<AudioCue>,
}

impl RodioSink {
    /// Builds the sink from the configured clip table and spawns the
    /// playback thread.
    ///
    /// # Errors
    ///
    /// Returns `Audio` if any cue has no clip configured. Missing files and
    /// decode failures are deferred to playback time and only logged there.
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let mut clips: HashMap<AudioCue, PathBuf> = HashMap::with_capacity(AudioCue::ALL.len());
        for cue in AudioCue::ALL {
            let path = config.clips.get(cue.config_key()).ok_or_else(|| {
                TeleopError::Audio(format!("no clip configured for '{}'", cue.config_key()))
            })?;
            clips.insert(cue, PathBuf::from(path));
        }

        let (sender, receiver) = mpsc::channel::<AudioCue>();

        thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || playback_loop(&receiver, &clips))
            .map_err(|e| TeleopError::Audio(format!("failed to spawn playback thread: {}", e)))?;

        Ok(Self { sender })
    }
}

impl AudioSink for RodioSink {
    fn play(&self, cue: AudioCue) {
        // The receiver only drops if the playback thread died; nothing to do
        if self.sender.send(cue).is_err() {
            warn!("Audio playback thread is gone, dropping cue {:?}", cue);
        }
    }
}

/// Runs on the playback thread until all senders drop.
fn playback_loop(receiver: &mpsc::Receiver<AudioCue>, clips: &HashMap<AudioCue, PathBuf>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            warn!("No audio output device, cues disabled: {}", e);
            // Keep draining so senders never block or error
            while receiver.recv().is_ok() {}
            return;
        }
    };

    while let Ok(cue) = receiver.recv() {
        let Some(path) = clips.get(&cue) else { continue };

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Failed to open clip {}: {}", path.display(), e);
                continue;
            }
        };

        match Decoder::new(BufReader::new(file)) {
            Ok(source) => {
                debug!("Playing cue {:?}", cue);
                if let Err(e) = handle.play_raw(source.convert_samples()) {
                    warn!("Failed to play cue {:?}: {}", cue, e);
                }
            }
            Err(e) => {
                warn!("Failed to decode clip {}: {}", path.display(), e);
            }
        }
    }
}

/// In-memory sink recording the cues it was asked to play.
#[cfg(test)]
pub mod testing {
    use std::sync::{Arc, Mutex};

    use super::{AudioCue, AudioSink};

    #[derive(Debug, Default)]
    pub struct CaptureSink {
        played: Mutex<Vec<AudioCue>>,
    }

    impl CaptureSink {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn played(&self) -> Vec<AudioCue> {
            self.played.lock().unwrap().clone()
        }

        pub fn clear(&self) {
            self.played.lock().unwrap().clear();
        }
    }

    impl AudioSink for CaptureSink {
        fn play(&self, cue: AudioCue) {
            self.played.lock().unwrap().push(cue);
        }
    }
}
