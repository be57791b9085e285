//! # Controller Module
//!
//! The per-tick orchestration: raw snapshot in, driver commands and audio
//! cues out. Each tick drains completed background work (reset outcomes,
//! gripper faults), normalizes the snapshot into action edges, handles a
//! mode switch, dispatches the actions live in the current mode, and
//! finally issues the motion commands for the tick.
//!
//! Driver errors on the jog path are logged and swallowed; one failed
//! write must not take down the session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::audio::{AudioCue, AudioSink};
use crate::config::Config;
use crate::control::gripper::{GripperCommand, GripperManager};
use crate::control::mode::{ControlMode, ModeMachine};
use crate::control::reset::{PoseTable, ResetSequencer};
use crate::control::speed::SpeedControl;
use crate::control::vision::{VisionRecorder, VisionSystem};
use crate::driver::ArmDriver;
use crate::error::Result;
use crate::input::bindings::{ArmSide, BindingTable, JogAxis, LogicalAction};
use crate::input::normalizer::InputNormalizer;
use crate::input::snapshot::DeviceSnapshot;

/// Accumulated signed direction components for one arm, clamped to
/// [-1, 1] per component.
#[derive(Debug, Default, Clone, Copy)]
struct JogVector {
    first: f64,
    second: f64,
    third: f64,
}

impl JogVector {
    fn add(&mut self, axis_slot: usize, contribution: f64) {
        let slot = match axis_slot {
            0 => &mut self.first,
            1 => &mut self.second,
            _ => &mut self.third,
        };
        *slot = (*slot + contribution).clamp(-1.0, 1.0);
    }
}

/// Everything the tick loop needs, owned in one place.
pub struct Controller {
    normalizer: InputNormalizer,
    mode: ModeMachine,
    speed: SpeedControl,
    grippers: GripperManager,
    resets: ResetSequencer,
    recorder: VisionRecorder,
    left: Arc<dyn ArmDriver>,
    right: Arc<dyn ArmDriver>,
    audio: Arc<dyn AudioSink>,
    fault_sender: mpsc::UnboundedSender<ArmSide>,
    fault_receiver: mpsc::UnboundedReceiver<ArmSide>,
}

impl Controller {
    /// Builds the controller from a validated config and its collaborators.
    ///
    /// # Errors
    ///
    /// Returns `Binding` when the controls table or the reset poses fail
    /// to resolve.
    pub fn new(
        config: &Config,
        left: Arc<dyn ArmDriver>,
        right: Arc<dyn ArmDriver>,
        audio: Arc<dyn AudioSink>,
        vision: Arc<dyn VisionSystem>,
    ) -> Result<Self> {
        let table = BindingTable::from_config(&config.controls)?;
        let poses = PoseTable::from_config(&config.reset_poses)?;
        let (fault_sender, fault_receiver) = mpsc::unbounded_channel();

        Ok(Self {
            normalizer: InputNormalizer::new(table),
            mode: ModeMachine::new(),
            speed: SpeedControl::from_settings(&config.settings),
            grippers: GripperManager::new(&config.arms, &config.settings),
            resets: ResetSequencer::new(poses, config.settings.reset_speed),
            recorder: VisionRecorder::new(vision),
            left,
            right,
            audio,
            fault_sender,
            fault_receiver,
        })
    }

    /// The active control mode.
    #[must_use]
    pub fn mode(&self) -> ControlMode {
        self.mode.current()
    }

    fn driver(&self, side: ArmSide) -> &Arc<dyn ArmDriver> {
        match side {
            ArmSide::Left => &self.left,
            ArmSide::Right => &self.right,
        }
    }

    /// Runs one control tick against the given snapshot.
    pub async fn tick(&mut self, snapshot: &DeviceSnapshot, dt: Duration) {
        // Background work that landed since the previous tick
        while let Ok(side) = self.fault_receiver.try_recv() {
            self.grippers.mark_inactive(side);
        }
        for outcome in self.resets.drain() {
            self.audio.play(outcome.cue());
        }

        let frame = self.normalizer.poll(snapshot, dt);

        // Mode switch first; the rest of the frame dispatches in the mode
        // the operator just selected
        let mut switched = false;
        for (action, state) in &frame {
            if *action == LogicalAction::ModeSwitch && state.rising {
                let transition = self.mode.cycle();
                if transition.leaves_vision() {
                    self.recorder.cancel_silently();
                }
                self.stop_all().await;
                self.audio.play(transition.cue);
                switched = true;
            }
        }

        let mode = self.mode.current();
        let mut cartesian = [JogVector::default(), JogVector::default()];
        let mut orientation = [JogVector::default(), JogVector::default()];

        for (action, state) in &frame {
            if !action.live_in(mode) {
                continue;
            }
            match *action {
                LogicalAction::ModeSwitch => {}
                LogicalAction::SpeedIncrease => self.speed.handle(state, 1),
                LogicalAction::SpeedDecrease => self.speed.handle(state, -1),
                LogicalAction::GripperToggle(side) => {
                    if state.rising {
                        self.toggle_gripper(side);
                    }
                }
                LogicalAction::Jog { side, axis, sign } => {
                    if state.active {
                        let contribution = f64::from(sign) * f64::from(state.magnitude);
                        let arm = side_index(side);
                        match axis {
                            JogAxis::X => cartesian[arm].add(0, contribution),
                            JogAxis::Y => cartesian[arm].add(1, contribution),
                            JogAxis::Z => cartesian[arm].add(2, contribution),
                            JogAxis::Roll => orientation[arm].add(0, contribution),
                            JogAxis::Pitch => orientation[arm].add(1, contribution),
                            JogAxis::Yaw => orientation[arm].add(2, contribution),
                        }
                    }
                }
                LogicalAction::Reset { side, pose } => {
                    if state.rising {
                        self.resets.request(side, pose, self.driver(side).clone());
                    }
                }
                LogicalAction::VisionStartRecord => {
                    if state.rising {
                        let cue = self.recorder.start();
                        self.audio.play(cue);
                    }
                }
                LogicalAction::VisionStopRecordConfirm => {
                    if state.rising {
                        let cue = self.recorder.stop_confirm();
                        self.audio.play(cue);
                    }
                }
                LogicalAction::VisionCancelRecord => {
                    if state.rising {
                        let cue = self.recorder.cancel();
                        self.audio.play(cue);
                    }
                }
            }
        }

        // Motion for the tick; skipped on the switch tick, where stop-all
        // already went out
        if !switched {
            match mode {
                ControlMode::Xyz => {
                    for side in [ArmSide::Left, ArmSide::Right] {
                        let vector = cartesian[side_index(side)];
                        let driver = self.driver(side);
                        if let Err(e) = driver
                            .jog_cartesian(vector.first, vector.second, 0.0, self.speed.xy())
                            .await
                        {
                            warn!("Planar jog for {} arm failed: {}", side, e);
                        }
                        if let Err(e) = driver
                            .jog_cartesian(0.0, 0.0, vector.third, self.speed.z())
                            .await
                        {
                            warn!("Vertical jog for {} arm failed: {}", side, e);
                        }
                    }
                }
                ControlMode::Rpy => {
                    for side in [ArmSide::Left, ArmSide::Right] {
                        let vector = orientation[side_index(side)];
                        if let Err(e) = self
                            .driver(side)
                            .jog_orientation(
                                vector.first,
                                vector.second,
                                vector.third,
                                self.speed.rpy(),
                            )
                            .await
                        {
                            warn!("Orientation jog for {} arm failed: {}", side, e);
                        }
                    }
                }
                ControlMode::Vision | ControlMode::Reset => {}
            }
        }
    }

    /// Plays the cue and dispatches the driver call as a background task.
    fn toggle_gripper(&mut self, side: ArmSide) {
        let outcome = self.grippers.toggle(side);
        self.audio.play(outcome.cue);

        if let Some(command) = outcome.command {
            self.dispatch_gripper(command);
        }
    }

    fn dispatch_gripper(&self, command: GripperCommand) {
        let driver = self.driver(command.side).clone();
        let fault_sender = self.fault_sender.clone();
        tokio::spawn(async move {
            if let Err(e) = driver
                .set_gripper(command.gripper_id, command.open, command.speed, command.force)
                .await
            {
                warn!("Gripper command for {} arm failed: {}", command.side, e);
                let _ = fault_sender.send(command.side);
            }
        });
    }

    /// Halts both arms. Used on mode switches and shutdown.
    pub async fn stop_all(&self) {
        for side in [ArmSide::Left, ArmSide::Right] {
            if let Err(e) = self.driver(side).stop_motion().await {
                warn!("Stop command for {} arm failed: {}", side, e);
            }
        }
    }

    /// Announces that setup finished and the loop is about to start.
    pub fn announce_ready(&self) {
        self.audio.play(AudioCue::SystemReady);
    }
}

fn side_index(side: ArmSide) -> usize {
    match side {
        ArmSide::Left => 0,
        ArmSide::Right => 1,
    }
}
