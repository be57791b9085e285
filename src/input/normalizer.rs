//! # Input Normalizer Module
//!
//! Turns raw device snapshots into per-action edge and hold information.
//! Each tick the normalizer evaluates every binding against the snapshot,
//! compares with the previous tick, and reports rising edges, falling edges,
//! and how long each action has been held. Consumers never look at raw
//! buttons or axes; everything downstream runs on [`LogicalAction`]s.

use std::collections::HashMap;
use std::time::Duration;

use crate::input::bindings::{BindingDescriptor, BindingTable, LogicalAction};
use crate::input::snapshot::DeviceSnapshot;

/// Per-action state for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionState {
    /// Active this tick.
    pub active: bool,
    /// Became active this tick.
    pub rising: bool,
    /// Became inactive this tick.
    pub falling: bool,
    /// Time continuously active; zero on the rising tick, accumulating
    /// one tick interval per subsequent active tick.
    pub held: Duration,
    /// Jog magnitude: 1.0 for buttons and hats, the absolute deflection
    /// for analog axes. Zero when inactive.
    pub magnitude: f32,
}

/// Tracks prior activation per action and produces edges.
#[derive(Debug)]
pub struct InputNormalizer {
    bindings: Vec<(LogicalAction, BindingDescriptor)>,
    prior: HashMap<LogicalAction, (bool, Duration)>,
}

impl InputNormalizer {
    #[must_use]
    pub fn new(table: BindingTable) -> Self {
        let bindings = table.entries().to_vec();
        let prior = bindings
            .iter()
            .map(|(action, _)| (*action, (false, Duration::ZERO)))
            .collect();
        Self { bindings, prior }
    }

    /// Evaluates all bindings against `snapshot` and advances edge state.
    ///
    /// `dt` is the elapsed time since the previous poll and feeds the
    /// hold-duration accumulator. A rising edge fires exactly once per
    /// press cycle; releasing resets the hold timer.
    pub fn poll(&mut self, snapshot: &DeviceSnapshot, dt: Duration) -> Vec<(LogicalAction, ActionState)> {
        let mut out = Vec::with_capacity(self.bindings.len());

        for (action, descriptor) in &self.bindings {
            let (was_active, prior_held) = self.prior[action];
            let active = descriptor.is_active(snapshot);

            let held = if active {
                if was_active {
                    prior_held + dt
                } else {
                    Duration::ZERO
                }
            } else {
                Duration::ZERO
            };

            let state = ActionState {
                active,
                rising: active && !was_active,
                falling: !active && was_active,
                held,
                magnitude: descriptor.magnitude(snapshot),
            };

            self.prior.insert(*action, (active, held));
            out.push((*action, state));
        }

        out
    }
}
