//! # Speed Control Module
//!
//! Three clamped speed scalars: planar (XY), vertical (Z), and orientation
//! (RPY). The speed buttons step all three together so their ratios stay
//! fixed. A short press steps once on the rising edge; holding past the
//! long-press duration steps once more every tick, giving a ramp whose rate
//! follows the tick rate. Speed changes are silent.

use std::time::Duration;

use tracing::debug;

use crate::config::SettingsConfig;
use crate::input::normalizer::ActionState;

/// One clamped speed scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedState {
    current: f64,
    min: f64,
    max: f64,
}

impl SpeedState {
    #[must_use]
    pub fn new(initial: f64, min: f64, max: f64) -> Self {
        Self {
            current: initial.clamp(min, max),
            min,
            max,
        }
    }

    /// Current value, always within [min, max].
    #[must_use]
    pub fn get(&self) -> f64 {
        self.current
    }

    /// Adds `delta` and clamps. Returns false when already at the bound.
    pub fn step(&mut self, delta: f64) -> bool {
        let next = (self.current + delta).clamp(self.min, self.max);
        let changed = (next - self.current).abs() > f64::EPSILON;
        self.current = next;
        changed
    }
}

/// The three shared speed groups plus ramp bookkeeping.
#[derive(Debug)]
pub struct SpeedControl {
    xy: SpeedState,
    z: SpeedState,
    rpy: SpeedState,
    increment: f64,
    long_press: Duration,
}

impl SpeedControl {
    #[must_use]
    pub fn from_settings(settings: &SettingsConfig) -> Self {
        let min = settings.min_speed;
        let max = settings.max_speed;
        Self {
            xy: SpeedState::new(settings.initial_xy_speed, min, max),
            z: SpeedState::new(settings.initial_z_speed, min, max),
            rpy: SpeedState::new(settings.rpy_speed, min, max),
            increment: settings.speed_increment,
            long_press: Duration::from_secs_f64(settings.long_press_duration),
        }
    }

    /// Planar jog speed (mm/s).
    #[must_use]
    pub fn xy(&self) -> f64 {
        self.xy.get()
    }

    /// Vertical jog speed (mm/s).
    #[must_use]
    pub fn z(&self) -> f64 {
        self.z.get()
    }

    /// Orientation jog speed (deg/s).
    #[must_use]
    pub fn rpy(&self) -> f64 {
        self.rpy.get()
    }

    /// Feeds one tick of a speed button's state. `direction` is +1 for
    /// increase, -1 for decrease.
    ///
    /// Steps once on the rising edge, then once per tick while the button
    /// has been held at least the long-press duration.
    pub fn handle(&mut self, state: &ActionState, direction: i8) {
        let ramping = state.active && state.held >= self.long_press;
        if !(state.rising || ramping) {
            return;
        }

        let delta = f64::from(direction) * self.increment;
        let changed = self.xy.step(delta) | self.z.step(delta) | self.rpy.step(delta);

        if changed {
            debug!(
                "Speed adjusted: xy={:.1} z={:.1} rpy={:.1}",
                self.xy.get(),
                self.z.get(),
                self.rpy.get()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(33);

    fn settings() -> SettingsConfig {
        SettingsConfig::default()
    }

    fn rising() -> ActionState {
        ActionState {
            active: true,
            rising: true,
            falling: false,
            held: Duration::ZERO,
            magnitude: 1.0,
        }
    }

    fn held_for(duration: Duration) -> ActionState {
        ActionState {
            active: true,
            rising: false,
            falling: false,
            held: duration,
            magnitude: 1.0,
        }
    }

    // ==================== SpeedState Tests ====================

    #[test]
    fn test_initial_value_is_clamped() {
        let state = SpeedState::new(500.0, 5.0, 100.0);
        assert_eq!(state.get(), 100.0);
    }

    #[test]
    fn test_step_clamps_at_max() {
        let mut state = SpeedState::new(98.0, 5.0, 100.0);
        assert!(state.step(5.0));
        assert_eq!(state.get(), 100.0);
        assert!(!state.step(5.0));
        assert_eq!(state.get(), 100.0);
    }

    #[test]
    fn test_step_clamps_at_min() {
        let mut state = SpeedState::new(7.0, 5.0, 100.0);
        assert!(state.step(-5.0));
        assert_eq!(state.get(), 5.0);
        assert!(!state.step(-5.0));
        assert_eq!(state.get(), 5.0);
    }

    // ==================== SpeedControl Tests ====================

    #[test]
    fn test_single_press_steps_exactly_once() {
        let mut control = SpeedControl::from_settings(&settings());
        let initial_xy = control.xy();

        control.handle(&rising(), 1);
        assert_eq!(control.xy(), initial_xy + 5.0);

        // Held but short of the long-press window: no further steps
        control.handle(&held_for(Duration::from_millis(200)), 1);
        control.handle(&held_for(Duration::from_millis(400)), 1);
        assert_eq!(control.xy(), initial_xy + 5.0);
    }

    #[test]
    fn test_all_groups_step_together() {
        let mut control = SpeedControl::from_settings(&settings());
        let (xy, z, rpy) = (control.xy(), control.z(), control.rpy());

        control.handle(&rising(), 1);
        assert_eq!(control.xy(), xy + 5.0);
        assert_eq!(control.z(), z + 5.0);
        assert_eq!(control.rpy(), rpy + 5.0);
    }

    #[test]
    fn test_long_press_ramps_one_step_per_tick() {
        let mut control = SpeedControl::from_settings(&settings());
        let initial = control.xy();

        control.handle(&rising(), -1);
        assert_eq!(control.xy(), initial - 5.0);

        // Past the 0.8s window: every tick is a step
        let mut held = Duration::from_millis(800);
        for i in 1..=3 {
            control.handle(&held_for(held), -1);
            assert_eq!(control.xy(), initial - 5.0 - 5.0 * f64::from(i));
            held += TICK;
        }
    }

    #[test]
    fn test_ramp_respects_bounds() {
        let mut control = SpeedControl::from_settings(&settings());

        // Ramp down well past the floor
        control.handle(&rising(), -1);
        for i in 0..50 {
            control.handle(&held_for(Duration::from_millis(800) + TICK * i), -1);
        }
        assert_eq!(control.xy(), 5.0);
        assert_eq!(control.z(), 5.0);
        assert_eq!(control.rpy(), 5.0);
    }

    #[test]
    fn test_inactive_state_is_ignored() {
        let mut control = SpeedControl::from_settings(&settings());
        let initial = control.xy();

        let idle = ActionState {
            active: false,
            rising: false,
            falling: false,
            held: Duration::ZERO,
            magnitude: 0.0,
        };
        control.handle(&idle, 1);
        assert_eq!(control.xy(), initial);
    }
}
