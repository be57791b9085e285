//! # Device Snapshot Module
//!
//! A [`DeviceSnapshot`] is the per-tick view of the physical gamepad: the
//! boolean state of every indexed button, the (x, y) state of every hat and
//! the [-1, 1] value of every analog axis. The control core depends only on
//! this shape; how it is filled (evdev, tests, replay) is up to the caller.

/// Raw gamepad state sampled once per control tick.
///
/// A lost or disconnected device is represented by an empty snapshot, which
/// makes every binding inactive and stops all motion without erroring.
///
/// # Examples
///
/// ```
/// use teleop_bridge::input::snapshot::DeviceSnapshot;
///
/// let snapshot = DeviceSnapshot::default();
/// assert!(!snapshot.button(0));
/// assert_eq!(snapshot.hat(0), (0, 0));
/// assert_eq!(snapshot.axis(0), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceSnapshot {
    /// Pressed state per button index.
    pub buttons: Vec<bool>,
    /// (x, y) state per hat index, each component in {-1, 0, 1}.
    pub hats: Vec<(i8, i8)>,
    /// Value per analog axis index, in [-1.0, 1.0].
    pub axes: Vec<f32>,
}

impl DeviceSnapshot {
    /// Creates a snapshot sized for a device's reported capabilities,
    /// everything released/centered.
    #[must_use]
    pub fn with_capacity(buttons: usize, hats: usize, axes: usize) -> Self {
        Self {
            buttons: vec![false; buttons],
            hats: vec![(0, 0); hats],
            axes: vec![0.0; axes],
        }
    }

    /// Button state; out-of-range indices read as released.
    #[must_use]
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    /// Hat state; out-of-range indices read as centered.
    #[must_use]
    pub fn hat(&self, index: usize) -> (i8, i8) {
        self.hats.get(index).copied().unwrap_or((0, 0))
    }

    /// Axis value; out-of-range indices read as 0.0.
    #[must_use]
    pub fn axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    /// Resets everything to released/centered, keeping the sizes.
    pub fn clear(&mut self) {
        self.buttons.iter_mut().for_each(|b| *b = false);
        self.hats.iter_mut().for_each(|h| *h = (0, 0));
        self.axes.iter_mut().for_each(|a| *a = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_empty() {
        let snapshot = DeviceSnapshot::default();
        assert!(snapshot.buttons.is_empty());
        assert!(snapshot.hats.is_empty());
        assert!(snapshot.axes.is_empty());
    }

    #[test]
    fn test_with_capacity() {
        let snapshot = DeviceSnapshot::with_capacity(12, 1, 6);
        assert_eq!(snapshot.buttons.len(), 12);
        assert_eq!(snapshot.hats.len(), 1);
        assert_eq!(snapshot.axes.len(), 6);
        assert!(!snapshot.button(11));
    }

    #[test]
    fn test_out_of_range_reads_are_inactive() {
        let snapshot = DeviceSnapshot::with_capacity(2, 1, 2);
        assert!(!snapshot.button(99));
        assert_eq!(snapshot.hat(99), (0, 0));
        assert_eq!(snapshot.axis(99), 0.0);
    }

    #[test]
    fn test_clear_keeps_sizes() {
        let mut snapshot = DeviceSnapshot::with_capacity(2, 1, 2);
        snapshot.buttons[0] = true;
        snapshot.hats[0] = (1, -1);
        snapshot.axes[1] = 0.7;

        snapshot.clear();

        assert_eq!(snapshot.buttons.len(), 2);
        assert!(!snapshot.button(0));
        assert_eq!(snapshot.hat(0), (0, 0));
        assert_eq!(snapshot.axis(1), 0.0);
    }
}
