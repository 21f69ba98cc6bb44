//! Wheel-gesture smoothing
//!
//! Raw wheel events arrive in hardware-dependent bursts; stepping the
//! viewer once per event would be unusably fast. The smoother
//! accumulates deltas and converts every `sensitivity` units into one
//! discrete offset step, discarding overshoot so a hard flick does not
//! keep stepping after the gesture ends.

use crate::error::Result;
use crate::prefetch::PrefetchController;

/// Accumulates wheel deltas into discrete offset steps
#[derive(Clone, Copy, Debug)]
pub struct WheelSmoother {
    delta: i32,
    sensitivity: i32,
}

impl WheelSmoother {
    /// Create a smoother that steps once per `sensitivity` delta units.
    pub fn new(sensitivity: i32) -> Self {
        Self {
            delta: 0,
            sensitivity,
        }
    }

    /// The current accumulated delta, saturated to `[-S, S]`.
    pub fn delta(&self) -> i32 {
        self.delta
    }

    /// Feed one wheel event into the controller.
    ///
    /// Returns true when the event produced an offset step. No-op when
    /// the window holds a single (non-sequenced) resource. A step resets
    /// the accumulator to zero; overshoot past the threshold is
    /// discarded, not carried into the next gesture. Stepping below
    /// offset zero is not possible; the accumulator saturates instead.
    pub async fn on_wheel(
        &mut self,
        delta_y: i32,
        controller: &mut PrefetchController,
    ) -> Result<bool> {
        if controller.is_single() {
            return Ok(false);
        }

        let accumulated = self.delta.saturating_add(delta_y);
        if accumulated >= self.sensitivity {
            self.delta = 0;
            controller.set_offset(controller.offset() + 1).await?;
            Ok(true)
        } else if accumulated <= -self.sensitivity && controller.offset() > 0 {
            self.delta = 0;
            controller.set_offset(controller.offset() - 1).await?;
            Ok(true)
        } else {
            self.delta = accumulated.clamp(-self.sensitivity, self.sensitivity);
            Ok(false)
        }
    }
}
