//! Repaint scheduling for timer-driven slowOS widgets
//!
//! egui is an immediate-mode GUI: every frame redraws everything, and by
//! default egui only wakes up on input. Widgets that animate on their own
//! (eyes following the pointer, blink timers, a tracker updater) need the
//! frame loop to come back at their next deadline, and no sooner.
//!
//! `RepaintController` collects those deadlines during a frame and, at the
//! end of it, asks egui for exactly one wake-up at the earliest of them:
//!
//! 1. **Dirty**: something changed and must be shown now.
//! 2. **Timed**: a timer is pending. Wake up when it is due.
//! 3. **Idle**: nothing pending. Sleep until the next input event.

use std::time::{Duration, Instant};

/// Never wake up more often than this, whatever the timers ask for.
const MIN_WAKE_INTERVAL: Duration = Duration::from_millis(5);

/// Controls when the egui context should request repaints.
///
/// Call [`begin_frame`](Self::begin_frame) at the top of `update()`, feed
/// it deadlines with [`wake_at`](Self::wake_at) while running widgets, and
/// call [`end_frame`](Self::end_frame) at the bottom.
#[derive(Debug)]
pub struct RepaintController {
    /// Whether an immediate repaint has been requested.
    needs_repaint: bool,
    /// Earliest deadline reported during this frame.
    next_wake: Option<Instant>,
    /// Deadline requested by the previous frame.
    pending_wake: Option<Instant>,
}

impl Default for RepaintController {
    fn default() -> Self {
        Self::new()
    }
}

impl RepaintController {
    pub fn new() -> Self {
        Self {
            needs_repaint: false,
            next_wake: None,
            pending_wake: None,
        }
    }

    /// Request a repaint as soon as possible.
    pub fn mark_needs_repaint(&mut self) {
        self.needs_repaint = true;
    }

    /// Report a deadline; the earliest one wins.
    pub fn wake_at(&mut self, deadline: Instant) {
        self.next_wake = Some(match self.next_wake {
            Some(current) => current.min(deadline),
            None => deadline,
        });
    }

    /// Report an optional deadline, e.g. straight from `TimerSet::next_due`.
    pub fn wake_at_opt(&mut self, deadline: Option<Instant>) {
        if let Some(deadline) = deadline {
            self.wake_at(deadline);
        }
    }

    /// Start a frame: forget the deadlines reported by the last one.
    pub fn begin_frame(&mut self) {
        self.next_wake = None;
    }

    /// Schedule the next frame from everything reported during this one.
    pub fn end_frame(&mut self, ctx: &egui::Context) {
        if self.needs_repaint {
            self.needs_repaint = false;
            ctx.request_repaint();
        }
        self.pending_wake = self.next_wake;
        if let Some(delay) = self.delay_until_wake(Instant::now()) {
            ctx.request_repaint_after(delay);
        }
    }

    /// Delay egui should wait before the next frame, if any timer is pending.
    pub fn delay_until_wake(&self, now: Instant) -> Option<Duration> {
        self.pending_wake
            .map(|due| due.saturating_duration_since(now).max(MIN_WAKE_INTERVAL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earliest_deadline_wins() {
        let t0 = Instant::now();
        let mut rc = RepaintController::new();
        rc.wake_at(t0 + Duration::from_millis(300));
        rc.wake_at(t0 + Duration::from_millis(40));
        rc.wake_at_opt(None);
        rc.pending_wake = rc.next_wake;
        assert_eq!(rc.delay_until_wake(t0), Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_overdue_deadline_is_floored() {
        let t0 = Instant::now();
        let mut rc = RepaintController::new();
        rc.wake_at(t0);
        rc.pending_wake = rc.next_wake;
        assert_eq!(
            rc.delay_until_wake(t0 + Duration::from_secs(1)),
            Some(MIN_WAKE_INTERVAL)
        );
    }

    #[test]
    fn test_idle_has_no_wake() {
        let rc = RepaintController::new();
        assert_eq!(rc.delay_until_wake(Instant::now()), None);
    }

    #[test]
    fn test_dirty_repaint_is_requested_once() {
        let ctx = egui::Context::default();
        let mut rc = RepaintController::new();
        rc.begin_frame();
        rc.mark_needs_repaint();
        assert!(rc.needs_repaint);
        rc.end_frame(&ctx);
        assert!(!rc.needs_repaint);
        assert_eq!(rc.delay_until_wake(Instant::now()), None);
    }

    #[test]
    fn test_begin_frame_drops_old_deadlines() {
        let t0 = Instant::now();
        let ctx = egui::Context::default();
        let mut rc = RepaintController::new();
        rc.wake_at(t0 + Duration::from_millis(30));
        rc.end_frame(&ctx);
        assert!(rc.delay_until_wake(t0).is_some());

        rc.begin_frame();
        rc.end_frame(&ctx);
        assert_eq!(rc.delay_until_wake(t0), None);
    }
}
