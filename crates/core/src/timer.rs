//! Countdown state machine for a timed attempt.
//!
//! The controller is a pure state machine: the 1-second scheduling lives in
//! the services runtime, which calls [`TimerController::tick`] once per
//! elapsed second. Expiry is reported as a return value exactly once; the
//! state is terminal afterwards, so a late `resume()` can never revive a
//! finished countdown.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// The timer is idle, paused, or already stopped; nothing changed.
    Inactive,
    /// The counter decremented; seconds now remaining.
    Running(u32),
    /// The countdown just reached zero. Reported exactly once.
    Expired,
}

/// One-tick-per-second countdown over a server-provided duration.
///
/// Independent of any question state; it only owns the remaining-seconds
/// counter. Pausing exists for the start/resume confirmation screen — the
/// clock otherwise runs regardless of focus, because exam time is wall-clock
/// time, not attention time.
#[derive(Debug, Clone)]
pub struct TimerController {
    remaining: u32,
    state: TimerState,
}

impl Default for TimerController {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            remaining: 0,
            state: TimerState::Idle,
        }
    }

    /// Begin counting down from `initial_seconds`.
    ///
    /// No-op once the timer has stopped: a finished countdown is terminal.
    /// Starting at zero is allowed; the first tick reports expiry.
    pub fn start(&mut self, initial_seconds: u32) {
        if self.state == TimerState::Stopped {
            return;
        }
        self.remaining = initial_seconds;
        self.state = TimerState::Running;
    }

    /// Suspend ticking. Only meaningful while running.
    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    /// Resume a paused countdown. No-op in every other state, including
    /// after expiry.
    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
        }
    }

    /// Stop the countdown without reporting expiry.
    ///
    /// Used on explicit completion so later ticks become no-ops. Terminal.
    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TimerTick {
        match self.state {
            TimerState::Running => {
                self.remaining = self.remaining.saturating_sub(1);
                if self.remaining == 0 {
                    self.state = TimerState::Stopped;
                    TimerTick::Expired
                } else {
                    TimerTick::Running(self.remaining)
                }
            }
            TimerState::Idle | TimerState::Paused | TimerState::Stopped => TimerTick::Inactive,
        }
    }

    /// Seconds left on the counter.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Returns true once the countdown has reached its terminal state.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state == TimerState::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_expiry_exactly_once() {
        let mut timer = TimerController::new();
        timer.start(3);

        assert_eq!(timer.tick(), TimerTick::Running(2));
        assert_eq!(timer.tick(), TimerTick::Running(1));
        assert_eq!(timer.tick(), TimerTick::Expired);
        // Further ticks never re-report expiry.
        assert_eq!(timer.tick(), TimerTick::Inactive);
        assert_eq!(timer.remaining(), 0);
        assert!(timer.is_stopped());
    }

    #[test]
    fn pause_suspends_ticks() {
        let mut timer = TimerController::new();
        timer.start(10);
        timer.pause();

        assert_eq!(timer.tick(), TimerTick::Inactive);
        assert_eq!(timer.remaining(), 10);

        timer.resume();
        assert_eq!(timer.tick(), TimerTick::Running(9));
    }

    #[test]
    fn resume_after_expiry_is_a_no_op() {
        let mut timer = TimerController::new();
        timer.start(1);
        assert_eq!(timer.tick(), TimerTick::Expired);

        timer.resume();
        assert_eq!(timer.tick(), TimerTick::Inactive);
        assert!(!timer.is_running());
    }

    #[test]
    fn start_after_stop_is_a_no_op() {
        let mut timer = TimerController::new();
        timer.start(5);
        timer.stop();

        timer.start(100);
        assert_eq!(timer.tick(), TimerTick::Inactive);
        assert_eq!(timer.remaining(), 5);
    }

    #[test]
    fn starting_at_zero_expires_on_first_tick() {
        let mut timer = TimerController::new();
        timer.start(0);
        assert_eq!(timer.tick(), TimerTick::Expired);
        assert_eq!(timer.tick(), TimerTick::Inactive);
    }
}
