use tracing::debug;

use crate::error::ValidationError;

pub const DEFAULT_POMODORO_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// What a single one-second tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Timer was not running; nothing happened.
    Idle,
    /// One second elapsed within the current phase.
    Counted,
    /// The countdown reached zero: the phase flipped and the counter was
    /// reloaded from the new phase's duration. `completed_focus` is true when
    /// the phase that just ended was a focus interval.
    PhaseEnded { completed_focus: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pomodoro_minutes: u32,
    break_minutes: u32,
    seconds_remaining: u32,
    is_running: bool,
    is_break: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            pomodoro_minutes: DEFAULT_POMODORO_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            seconds_remaining: DEFAULT_POMODORO_MINUTES * 60,
            is_running: false,
            is_break: false,
        }
    }
}

impl TimerState {
    pub fn new(pomodoro_minutes: u32, break_minutes: u32) -> Result<Self, ValidationError> {
        let mut state = Self::default();
        state.set_pomodoro_minutes(pomodoro_minutes)?;
        state.set_break_minutes(break_minutes)?;
        Ok(state)
    }

    pub fn pomodoro_minutes(&self) -> u32 {
        self.pomodoro_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_break(&self) -> bool {
        self.is_break
    }

    pub fn phase_label(&self) -> &'static str {
        if self.is_break { "Break" } else { "Focus" }
    }

    /// Idle -> Running in the same phase. No-op while already running.
    pub fn start(&mut self) {
        if !self.is_running {
            debug!(phase = self.phase_label(), "timer started");
            self.is_running = true;
        }
    }

    /// Running -> Idle in the same phase, keeping the counter where it is.
    pub fn pause(&mut self) {
        if self.is_running {
            debug!(
                phase = self.phase_label(),
                seconds_remaining = self.seconds_remaining,
                "timer paused"
            );
            self.is_running = false;
        }
    }

    pub fn toggle(&mut self) {
        if self.is_running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Back to an idle focus phase with a full pomodoro on the clock,
    /// whatever was going on before.
    pub fn reset(&mut self) {
        debug!("timer reset");
        self.is_running = false;
        self.is_break = false;
        self.seconds_remaining = self.pomodoro_minutes * 60;
    }

    /// Advances the countdown by one second. The tick that brings the counter
    /// to zero ends the phase: the phase flips, the counter reloads from the
    /// new phase's configured duration and the timer stays running.
    pub fn tick(&mut self) -> Tick {
        if !self.is_running {
            return Tick::Idle;
        }

        if self.seconds_remaining > 1 {
            self.seconds_remaining -= 1;
            return Tick::Counted;
        }

        let completed_focus = !self.is_break;
        self.is_break = !self.is_break;
        self.seconds_remaining = self.current_phase_minutes() * 60;
        debug!(
            phase = self.phase_label(),
            completed_focus, "phase ended, countdown reloaded"
        );
        Tick::PhaseEnded { completed_focus }
    }

    /// A new pomodoro duration takes effect on the countdown immediately when
    /// the timer sits idle in the focus phase; otherwise it applies from the
    /// next phase change or reset.
    pub fn set_pomodoro_minutes(&mut self, minutes: u32) -> Result<(), ValidationError> {
        if minutes == 0 {
            return Err(ValidationError::NonPositiveDuration(minutes.to_string()));
        }
        self.pomodoro_minutes = minutes;
        if !self.is_running && !self.is_break {
            self.seconds_remaining = minutes * 60;
        }
        Ok(())
    }

    /// Break duration changes never rewrite the countdown in place; they only
    /// feed the next break phase.
    pub fn set_break_minutes(&mut self, minutes: u32) -> Result<(), ValidationError> {
        if minutes == 0 {
            return Err(ValidationError::NonPositiveDuration(minutes.to_string()));
        }
        self.break_minutes = minutes;
        Ok(())
    }

    fn current_phase_minutes(&self) -> u32 {
        if self.is_break {
            self.break_minutes
        } else {
            self.pomodoro_minutes
        }
    }
}

/// Renders a second count as zero-padded `MM:SS`.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
