use serde::Serialize;

use crate::config::StudyHallConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Focus,
    Break,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    SessionEnded { next: SessionMode, message: &'static str },
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerSnapshot {
    pub mode: SessionMode,
    pub minutes: u32,
    pub seconds: u32,
    pub active: bool,
    pub display: String,
}

/// Pomodoro countdown: a focus session followed by a short break, forever.
/// The timer stops itself whenever a session runs out.
#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    focus_minutes: u32,
    break_minutes: u32,
    mode: SessionMode,
    minutes: u32,
    seconds: u32,
    active: bool,
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::new(&StudyHallConfig::default())
    }
}

impl PomodoroTimer {
    pub fn new(config: &StudyHallConfig) -> Self {
        Self {
            focus_minutes: config.focus_minutes,
            break_minutes: config.break_minutes,
            mode: SessionMode::Focus,
            minutes: config.focus_minutes,
            seconds: 0,
            active: false,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn pause(&mut self) {
        self.active = false;
    }

    pub fn toggle(&mut self) {
        self.active = !self.active;
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.mode = SessionMode::Focus;
        self.minutes = self.focus_minutes;
        self.seconds = 0;
    }

    fn session_minutes(&self, mode: SessionMode) -> u32 {
        match mode {
            SessionMode::Focus => self.focus_minutes,
            SessionMode::Break => self.break_minutes,
        }
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.active {
            return None;
        }

        if self.seconds > 0 {
            self.seconds -= 1;
            return None;
        }

        if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
            return None;
        }

        let next = match self.mode {
            SessionMode::Focus => SessionMode::Break,
            SessionMode::Break => SessionMode::Focus,
        };
        self.mode = next;
        self.minutes = self.session_minutes(next);
        self.seconds = 0;
        self.active = false;

        let message = match next {
            SessionMode::Focus => "Break over! Time to study.",
            SessionMode::Break => "Great work! Take a short break.",
        };
        Some(TimerEvent::SessionEnded { next, message })
    }

    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            minutes: self.minutes,
            seconds: self.seconds,
            active: self.active,
            display: self.display(),
        }
    }
}
