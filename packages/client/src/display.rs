//! Countdown / elapsed display.

/// What the status line currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTimer {
    /// Time left until `target_time` (coordinator epoch ms)
    Countdown { target_time: i64 },
    /// Media position, counted from `origin` (coordinator epoch ms of position 0)
    Elapsed { origin: i64 },
}

impl DisplayTimer {
    /// Render as `MM:SS` against the coordinator's current time
    pub fn render(&self, synced_now: i64) -> String {
        match *self {
            DisplayTimer::Countdown { target_time } => {
                let remaining = target_time.saturating_sub(synced_now).max(0);
                // round up so the last second shows 00:01, not 00:00
                format_mm_ss(remaining.unsigned_abs().div_ceil(1000))
            }
            DisplayTimer::Elapsed { origin } => {
                let elapsed = synced_now.saturating_sub(origin).max(0);
                format_mm_ss((elapsed / 1000) as u64)
            }
        }
    }

    fn is_finished(&self, synced_now: i64) -> bool {
        matches!(*self, DisplayTimer::Countdown { target_time } if target_time <= synced_now)
    }
}

pub fn format_mm_ss(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Holds the single active display timer.
///
/// Starting a timer replaces the previous one, and [`DisplayTicker::tick`]
/// only yields text when the rendered value changes.
#[derive(Debug, Default)]
pub struct DisplayTicker {
    active: Option<DisplayTimer>,
    last_rendered: Option<String>,
}

impl DisplayTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, timer: DisplayTimer) {
        self.active = Some(timer);
        self.last_rendered = None;
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.last_rendered = None;
    }

    pub fn active(&self) -> Option<DisplayTimer> {
        self.active
    }

    /// Advance the display; returns the new text if it changed.
    ///
    /// A countdown that reaches zero renders `00:00` once and then clears itself.
    pub fn tick(&mut self, synced_now: i64) -> Option<String> {
        let timer = self.active?;
        let text = timer.render(synced_now);
        if timer.is_finished(synced_now) {
            self.active = None;
        }

        if self.last_rendered.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last_rendered = Some(text.clone());
        Some(text)
    }
}
