//! Pure countdown arithmetic shared by the controller and the page view.

/// Whether a question still has time on the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Running,
    Expired,
}

/// One evaluation of the countdown against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining_secs: i64,
    pub state: CountdownState,
}

impl CountdownTick {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }

    /// `MM:SS`, zero padded.
    #[must_use]
    pub fn display(&self) -> String {
        format_remaining(self.remaining_secs)
    }
}

/// Whole seconds left until `deadline_millis`, floored and clamped at zero.
///
/// Under one second left already counts as expired.
#[must_use]
pub fn evaluate(deadline_millis: i64, now_millis: i64) -> CountdownTick {
    let remaining_secs = deadline_millis
        .saturating_sub(now_millis)
        .div_euclid(1000)
        .max(0);
    let state = if remaining_secs <= 0 {
        CountdownState::Expired
    } else {
        CountdownState::Running
    };
    CountdownTick {
        remaining_secs,
        state,
    }
}

/// Render seconds as `MM:SS`. Minutes keep growing past two digits.
#[must_use]
pub fn format_remaining(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
