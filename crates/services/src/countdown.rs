use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use tokio::time::{Interval, MissedTickBehavior};

use quiz_core::countdown::{self, CountdownTick};
use quiz_core::model::{Page, QuizSettings};
use storage::repository::KeyValueStore;

use crate::Clock;
use crate::error::CountdownError;
use crate::state::QuizState;

/// Where the remaining time is shown. Pages without one get no countdown.
pub trait CountdownDisplay: Send {
    fn render(&mut self, text: &str);
}

/// Waits until the next frame should be drawn.
///
/// The clock is handed over so test tickers can move fixed time forward.
#[async_trait]
pub trait FrameTicker: Send {
    async fn next_frame(&mut self, clock: &mut Clock);
}

/// Real-time ticker firing at display-refresh cadence.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub const FRAME: StdDuration = StdDuration::from_millis(16);

    /// Ticker at roughly 60 frames per second. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn per_frame() -> Self {
        Self::every(Self::FRAME)
    }

    /// # Panics
    ///
    /// Panics if `period` is zero.
    #[must_use]
    pub fn every(period: StdDuration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait]
impl FrameTicker for IntervalTicker {
    async fn next_frame(&mut self, _clock: &mut Clock) {
        self.interval.tick().await;
    }
}

/// Deterministic ticker that advances a fixed clock by `step` per frame.
#[derive(Debug, Clone)]
pub struct ManualTicker {
    step: Duration,
    frames: u64,
}

impl ManualTicker {
    #[must_use]
    pub fn new(step: Duration) -> Self {
        Self { step, frames: 0 }
    }

    /// Frames waited for so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[async_trait]
impl FrameTicker for ManualTicker {
    async fn next_frame(&mut self, clock: &mut Clock) {
        self.frames += 1;
        clock.advance(self.step);
    }
}

/// Drives the per-question countdown and decides where expiry leads.
#[derive(Clone)]
pub struct CountdownController {
    clock: Clock,
    settings: QuizSettings,
    state: QuizState,
}

impl CountdownController {
    #[must_use]
    pub fn new(clock: Clock, settings: QuizSettings, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            settings,
            state: QuizState::new(store),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Evaluate the stored deadline at the controller's current time.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::Storage` on backend failures.
    pub async fn current(&self) -> Result<CountdownTick, CountdownError> {
        self.tick_at(&self.clock).await
    }

    /// Run the countdown for `page` until it expires.
    ///
    /// Returns `None` when the countdown does not apply (not a question page,
    /// or no display), otherwise the page to navigate to after expiry. The
    /// deadline is re-read from the store on every frame.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::Storage` on backend failures.
    pub async fn run(
        &self,
        page: Page,
        display: Option<&mut dyn CountdownDisplay>,
        ticker: &mut dyn FrameTicker,
    ) -> Result<Option<Page>, CountdownError> {
        let Some(index) = page.question_index() else {
            return Ok(None);
        };
        let Some(display) = display else {
            tracing::debug!(question = index.get(), "no countdown display on page");
            return Ok(None);
        };

        let mut clock = self.clock;
        loop {
            let tick = self.tick_at(&clock).await?;
            display.render(&tick.display());
            if tick.is_expired() {
                let target = Page::after_expiry(Some(index), self.settings.question_count());
                tracing::info!(question = index.get(), %target, "time is up, advancing");
                return Ok(Some(target));
            }
            ticker.next_frame(&mut clock).await;
        }
    }

    async fn tick_at(&self, clock: &Clock) -> Result<CountdownTick, CountdownError> {
        let deadline = self.state.deadline_millis().await?;
        Ok(countdown::evaluate(deadline, clock.now_millis()))
    }
}
