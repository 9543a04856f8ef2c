use chrono::Duration;
use thiserror::Error;

/// Fixed shape of a quiz: how many question pages and how long each one lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    question_count: u32,
    question_duration: Duration,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be at least 1")]
    NoQuestions,
    #[error("question duration must be at least one second, got {secs}s")]
    DurationTooShort { secs: i64 },
}

impl QuizSettings {
    pub const DEFAULT_QUESTION_COUNT: u32 = 10;
    pub const DEFAULT_DURATION_SECS: i64 = 120;

    /// Build validated settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if there are no questions or the per-question
    /// duration is under one second.
    pub fn new(question_count: u32, duration_secs: i64) -> Result<Self, SettingsError> {
        if question_count == 0 {
            return Err(SettingsError::NoQuestions);
        }
        if duration_secs < 1 {
            return Err(SettingsError::DurationTooShort {
                secs: duration_secs,
            });
        }
        Ok(Self {
            question_count,
            question_duration: Duration::seconds(duration_secs),
        })
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn question_duration(&self) -> Duration {
        self.question_duration
    }

    /// Absolute deadline (epoch ms) for a question first shown at `now_millis`.
    #[must_use]
    pub fn deadline_from(&self, now_millis: i64) -> i64 {
        now_millis.saturating_add(self.question_duration.num_milliseconds())
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            question_count: Self::DEFAULT_QUESTION_COUNT,
            question_duration: Duration::seconds(Self::DEFAULT_DURATION_SECS),
        }
    }
}
