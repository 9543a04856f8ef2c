//! Typed access to the quiz keys in the persistent store.
//!
//! Every read goes back to the store; nothing is cached between calls.

use std::sync::Arc;

use quiz_core::model::{Participant, QuestionIndex, SessionSnapshot};
use storage::repository::{KeyValueStore, StorageError};

/// Store keys. Values are plain text.
pub mod keys {
    pub const PARTICIPANT: &str = "quiz_user";
    pub const TOTAL_SCORE: &str = "totalScore";
    pub const FURTHEST_INDEX: &str = "quiz_max_index";
    pub const LAST_VISITED_INDEX: &str = "quiz_last_index";
    pub const DEADLINE: &str = "quiz_endTime";

    pub const ALL: [&str; 5] = [
        PARTICIPANT,
        TOTAL_SCORE,
        FURTHEST_INDEX,
        LAST_VISITED_INDEX,
        DEADLINE,
    ];
}

/// Parse the leading integer of `raw`.
///
/// Accepts leading whitespace, an optional sign and then digits, ignoring
/// anything after them (`"12abc"` is 12). Returns `None` when there are no
/// digits or the value does not fit in `i64`.
#[must_use]
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits_end == 0 {
        return None;
    }
    let digits = &unsigned[..digits_end];
    if negative {
        format!("-{digits}").parse().ok()
    } else {
        digits.parse().ok()
    }
}

#[derive(Clone)]
pub struct QuizState {
    store: Arc<dyn KeyValueStore>,
}

impl QuizState {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Whether any participant record exists, parseable or not.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn has_participant(&self) -> Result<bool, StorageError> {
        Ok(self.store.get(keys::PARTICIPANT).await?.is_some())
    }

    /// The stored participant, or `None` if absent or unreadable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn participant(&self) -> Result<Option<Participant>, StorageError> {
        let Some(raw) = self.store.get(keys::PARTICIPANT).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Participant>(&raw) {
            Ok(participant) => Ok(Some(participant)),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed participant record");
                Ok(None)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or written.
    pub async fn set_participant(&self, participant: &Participant) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(participant)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.store.set(keys::PARTICIPANT, &encoded).await
    }

    /// Cumulative score, `0` when absent or malformed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn score(&self) -> Result<i64, StorageError> {
        Ok(self.read_int(keys::TOTAL_SCORE).await?.unwrap_or(0))
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn set_score(&self, score: i64) -> Result<(), StorageError> {
        self.store
            .set(keys::TOTAL_SCORE, &score.to_string())
            .await
    }

    /// Progress watermark, question 1 when absent, malformed or not positive.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn furthest(&self) -> Result<QuestionIndex, StorageError> {
        let furthest = self
            .read_int(keys::FURTHEST_INDEX)
            .await?
            .and_then(|value| u32::try_from(value).ok())
            .and_then(|value| QuestionIndex::new(value).ok())
            .unwrap_or(QuestionIndex::FIRST);
        Ok(furthest)
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn set_furthest(&self, index: QuestionIndex) -> Result<(), StorageError> {
        self.store
            .set(keys::FURTHEST_INDEX, &index.to_string())
            .await
    }

    /// Question shown on the previous load, `0` when none is known.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn last_visited(&self) -> Result<u32, StorageError> {
        let last = self
            .read_int(keys::LAST_VISITED_INDEX)
            .await?
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(0);
        Ok(last)
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn set_last_visited(&self, index: QuestionIndex) -> Result<(), StorageError> {
        self.store
            .set(keys::LAST_VISITED_INDEX, &index.to_string())
            .await
    }

    /// Deadline in epoch milliseconds, `0` (already expired) when unusable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn deadline_millis(&self) -> Result<i64, StorageError> {
        Ok(self.read_int(keys::DEADLINE).await?.unwrap_or(0))
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn set_deadline_millis(&self, deadline: i64) -> Result<(), StorageError> {
        self.store.set(keys::DEADLINE, &deadline.to_string()).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, StorageError> {
        Ok(SessionSnapshot {
            score: self.score().await?,
            furthest: self.furthest().await?,
            last_visited: self.last_visited().await?,
            deadline_millis: self.deadline_millis().await?,
        })
    }

    /// Remove every quiz key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn clear(&self) -> Result<(), StorageError> {
        for key in keys::ALL {
            self.store.remove(key).await?;
        }
        Ok(())
    }

    async fn read_int(&self, key: &str) -> Result<Option<i64>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        let parsed = parse_leading_int(&raw);
        if parsed.is_none() {
            tracing::debug!(key, raw = %raw, "stored value is not an integer, using default");
        }
        Ok(parsed)
    }
}
