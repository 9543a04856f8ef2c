use std::sync::Arc;

use quiz_core::model::{Participant, QuestionIndex, QuizSettings, SessionSnapshot};
use storage::repository::KeyValueStore;

use crate::Clock;
use crate::error::SessionError;
use crate::state::QuizState;

/// Participant identity, score and session start/reset.
#[derive(Clone)]
pub struct SessionService {
    clock: Clock,
    settings: QuizSettings,
    state: QuizState,
}

impl SessionService {
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

    /// The registered participant, or the "Student" placeholder.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn participant(&self) -> Result<Participant, SessionError> {
        Ok(self.state.participant().await?.unwrap_or_default())
    }

    /// Whether somebody registered in this store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn is_registered(&self) -> Result<bool, SessionError> {
        Ok(self.state.has_participant().await?)
    }

    /// Register a participant and restart the quiz from question 1 with a
    /// full timer. Any earlier session in the store is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn start_session(
        &self,
        name: impl Into<String>,
        attendance_number: impl Into<String>,
        class_label: impl Into<String>,
    ) -> Result<Participant, SessionError> {
        let participant = Participant::new(name, attendance_number, class_label);
        let deadline = self.settings.deadline_from(self.clock.now_millis());

        self.state.set_participant(&participant).await?;
        self.state.set_score(0).await?;
        self.state.set_furthest(QuestionIndex::FIRST).await?;
        self.state.set_deadline_millis(deadline).await?;

        tracing::info!(
            name = %participant.name,
            class = %participant.class_label,
            deadline,
            "started quiz session"
        );
        Ok(participant)
    }

    /// Add `points` to the stored score and return the new total.
    ///
    /// A missing or malformed score counts as 0. Negative points are applied
    /// as given.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn add_score(&self, points: i64) -> Result<i64, SessionError> {
        let total = self.state.score().await?.saturating_add(points);
        self.state.set_score(total).await?;
        tracing::debug!(points, total, "updated score");
        Ok(total)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn score(&self) -> Result<i64, SessionError> {
        Ok(self.state.score().await?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        Ok(self.state.snapshot().await?)
    }

    /// Forget the participant and all progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.state.clear().await?;
        tracing::info!("cleared quiz session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::keys;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryStore;

    fn service() -> (InMemoryStore, SessionService) {
        let store = InMemoryStore::new();
        let service = SessionService::new(
            fixed_clock(),
            QuizSettings::default(),
            Arc::new(store.clone()),
        );
        (store, service)
    }

    #[tokio::test]
    async fn placeholder_participant_before_registration() {
        let (_store, service) = service();
        assert!(!service.is_registered().await.unwrap());
        assert_eq!(
            service.participant().await.unwrap(),
            Participant::placeholder()
        );
    }

    #[tokio::test]
    async fn start_session_resets_progress_and_timer() {
        let (store, service) = service();
        store.set(keys::TOTAL_SCORE, "40").await.unwrap();
        store.set(keys::FURTHEST_INDEX, "7").await.unwrap();

        let participant = service.start_session("Ana", "12", "X").await.unwrap();

        assert_eq!(participant, Participant::new("Ana", "12", "X"));
        assert!(service.is_registered().await.unwrap());
        assert_eq!(service.participant().await.unwrap(), participant);

        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.furthest, QuestionIndex::FIRST);
        assert_eq!(
            snapshot.deadline_millis,
            fixed_now().timestamp_millis() + 120_000
        );
    }

    #[tokio::test]
    async fn start_session_keeps_last_visited_index() {
        let (store, service) = service();
        store.set(keys::LAST_VISITED_INDEX, "5").await.unwrap();

        service.start_session("Ana", "12", "X").await.unwrap();

        assert_eq!(service.snapshot().await.unwrap().last_visited, 5);
    }

    #[tokio::test]
    async fn add_score_accumulates_signed_points() {
        let (_store, service) = service();
        assert_eq!(service.add_score(5).await.unwrap(), 5);
        assert_eq!(service.add_score(-2).await.unwrap(), 3);
        assert_eq!(service.score().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn add_score_treats_garbage_as_zero() {
        let (store, service) = service();
        store.set(keys::TOTAL_SCORE, "NaN").await.unwrap();
        assert_eq!(service.add_score(10).await.unwrap(), 10);
        assert_eq!(
            store.get(keys::TOTAL_SCORE).await.unwrap().as_deref(),
            Some("10")
        );
    }

    #[tokio::test]
    async fn reset_forgets_participant() {
        let (_store, service) = service();
        service.start_session("Ana", "12", "X").await.unwrap();
        service.reset().await.unwrap();
        assert!(!service.is_registered().await.unwrap());
        assert_eq!(service.score().await.unwrap(), 0);
    }
}
