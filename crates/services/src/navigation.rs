use std::sync::Arc;

use quiz_core::model::{Page, QuizSettings};
use storage::repository::KeyValueStore;

use crate::Clock;
use crate::error::NavigationError;
use crate::state::QuizState;

/// Outcome of the guard for one page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Stay,
    Redirect(Page),
}

impl GuardDecision {
    #[must_use]
    pub fn redirect_target(&self) -> Option<Page> {
        match self {
            Self::Stay => None,
            Self::Redirect(page) => Some(*page),
        }
    }

    /// Hand a redirect to the host. Returns `true` if navigation happened.
    pub fn apply(self, navigator: &mut dyn Navigator) -> bool {
        match self {
            Self::Stay => false,
            Self::Redirect(page) => {
                navigator.navigate(page);
                true
            }
        }
    }
}

/// Host side of a redirect (window location, terminal, test recorder).
pub trait Navigator {
    fn navigate(&mut self, target: Page);
}

/// Enforces one-way, in-order progression through the question pages.
#[derive(Clone)]
pub struct NavigationGuard {
    clock: Clock,
    settings: QuizSettings,
    state: QuizState,
}

impl NavigationGuard {
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

    /// Full guard protocol for a page load: authentication, then progress.
    ///
    /// `None` means the path is not part of the quiz and nothing is checked.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Storage` on backend failures.
    pub async fn on_page_load(&self, page: Option<Page>) -> Result<GuardDecision, NavigationError> {
        match self.authenticate(page).await? {
            GuardDecision::Stay => self.reconcile(page).await,
            redirect => Ok(redirect),
        }
    }

    /// Send unregistered visitors of question pages to the entry page.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Storage` on backend failures.
    pub async fn authenticate(&self, page: Option<Page>) -> Result<GuardDecision, NavigationError> {
        let Some(Page::Question(index)) = page else {
            return Ok(GuardDecision::Stay);
        };
        if self.state.has_participant().await? {
            return Ok(GuardDecision::Stay);
        }
        tracing::info!(question = index.get(), "no participant registered, redirecting to entry");
        Ok(GuardDecision::Redirect(Page::Entry))
    }

    /// Reconcile the declared question index with stored progress.
    ///
    /// Runs in a fixed order: a question index different from the previous
    /// load restarts the timer and becomes the last visited index, even when
    /// the next step redirects away; then an index behind the watermark
    /// redirects to the watermark; finally an index ahead of it moves it.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Storage` on backend failures.
    pub async fn reconcile(&self, page: Option<Page>) -> Result<GuardDecision, NavigationError> {
        let Some(index) = page.and_then(|page| page.question_index()) else {
            return Ok(GuardDecision::Stay);
        };

        let furthest = self.state.furthest().await?;
        let last_visited = self.state.last_visited().await?;

        if index.get() != last_visited {
            let deadline = self.settings.deadline_from(self.clock.now_millis());
            self.state.set_deadline_millis(deadline).await?;
            self.state.set_last_visited(index).await?;
            tracing::debug!(question = index.get(), deadline, "arrived at new question");
        }

        if index < furthest {
            tracing::info!(
                question = index.get(),
                furthest = furthest.get(),
                "blocked backward navigation"
            );
            return Ok(GuardDecision::Redirect(Page::Question(furthest)));
        }

        if index > furthest {
            self.state.set_furthest(index).await?;
            tracing::debug!(question = index.get(), "advanced progress watermark");
        }

        Ok(GuardDecision::Stay)
    }

    /// Where to go when the current question's time runs out.
    #[must_use]
    pub fn advance(&self, current: Option<Page>) -> Page {
        Page::after_expiry(
            current.and_then(|page| page.question_index()),
            self.settings.question_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::keys;
    use chrono::Duration;
    use quiz_core::model::QuestionIndex;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryStore;

    fn q(value: u32) -> Page {
        Page::Question(QuestionIndex::new(value).unwrap())
    }

    async fn registered() -> (InMemoryStore, NavigationGuard) {
        let store = InMemoryStore::new();
        store
            .set(
                keys::PARTICIPANT,
                r#"{"name":"Ana","attendanceNumber":"12","classLabel":"X"}"#,
            )
            .await
            .unwrap();
        let guard = NavigationGuard::new(
            fixed_clock(),
            QuizSettings::default(),
            Arc::new(store.clone()),
        );
        (store, guard)
    }

    async fn read(store: &InMemoryStore, key: &str) -> Option<String> {
        store.get(key).await.unwrap()
    }

    #[derive(Default)]
    struct Recorder(Vec<Page>);

    impl Navigator for Recorder {
        fn navigate(&mut self, target: Page) {
            self.0.push(target);
        }
    }

    #[tokio::test]
    async fn unregistered_visitor_is_sent_to_entry() {
        let store = InMemoryStore::new();
        let guard = NavigationGuard::new(
            fixed_clock(),
            QuizSettings::default(),
            Arc::new(store.clone()),
        );

        let decision = guard.on_page_load(Some(q(3))).await.unwrap();

        assert_eq!(decision, GuardDecision::Redirect(Page::Entry));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn entry_completion_and_foreign_pages_are_exempt() {
        let store = InMemoryStore::new();
        let guard = NavigationGuard::new(
            fixed_clock(),
            QuizSettings::default(),
            Arc::new(store.clone()),
        );
        for page in [Some(Page::Entry), Some(Page::Completion), None] {
            assert_eq!(guard.on_page_load(page).await.unwrap(), GuardDecision::Stay);
        }
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn first_arrival_resets_deadline_and_reload_does_not() {
        let (store, guard) = registered().await;
        guard.on_page_load(Some(q(1))).await.unwrap();
        let first = read(&store, keys::DEADLINE).await;
        assert_eq!(
            first,
            Some((fixed_now().timestamp_millis() + 120_000).to_string())
        );
        assert_eq!(read(&store, keys::LAST_VISITED_INDEX).await.as_deref(), Some("1"));

        let mut later = fixed_clock();
        later.advance(Duration::seconds(30));
        let guard = guard.with_clock(later);
        assert_eq!(guard.on_page_load(Some(q(1))).await.unwrap(), GuardDecision::Stay);
        assert_eq!(read(&store, keys::DEADLINE).await, first);
    }

    #[tokio::test]
    async fn advancing_moves_watermark_and_restarts_timer() {
        let (store, guard) = registered().await;
        guard.on_page_load(Some(q(1))).await.unwrap();

        let mut later = fixed_clock();
        later.advance(Duration::seconds(45));
        let guard = guard.with_clock(later);
        assert_eq!(guard.on_page_load(Some(q(2))).await.unwrap(), GuardDecision::Stay);

        assert_eq!(read(&store, keys::FURTHEST_INDEX).await.as_deref(), Some("2"));
        assert_eq!(
            read(&store, keys::DEADLINE).await,
            Some((later.now_millis() + 120_000).to_string())
        );
    }

    #[tokio::test]
    async fn backward_visit_redirects_but_still_touches_timer() {
        let (store, guard) = registered().await;
        store.set(keys::FURTHEST_INDEX, "5").await.unwrap();
        store.set(keys::LAST_VISITED_INDEX, "5").await.unwrap();
        store.set(keys::DEADLINE, "42").await.unwrap();

        let decision = guard.on_page_load(Some(q(2))).await.unwrap();

        assert_eq!(decision, GuardDecision::Redirect(q(5)));
        assert_eq!(read(&store, keys::FURTHEST_INDEX).await.as_deref(), Some("5"));
        assert_eq!(read(&store, keys::LAST_VISITED_INDEX).await.as_deref(), Some("2"));
        assert_ne!(read(&store, keys::DEADLINE).await.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn missing_progress_defaults_to_question_one_then_advances() {
        let (store, guard) = registered().await;

        let decision = guard.on_page_load(Some(q(3))).await.unwrap();

        assert_eq!(decision, GuardDecision::Stay);
        assert_eq!(read(&store, keys::FURTHEST_INDEX).await.as_deref(), Some("3"));
        assert_eq!(read(&store, keys::LAST_VISITED_INDEX).await.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn non_positive_watermark_counts_as_question_one() {
        let (store, guard) = registered().await;
        store.set(keys::FURTHEST_INDEX, "-3").await.unwrap();

        assert_eq!(guard.on_page_load(Some(q(1))).await.unwrap(), GuardDecision::Stay);
        assert_eq!(read(&store, keys::FURTHEST_INDEX).await.as_deref(), Some("-3"));
        assert_eq!(guard.on_page_load(Some(q(2))).await.unwrap(), GuardDecision::Stay);
        assert_eq!(read(&store, keys::FURTHEST_INDEX).await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn malformed_progress_defaults_to_question_one() {
        let (store, guard) = registered().await;
        store.set(keys::FURTHEST_INDEX, "abc").await.unwrap();
        store.set(keys::LAST_VISITED_INDEX, "xyz").await.unwrap();

        assert_eq!(
            guard.on_page_load(Some(q(1))).await.unwrap(),
            GuardDecision::Stay
        );
        assert_eq!(read(&store, keys::LAST_VISITED_INDEX).await.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn advance_targets_next_question_then_completion() {
        let (_store, guard) = registered().await;
        assert_eq!(guard.advance(Some(q(1))), q(2));
        assert_eq!(guard.advance(Some(q(10))), Page::Completion);
        assert_eq!(guard.advance(Some(Page::Entry)), Page::Completion);
        assert_eq!(guard.advance(None), Page::Completion);
    }

    #[test]
    fn apply_only_navigates_on_redirect() {
        let mut recorder = Recorder::default();
        assert!(!GuardDecision::Stay.apply(&mut recorder));
        assert!(GuardDecision::Redirect(Page::Entry).apply(&mut recorder));
        assert_eq!(recorder.0, vec![Page::Entry]);
        assert_eq!(GuardDecision::Stay.redirect_target(), None);
    }
}
