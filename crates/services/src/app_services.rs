use std::sync::Arc;

use quiz_core::model::QuizSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::countdown::CountdownController;
use crate::error::QuizServicesError;
use crate::navigation::NavigationGuard;
use crate::page::PageLoader;
use crate::session_service::SessionService;

/// Assembles the quiz services over one shared store.
#[derive(Clone)]
pub struct QuizServices {
    settings: QuizSettings,
    session: Arc<SessionService>,
    guard: Arc<NavigationGuard>,
    countdown: Arc<CountdownController>,
    pages: Arc<PageLoader>,
}

impl QuizServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, settings: QuizSettings) -> Self {
        let session = SessionService::new(clock, settings, Arc::clone(&storage.store));
        let guard = NavigationGuard::new(clock, settings, Arc::clone(&storage.store));
        let countdown = CountdownController::new(clock, settings, Arc::clone(&storage.store));
        let pages = PageLoader::new(clock, settings, session.clone(), guard.clone());

        Self {
            settings,
            session: Arc::new(session),
            guard: Arc::new(guard),
            countdown: Arc::new(countdown),
            pages: Arc::new(pages),
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock, settings: QuizSettings) -> Self {
        Self::new(&Storage::in_memory(), clock, settings)
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, QuizServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, settings))
    }

    #[must_use]
    pub fn settings(&self) -> QuizSettings {
        self.settings
    }

    #[must_use]
    pub fn session(&self) -> Arc<SessionService> {
        Arc::clone(&self.session)
    }

    #[must_use]
    pub fn guard(&self) -> Arc<NavigationGuard> {
        Arc::clone(&self.guard)
    }

    #[must_use]
    pub fn countdown(&self) -> Arc<CountdownController> {
        Arc::clone(&self.countdown)
    }

    #[must_use]
    pub fn pages(&self) -> Arc<PageLoader> {
        Arc::clone(&self.pages)
    }
}
