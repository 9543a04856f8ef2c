use serde::Serialize;

use quiz_core::countdown::{self, CountdownTick};
use quiz_core::model::{Page, Participant, QuizSettings};

use crate::Clock;
use crate::error::NavigationError;
use crate::navigation::{GuardDecision, NavigationGuard};
use crate::session_service::SessionService;

/// Avatar badge values for the registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBadge {
    pub initial: String,
    pub name: String,
    pub class_label: String,
    pub attendance_number: String,
}

impl ProfileBadge {
    #[must_use]
    pub fn from_participant(participant: &Participant) -> Self {
        Self {
            initial: participant.initial(),
            name: participant.name.clone(),
            class_label: participant.class_label.clone(),
            attendance_number: participant.attendance_number.clone(),
        }
    }
}

/// "Question k of N" counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBadge {
    pub index: u32,
    pub total: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownView {
    pub remaining_secs: i64,
    pub display: String,
}

impl From<CountdownTick> for CountdownView {
    fn from(tick: CountdownTick) -> Self {
        Self {
            remaining_secs: tick.remaining_secs,
            display: tick.display(),
        }
    }
}

/// Everything the presentation layer needs to decorate a page it may show.
///
/// Recomputed from the store on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    #[serde(skip)]
    pub page: Page,
    pub path: String,
    pub profile: Option<ProfileBadge>,
    pub question: Option<QuestionBadge>,
    pub countdown: Option<CountdownView>,
    /// Only filled on the completion page.
    pub score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoad {
    /// Leave this page for another one; nothing should be rendered.
    Redirect(Page),
    Render(PageView),
    /// Not a quiz page; nothing to guard or decorate.
    Passthrough,
}

/// Runs the guard for a page load and builds the view when the visitor stays.
#[derive(Clone)]
pub struct PageLoader {
    clock: Clock,
    settings: QuizSettings,
    session: SessionService,
    guard: NavigationGuard,
}

impl PageLoader {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        session: SessionService,
        guard: NavigationGuard,
    ) -> Self {
        Self {
            clock,
            settings,
            session,
            guard,
        }
    }

    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        Self {
            clock,
            settings: self.settings,
            session: self.session.with_clock(clock),
            guard: self.guard.with_clock(clock),
        }
    }

    #[must_use]
    pub fn settings(&self) -> QuizSettings {
        self.settings
    }

    /// Recognize `path` and load it.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` on storage failures.
    pub async fn load_path(&self, path: &str) -> Result<PageLoad, NavigationError> {
        self.load(Page::parse(path, self.settings.question_count()))
            .await
    }

    /// # Errors
    ///
    /// Returns `NavigationError` on storage failures.
    pub async fn load(&self, page: Option<Page>) -> Result<PageLoad, NavigationError> {
        let Some(page) = page else {
            return Ok(PageLoad::Passthrough);
        };

        if let GuardDecision::Redirect(target) = self.guard.on_page_load(Some(page)).await? {
            return Ok(PageLoad::Redirect(target));
        }

        Ok(PageLoad::Render(self.view(page).await?))
    }

    async fn view(&self, page: Page) -> Result<PageView, NavigationError> {
        let profile = match page {
            Page::Entry => None,
            Page::Question(_) | Page::Completion => Some(ProfileBadge::from_participant(
                &self.session.participant().await?,
            )),
        };

        let (question, countdown) = match page.question_index() {
            Some(index) => {
                let total = self.settings.question_count();
                let snapshot = self.session.snapshot().await?;
                let tick = countdown::evaluate(snapshot.deadline_millis, self.clock.now_millis());
                let badge = QuestionBadge {
                    index: index.get(),
                    total,
                    label: format!("QUESTION {index} / {total}"),
                };
                (Some(badge), Some(CountdownView::from(tick)))
            }
            None => (None, None),
        };

        let score = match page {
            Page::Completion => Some(self.session.score().await?),
            Page::Entry | Page::Question(_) => None,
        };

        Ok(PageView {
            page,
            path: page.path(),
            profile,
            question,
            countdown,
            score,
        })
    }
}
