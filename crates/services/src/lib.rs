#![forbid(unsafe_code)]

pub mod app_services;
pub mod countdown;
pub mod error;
pub mod navigation;
pub mod page;
pub mod session_service;
pub mod state;

pub use quiz_core::Clock;

pub use app_services::QuizServices;
pub use countdown::{CountdownController, CountdownDisplay, FrameTicker, IntervalTicker, ManualTicker};
pub use error::{CountdownError, NavigationError, QuizServicesError, SessionError};
pub use navigation::{GuardDecision, NavigationGuard, Navigator};
pub use page::{CountdownView, PageLoad, PageLoader, PageView, ProfileBadge, QuestionBadge};
pub use session_service::SessionService;
pub use state::QuizState;
