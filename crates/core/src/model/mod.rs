mod page;
mod participant;
mod session;
mod settings;

pub use page::{Page, QuestionIndex, QuestionIndexError};
pub use participant::Participant;
pub use session::SessionSnapshot;
pub use settings::{QuizSettings, SettingsError};
