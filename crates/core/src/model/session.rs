use crate::model::QuestionIndex;

/// Read-only view of the persisted session values after defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub score: i64,
    pub furthest: QuestionIndex,
    /// `0` until the first question page has been shown.
    pub last_visited: u32,
    /// Epoch milliseconds; `0` when nothing usable is stored.
    pub deadline_millis: i64,
}
