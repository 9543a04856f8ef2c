use std::fmt;
use std::num::NonZeroU32;

use thiserror::Error;

/// 1-based position of a question page in the quiz sequence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionIndex(NonZeroU32);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionIndexError {
    #[error("question indices are 1-based, got 0")]
    Zero,
}

impl QuestionIndex {
    /// The first question of every session.
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Creates a new `QuestionIndex`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionIndexError::Zero` for `0`.
    pub fn new(value: u32) -> Result<Self, QuestionIndexError> {
        NonZeroU32::new(value)
            .map(Self)
            .ok_or(QuestionIndexError::Zero)
    }

    /// Returns the underlying 1-based value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The following index, or `None` on overflow.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Debug for QuestionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionIndex({})", self.0)
    }
}

impl fmt::Display for QuestionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A page of the quiz site.
///
/// Question pages carry their declared index; the entry and completion pages
/// bound the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Entry,
    Question(QuestionIndex),
    Completion,
}

impl Page {
    pub const ENTRY_PATH: &'static str = "index.html";
    pub const COMPLETION_PATH: &'static str = "finish.html";
    const QUESTION_PREFIX: &'static str = "question";
    const QUESTION_SUFFIX: &'static str = ".html";

    /// Recognize a page from a request path or file name.
    ///
    /// Matching is by substring, so `/quiz/question3.html?x=1` is question 3.
    /// Question indices outside `1..=question_count` are not part of the
    /// sequence and yield `None`, as does any unrelated path.
    #[must_use]
    pub fn parse(path: &str, question_count: u32) -> Option<Self> {
        if path.contains(Self::ENTRY_PATH) {
            return Some(Self::Entry);
        }
        if path.contains(Self::COMPLETION_PATH) {
            return Some(Self::Completion);
        }

        path.match_indices(Self::QUESTION_PREFIX)
            .find_map(|(at, prefix)| {
                let rest = &path[at + prefix.len()..];
                let digits_end = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                if digits_end == 0 || !rest[digits_end..].starts_with(Self::QUESTION_SUFFIX) {
                    return None;
                }
                rest[..digits_end].parse::<u32>().ok()
            })
            .filter(|value| *value <= question_count)
            .and_then(|value| QuestionIndex::new(value).ok())
            .map(Self::Question)
    }

    /// Question page for a 1-based index.
    #[must_use]
    pub fn question(index: QuestionIndex) -> Self {
        Self::Question(index)
    }

    /// The canonical identifier redirects are issued with.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Entry => Self::ENTRY_PATH.to_string(),
            Self::Question(index) => {
                format!("{}{}{}", Self::QUESTION_PREFIX, index, Self::QUESTION_SUFFIX)
            }
            Self::Completion => Self::COMPLETION_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn question_index(&self) -> Option<QuestionIndex> {
        match self {
            Self::Question(index) => Some(*index),
            Self::Entry | Self::Completion => None,
        }
    }

    /// Where a timed-out question sends the participant.
    ///
    /// Questions before the last one advance by one; the last question, or an
    /// indeterminate current page, lands on the completion page.
    #[must_use]
    pub fn after_expiry(current: Option<QuestionIndex>, question_count: u32) -> Self {
        match current {
            Some(index) if index.get() < question_count => index
                .next()
                .map_or(Self::Completion, Self::Question),
            _ => Self::Completion,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
