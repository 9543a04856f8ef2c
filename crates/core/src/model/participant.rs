use serde::{Deserialize, Serialize};

/// The quiz-taker registered on the entry page.
///
/// Serialized as `{"name", "attendanceNumber", "classLabel"}` in the store.
/// Fields missing from a stored record fall back to the placeholder's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Participant {
    pub name: String,
    pub attendance_number: String,
    pub class_label: String,
}

impl Participant {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        attendance_number: impl Into<String>,
        class_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            attendance_number: attendance_number.into(),
            class_label: class_label.into(),
        }
    }

    /// Stand-in shown when nobody has registered in this store.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::new("Student", "-", "-")
    }

    /// Uppercased first letter of the name, used for the avatar badge.
    #[must_use]
    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

impl Default for Participant {
    fn default() -> Self {
        Self::placeholder()
    }
}
