use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque user identifier: the string form of the messaging platform's user id.
pub type UserId = String;

/// The whole persisted document: user id → record.
pub type UserMap = BTreeMap<UserId, UserRecord>;

/// Position of a user's conversation in the fixed flow.
/// Serialized names match the keys stored in the user document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Phone,
    AfterPhone,
    ChooseGrade,
    RatingSubjects,
    Finished,
}

/// Prints the serialized stage name, e.g. `rating_subjects`.
impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(name)) => f.write_str(&name),
            _ => write!(f, "{self:?}"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub stage: Stage,
    #[serde(default)]
    pub grade: Option<u8>,
    /// Subject → score 0..=10, filled one rating at a time.
    #[serde(default)]
    pub ratings: BTreeMap<String, u8>,
    /// Snapshot of the prompt order taken when the grade was chosen.
    #[serde(default)]
    pub subject_order: Vec<String>,
    #[serde(default)]
    pub current_subject_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// The subject awaiting a rating, if any remain.
    pub fn current_subject(&self) -> Option<&str> {
        self.subject_order
            .get(self.current_subject_index)
            .map(String::as_str)
    }
}
