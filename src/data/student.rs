use chrono::NaiveDate;
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

use super::lecture::LectureId;

pub static STUDENT_COLLECTION_NAME: &str = "students";

#[derive(
    Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize, Deref, Display,
)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for StudentId {
    fn from(value: String) -> Self {
        StudentId(value)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        StudentId(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: StudentId,
    /// Overwritten on every login; 0 when the identity provider didn't
    /// release a usable value.
    #[serde(default)]
    pub semester_of_study: u32,
    /// Subscribed lectures in the order they were added.
    #[serde(default)]
    pub lectures: Vec<LectureId>,
    #[serde(default)]
    pub agreed_to_privacy: bool,
    /// Test accounts whose data is excluded from analysis.
    #[serde(default)]
    pub ignore_data: bool,
    pub registered: NaiveDate,
}

impl Student {
    pub fn new(id: StudentId, semester_of_study: u32, registered: NaiveDate) -> Student {
        Student {
            id,
            semester_of_study,
            lectures: vec![],
            agreed_to_privacy: false,
            ignore_data: false,
            registered,
        }
    }

    pub fn is_subscribed(&self, lecture: LectureId) -> bool {
        self.lectures.contains(&lecture)
    }
}
