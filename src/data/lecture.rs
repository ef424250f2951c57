use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub static LECTURE_COLLECTION_NAME: &str = "lectures";

#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    Serialize,
    Deserialize,
    Display,
    ToSchema,
)]
#[serde(transparent)]
pub struct LectureId(pub u32);

impl LectureId {
    /// BSON has no unsigned integers, ids are stored as 64 bit.
    pub fn bson(self) -> bson::Bson {
        bson::Bson::Int64(i64::from(self.0))
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Lecture {
    #[serde(rename = "_id", alias = "id")]
    pub id: LectureId,
    pub name: String,
    /// Free form category such as "Bachelor 3" or "Wahlpflicht".
    pub semester: String,
}

impl Lecture {
    pub fn new(id: u32, name: impl ToString, semester: impl ToString) -> Lecture {
        Lecture {
            id: LectureId(id),
            name: name.to_string(),
            semester: semester.to_string(),
        }
    }
}
