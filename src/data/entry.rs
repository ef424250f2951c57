use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::lecture::LectureId;
use super::student::StudentId;
use crate::error::ValidationError;
use crate::week::IsoWeek;

pub static ENTRY_COLLECTION_NAME: &str = "working_hours";

/// Identifies at most one entry: a student's hours for a lecture in a week.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EntryKey {
    pub student: StudentId,
    pub lecture: LectureId,
    pub week: IsoWeek,
}

impl EntryKey {
    pub fn new(student: StudentId, lecture: LectureId, week: IsoWeek) -> EntryKey {
        EntryKey {
            student,
            lecture,
            week,
        }
    }
}

/// Self reported hours for one lecture and week.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hours {
    pub hours_in_lecture: f64,
    pub hours_for_homework: f64,
    pub hours_studying: f64,
}

impl Hours {
    pub fn new(
        hours_in_lecture: f64,
        hours_for_homework: f64,
        hours_studying: f64,
    ) -> Result<Hours, ValidationError> {
        let hours = Hours {
            hours_in_lecture,
            hours_for_homework,
            hours_studying,
        };
        hours.validate()?;
        Ok(hours)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("hoursInLecture", self.hours_in_lecture),
            ("hoursForHomework", self.hours_for_homework),
            ("hoursStudying", self.hours_studying),
        ];

        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::Hours { field, value });
            }
        }

        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.hours_in_lecture + self.hours_for_homework + self.hours_studying
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHoursEntry {
    pub student: StudentId,
    pub lecture: LectureId,
    /// Monday of the ISO week.
    pub week: NaiveDate,
    #[serde(default)]
    pub hours_in_lecture: f64,
    #[serde(default)]
    pub hours_for_homework: f64,
    #[serde(default)]
    pub hours_studying: f64,
    /// The student's semester of study when the entry was created.
    #[serde(default)]
    pub semester_of_study: u32,
}

impl WorkingHoursEntry {
    pub fn new(key: &EntryKey, semester_of_study: u32) -> WorkingHoursEntry {
        WorkingHoursEntry {
            student: key.student.clone(),
            lecture: key.lecture,
            week: key.week.monday(),
            hours_in_lecture: 0.0,
            hours_for_homework: 0.0,
            hours_studying: 0.0,
            semester_of_study,
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey::new(
            self.student.clone(),
            self.lecture,
            IsoWeek::containing(self.week),
        )
    }

    pub fn hours(&self) -> Hours {
        Hours {
            hours_in_lecture: self.hours_in_lecture,
            hours_for_homework: self.hours_for_homework,
            hours_studying: self.hours_studying,
        }
    }

    pub fn set_hours(&mut self, hours: Hours) {
        self.hours_in_lecture = hours.hours_in_lecture;
        self.hours_for_homework = hours.hours_for_homework;
        self.hours_studying = hours.hours_studying;
    }

    pub fn total_hours(&self) -> f64 {
        self.hours().total()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub student: Option<StudentId>,
    pub lecture: Option<LectureId>,
    pub week: Option<IsoWeek>,
}

impl EntryFilter {
    pub fn student(student: StudentId) -> EntryFilter {
        EntryFilter {
            student: Some(student),
            ..Default::default()
        }
    }

    pub fn lecture(mut self, lecture: impl Into<Option<LectureId>>) -> EntryFilter {
        self.lecture = lecture.into();
        self
    }

    pub fn week(mut self, week: impl Into<Option<IsoWeek>>) -> EntryFilter {
        self.week = week.into();
        self
    }

    pub fn matches(&self, entry: &WorkingHoursEntry) -> bool {
        self.student.as_ref().map_or(true, |s| *s == entry.student)
            && self.lecture.map_or(true, |l| l == entry.lecture)
            && self.week.map_or(true, |w| w.monday() == entry.week)
    }
}
