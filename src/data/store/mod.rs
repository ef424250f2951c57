use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use super::entry::{EntryFilter, EntryKey, Hours, WorkingHoursEntry};
use super::lecture::{Lecture, LectureId};
use super::student::{Student, StudentId};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("student '{0}' doesn't exist")]
    StudentNotFound(StudentId),
    #[error("lecture {0} doesn't exist")]
    LectureNotFound(LectureId),
    #[error("no entry for lecture {} in week {} of '{}'", .0.lecture, .0.week, .0.student)]
    EntryNotFound(EntryKey),

    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    BsonSerialization(#[from] bson::ser::Error),
}

/// Persistence of students, lectures and working hour entries.
///
/// Entries are only ever created through [`WorkloadStore::get_or_create_entry`].
/// Single documents are updated atomically; concurrent writes to the same
/// entry are not serialized, the last one wins.
#[rocket::async_trait]
pub trait WorkloadStore: Send + Sync {
    /// Creates indexes and whatever else the backend needs before serving.
    async fn prepare(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Creates the student on first login; afterwards only the semester of
    /// study is updated.
    async fn resolve_student(
        &self,
        id: &StudentId,
        semester_of_study: u32,
        today: NaiveDate,
    ) -> Result<Student, StoreError>;

    async fn student(&self, id: &StudentId) -> Result<Option<Student>, StoreError>;

    async fn agree_to_privacy(&self, id: &StudentId) -> Result<(), StoreError>;

    /// Inserts or replaces reference data.
    async fn put_lecture(&self, lecture: Lecture) -> Result<(), StoreError>;

    /// All lectures ordered by id.
    async fn lectures(&self) -> Result<Vec<Lecture>, StoreError>;

    async fn lecture(&self, id: LectureId) -> Result<Option<Lecture>, StoreError>;

    /// Returns the entry for `key` and whether this call created it. The
    /// semester of study snapshot is only written on creation.
    async fn get_or_create_entry(
        &self,
        key: &EntryKey,
        semester_of_study: u32,
    ) -> Result<(WorkingHoursEntry, bool), StoreError>;

    /// Matching entries ordered by week and lecture.
    async fn find_entries(
        &self,
        filter: &EntryFilter,
    ) -> Result<Vec<WorkingHoursEntry>, StoreError>;

    /// Overwrites the hours of an existing entry.
    async fn upsert_hours(
        &self,
        key: &EntryKey,
        hours: Hours,
    ) -> Result<WorkingHoursEntry, StoreError>;

    /// Adding an already subscribed lecture or removing one that isn't
    /// subscribed leaves the student unchanged.
    async fn set_lecture_subscription(
        &self,
        student: &StudentId,
        lecture: LectureId,
        active: bool,
    ) -> Result<(), StoreError>;

    async fn unsubscribe_lecture(
        &self,
        student: &StudentId,
        lecture: LectureId,
    ) -> Result<(), StoreError> {
        self.set_lecture_subscription(student, lecture, false).await
    }

    /// Returns the number of deleted entries.
    async fn delete_entries_for_lecture(
        &self,
        student: &StudentId,
        lecture: LectureId,
    ) -> Result<u64, StoreError>;
}

pub type Store = Arc<dyn WorkloadStore>;
