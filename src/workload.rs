//! Operations shared by the mobile API and the web surface.
//!
//! Every function gets the acting student from the access gate; nothing in
//! here looks at requests.

use chrono::NaiveDate;

use crate::aggregate::{self, Dashboard};
use crate::data::entry::{EntryFilter, EntryKey, Hours, WorkingHoursEntry};
use crate::data::lecture::{Lecture, LectureId};
use crate::data::store::{StoreError, WorkloadStore};
use crate::data::student::Student;
use crate::week::IsoWeek;

pub async fn lecture_or_not_found(
    store: &dyn WorkloadStore,
    id: LectureId,
) -> Result<Lecture, StoreError> {
    store
        .lecture(id)
        .await?
        .ok_or(StoreError::LectureNotFound(id))
}

/// Entry of the student for a lecture and week, created with zero hours on
/// first access.
pub async fn open_entry(
    store: &dyn WorkloadStore,
    student: &Student,
    lecture: LectureId,
    week: IsoWeek,
) -> Result<WorkingHoursEntry, StoreError> {
    lecture_or_not_found(store, lecture).await?;

    let key = EntryKey::new(student.id.clone(), lecture, week);
    let (entry, created) = store
        .get_or_create_entry(&key, student.semester_of_study)
        .await?;
    if created {
        tracing::debug!("created entry for lecture {} in {}", lecture, week);
    }

    Ok(entry)
}

/// Stores the hours of a week, replacing whatever was reported before.
pub async fn record_hours(
    store: &dyn WorkloadStore,
    student: &Student,
    lecture: LectureId,
    week: IsoWeek,
    hours: Hours,
) -> Result<WorkingHoursEntry, StoreError> {
    let entry = open_entry(store, student, lecture, week).await?;
    store.upsert_hours(&entry.key(), hours).await
}

pub async fn entries(
    store: &dyn WorkloadStore,
    student: &Student,
    lecture: Option<LectureId>,
    week: Option<IsoWeek>,
) -> Result<Vec<WorkingHoursEntry>, StoreError> {
    let filter = EntryFilter::student(student.id.clone())
        .lecture(lecture)
        .week(week);
    store.find_entries(&filter).await
}

pub async fn subscribe(
    store: &dyn WorkloadStore,
    student: &Student,
    lecture: LectureId,
) -> Result<(), StoreError> {
    lecture_or_not_found(store, lecture).await?;
    store
        .set_lecture_subscription(&student.id, lecture, true)
        .await
}

pub async fn set_subscription(
    store: &dyn WorkloadStore,
    student: &Student,
    lecture: LectureId,
    active: bool,
) -> Result<(), StoreError> {
    if active {
        subscribe(store, student, lecture).await
    } else {
        store.unsubscribe_lecture(&student.id, lecture).await
    }
}

/// Unsubscribes and removes every entry the student reported for the
/// lecture. Returns the number of removed entries.
pub async fn permanently_delete(
    store: &dyn WorkloadStore,
    student: &Student,
    lecture: LectureId,
) -> Result<u64, StoreError> {
    store.unsubscribe_lecture(&student.id, lecture).await?;
    let deleted = store.delete_entries_for_lecture(&student.id, lecture).await?;
    tracing::info!(
        "student {} deleted {} entries of lecture {}",
        student.id,
        deleted,
        lecture
    );
    Ok(deleted)
}

/// Subscribed lectures in the order the student added them. Lectures that
/// vanished from the reference data are skipped.
pub async fn subscribed_lectures(
    store: &dyn WorkloadStore,
    student: &Student,
) -> Result<Vec<Lecture>, StoreError> {
    let mut lectures = Vec::with_capacity(student.lectures.len());
    for id in &student.lectures {
        match store.lecture(*id).await? {
            Some(lecture) => lectures.push(lecture),
            None => tracing::warn!("student {} is subscribed to unknown lecture {}", student.id, id),
        }
    }
    Ok(lectures)
}

pub async fn student_weeks(
    store: &dyn WorkloadStore,
    student: &Student,
    today: NaiveDate,
) -> Result<Vec<IsoWeek>, StoreError> {
    let entries = entries(store, student, None, None).await?;
    Ok(aggregate::student_weeks(student.registered, &entries, today))
}

pub async fn dashboard(
    store: &dyn WorkloadStore,
    student: &Student,
    today: NaiveDate,
) -> Result<Dashboard, StoreError> {
    let lectures = subscribed_lectures(store, student).await?;
    let entries = entries(store, student, None, None).await?;
    let weeks = aggregate::student_weeks(student.registered, &entries, today);

    Ok(aggregate::dashboard(&lectures, &weeks, &entries))
}
