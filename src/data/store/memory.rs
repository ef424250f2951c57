use std::collections::BTreeMap;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{StoreError, WorkloadStore};
use crate::data::entry::{EntryFilter, EntryKey, Hours, WorkingHoursEntry};
use crate::data::lecture::{Lecture, LectureId};
use crate::data::student::{Student, StudentId};

#[derive(Debug, Default)]
struct State {
    students: BTreeMap<StudentId, Student>,
    lectures: BTreeMap<LectureId, Lecture>,
    entries: BTreeMap<EntryKey, WorkingHoursEntry>,
}

/// Process local store for development and tests. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

#[rocket::async_trait]
impl WorkloadStore for MemoryStore {
    async fn resolve_student(
        &self,
        id: &StudentId,
        semester_of_study: u32,
        today: NaiveDate,
    ) -> Result<Student, StoreError> {
        let mut state = self.state.write().await;
        let student = state
            .students
            .entry(id.clone())
            .or_insert_with(|| Student::new(id.clone(), semester_of_study, today));
        student.semester_of_study = semester_of_study;
        Ok(student.clone())
    }

    async fn student(&self, id: &StudentId) -> Result<Option<Student>, StoreError> {
        Ok(self.state.read().await.students.get(id).cloned())
    }

    async fn agree_to_privacy(&self, id: &StudentId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let student = state
            .students
            .get_mut(id)
            .ok_or_else(|| StoreError::StudentNotFound(id.clone()))?;
        student.agreed_to_privacy = true;
        Ok(())
    }

    async fn put_lecture(&self, lecture: Lecture) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .lectures
            .insert(lecture.id, lecture);
        Ok(())
    }

    async fn lectures(&self) -> Result<Vec<Lecture>, StoreError> {
        Ok(self.state.read().await.lectures.values().cloned().collect())
    }

    async fn lecture(&self, id: LectureId) -> Result<Option<Lecture>, StoreError> {
        Ok(self.state.read().await.lectures.get(&id).cloned())
    }

    async fn get_or_create_entry(
        &self,
        key: &EntryKey,
        semester_of_study: u32,
    ) -> Result<(WorkingHoursEntry, bool), StoreError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.entries.get(key) {
            return Ok((existing.clone(), false));
        }

        let entry = WorkingHoursEntry::new(key, semester_of_study);
        state.entries.insert(key.clone(), entry.clone());
        Ok((entry, true))
    }

    async fn find_entries(
        &self,
        filter: &EntryFilter,
    ) -> Result<Vec<WorkingHoursEntry>, StoreError> {
        let state = self.state.read().await;
        let mut found: Vec<WorkingHoursEntry> = state
            .entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.week, a.lecture).cmp(&(b.week, b.lecture)));
        Ok(found)
    }

    async fn upsert_hours(
        &self,
        key: &EntryKey,
        hours: Hours,
    ) -> Result<WorkingHoursEntry, StoreError> {
        let mut state = self.state.write().await;
        let entry = state
            .entries
            .get_mut(key)
            .ok_or_else(|| StoreError::EntryNotFound(key.clone()))?;
        entry.set_hours(hours);
        Ok(entry.clone())
    }

    async fn set_lecture_subscription(
        &self,
        student: &StudentId,
        lecture: LectureId,
        active: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let student = state
            .students
            .get_mut(student)
            .ok_or_else(|| StoreError::StudentNotFound(student.clone()))?;

        if active {
            if !student.is_subscribed(lecture) {
                student.lectures.push(lecture);
            }
        } else {
            student.lectures.retain(|l| *l != lecture);
        }
        Ok(())
    }

    async fn delete_entries_for_lecture(
        &self,
        student: &StudentId,
        lecture: LectureId,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state
            .entries
            .retain(|key, _| !(key.student == *student && key.lecture == lecture));
        Ok((before - state.entries.len()) as u64)
    }
}
