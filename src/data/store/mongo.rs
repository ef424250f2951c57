use bson::{doc, Document};
use chrono::NaiveDate;
use mongodb::options::{
    FindOneAndUpdateOptions, FindOptions, IndexOptions, ReplaceOptions, ReturnDocument,
    UpdateOptions,
};
use mongodb::{Collection, Database, IndexModel};
use rocket::futures::TryStreamExt;

use super::{StoreError, WorkloadStore};
use crate::data::entry::{EntryFilter, EntryKey, Hours, WorkingHoursEntry, ENTRY_COLLECTION_NAME};
use crate::data::lecture::{Lecture, LectureId, LECTURE_COLLECTION_NAME};
use crate::data::student::{Student, StudentId, STUDENT_COLLECTION_NAME};

mod filter {
    use super::*;

    #[inline]
    pub fn by_student(id: &StudentId) -> Document {
        doc! { "_id": id.as_str() }
    }

    #[inline]
    pub fn by_lecture(id: LectureId) -> Document {
        doc! { "_id": id.bson() }
    }

    /// Dates are stored in their ISO 8601 string form.
    #[inline]
    pub fn by_key(key: &EntryKey) -> Document {
        doc! {
            "student": key.student.as_str(),
            "lecture": key.lecture.bson(),
            "week": key.week.monday().to_string(),
        }
    }

    pub fn by_entry_filter(filter: &EntryFilter) -> Document {
        let mut document = Document::new();
        if let Some(student) = &filter.student {
            document.insert("student", student.as_str());
        }
        if let Some(lecture) = filter.lecture {
            document.insert("lecture", lecture.bson());
        }
        if let Some(week) = filter.week {
            document.insert("week", week.monday().to_string());
        }
        document
    }
}

mod update {
    use super::*;

    /// Fields a student document gets on first login.
    pub fn resolve_student(semester_of_study: u32, today: NaiveDate) -> Document {
        doc! {
            "$set": { "semester_of_study": i64::from(semester_of_study) },
            "$setOnInsert": {
                "lectures": [],
                "agreed_to_privacy": false,
                "ignore_data": false,
                "registered": today.to_string(),
            },
        }
    }

    /// Defaults of a new entry; the key fields come from the filter.
    pub fn entry_defaults(semester_of_study: u32) -> Document {
        doc! {
            "$setOnInsert": {
                "hours_in_lecture": 0.0,
                "hours_for_homework": 0.0,
                "hours_studying": 0.0,
                "semester_of_study": i64::from(semester_of_study),
            }
        }
    }
}

fn students(db: &Database) -> Collection<Student> {
    db.collection(STUDENT_COLLECTION_NAME)
}

fn lectures(db: &Database) -> Collection<Lecture> {
    db.collection(LECTURE_COLLECTION_NAME)
}

fn entries(db: &Database) -> Collection<WorkingHoursEntry> {
    db.collection(ENTRY_COLLECTION_NAME)
}

#[rocket::async_trait]
impl WorkloadStore for Database {
    async fn prepare(&self) -> Result<(), StoreError> {
        let unique_key = IndexModel::builder()
            .keys(doc! { "student": 1, "lecture": 1, "week": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("entry_key".to_string())
                    .build(),
            )
            .build();

        entries(self).create_index(unique_key, None).await?;
        tracing::debug!("ensured unique entry key index");
        Ok(())
    }

    async fn resolve_student(
        &self,
        id: &StudentId,
        semester_of_study: u32,
        today: NaiveDate,
    ) -> Result<Student, StoreError> {
        let update = update::resolve_student(semester_of_study, today);
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        students(self)
            .find_one_and_update(filter::by_student(id), update, options)
            .await?
            .ok_or_else(|| StoreError::StudentNotFound(id.clone()))
    }

    async fn student(&self, id: &StudentId) -> Result<Option<Student>, StoreError> {
        Ok(students(self).find_one(filter::by_student(id), None).await?)
    }

    async fn agree_to_privacy(&self, id: &StudentId) -> Result<(), StoreError> {
        let result = students(self)
            .update_one(
                filter::by_student(id),
                doc! { "$set": { "agreed_to_privacy": true } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::StudentNotFound(id.clone()));
        }
        Ok(())
    }

    async fn put_lecture(&self, lecture: Lecture) -> Result<(), StoreError> {
        lectures(self)
            .replace_one(
                filter::by_lecture(lecture.id),
                &lecture,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn lectures(&self) -> Result<Vec<Lecture>, StoreError> {
        let cursor = lectures(self)
            .find(None, FindOptions::builder().sort(doc! { "_id": 1 }).build())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn lecture(&self, id: LectureId) -> Result<Option<Lecture>, StoreError> {
        Ok(lectures(self).find_one(filter::by_lecture(id), None).await?)
    }

    async fn get_or_create_entry(
        &self,
        key: &EntryKey,
        semester_of_study: u32,
    ) -> Result<(WorkingHoursEntry, bool), StoreError> {
        let defaults = update::entry_defaults(semester_of_study);

        // The key fields of the filter become part of an inserted document.
        let result = entries(self)
            .update_one(
                filter::by_key(key),
                defaults,
                UpdateOptions::builder().upsert(true).build(),
            )
            .await?;
        let created = result.upserted_id.is_some();

        let entry = entries(self)
            .find_one(filter::by_key(key), None)
            .await?
            .ok_or_else(|| StoreError::EntryNotFound(key.clone()))?;

        Ok((entry, created))
    }

    async fn find_entries(
        &self,
        filter: &EntryFilter,
    ) -> Result<Vec<WorkingHoursEntry>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "week": 1, "lecture": 1 })
            .build();
        let cursor = entries(self)
            .find(filter::by_entry_filter(filter), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn upsert_hours(
        &self,
        key: &EntryKey,
        hours: Hours,
    ) -> Result<WorkingHoursEntry, StoreError> {
        let update = doc! {
            "$set": {
                "hours_in_lecture": hours.hours_in_lecture,
                "hours_for_homework": hours.hours_for_homework,
                "hours_studying": hours.hours_studying,
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        entries(self)
            .find_one_and_update(filter::by_key(key), update, options)
            .await?
            .ok_or_else(|| StoreError::EntryNotFound(key.clone()))
    }

    async fn set_lecture_subscription(
        &self,
        student: &StudentId,
        lecture: LectureId,
        active: bool,
    ) -> Result<(), StoreError> {
        let update = if active {
            doc! { "$addToSet": { "lectures": lecture.bson() } }
        } else {
            doc! { "$pull": { "lectures": lecture.bson() } }
        };

        let result = students(self)
            .update_one(filter::by_student(student), update, None)
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::StudentNotFound(student.clone()));
        }
        Ok(())
    }

    async fn delete_entries_for_lecture(
        &self,
        student: &StudentId,
        lecture: LectureId,
    ) -> Result<u64, StoreError> {
        let by = EntryFilter::student(student.clone()).lecture(lecture);
        let result = entries(self)
            .delete_many(filter::by_entry_filter(&by), None)
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::week::IsoWeek;

    /// Document an upsert inserts: the equality filter plus `$setOnInsert`.
    fn inserted(filter: Document, update: &Document) -> Document {
        let mut document = filter;
        for op in ["$set", "$setOnInsert"] {
            if let Ok(fields) = update.get_document(op) {
                for (field, value) in fields.clone() {
                    document.insert(field, value);
                }
            }
        }
        document
    }

    #[test]
    fn upserted_entry_reads_back_with_its_key() {
        let week = IsoWeek::new(2024, 3).unwrap();
        let key = EntryKey::new("s1".into(), LectureId(7), week);

        let document = inserted(filter::by_key(&key), &update::entry_defaults(4));
        assert_eq!(document.get_str("week").unwrap(), "2024-01-15");
        assert_eq!(document.get_i64("lecture").unwrap(), 7);

        let entry: WorkingHoursEntry = bson::from_document(document).unwrap();
        assert_eq!(entry.key(), key);
        assert_eq!(entry.semester_of_study, 4);
        assert_eq!(entry.total_hours(), 0.0);
    }

    #[test]
    fn stored_entry_matches_key_filter() {
        let key = EntryKey::new("s1".into(), LectureId(7), IsoWeek::new(2024, 3).unwrap());
        let mut entry = WorkingHoursEntry::new(&key, 2);
        entry.set_hours(Hours::new(1.5, 2.0, 0.5).unwrap());

        let document = bson::to_document(&entry).unwrap();
        for (field, value) in filter::by_key(&key) {
            let stored = document.get(&field).unwrap();
            match (stored, &value) {
                (bson::Bson::Int32(a), bson::Bson::Int64(b)) => assert_eq!(i64::from(*a), *b),
                _ => assert_eq!(stored, &value, "{}", field),
            }
        }

        let back: WorkingHoursEntry = bson::from_document(document).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn upserted_student_reads_back() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let id = StudentId::from("a1b2c3");

        let document = inserted(
            filter::by_student(&id),
            &update::resolve_student(3, today),
        );
        let student: Student = bson::from_document(document).unwrap();
        assert_eq!(student, Student::new(id, 3, today));

        let mut subscribed = student.clone();
        subscribed.lectures = vec![LectureId(2), LectureId(1)];
        let back: Student = bson::from_document(bson::to_document(&subscribed).unwrap()).unwrap();
        assert_eq!(back.lectures, vec![LectureId(2), LectureId(1)]);
    }
}
