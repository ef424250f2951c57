use std::collections::HashSet;

use chrono::Utc;
use rocket::form::{self, Errors, Form};
use rocket::http::Status;
use rocket::State;

use super::{form_problem, LectureView};
use crate::aggregate::Dashboard;
use crate::data::entry::Hours;
use crate::data::lecture::LectureId;
use crate::data::store::Store;
use crate::gate::{Active, Denial};
use crate::middleware::notification::Notification;
use crate::resp::page::Page;
use crate::resp::Rejection;
use crate::week::{group_by_semester, IsoWeek, WeekView};
use crate::workload;

#[derive(Debug, Serialize)]
pub struct SemesterWeeks {
    pub semester: String,
    pub weeks: Vec<WeekView>,
}

#[derive(Debug, Serialize)]
pub struct CalendarPage {
    pub semesters: Vec<SemesterWeeks>,
}

/// Every week the student could report hours for, grouped by semester.
#[get("/calendar")]
#[tracing::instrument(skip(store))]
pub async fn calendar(
    active: Result<Active, Denial>,
    notification: Notification,
    store: &State<Store>,
) -> Result<Page<CalendarPage>, Rejection> {
    let Active(student) = active?;

    let weeks =
        workload::student_weeks(store.inner().as_ref(), &student, Utc::now().date_naive()).await?;
    let semesters = group_by_semester(&weeks)
        .into_iter()
        .map(|(semester, weeks)| SemesterWeeks {
            semester: semester.to_string(),
            weeks: weeks.into_iter().map(WeekView::from).collect(),
        })
        .collect();

    Ok(Page::for_student(
        &student,
        notification,
        CalendarPage { semesters },
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureOfWeek {
    #[serde(flatten)]
    pub lecture: LectureView,
    pub has_data: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectLecturePage {
    pub year: i32,
    pub week: u32,
    pub lectures_to_display: Vec<LectureOfWeek>,
}

/// Subscribed lectures with a flag telling whether hours were already
/// recorded for the week.
#[get("/selectLecture?<year>&<week>")]
#[tracing::instrument(skip(store))]
pub async fn select_lecture(
    year: i32,
    week: i64,
    active: Result<Active, Denial>,
    notification: Notification,
    store: &State<Store>,
) -> Result<Page<SelectLecturePage>, Rejection> {
    let Active(student) = active?;
    let week = IsoWeek::parse(year, week)?;
    let store = store.inner().as_ref();

    let recorded: HashSet<LectureId> = workload::entries(store, &student, None, Some(week))
        .await?
        .into_iter()
        .map(|e| e.lecture)
        .collect();

    let lectures_to_display = workload::subscribed_lectures(store, &student)
        .await?
        .into_iter()
        .map(|lecture| LectureOfWeek {
            has_data: recorded.contains(&lecture.id),
            lecture: lecture.into(),
        })
        .collect();

    Ok(Page::for_student(
        &student,
        notification,
        SelectLecturePage {
            year: week.year(),
            week: week.week(),
            lectures_to_display,
        },
    ))
}

#[derive(Debug, Clone, FromForm)]
pub struct EntryQuery {
    pub year: i32,
    pub week: i64,
    #[field(name = "lectureId")]
    pub lecture_id: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterWorkloadPage {
    pub week: WeekView,
    pub lecture: LectureView,
    #[serde(flatten)]
    pub hours: Hours,
}

/// Form for the hours of a week. Opening it creates the entry.
#[get("/enterWorkloadData?<query..>")]
#[tracing::instrument(skip(store))]
pub async fn enter_workload_data(
    query: form::Result<'_, EntryQuery>,
    active: Result<Active, Denial>,
    notification: Notification,
    store: &State<Store>,
) -> Result<Page<EnterWorkloadPage>, Rejection> {
    let Active(student) = active?;
    let query = query.map_err(form_problem)?;
    let week = IsoWeek::parse(query.year, query.week)?;
    let store = store.inner().as_ref();

    let lecture = workload::lecture_or_not_found(store, LectureId(query.lecture_id)).await?;
    let entry = workload::open_entry(store, &student, lecture.id, week).await?;

    Ok(Page::for_student(
        &student,
        notification,
        EnterWorkloadPage {
            week: week.into(),
            lecture: lecture.into(),
            hours: entry.hours(),
        },
    ))
}

#[derive(Debug, Clone, FromForm)]
pub struct EntryForm {
    pub year: i32,
    pub week: i64,
    #[field(name = "lectureId")]
    pub lecture_id: u32,
    #[field(name = "hoursInLecture")]
    pub hours_in_lecture: f64,
    #[field(name = "hoursForHomework")]
    pub hours_for_homework: f64,
    #[field(name = "hoursStudying")]
    pub hours_studying: f64,
}

#[post("/enterWorkloadData", data = "<form>")]
#[tracing::instrument(skip(store))]
pub async fn enter_workload_data_submit(
    form: Result<Form<EntryForm>, Errors<'_>>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Status, Rejection> {
    let Active(student) = active?;
    let form = form.map_err(form_problem)?.into_inner();
    let week = IsoWeek::parse(form.year, form.week)?;
    let hours = Hours::new(
        form.hours_in_lecture,
        form.hours_for_homework,
        form.hours_studying,
    )?;

    workload::record_hours(
        store.inner().as_ref(),
        &student,
        LectureId(form.lecture_id),
        week,
        hours,
    )
    .await?;

    Ok(Status::NoContent)
}

/// Weekly totals per lecture, hours per activity and both totals as pies.
#[get("/visualizeData")]
#[tracing::instrument(skip(store))]
pub async fn visualize_data(
    active: Result<Active, Denial>,
    notification: Notification,
    store: &State<Store>,
) -> Result<Page<Dashboard>, Rejection> {
    let Active(student) = active?;
    let dashboard =
        workload::dashboard(store.inner().as_ref(), &student, Utc::now().date_naive()).await?;

    Ok(Page::for_student(&student, notification, dashboard))
}
