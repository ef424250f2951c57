use rocket::form::{Errors, Form};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::data::entry::{Hours, WorkingHoursEntry};
use crate::data::lecture::{Lecture, LectureId};
use crate::data::store::Store;
use crate::error::ValidationError;
use crate::gate::{Active, AppClient, Denial};
use crate::resp::problem::Problem;
use crate::resp::Rejection;
use crate::route::web::form_problem;
use crate::week::{IsoWeek, WeekView};
use crate::workload;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub week: WeekView,
    pub lecture: LectureId,
    pub hours_in_lecture: f64,
    pub hours_for_homework: f64,
    pub hours_studying: f64,
    pub semester_of_study: u32,
}

impl From<WorkingHoursEntry> for EntryResponse {
    fn from(entry: WorkingHoursEntry) -> Self {
        EntryResponse {
            week: IsoWeek::containing(entry.week).into(),
            lecture: entry.lecture,
            hours_in_lecture: entry.hours_in_lecture,
            hours_for_homework: entry.hours_for_homework,
            hours_studying: entry.hours_studying,
            semester_of_study: entry.semester_of_study,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LectureResponse {
    pub id: LectureId,
    pub name: String,
    pub semester: String,
    /// Whether the student is subscribed to the lecture.
    pub is_active: bool,
}

impl LectureResponse {
    fn new(lecture: Lecture, is_active: bool) -> LectureResponse {
        LectureResponse {
            id: lecture.id,
            name: lecture.name,
            semester: lecture.semester,
            is_active,
        }
    }
}

/// The app sends the flag as a string.
#[derive(Debug, Clone, Deserialize, FromForm, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivationSubmission {
    #[field(name = "isActive")]
    pub is_active: String,
}

/// Hours as posted by older app versions.
#[derive(Debug, Clone, FromForm)]
pub struct HoursForm {
    #[field(name = "hoursInLecture")]
    pub hours_in_lecture: f64,
    #[field(name = "hoursForHomework")]
    pub hours_for_homework: f64,
    #[field(name = "hoursStudying")]
    pub hours_studying: f64,
}

impl From<HoursForm> for Hours {
    fn from(form: HoursForm) -> Self {
        Hours {
            hours_in_lecture: form.hours_in_lecture,
            hours_for_homework: form.hours_for_homework,
            hours_studying: form.hours_studying,
        }
    }
}

impl ActivationSubmission {
    pub fn parse(&self) -> Result<bool, ValidationError> {
        match self.is_active.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ValidationError::IsActive(other.to_string())),
        }
    }
}

fn body_problem(e: rocket::serde::json::Error<'_>) -> Problem {
    Problem::new_untyped(Status::BadRequest, "Invalid request data.")
        .detail(e)
        .clone()
}

async fn list_entries(
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &Store,
    lecture: Option<LectureId>,
    week: Option<(i32, i64)>,
) -> Result<Json<Vec<EntryResponse>>, Rejection> {
    client?;
    let Active(student) = active?;
    let week = match week {
        Some((year, week)) => Some(IsoWeek::parse(year, week)?),
        None => None,
    };

    let entries = workload::entries(store.as_ref(), &student, lecture, week).await?;
    Ok(Json(entries.into_iter().map(EntryResponse::from).collect()))
}

/// List all entries of the student
#[utoipa::path(
    responses(
        (status = 200, description = "Entries ordered by week and lecture", body = Vec<EntryResponse>),
        (status = 401, description = "Missing or expired session", body = Problem),
        (status = 403, description = "Request wasn't sent by the app", body = Problem),
    )
)]
#[get("/workload/entries")]
#[tracing::instrument(skip(store))]
pub async fn entries_all(
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Json<Vec<EntryResponse>>, Rejection> {
    list_entries(client, active, store, None, None).await
}

/// List entries of the student in a week
#[utoipa::path(
    params(
        ("year", description = "ISO week-numbering year"),
        ("week", description = "ISO week number"),
    ),
    responses(
        (status = 200, description = "Entries ordered by lecture", body = Vec<EntryResponse>),
        (status = 400, description = "The year has no such week", body = Problem),
    )
)]
#[get("/workload/entries/<year>/<week>", rank = 2)]
#[tracing::instrument(skip(store))]
pub async fn entries_of_week(
    year: i32,
    week: i64,
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Json<Vec<EntryResponse>>, Rejection> {
    list_entries(client, active, store, None, Some((year, week))).await
}

/// List entries of the student for a lecture
#[utoipa::path(
    params(
        ("id", description = "lecture ID")
    ),
    responses(
        (status = 200, description = "Entries ordered by week", body = Vec<EntryResponse>),
    )
)]
#[get("/workload/entries/lecture/<id>", rank = 1)]
#[tracing::instrument(skip(store))]
pub async fn entries_of_lecture(
    id: u32,
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Json<Vec<EntryResponse>>, Rejection> {
    list_entries(client, active, store, Some(LectureId(id)), None).await
}

/// Get the entry of the student for a lecture and week
#[utoipa::path(
    params(
        ("year", description = "ISO week-numbering year"),
        ("week", description = "ISO week number"),
        ("id", description = "lecture ID"),
    ),
    responses(
        (status = 200, description = "Zero or one entry", body = Vec<EntryResponse>),
        (status = 400, description = "The year has no such week", body = Problem),
    )
)]
#[get("/workload/entries/<year>/<week>/lecture/<id>")]
#[tracing::instrument(skip(store))]
pub async fn entries_of_week_and_lecture(
    year: i32,
    week: i64,
    id: u32,
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Json<Vec<EntryResponse>>, Rejection> {
    list_entries(client, active, store, Some(LectureId(id)), Some((year, week))).await
}

/// Report hours for a lecture and week
///
/// Creates the entry if necessary and replaces previously reported hours.
#[utoipa::path(
    params(
        ("year", description = "ISO week-numbering year"),
        ("week", description = "ISO week number"),
        ("id", description = "lecture ID"),
    ),
    request_body = Hours,
    responses(
        (status = 204, description = "Hours were stored"),
        (status = 400, description = "Invalid week or hours", body = Problem),
        (status = 404, description = "Lecture doesn't exist", body = Problem),
    )
)]
#[post(
    "/workload/entries/<year>/<week>/lecture/<id>",
    format = "json",
    data = "<hours>"
)]
#[tracing::instrument(skip(store))]
pub async fn entry_submit(
    year: i32,
    week: i64,
    id: u32,
    hours: Result<Json<Hours>, rocket::serde::json::Error<'_>>,
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Status, Rejection> {
    let hours = hours.map(Json::into_inner).map_err(body_problem);
    store_hours(client, active, store, (year, week), id, hours).await
}

/// Same as [`entry_submit`] for form encoded bodies.
#[post(
    "/workload/entries/<year>/<week>/lecture/<id>",
    format = "form",
    data = "<hours>"
)]
#[tracing::instrument(skip(store))]
pub async fn entry_submit_form(
    year: i32,
    week: i64,
    id: u32,
    hours: Result<Form<HoursForm>, Errors<'_>>,
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Status, Rejection> {
    let hours = hours
        .map(|f| Hours::from(f.into_inner()))
        .map_err(form_problem);
    store_hours(client, active, store, (year, week), id, hours).await
}

async fn store_hours(
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &Store,
    (year, week): (i32, i64),
    id: u32,
    hours: Result<Hours, Problem>,
) -> Result<Status, Rejection> {
    client?;
    let Active(student) = active?;
    let week = IsoWeek::parse(year, week)?;
    let hours = hours?;
    hours.validate()?;

    workload::record_hours(store.as_ref(), &student, LectureId(id), week, hours).await?;
    Ok(Status::NoContent)
}

/// List all lectures and whether the student is subscribed to them
#[utoipa::path(
    responses(
        (status = 200, description = "Lectures ordered by ID", body = Vec<LectureResponse>),
    )
)]
#[get("/workload/lectures")]
#[tracing::instrument(skip(store))]
pub async fn lecture_list(
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Json<Vec<LectureResponse>>, Rejection> {
    client?;
    let Active(student) = active?;

    let lectures = store
        .lectures()
        .await?
        .into_iter()
        .map(|l| {
            let subscribed = student.is_subscribed(l.id);
            LectureResponse::new(l, subscribed)
        })
        .collect();

    Ok(Json(lectures))
}

/// Subscribe to or unsubscribe from a lecture
///
/// Recorded hours are kept when unsubscribing.
#[utoipa::path(
    params(
        ("id", description = "lecture ID")
    ),
    request_body = ActivationSubmission,
    responses(
        (status = 204, description = "Subscription was updated"),
        (status = 400, description = "isActive is neither \"true\" nor \"false\"", body = Problem),
        (status = 404, description = "Lecture doesn't exist", body = Problem),
    )
)]
#[post("/workload/lectures/<id>", format = "json", data = "<submission>")]
#[tracing::instrument(skip(store))]
pub async fn lecture_activation(
    id: u32,
    submission: Result<Json<ActivationSubmission>, rocket::serde::json::Error<'_>>,
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Status, Rejection> {
    let submission = submission.map(Json::into_inner).map_err(body_problem);
    change_subscription(client, active, store, id, submission).await
}

/// Same as [`lecture_activation`] for form encoded bodies.
#[post("/workload/lectures/<id>", format = "form", data = "<submission>")]
#[tracing::instrument(skip(store))]
pub async fn lecture_activation_form(
    id: u32,
    submission: Result<Form<ActivationSubmission>, Errors<'_>>,
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Status, Rejection> {
    let submission = submission.map(Form::into_inner).map_err(form_problem);
    change_subscription(client, active, store, id, submission).await
}

async fn change_subscription(
    client: Result<AppClient, Denial>,
    active: Result<Active, Denial>,
    store: &Store,
    id: u32,
    submission: Result<ActivationSubmission, Problem>,
) -> Result<Status, Rejection> {
    client?;
    let Active(student) = active?;
    let is_active = submission?.parse()?;

    workload::set_subscription(store.as_ref(), &student, LectureId(id), is_active).await?;
    Ok(Status::NoContent)
}

#[cfg(test)]
mod api_endpoints {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use rocket::http::Cookie;
    use rocket::local::asynchronous::Client;

    use crate::testing::{app_client, client, login};

    async fn activate(client: &Client, session: &Cookie<'static>, value: &str) -> Status {
        client
            .post("/api/v1/workload/lectures/2")
            .header(app_client())
            .header(ContentType::JSON)
            .cookie(session.clone())
            .body(format!(r#"{{"isActive":"{}"}}"#, value))
            .dispatch()
            .await
            .status()
    }

    #[rocket::async_test]
    async fn requests_without_client_marker_are_forbidden() {
        let client = client().await;
        let session = login(&client, "student1", true).await;

        let response = client
            .get("/api/v1/workload/lectures")
            .cookie(session)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn requests_without_session_are_unauthorized() {
        let client = client().await;

        let response = client
            .get("/api/v1/workload/entries")
            .header(app_client())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn pending_privacy_agreement_redirects() {
        let client = client().await;
        let session = login(&client, "student1", false).await;

        let response = client
            .get("/api/v1/workload/entries")
            .header(app_client())
            .cookie(session)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::SeeOther);
        let location = response.headers().get_one("Location").unwrap();
        assert!(location.starts_with("/app/workload/privacyAgreement?notification="));
    }

    #[rocket::async_test]
    async fn submitted_hours_are_listed() {
        let client = client().await;
        let session = login(&client, "student1", true).await;

        for hours in [1.0, 2.5] {
            let response = client
                .post("/api/v1/workload/entries/2024/3/lecture/1")
                .header(app_client())
                .header(ContentType::JSON)
                .cookie(session.clone())
                .body(
                    json!({
                        "hoursInLecture": hours,
                        "hoursForHomework": 1.0,
                        "hoursStudying": 0.0
                    })
                    .to_string(),
                )
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::NoContent);
        }

        let response = client
            .get("/api/v1/workload/entries/2024/3")
            .header(app_client())
            .cookie(session.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let entries: Value = response.into_json().await.unwrap();
        assert_eq!(entries.as_array().unwrap().len(), 1);
        assert_eq!(entries[0]["hoursInLecture"], json!(2.5));
        assert_eq!(entries[0]["week"]["monday"], json!("2024-01-15"));
        assert_eq!(entries[0]["lecture"], json!(1));

        let response = client
            .get("/api/v1/workload/entries/lecture/2")
            .header(app_client())
            .cookie(session)
            .dispatch()
            .await;
        let entries: Value = response.into_json().await.unwrap();
        assert!(entries.as_array().unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn form_encoded_bodies_are_accepted() {
        let client = client().await;
        let session = login(&client, "student1", true).await;

        let response = client
            .post("/api/v1/workload/entries/2024/3/lecture/1")
            .header(app_client())
            .header(ContentType::Form)
            .cookie(session.clone())
            .body("hoursInLecture=1&hoursForHomework=2&hoursStudying=3")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        let entries: Value = client
            .get("/api/v1/workload/entries/2024/3/lecture/1")
            .header(app_client())
            .cookie(session.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(entries[0]["hoursForHomework"], json!(2.0));
        assert_eq!(entries[0]["hoursStudying"], json!(3.0));

        let response = client
            .post("/api/v1/workload/entries/2024/3/lecture/1")
            .header(app_client())
            .header(ContentType::Form)
            .cookie(session.clone())
            .body("hoursInLecture=-1&hoursForHomework=0&hoursStudying=0")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        for (body, expected) in [
            ("isActive=true", Status::NoContent),
            ("isActive=maybe", Status::BadRequest),
        ] {
            let response = client
                .post("/api/v1/workload/lectures/1")
                .header(app_client())
                .header(ContentType::Form)
                .cookie(session.clone())
                .body(body)
                .dispatch()
                .await;
            assert_eq!(response.status(), expected, "{}", body);
        }

        let lectures: Value = client
            .get("/api/v1/workload/lectures")
            .header(app_client())
            .cookie(session)
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(lectures[0]["isActive"], json!(true));
    }

    #[rocket::async_test]
    async fn invalid_weeks_and_hours_are_bad_requests() {
        let client = client().await;
        let session = login(&client, "student1", true).await;
        let body = json!({
            "hoursInLecture": 1.0,
            "hoursForHomework": 0.0,
            "hoursStudying": 0.0
        })
        .to_string();

        for uri in [
            "/api/v1/workload/entries/2021/53/lecture/1",
            "/api/v1/workload/entries/2021/0/lecture/1",
            "/api/v1/workload/entries/2021/-4/lecture/1",
        ] {
            let response = client
                .post(uri)
                .header(app_client())
                .header(ContentType::JSON)
                .cookie(session.clone())
                .body(&body)
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::BadRequest, "{}", uri);
        }

        let response = client
            .post("/api/v1/workload/entries/2024/3/lecture/1")
            .header(app_client())
            .header(ContentType::JSON)
            .cookie(session)
            .body(r#"{"hoursInLecture":-1,"hoursForHomework":0,"hoursStudying":0}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn unknown_lecture_is_not_found() {
        let client = client().await;
        let session = login(&client, "student1", true).await;

        let response = client
            .post("/api/v1/workload/lectures/99")
            .header(app_client())
            .header(ContentType::JSON)
            .cookie(session)
            .body(r#"{"isActive":"true"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn lecture_activation_toggles_subscription() {
        let client = client().await;
        let session = login(&client, "student1", true).await;

        assert_eq!(activate(&client, &session, "true").await, Status::NoContent);
        assert_eq!(activate(&client, &session, "true").await, Status::NoContent);
        assert_eq!(activate(&client, &session, "yes").await, Status::BadRequest);

        let lectures: Value = client
            .get("/api/v1/workload/lectures")
            .header(app_client())
            .cookie(session.clone())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let active: Vec<&Value> = lectures
            .as_array()
            .unwrap()
            .iter()
            .filter(|l| l["isActive"] == json!(true))
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0]["id"], json!(2));

        assert_eq!(activate(&client, &session, "false").await, Status::NoContent);
    }
}
