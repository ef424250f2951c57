use std::collections::BTreeSet;

use rocket::form::{Errors, Form};
use rocket::response::Redirect;
use rocket::State;

use super::{form_problem, LectureForm, LectureView, CHOSEN_LECTURES_PATH, SETTINGS_PATH};
use crate::data::lecture::LectureId;
use crate::data::store::Store;
use crate::gate::{Active, Denial};
use crate::middleware::notification::Notification;
use crate::resp::page::Page;
use crate::resp::Rejection;
use crate::util::with_notification;
use crate::workload;

#[derive(Debug, Serialize)]
pub struct OptionsPage {}

#[get("/options")]
#[tracing::instrument]
pub async fn options(
    active: Result<Active, Denial>,
    notification: Notification,
) -> Result<Page<OptionsPage>, Rejection> {
    let Active(student) = active?;
    Ok(Page::for_student(&student, notification, OptionsPage {}))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLecturePage {
    /// Set once a semester was picked.
    pub semester: Option<String>,
    /// Distinct semester labels, offered while no semester is picked.
    pub all_semesters: Vec<String>,
    /// Lectures of the picked semester the student isn't subscribed to.
    pub lectures: Vec<LectureView>,
}

#[get("/addLecture?<semester>")]
#[tracing::instrument(skip(store))]
pub async fn add_lecture(
    semester: Option<String>,
    active: Result<Active, Denial>,
    notification: Notification,
    store: &State<Store>,
) -> Result<Page<AddLecturePage>, Rejection> {
    let Active(student) = active?;
    let lectures = store.lectures().await?;

    let content = match semester {
        Some(semester) => AddLecturePage {
            lectures: lectures
                .into_iter()
                .filter(|l| l.semester == semester && !student.is_subscribed(l.id))
                .map(LectureView::from)
                .collect(),
            semester: Some(semester),
            all_semesters: vec![],
        },
        None => {
            let mut all_semesters: Vec<String> = vec![];
            for lecture in lectures {
                if !all_semesters.contains(&lecture.semester) {
                    all_semesters.push(lecture.semester);
                }
            }
            AddLecturePage {
                semester: None,
                all_semesters,
                lectures: vec![],
            }
        }
    };

    Ok(Page::for_student(&student, notification, content))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChosenLecturesPage {
    pub chosen_lectures: Vec<LectureView>,
}

#[get("/options/chosenLectures")]
#[tracing::instrument(skip(store))]
pub async fn chosen_lectures(
    active: Result<Active, Denial>,
    notification: Notification,
    store: &State<Store>,
) -> Result<Page<ChosenLecturesPage>, Rejection> {
    let Active(student) = active?;
    let chosen_lectures = workload::subscribed_lectures(store.inner().as_ref(), &student)
        .await?
        .into_iter()
        .map(LectureView::from)
        .collect();

    Ok(Page::for_student(
        &student,
        notification,
        ChosenLecturesPage { chosen_lectures },
    ))
}

#[post("/options/chosenLectures/add", data = "<form>")]
#[tracing::instrument(skip(store))]
pub async fn chosen_lectures_add(
    form: Result<Form<LectureForm>, Errors<'_>>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Redirect, Rejection> {
    let Active(student) = active?;
    let form = form.map_err(form_problem)?;

    workload::subscribe(store.inner().as_ref(), &student, LectureId(form.lecture_id)).await?;
    Ok(Redirect::to(with_notification(
        CHOSEN_LECTURES_PATH,
        "Lecture added to list",
    )))
}

/// Removes the lecture from the list; recorded hours are kept.
#[post("/options/chosenLectures/remove", data = "<form>")]
#[tracing::instrument(skip(store))]
pub async fn chosen_lectures_remove(
    form: Result<Form<LectureForm>, Errors<'_>>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Redirect, Rejection> {
    let Active(student) = active?;
    let form = form.map_err(form_problem)?;

    store
        .unsubscribe_lecture(&student.id, LectureId(form.lecture_id))
        .await?;
    Ok(Redirect::to(with_notification(
        CHOSEN_LECTURES_PATH,
        "Lecture removed from list",
    )))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPage {
    #[serde(rename = "studentID")]
    pub student_id: String,
    pub semester_of_study: u32,
}

#[get("/options/settings")]
#[tracing::instrument]
pub async fn settings(
    active: Result<Active, Denial>,
    notification: Notification,
) -> Result<Page<SettingsPage>, Rejection> {
    let Active(student) = active?;

    Ok(Page::for_student(
        &student,
        notification,
        SettingsPage {
            student_id: student.id.to_string(),
            semester_of_study: student.semester_of_study,
        },
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermanentDeletePage {
    /// Lectures the student recorded hours for, subscribed or not.
    pub all_lectures: Vec<LectureView>,
}

#[get("/options/settings/permanentDelete")]
#[tracing::instrument(skip(store))]
pub async fn permanent_delete(
    active: Result<Active, Denial>,
    notification: Notification,
    store: &State<Store>,
) -> Result<Page<PermanentDeletePage>, Rejection> {
    let Active(student) = active?;
    let store = store.inner().as_ref();

    let recorded: BTreeSet<LectureId> = workload::entries(store, &student, None, None)
        .await?
        .into_iter()
        .map(|e| e.lecture)
        .collect();

    let mut all_lectures = Vec::with_capacity(recorded.len());
    for id in recorded {
        if let Some(lecture) = store.lecture(id).await? {
            all_lectures.push(LectureView::from(lecture));
        }
    }

    Ok(Page::for_student(
        &student,
        notification,
        PermanentDeletePage { all_lectures },
    ))
}

/// Unsubscribes from the lecture and deletes every hour recorded for it.
#[post("/options/settings/permanentDelete", data = "<form>")]
#[tracing::instrument(skip(store))]
pub async fn permanent_delete_submit(
    form: Result<Form<LectureForm>, Errors<'_>>,
    active: Result<Active, Denial>,
    store: &State<Store>,
) -> Result<Redirect, Rejection> {
    let Active(student) = active?;
    let form = form.map_err(form_problem)?;
    let store = store.inner().as_ref();

    let lecture = workload::lecture_or_not_found(store, LectureId(form.lecture_id)).await?;
    workload::permanently_delete(store, &student, lecture.id).await?;

    Ok(Redirect::to(with_notification(
        SETTINGS_PATH,
        &format!("All data of {} has been deleted.", lecture.name),
    )))
}

#[cfg(test)]
mod options_endpoints {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use crate::data::store::Store;
    use crate::testing::{client, login, subscribe};

    async fn page(
        client: &rocket::local::asynchronous::Client,
        session: &rocket::http::Cookie<'static>,
        uri: &str,
    ) -> Value {
        let response = client.get(uri).cookie(session.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Ok, "{}", uri);
        response.into_json().await.unwrap()
    }

    #[rocket::async_test]
    async fn add_lecture_lists_semesters_then_unsubscribed_lectures() {
        let client = client().await;
        let session = login(&client, "student1", true).await;

        let semesters = page(&client, &session, "/app/workload/addLecture").await;
        assert_eq!(semesters["allSemesters"], json!(["Bachelor 1", "Bachelor 3"]));

        subscribe(&client, &session, 1).await;
        let lectures = page(
            &client,
            &session,
            "/app/workload/addLecture?semester=Bachelor%201",
        )
        .await;
        assert_eq!(lectures["semester"], json!("Bachelor 1"));
        assert_eq!(
            lectures["lectures"],
            json!([{"id": 2, "name": "Linear Algebra", "semester": "Bachelor 1"}])
        );
    }

    #[rocket::async_test]
    async fn chosen_lectures_keep_insertion_order() {
        let client = client().await;
        let session = login(&client, "student1", true).await;

        subscribe(&client, &session, 3).await;
        subscribe(&client, &session, 1).await;
        subscribe(&client, &session, 3).await;

        let chosen = page(&client, &session, "/app/workload/options/chosenLectures").await;
        let ids: Vec<&Value> = chosen["chosenLectures"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| &l["id"])
            .collect();
        assert_eq!(ids, vec![&json!(3), &json!(1)]);

        let response = client
            .post("/app/workload/options/chosenLectures/remove")
            .header(ContentType::Form)
            .cookie(session.clone())
            .body("lectureId=3")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::SeeOther);

        let chosen = page(
            &client,
            &session,
            "/app/workload/options/chosenLectures?notification=Lecture%20removed%20from%20list",
        )
        .await;
        assert_eq!(chosen["notification"], json!("Lecture removed from list"));
        assert_eq!(chosen["chosenLectures"].as_array().unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn permanent_delete_removes_history() {
        let client = client().await;
        let session = login(&client, "student1", true).await;
        subscribe(&client, &session, 1).await;

        for week in 2..=4 {
            client
                .post("/app/workload/enterWorkloadData")
                .header(ContentType::Form)
                .cookie(session.clone())
                .body(format!(
                    "year=2024&week={}&lectureId=1&hoursInLecture=1&hoursForHomework=1&hoursStudying=1",
                    week
                ))
                .dispatch()
                .await;
        }

        let listed = page(&client, &session, "/app/workload/options/settings/permanentDelete").await;
        assert_eq!(listed["allLectures"][0]["id"], json!(1));

        let response = client
            .post("/app/workload/options/settings/permanentDelete")
            .header(ContentType::Form)
            .cookie(session.clone())
            .body("lectureId=1")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::SeeOther);

        let store: &Store = client.rocket().state().unwrap();
        let student = store.student(&"student1".into()).await.unwrap().unwrap();
        assert!(student.lectures.is_empty());

        let listed = page(&client, &session, "/app/workload/options/settings/permanentDelete").await;
        assert_eq!(listed["allLectures"], json!([]));

        let settings = page(&client, &session, "/app/workload/options/settings").await;
        assert_eq!(settings["studentID"], json!("student1"));
        assert_eq!(settings["semesterOfStudy"], json!(2));
    }

    #[rocket::async_test]
    async fn unknown_lecture_cant_be_added() {
        let client = client().await;
        let session = login(&client, "student1", true).await;

        let response = client
            .post("/app/workload/options/chosenLectures/add")
            .header(ContentType::Form)
            .cookie(session)
            .body("lectureId=99")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
