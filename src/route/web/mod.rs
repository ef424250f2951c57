//! The student facing website.
//!
//! Pages are delivered as view models; every one of them echoes the
//! `notification` it was reached with. Mutations answer with a redirect that
//! carries the next notification.

use rocket::form::Errors;
use rocket::http::Status;
use rocket::Route;
use serde::Serialize;

use crate::data::lecture::{Lecture, LectureId};
use crate::resp::problem::Problem;

pub mod calendar;
pub mod options;
pub mod session;

pub const WEB_BASE: &str = "/app/workload";
pub const INDEX_PATH: &str = "/app/workload";
pub const LOGIN_PATH: &str = "/app/workload/login";
pub const PRIVACY_PATH: &str = "/app/workload/privacyAgreement";
pub const CALENDAR_PATH: &str = "/app/workload/calendar";
pub const CHOSEN_LECTURES_PATH: &str = "/app/workload/options/chosenLectures";
pub const SETTINGS_PATH: &str = "/app/workload/options/settings";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LectureView {
    pub id: LectureId,
    pub name: String,
    pub semester: String,
}

impl From<Lecture> for LectureView {
    fn from(lecture: Lecture) -> Self {
        LectureView {
            id: lecture.id,
            name: lecture.name,
            semester: lecture.semester,
        }
    }
}

/// Form naming a single lecture.
#[derive(Debug, Clone, FromForm)]
pub struct LectureForm {
    #[field(name = "lectureId")]
    pub lecture_id: u32,
}

pub(crate) fn form_problem(errors: Errors<'_>) -> Problem {
    Problem::new_untyped(Status::BadRequest, "Invalid request data.")
        .detail(errors)
        .clone()
}

pub fn web_routes() -> Vec<Route> {
    routes![
        session::index,
        session::login,
        session::logout,
        session::privacy_agreement,
        session::privacy_agreement_submit,
        calendar::calendar,
        calendar::select_lecture,
        calendar::enter_workload_data,
        calendar::enter_workload_data_submit,
        calendar::visualize_data,
        options::options,
        options::add_lecture,
        options::chosen_lectures,
        options::chosen_lectures_add,
        options::chosen_lectures_remove,
        options::settings,
        options::permanent_delete,
        options::permanent_delete_submit,
    ]
}
