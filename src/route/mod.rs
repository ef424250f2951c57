use std::collections::BTreeMap;

use rocket::{Build, Rocket, Route};

pub mod api;
pub mod web;

use api::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    data::{entry::Hours, lecture::LectureId},
    resp::problem::Problem,
    week::WeekView,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        entries_all,
        entries_of_week,
        entries_of_lecture,
        entries_of_week_and_lecture,
        entry_submit,
        lecture_list,
        lecture_activation
    ),
    components(schemas(
        EntryResponse,
        LectureResponse,
        ActivationSubmission,
        Hours,
        LectureId,
        WeekView,
        Problem
    )),
    modifiers(&V1_PREFIX)
)]
pub struct ApiDocV1;

pub struct PathPrefix(pub &'static str);
static V1_PREFIX: PathPrefix = PathPrefix("/api/v1");

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut new_paths = BTreeMap::new();

        for (path, item) in std::mem::take(&mut openapi.paths.paths) {
            new_paths.insert(self.0.to_string() + path.as_ref(), item);
        }

        openapi.paths.paths = new_paths;
    }
}

pub fn api_v1() -> Vec<Route> {
    routes![
        entries_all,
        entries_of_week,
        entries_of_lecture,
        entries_of_week_and_lecture,
        entry_submit,
        entry_submit_form,
        lecture_list,
        lecture_activation,
        lecture_activation_form
    ]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api/v1", api_v1())
        .mount(web::WEB_BASE, web::web_routes())
        .mount(
            "/",
            SwaggerUi::new("/swagger/<_..>").url("/api/v1/openapi.json", ApiDocV1::openapi()),
        )
}
