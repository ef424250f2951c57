//! Access control in front of every workload operation.
//!
//! A student session moves through
//! `Unauthenticated -> Authenticated -> PrivacyPending -> Active`.
//! Each step is a request guard that either yields the acting student or a
//! [`Denial`] naming the reason. Handlers take guards as
//! `Result<Guard, Denial>` and decide the order they are checked in, so the
//! pipeline stays visible at the route.

use std::collections::HashMap;

use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};
use rocket::response::{self, Redirect, Responder};
use thiserror::Error;

use crate::config::Config;
use crate::data::store::Store;
use crate::data::student::Student;
use crate::identity::IdentityAssertion;
use crate::resp::jwt::{auth_problem, extract_claims};
use crate::resp::problem::Problem;
use crate::route::web::PRIVACY_PATH;
use crate::security::Security;
use crate::util::with_notification;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AccessState {
    Unauthenticated,
    Authenticated,
    PrivacyPending,
    Active,
}

/// State of a request given the student its session resolved to, if any.
pub fn access_state(student: Option<&Student>) -> AccessState {
    match student {
        None => AccessState::Unauthenticated,
        Some(s) if s.agreed_to_privacy => AccessState::Active,
        Some(_) => AccessState::PrivacyPending,
    }
}

#[derive(Debug, Clone, Error)]
pub enum Denial {
    #[error("not authenticated: {0}")]
    Unauthenticated(String),
    #[error("request doesn't carry the client marker")]
    MissingClientMarker,
    #[error("privacy agreement hasn't been accepted")]
    PrivacyPending,
    #[error(transparent)]
    Internal(Problem),
}

impl<'r> Responder<'r, 'static> for Denial {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        tracing::debug!("denied access to {}: {}", req.uri(), self);
        match self {
            Denial::Unauthenticated(detail) => auth_problem(detail).respond_to(req),
            Denial::MissingClientMarker => {
                Problem::new_untyped(Status::Forbidden, "Unknown client.").respond_to(req)
            }
            Denial::PrivacyPending => Redirect::to(with_notification(
                PRIVACY_PATH,
                "Please confirm the privacy policy.",
            ))
            .respond_to(req),
            Denial::Internal(problem) => problem.respond_to(req),
        }
    }
}

pub fn check_client_marker(header: Option<&str>, marker: &str) -> Result<(), Denial> {
    match header {
        Some(value) if value.contains(marker) => Ok(()),
        _ => Err(Denial::MissingClientMarker),
    }
}

pub fn check_session(student: Option<Student>) -> Result<Student, Denial> {
    student.ok_or_else(|| Denial::Unauthenticated("Session refers to an unknown student.".into()))
}

pub fn check_privacy(student: Student) -> Result<Student, Denial> {
    match access_state(Some(&student)) {
        AccessState::Active => Ok(student),
        _ => Err(Denial::PrivacyPending),
    }
}

fn managed<'r, T: Send + Sync + 'static>(req: &'r Request<'_>) -> Result<&'r T, Denial> {
    req.rocket().state::<T>().ok_or_else(|| {
        Denial::Internal(Problem::new_untyped(
            Status::InternalServerError,
            "Server state is incomplete.",
        ))
    })
}

fn deny<S>(denial: Denial) -> request::Outcome<S, Denial> {
    let status = match &denial {
        Denial::Unauthenticated(_) => Status::Unauthorized,
        Denial::MissingClientMarker => Status::Forbidden,
        Denial::PrivacyPending => Status::SeeOther,
        Denial::Internal(problem) => problem.status,
    };
    Outcome::Error((status, denial))
}

macro_rules! try_allow {
    ($expr:expr) => {
        match $expr {
            Ok(it) => it,
            Err(denial) => return deny(denial),
        }
    };
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for IdentityAssertion {
    type Error = Denial;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config: &Config = try_allow!(managed(req));
        let identity = &config.identity;

        let remote_user = match req.headers().get_one(&identity.remote_user_header) {
            Some(it) if !it.trim().is_empty() => it.trim().to_string(),
            _ => {
                return deny(Denial::Unauthenticated(
                    "Request carries no identity assertion.".into(),
                ))
            }
        };

        let attributes: HashMap<String, String> = identity
            .attribute_headers
            .iter()
            .filter_map(|name| {
                req.headers()
                    .get_one(name)
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();

        Outcome::Success(IdentityAssertion {
            remote_user,
            attributes,
        })
    }
}

/// A request with a valid session for a known student.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Student);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Authenticated {
    type Error = Denial;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let security: &Security = try_allow!(managed(req));
        let store: &Store = try_allow!(managed(req));

        let claims = match extract_claims(req.cookies(), security) {
            Ok(it) => it,
            Err(problem) => {
                tracing::debug!("unable to extract session claims from cookies");
                return deny(Denial::Unauthenticated(
                    problem.detail.unwrap_or(problem.title),
                ));
            }
        };

        let student = match store.student(&claims.sub).await {
            Ok(it) => it,
            Err(e) => return deny(Denial::Internal(e.into())),
        };

        Outcome::Success(Authenticated(try_allow!(check_session(student))))
    }
}

/// An authenticated student who has accepted the privacy agreement.
#[derive(Debug, Clone)]
pub struct Active(pub Student);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Active {
    type Error = Denial;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Authenticated(student) = match req.guard::<Authenticated>().await {
            Outcome::Success(it) => it,
            Outcome::Error(e) => return Outcome::Error(e),
            Outcome::Forward(status) => return Outcome::Forward(status),
        };

        Outcome::Success(Active(try_allow!(check_privacy(student))))
    }
}

/// Requests sent by the mobile app.
#[derive(Debug, Clone, Copy)]
pub struct AppClient;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AppClient {
    type Error = Denial;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config: &Config = try_allow!(managed(req));
        let header = req.headers().get_one(&config.api.client_marker_header);

        try_allow!(check_client_marker(header, &config.api.client_marker));
        Outcome::Success(AppClient)
    }
}
