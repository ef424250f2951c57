use std::io::Cursor;

use rocket::http::ContentType;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::{response, Request, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use utoipa::ToSchema;

use crate::data::store::StoreError;
use crate::error::ValidationError;
use crate::week::InvalidWeek;

/// Implements [RFC7807](https://tools.ietf.org/html/rfc7807).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Problem {
    #[serde(skip)]
    pub status: Status,
    pub type_uri: String,
    pub title: String,

    pub detail: Option<String>,
    pub instance_uri: Option<String>,

    #[schema(value_type = Object)]
    pub body: Map<String, Value>,
}

impl Default for Problem {
    fn default() -> Self {
        Problem {
            status: Status::InternalServerError,
            type_uri: "about:blank".to_string(),
            title: "Problem".to_string(),
            detail: None,
            instance_uri: None,
            body: Map::new(),
        }
    }
}

impl Problem {
    pub fn new_untyped(status: Status, title: impl ToString) -> Problem {
        Problem {
            status,
            type_uri: "about:blank".to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn detail(&mut self, value: impl ToString) -> &mut Problem {
        self.detail = Some(value.to_string());
        self
    }

    pub fn insert<V: Serialize>(&mut self, key: impl ToString, value: V) -> &mut Problem {
        self.body.insert(
            key.to_string(),
            serde_json::to_value(value).expect("data must be JSON serializable"),
        );
        self
    }

    pub fn insert_str(&mut self, key: impl ToString, value: impl ToString) -> &mut Problem {
        self.body
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.title)
    }
}

impl std::error::Error for Problem {}

impl<'r> Responder<'r, 'static> for Problem {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let mut body = self.body.clone();

        // Following are required by rfc7807
        body.insert(String::from("type"), Value::from(self.type_uri));
        body.insert(String::from("title"), Value::from(self.title));

        // Optional parameters as specified by rfc7807
        if let Some(detail) = self.detail {
            body.insert(String::from("detail"), Value::from(detail));
        }
        body.insert(String::from("status"), Value::from(self.status.code));
        if let Some(instance) = self.instance_uri {
            body.insert(String::from("instance"), Value::from(instance));
        }

        let body_string = serde_json::to_string(&body)
            .expect("JSON map keys and values must be JSON serializable");

        Response::build()
            .status(self.status)
            .header(ContentType::new("application", "problem+json"))
            .raw_header("Content-Language", "en")
            .sized_body(body_string.len(), Cursor::new(body_string))
            .ok()
    }
}

pub mod problems {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn lecture_not_found(id: impl ToString) -> Problem {
        Problem::new_untyped(Status::NotFound, "Lecture doesn't exist.")
            .insert_str("lecture", id)
            .clone()
    }
}

impl From<StoreError> for Problem {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::StudentNotFound(id) => {
                Problem::new_untyped(Status::NotFound, "Student doesn't exist.")
                    .insert_str("student", id)
                    .clone()
            }
            StoreError::LectureNotFound(id) => problems::lecture_not_found(id),
            StoreError::EntryNotFound(key) => {
                Problem::new_untyped(Status::NotFound, "Entry doesn't exist.")
                    .insert_str("lecture", key.lecture)
                    .insert_str("week", key.week)
                    .clone()
            }
            StoreError::Database(e) => Problem::from(e),
            StoreError::BsonSerialization(_) => Problem::new_untyped(
                Status::InternalServerError,
                "An error occurred while processing BSON data.",
            ),
        }
    }
}

impl From<ValidationError> for Problem {
    fn from(e: ValidationError) -> Self {
        Problem::new_untyped(Status::BadRequest, "Invalid request data.")
            .detail(e)
            .clone()
    }
}

impl From<InvalidWeek> for Problem {
    fn from(e: InvalidWeek) -> Self {
        Problem::new_untyped(Status::BadRequest, "Invalid ISO week.")
            .detail(e)
            .insert("year", e.year)
            .insert("week", e.week)
            .clone()
    }
}

impl From<mongodb::error::Error> for Problem {
    fn from(e: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        tracing::error!("database error: {}", e);

        fn mongodb_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "MongoDB failed while processing request.",
            )
        }

        fn access_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "Server was unable to access MongoDB.",
            )
        }

        match e.kind.as_ref() {
            ErrorKind::Authentication { .. } => access_problem(),
            ErrorKind::DnsResolve { .. } => access_problem(),
            ErrorKind::ServerSelection { .. } => access_problem(),
            ErrorKind::InvalidTlsConfig { .. } => access_problem(),
            ErrorKind::IncompatibleServer { .. } => access_problem(),
            ErrorKind::Io(_) => mongodb_problem()
                .detail("An IO error occurred. Submitted data might not be properly stored.")
                .clone(),
            ErrorKind::Write(_) => mongodb_problem()
                .detail("A write error occurred. Submitted data might not be properly stored.")
                .clone(),
            _ => mongodb_problem(),
        }
    }
}

impl From<serde_json::Error> for Problem {
    fn from(_: serde_json::Error) -> Self {
        Problem::new_untyped(
            Status::InternalServerError,
            "An error occurred while processing JSON data.",
        )
    }
}

impl From<jsonwebtoken::errors::Error> for Problem {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.into_kind() {
            ErrorKind::ExpiredSignature => {
                Problem::new_untyped(Status::Unauthorized, "Expired session token.")
            }
            _ => Problem::new_untyped(Status::Unauthorized, "Error while handling session token."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::lecture::LectureId;

    #[test]
    fn store_errors_map_to_statuses() {
        let p = Problem::from(StoreError::LectureNotFound(LectureId(7)));
        assert_eq!(p.status, Status::NotFound);
        assert_eq!(p.body.get("lecture"), Some(&Value::from("7")));

        let p = Problem::from(InvalidWeek {
            year: 2021,
            week: 53,
        });
        assert_eq!(p.status, Status::BadRequest);
        assert_eq!(p.body.get("week"), Some(&Value::from(53)));
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let p = Problem::from(ValidationError::IsActive("yes".to_string()));
        assert_eq!(p.status, Status::BadRequest);
        assert!(p.detail.unwrap().contains("yes"));
    }
}
