use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;

use crate::data::student::Student;
use crate::middleware::notification::Notification;

/// View model of a web page.
///
/// Rendering happens elsewhere; the surface only delivers the data a page
/// template needs plus the one-shot notification it was reached with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: Serialize> {
    pub notification: Option<String>,
    pub has_notification: bool,
    /// Set for test accounts so templates can flag them.
    pub ignore_data: bool,
    #[serde(flatten)]
    pub content: T,
}

impl<T: Serialize> Page<T> {
    pub fn new(notification: Notification, content: T) -> Page<T> {
        let Notification(notification) = notification;
        Page {
            has_notification: notification.is_some(),
            notification,
            ignore_data: false,
            content,
        }
    }

    pub fn for_student(student: &Student, notification: Notification, content: T) -> Page<T> {
        Page {
            ignore_data: student.ignore_data,
            ..Page::new(notification, content)
        }
    }
}

impl<'r, T: Serialize> Responder<'r, 'static> for Page<T> {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        Json(self).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Content {
        lectures: Vec<u32>,
    }

    #[test]
    fn content_is_flattened_next_to_notification() {
        let page = Page::new(
            Notification(Some("Saved.".to_string())),
            Content { lectures: vec![1] },
        );

        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({
                "notification": "Saved.",
                "hasNotification": true,
                "ignoreData": false,
                "lectures": [1]
            })
        );
    }
}
