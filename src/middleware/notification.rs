use std::convert::Infallible;

use rocket::request::{FromRequest, Outcome, Request};

/// One-shot message passed along in the `notification` query parameter,
/// usually by the redirect that led to the current page.
///
/// Only the query string is read. Form posts answer with a redirect or an
/// empty status, never with a page, so a `notification` field in a request
/// body would have nowhere to show up and is left to the data guard.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Notification(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Notification {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let message: Option<String> = request
            .query_value::<String>("notification")
            .and_then(|it| it.ok())
            .filter(|it| !it.is_empty());

        Outcome::Success(Notification(message))
    }
}

#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;

    use super::Notification;

    #[get("/")]
    fn shown(notification: Notification) -> String {
        format!("{:?}", notification.0)
    }

    #[post("/", data = "<body>")]
    fn posted(notification: Notification, body: String) -> String {
        format!("{}|{}", notification.0.unwrap_or_default(), body)
    }

    async fn client() -> Client {
        Client::untracked(rocket::build().mount("/", routes![shown, posted]))
            .await
            .expect("invalid rocket")
    }

    #[rocket::async_test]
    async fn read_from_query_and_empty_is_none() {
        let client = client().await;

        let response = client.get("/?notification=Saved%21").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), r#"Some("Saved!")"#);

        let response = client.get("/?notification=").dispatch().await;
        assert_eq!(response.into_string().await.unwrap(), "None");

        let response = client.get("/").dispatch().await;
        assert_eq!(response.into_string().await.unwrap(), "None");
    }

    #[rocket::async_test]
    async fn body_stays_with_data_guard() {
        let client = client().await;

        let response = client
            .post("/?notification=fromQuery")
            .header(ContentType::Form)
            .body("notification=fromBody")
            .dispatch()
            .await;
        assert_eq!(
            response.into_string().await.unwrap(),
            "fromQuery|notification=fromBody"
        );
    }
}
