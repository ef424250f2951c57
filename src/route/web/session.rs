use chrono::{Duration, Utc};
use rocket::form::{Errors, Form};
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::State;

use super::{form_problem, CALENDAR_PATH, INDEX_PATH, LOGIN_PATH, PRIVACY_PATH};
use crate::config::Config;
use crate::data::store::Store;
use crate::gate::{Authenticated, Denial};
use crate::identity::{IdentifierCleaner, IdentityAssertion};
use crate::middleware::notification::Notification;
use crate::resp::jwt::{SessionToken, AUTH_COOKIE_NAME};
use crate::resp::page::Page;
use crate::resp::Rejection;
use crate::security::Security;
use crate::util::with_notification;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPage {
    pub login: String,
}

#[get("/")]
#[tracing::instrument]
pub async fn index(notification: Notification) -> Page<IndexPage> {
    Page::new(
        notification,
        IndexPage {
            login: LOGIN_PATH.to_string(),
        },
    )
}

/// Turns the identity assertion of the service provider into a session.
///
/// The student is created on the first login; the semester of study is
/// refreshed on every login.
#[get("/login")]
#[tracing::instrument(skip(store, security, cleaner, cookies))]
pub async fn login(
    identity: Result<IdentityAssertion, Denial>,
    cookies: &CookieJar<'_>,
    store: &State<Store>,
    config: &State<Config>,
    security: &State<Security>,
    cleaner: &State<IdentifierCleaner>,
) -> Result<Redirect, Rejection> {
    let identity = identity?;
    let id = cleaner.clean(&identity.remote_user).ok_or_else(|| {
        tracing::warn!("unusable remote user identifier: {}", identity.remote_user);
        Denial::Unauthenticated("Unable to identify student.".into())
    })?;

    let student = store
        .resolve_student(&id, identity.semester_of_study(), Utc::now().date_naive())
        .await?;
    tracing::info!(
        "student {} logged in, semester of study {}",
        student.id,
        student.semester_of_study
    );

    let token = SessionToken::new(&student.id, Duration::days(config.session_days));
    cookies.add(token.cookie(security)?);

    Ok(Redirect::to(CALENDAR_PATH))
}

#[get("/logout")]
#[tracing::instrument(skip(cookies))]
pub async fn logout(cookies: &CookieJar<'_>) -> Redirect {
    cookies.remove(AUTH_COOKIE_NAME);
    Redirect::to(with_notification(INDEX_PATH, "You have been logged out."))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPage {
    pub has_agreed_to_privacy_agreement: bool,
}

#[get("/privacyAgreement")]
#[tracing::instrument]
pub async fn privacy_agreement(
    auth: Result<Authenticated, Denial>,
    notification: Notification,
) -> Result<Page<PrivacyPage>, Rejection> {
    let Authenticated(student) = auth?;

    Ok(Page::for_student(
        &student,
        notification,
        PrivacyPage {
            has_agreed_to_privacy_agreement: student.agreed_to_privacy,
        },
    ))
}

#[derive(Debug, FromForm)]
pub struct PrivacyForm {
    /// The checkbox; absent unless checked.
    pub privacy: bool,
}

#[post("/privacyAgreement", data = "<form>")]
#[tracing::instrument(skip(store))]
pub async fn privacy_agreement_submit(
    auth: Result<Authenticated, Denial>,
    form: Result<Form<PrivacyForm>, Errors<'_>>,
    store: &State<Store>,
) -> Result<Redirect, Rejection> {
    let Authenticated(student) = auth?;
    let form = form.map_err(form_problem)?;

    if !form.privacy {
        return Ok(Redirect::to(with_notification(
            PRIVACY_PATH,
            "You must check the checkbox.",
        )));
    }

    store.agree_to_privacy(&student.id).await?;
    tracing::info!("student {} agreed to the privacy agreement", student.id);

    Ok(Redirect::to(with_notification(
        CALENDAR_PATH,
        "You have agreed to the privacy agreement",
    )))
}
