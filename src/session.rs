use rocket::http::{CookieJar, Status};
use rocket::request::{FromRequest, Outcome, Request};

use crate::models::User;
use crate::AppState;

pub const USER_ID_COOKIE: &str = "user_id";
pub const USERNAME_COOKIE: &str = "username";

/// The logged-in user, read from the signed session cookies.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    LoginRequired,
    /// The cookie names a user the store no longer knows, e.g. after an in-memory restart.
    UnknownUser,
    NoAppState,
    StoreUnavailable,
}

pub fn start(cookies: &CookieJar<'_>, user: &User) {
    cookies.add_private((USER_ID_COOKIE, user.id.to_string()));
    cookies.add_private((USERNAME_COOKIE, user.username.clone()));
}

pub fn clear(cookies: &CookieJar<'_>) {
    cookies.remove_private(USER_ID_COOKIE);
    cookies.remove_private(USERNAME_COOKIE);
}

/// Username from the session cookie, without touching the store.
pub fn username(cookies: &CookieJar<'_>) -> Option<String> {
    cookies
        .get_private(USERNAME_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

fn fail(req: &Request<'_>, status: Status, error: AuthError) -> Outcome<SessionUser, AuthError> {
    req.local_cache(|| Some(error));
    Outcome::Error((status, error))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(app_state) = req.rocket().state::<AppState>() else {
            return fail(req, Status::InternalServerError, AuthError::NoAppState);
        };

        let user_id = req
            .cookies()
            .get_private(USER_ID_COOKIE)
            .and_then(|cookie| cookie.value().parse::<i32>().ok());
        let Some(user_id) = user_id else {
            return fail(req, Status::Unauthorized, AuthError::LoginRequired);
        };

        match app_state.store().get_user(user_id) {
            Ok(Some(user)) => Outcome::Success(SessionUser {
                id: user.id,
                username: user.username,
            }),
            Ok(None) => fail(req, Status::Unauthorized, AuthError::UnknownUser),
            Err(err) => {
                tracing::error!(error = %err, "session lookup failed");
                fail(req, Status::InternalServerError, AuthError::StoreUnavailable)
            }
        }
    }
}
