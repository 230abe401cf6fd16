use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::request::FlashMessage;
use rocket::response::content::RawHtml;
use rocket::response::{Flash, Redirect};
use rocket::{get, post, State};

use super::blocking;
use crate::responses::Apology;
use crate::services::auth::{login_user, register_user, LoginForm, RegisterForm};
use crate::services::validation::{PASSWORD_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN};
use crate::session::{self, SessionUser};
use crate::views::{self, Layout, LoginPage, RegisterPage};
use crate::AppState;

#[get("/register")]
pub fn register_form(
    user: Option<SessionUser>,
    flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, Apology> {
    let page = RegisterPage {
        layout: Layout::new(user.as_ref(), flash),
        min_username: USERNAME_MIN_LEN,
        max_username: USERNAME_MAX_LEN,
        min_password: PASSWORD_MIN_LEN,
    };
    Ok(views::render(&page)?)
}

#[post("/register", data = "<form>")]
pub async fn register(
    form: Form<RegisterForm>,
    app_state: &State<AppState>,
    cookies: &CookieJar<'_>,
) -> Result<Flash<Redirect>, Apology> {
    let form = form.into_inner();
    let user = blocking(app_state, move |store, cost| register_user(store, &form, cost)).await?;
    session::start(cookies, &user);
    Ok(Flash::success(Redirect::to("/dashboard"), "Registered!"))
}

// Visiting the login page always ends the current session.
#[get("/login")]
pub fn login_form(
    cookies: &CookieJar<'_>,
    flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, Apology> {
    session::clear(cookies);
    let page = LoginPage {
        layout: Layout::new(None, flash),
    };
    Ok(views::render(&page)?)
}

#[post("/login", data = "<form>")]
pub async fn login(
    form: Form<LoginForm>,
    app_state: &State<AppState>,
    cookies: &CookieJar<'_>,
) -> Result<Flash<Redirect>, Apology> {
    session::clear(cookies);
    let form = form.into_inner();
    let user = blocking(app_state, move |store, _| login_user(store, &form)).await?;
    session::start(cookies, &user);
    Ok(Flash::success(
        Redirect::to("/dashboard"),
        format!("Welcome back, {}!", user.username),
    ))
}

#[get("/logout")]
pub fn logout(cookies: &CookieJar<'_>) -> Flash<Redirect> {
    session::clear(cookies);
    Flash::success(Redirect::to("/"), "You have been logged out.")
}
