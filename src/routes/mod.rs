use rocket::response::content::RawHtml;
use rocket::response::Redirect;
use rocket::tokio::task;
use rocket::{catchers, routes, Catcher, Responder, Route};

use crate::error::Result;
use crate::store::Store;
use crate::AppState;

pub mod api;
pub mod auth;
pub mod catchers;
pub mod pages;
pub mod projects;

/// A page that may send the browser elsewhere instead.
#[derive(Responder)]
pub enum Page {
    Html(RawHtml<String>),
    Redirect(Redirect),
}

/// Runs store and bcrypt work on the blocking pool.
pub(crate) async fn blocking<T, F>(app_state: &AppState, work: F) -> Result<T>
where
    F: FnOnce(&dyn Store, u32) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = app_state.shared_store();
    let cost = app_state.password_cost();
    task::spawn_blocking(move || work(store.as_ref(), cost)).await?
}

pub fn page_routes() -> Vec<Route> {
    routes![
        pages::index,
        pages::about,
        pages::dashboard,
        pages::profile,
        auth::register_form,
        auth::register,
        auth::login_form,
        auth::login,
        auth::logout,
        projects::new_project_form,
        projects::new_project,
        projects::show_project,
        projects::editor,
    ]
}

pub fn api_routes() -> Vec<Route> {
    routes![api::save_code, api::create_file]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![
        catchers::bad_request,
        catchers::unauthorized,
        catchers::not_found,
        catchers::unprocessable_entity,
        catchers::internal_server_error,
    ]
}
