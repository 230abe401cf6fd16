use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::content::RawHtml;
use rocket::response::{Flash, Redirect};
use rocket::{get, post, uri, State};

use crate::responses::Apology;
use crate::services::projects::{self, ProjectForm};
use crate::session::SessionUser;
use crate::views::{self, EditorPage, Layout, NewProjectPage, ProjectPage};
use crate::AppState;

#[get("/projects/new")]
pub fn new_project_form(user: SessionUser, flash: Option<FlashMessage<'_>>) -> Result<RawHtml<String>, Apology> {
    let page = NewProjectPage::new(Layout::new(Some(&user), flash));
    Ok(views::render(&page)?)
}

#[post("/projects/new", data = "<form>")]
pub fn new_project(
    user: SessionUser,
    form: Form<ProjectForm>,
    app_state: &State<AppState>,
) -> Result<Flash<Redirect>, Apology> {
    let (project, _) = projects::create_project(app_state.store(), user.id, &form)?;
    Ok(Flash::success(
        Redirect::to(uri!(show_project(project.id))),
        "Project created!",
    ))
}

#[get("/project/<id>")]
pub fn show_project(
    id: i32,
    user: SessionUser,
    app_state: &State<AppState>,
    flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, Apology> {
    let (project, files) = projects::project_with_files(app_state.store(), user.id, id)?;
    let page = ProjectPage::new(Layout::new(Some(&user), flash), project, files);
    Ok(views::render(&page)?)
}

#[get("/editor/<project_id>/<file_id>")]
pub fn editor(
    project_id: i32,
    file_id: i32,
    user: SessionUser,
    app_state: &State<AppState>,
    flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, Apology> {
    let (project, file) = projects::open_file(app_state.store(), user.id, project_id, file_id)?;
    let page = EditorPage {
        layout: Layout::new(Some(&user), flash),
        project,
        file,
    };
    Ok(views::render(&page)?)
}
