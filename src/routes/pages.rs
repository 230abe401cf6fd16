use rocket::request::FlashMessage;
use rocket::response::content::RawHtml;
use rocket::response::Redirect;
use rocket::{get, State};

use super::Page;
use crate::responses::Apology;
use crate::services::{auth, projects};
use crate::session::SessionUser;
use crate::views::{self, AboutPage, DashboardPage, IndexPage, Layout, ProfilePage, ProjectCard};
use crate::AppState;

#[get("/")]
pub fn index(user: Option<SessionUser>, flash: Option<FlashMessage<'_>>) -> Result<Page, Apology> {
    if user.is_some() {
        return Ok(Page::Redirect(Redirect::to("/dashboard")));
    }
    let page = IndexPage {
        layout: Layout::new(None, flash),
    };
    Ok(Page::Html(views::render(&page)?))
}

#[get("/about")]
pub fn about(user: Option<SessionUser>, flash: Option<FlashMessage<'_>>) -> Result<RawHtml<String>, Apology> {
    let page = AboutPage {
        layout: Layout::new(user.as_ref(), flash),
    };
    Ok(views::render(&page)?)
}

#[get("/dashboard?<q>")]
pub fn dashboard(
    q: Option<String>,
    user: SessionUser,
    app_state: &State<AppState>,
    flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, Apology> {
    let summaries = projects::list_projects(app_state.store(), user.id, q.as_deref())?;
    let page = DashboardPage {
        layout: Layout::new(Some(&user), flash),
        projects: summaries.into_iter().map(ProjectCard::from).collect(),
        query: q.map(|q| q.trim().to_string()).unwrap_or_default(),
    };
    Ok(views::render(&page)?)
}

#[get("/profile")]
pub fn profile(
    user: SessionUser,
    app_state: &State<AppState>,
    flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, Apology> {
    let (account, stats) = auth::profile(app_state.store(), user.id)?;
    let page = ProfilePage::new(Layout::new(Some(&user), flash), account, stats);
    Ok(views::render(&page)?)
}
