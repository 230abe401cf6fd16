//! Server-rendered pages.

use askama::Template;
use rocket::request::FlashMessage;
use rocket::response::content::RawHtml;

use crate::error::Result;
use crate::languages::{Language, LANGUAGES};
use crate::models::{CodeFile, Project, ProjectSummary, User, UserStats};
use crate::session::SessionUser;

/// What every page needs for the navigation bar and flash banner.
#[derive(Debug, Default)]
pub struct Layout {
    pub username: String,
    pub flash_kind: String,
    pub flash_message: String,
}

impl Layout {
    pub fn new(user: Option<&SessionUser>, flash: Option<FlashMessage<'_>>) -> Self {
        let (flash_kind, flash_message) = flash
            .map(|f| (f.kind().to_string(), f.message().to_string()))
            .unwrap_or_default();
        Layout {
            username: user.map(|u| u.username.clone()).unwrap_or_default(),
            flash_kind,
            flash_message,
        }
    }

    pub fn logged_in(&self) -> bool {
        !self.username.is_empty()
    }

    pub fn has_flash(&self) -> bool {
        !self.flash_message.is_empty()
    }

    /// Bootstrap alert class for the flash kind.
    pub fn alert_class(&self) -> &'static str {
        match self.flash_kind.as_str() {
            "success" => "success",
            "error" => "danger",
            "warning" => "warning",
            _ => "info",
        }
    }
}

pub fn render<T: Template>(page: &T) -> Result<RawHtml<String>> {
    Ok(RawHtml(page.render()?))
}

fn date(value: &chrono::NaiveDateTime) -> String {
    value.format("%b %d, %Y").to_string()
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutPage {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub layout: Layout,
    pub min_username: usize,
    pub max_username: usize,
    pub min_password: usize,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub layout: Layout,
}

pub struct ProjectCard {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub language: String,
    pub is_public: bool,
    pub file_count: i64,
    pub updated: String,
}

impl From<ProjectSummary> for ProjectCard {
    fn from(summary: ProjectSummary) -> Self {
        let ProjectSummary { project, file_count } = summary;
        ProjectCard {
            updated: date(&project.updated_at),
            id: project.id,
            title: project.title,
            description: project.description,
            language: project.language,
            is_public: project.is_public,
            file_count,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub layout: Layout,
    pub projects: Vec<ProjectCard>,
    pub query: String,
}

#[derive(Template)]
#[template(path = "new_project.html")]
pub struct NewProjectPage {
    pub layout: Layout,
    pub languages: &'static [Language],
}

impl NewProjectPage {
    pub fn new(layout: Layout) -> Self {
        NewProjectPage {
            layout,
            languages: LANGUAGES,
        }
    }
}

#[derive(Template)]
#[template(path = "project.html")]
pub struct ProjectPage {
    pub layout: Layout,
    pub project: Project,
    pub files: Vec<CodeFile>,
    pub created: String,
    pub updated: String,
}

impl ProjectPage {
    pub fn new(layout: Layout, project: Project, files: Vec<CodeFile>) -> Self {
        ProjectPage {
            layout,
            created: date(&project.created_at),
            updated: date(&project.updated_at),
            project,
            files,
        }
    }
}

#[derive(Template)]
#[template(path = "editor.html")]
pub struct EditorPage {
    pub layout: Layout,
    pub project: Project,
    pub file: CodeFile,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub layout: Layout,
    pub user: User,
    pub bio: String,
    pub member_since: String,
    pub stats: UserStats,
}

impl ProfilePage {
    pub fn new(layout: Layout, user: User, stats: UserStats) -> Self {
        ProfilePage {
            layout,
            bio: user.bio.clone().unwrap_or_default(),
            member_since: date(&user.created_at),
            user,
            stats,
        }
    }
}

#[derive(Template)]
#[template(path = "apology.html")]
pub struct ApologyPage {
    pub layout: Layout,
    pub code: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apology_escapes_message() {
        let page = ApologyPage {
            layout: Layout::default(),
            code: 400,
            message: "<script>alert(1)</script>".to_string(),
        };
        let html = page.render().unwrap();
        assert!(html.contains("400"));
        assert!(!html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn layout_shows_logged_in_user() {
        let user = SessionUser {
            id: 1,
            username: "hana".to_string(),
        };
        let page = AboutPage {
            layout: Layout::new(Some(&user), None),
        };
        let html = page.render().unwrap();
        assert!(html.contains("hana"));
        assert!(html.contains("/logout"));
    }

    #[test]
    fn new_project_lists_every_language() {
        let html = NewProjectPage::new(Layout::default()).render().unwrap();
        for lang in LANGUAGES {
            assert!(html.contains(&format!("value=\"{}\"", lang.tag)), "{}", lang.tag);
        }
    }
}
