use rocket::FromForm;

use super::validation::{self, field};
use crate::error::{Error, Result};
use crate::languages::{self, DEFAULT_LANGUAGE};
use crate::models::{CodeFile, NewCodeFile, NewProject, Project, ProjectSummary};
use crate::store::Store;

#[derive(FromForm, Debug, Default)]
pub struct ProjectForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    /// Checkbox: present when ticked.
    pub is_public: Option<String>,
}

fn project_not_found() -> Error {
    Error::not_found("Project not found")
}

fn file_not_found() -> Error {
    Error::not_found("File not found")
}

/// Creates the project together with a starter file for its language.
pub fn create_project(store: &dyn Store, owner_id: i32, form: &ProjectForm) -> Result<(Project, CodeFile)> {
    let title = field(&form.title);
    let description = field(&form.description);
    validation::validate_title(title)?;
    validation::validate_description(description)?;

    let tag = match field(&form.language) {
        "" => DEFAULT_LANGUAGE,
        tag => tag,
    };
    let language =
        languages::find(tag).ok_or_else(|| Error::invalid(format!("Unsupported language: {tag}")))?;
    let is_public = !matches!(field(&form.is_public), "" | "false" | "off" | "0");

    let (project, file) = store.create_project(
        &NewProject {
            owner_id,
            title,
            description,
            language: language.tag,
            is_public,
        },
        language.filename,
        language.starter,
    )?;

    tracing::info!(project_id = project.id, owner_id, language = %project.language, "created project");
    Ok((project, file))
}

pub fn list_projects(store: &dyn Store, owner_id: i32, query: Option<&str>) -> Result<Vec<ProjectSummary>> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    store.list_projects(owner_id, query)
}

pub fn project_with_files(store: &dyn Store, owner_id: i32, project_id: i32) -> Result<(Project, Vec<CodeFile>)> {
    let project = store
        .get_project(project_id, owner_id)?
        .ok_or_else(project_not_found)?;
    let files = store.list_files(project.id, owner_id)?;
    Ok((project, files))
}

/// Loads a file for the editor. The file must sit in the given project.
pub fn open_file(store: &dyn Store, owner_id: i32, project_id: i32, file_id: i32) -> Result<(Project, CodeFile)> {
    let project = store
        .get_project(project_id, owner_id)?
        .ok_or_else(project_not_found)?;
    let file = store
        .get_file(file_id, owner_id)?
        .filter(|file| file.project_id == project.id)
        .ok_or_else(file_not_found)?;
    Ok((project, file))
}

pub fn create_file(store: &dyn Store, owner_id: i32, project_id: i32, filename: &str) -> Result<CodeFile> {
    let filename = filename.trim();
    validation::validate_filename(filename)?;

    let project = store
        .get_project(project_id, owner_id)?
        .ok_or_else(project_not_found)?;

    let conflict = || Error::Conflict(format!("A file named {filename} already exists in this project"));
    if store.get_file_by_name(project.id, filename)?.is_some() {
        return Err(conflict());
    }

    let file = store
        .create_file(&NewCodeFile {
            project_id: project.id,
            filename,
            content: "",
            language: languages::detect(filename),
        })
        .map_err(|err| match err {
            Error::Conflict(_) => conflict(),
            other => other,
        })?;

    tracing::info!(file_id = file.id, project_id = project.id, "created file");
    Ok(file)
}

pub fn save_code(store: &dyn Store, owner_id: i32, file_id: i32, content: &str) -> Result<CodeFile> {
    let file = store
        .update_file_content(file_id, owner_id, content)?
        .ok_or_else(file_not_found)?;
    tracing::debug!(file_id, bytes = content.len(), "saved file");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::store::MemoryStore;

    fn owner(store: &MemoryStore, name: &str) -> i32 {
        let email = format!("{name}@example.com");
        store
            .create_user(&NewUser {
                username: name,
                email: &email,
                password_hash: "x",
            })
            .unwrap()
            .id
    }

    fn form(title: &str, language: &str) -> ProjectForm {
        ProjectForm {
            title: Some(title.to_string()),
            description: Some("  a description  ".to_string()),
            language: Some(language.to_string()),
            is_public: Some("on".to_string()),
        }
    }

    #[test]
    fn new_project_gets_language_starter_file() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice");

        let (project, file) = create_project(&store, alice, &form("Game", "java")).unwrap();
        assert_eq!(project.description, "a description");
        assert!(project.is_public);
        assert_eq!(file.filename, "Main.java");
        assert_eq!(file.language, "java");
        assert!(file.content.contains("public static void main"));
    }

    #[test]
    fn language_defaults_to_python_and_unknown_is_rejected() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice");

        let (project, _) = create_project(&store, alice, &form("Default", "")).unwrap();
        assert_eq!(project.language, "python");

        let err = create_project(&store, alice, &form("Nope", "cobol")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = create_project(&store, alice, &form("   ", "python")).unwrap_err();
        assert_eq!(err.to_string(), "Must provide a project title");
    }

    #[test]
    fn unticked_checkbox_makes_project_private() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice");
        let mut private = form("Private", "c");
        private.is_public = None;

        let (project, _) = create_project(&store, alice, &private).unwrap();
        assert!(!project.is_public);
    }

    #[test]
    fn files_detect_language_and_reject_duplicates() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice");
        let (project, _) = create_project(&store, alice, &form("Site", "html")).unwrap();

        let file = create_file(&store, alice, project.id, " app.js ").unwrap();
        assert_eq!(file.filename, "app.js");
        assert_eq!(file.language, "javascript");
        assert_eq!(file.content, "");

        let err = create_file(&store, alice, project.id, "app.js").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let err = create_file(&store, alice, project.id, "../app.js").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn other_users_cannot_touch_projects_or_files() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice");
        let mallory = owner(&store, "mallory");
        let (project, file) = create_project(&store, alice, &form("Secret", "rust")).unwrap();

        assert!(matches!(project_with_files(&store, mallory, project.id), Err(Error::NotFound(_))));
        assert!(matches!(open_file(&store, mallory, project.id, file.id), Err(Error::NotFound(_))));
        assert!(matches!(create_file(&store, mallory, project.id, "x.rs"), Err(Error::NotFound(_))));
        assert!(matches!(save_code(&store, mallory, file.id, "pwned"), Err(Error::NotFound(_))));

        let (_, reloaded) = open_file(&store, alice, project.id, file.id).unwrap();
        assert_eq!(reloaded.content, file.content);
    }

    #[test]
    fn editor_requires_file_to_belong_to_project() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice");
        let (first, _) = create_project(&store, alice, &form("One", "go")).unwrap();
        let (_, other_file) = create_project(&store, alice, &form("Two", "go")).unwrap();

        let err = open_file(&store, alice, first.id, other_file.id).unwrap_err();
        assert_eq!(err.to_string(), "File not found");
    }

    #[test]
    fn search_ignores_blank_queries() {
        let store = MemoryStore::new();
        let alice = owner(&store, "alice");
        create_project(&store, alice, &form("Alpha", "python")).unwrap();
        create_project(&store, alice, &form("Beta", "python")).unwrap();

        assert_eq!(list_projects(&store, alice, Some("  ")).unwrap().len(), 2);
        assert_eq!(list_projects(&store, alice, Some("alp")).unwrap().len(), 1);
    }
}
