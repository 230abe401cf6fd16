use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, Utc};
use dashmap::DashMap;

use super::{matches_search, Backend, Store};
use crate::error::{Error, Result};
use crate::models::{
    CodeFile, NewCodeFile, NewProject, NewUser, Project, ProjectSummary, User, UserStats,
    DEFAULT_AVATAR_URL,
};

/// Process-local store used when no database can be opened. Data is lost on restart.
pub struct MemoryStore {
    users: DashMap<i32, User>,
    projects: DashMap<i32, Project>,
    files: DashMap<i32, CodeFile>,
    next_user_id: AtomicI32,
    next_project_id: AtomicI32,
    next_file_id: AtomicI32,
    // Held across check-then-insert so uniqueness holds under concurrent requests.
    writes: Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            users: DashMap::new(),
            projects: DashMap::new(),
            files: DashMap::new(),
            next_user_id: AtomicI32::new(1),
            next_project_id: AtomicI32::new(1),
            next_file_id: AtomicI32::new(1),
            writes: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn owns(&self, project_id: i32, owner_id: i32) -> bool {
        self.projects
            .get(&project_id)
            .map_or(false, |project| project.owner_id == owner_id)
    }

    fn insert_file(&self, file: &NewCodeFile<'_>, now: NaiveDateTime) -> Result<CodeFile> {
        let taken = self
            .files
            .iter()
            .any(|f| f.project_id == file.project_id && f.filename == file.filename);
        if taken {
            return Err(Error::Conflict(format!(
                "code_files.filename {} already exists in project {}",
                file.filename, file.project_id
            )));
        }

        let id = self.next_file_id.fetch_add(1, Ordering::SeqCst);
        let created = CodeFile {
            id,
            project_id: file.project_id,
            filename: file.filename.to_string(),
            content: file.content.to_string(),
            language: file.language.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.files.insert(id, created.clone());
        Ok(created)
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl Store for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn create_user(&self, user: &NewUser<'_>) -> Result<User> {
        let _guard = self.lock();

        if self.users.iter().any(|u| u.username == user.username) {
            return Err(Error::Conflict("users.username already exists".to_string()));
        }
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(Error::Conflict("users.email already exists".to_string()));
        }

        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        let created = User {
            id,
            username: user.username.to_string(),
            email: user.email.to_string(),
            password_hash: user.password_hash.to_string(),
            bio: None,
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            created_at: now(),
        };
        self.users.insert(id, created.clone());
        Ok(created)
    }

    fn get_user(&self, id: i32) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.value().clone()))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    fn user_stats(&self, user_id: i32) -> Result<UserStats> {
        let owned: Vec<i32> = self
            .projects
            .iter()
            .filter(|p| p.owner_id == user_id)
            .map(|p| p.id)
            .collect();
        let files = self
            .files
            .iter()
            .filter(|f| owned.contains(&f.project_id))
            .count();
        Ok(UserStats {
            projects: owned.len() as i64,
            files: files as i64,
        })
    }

    fn create_project(
        &self,
        project: &NewProject<'_>,
        filename: &str,
        content: &str,
    ) -> Result<(Project, CodeFile)> {
        let _guard = self.lock();
        let now = now();

        let id = self.next_project_id.fetch_add(1, Ordering::SeqCst);
        let created = Project {
            id,
            owner_id: project.owner_id,
            title: project.title.to_string(),
            description: project.description.to_string(),
            language: project.language.to_string(),
            is_public: project.is_public,
            created_at: now,
            updated_at: now,
        };
        self.projects.insert(id, created.clone());

        let file = self.insert_file(
            &NewCodeFile {
                project_id: id,
                filename,
                content,
                language: project.language,
            },
            now,
        )?;
        Ok((created, file))
    }

    fn get_project(&self, id: i32, owner_id: i32) -> Result<Option<Project>> {
        Ok(self
            .projects
            .get(&id)
            .filter(|p| p.owner_id == owner_id)
            .map(|p| p.value().clone()))
    }

    fn list_projects(&self, owner_id: i32, search: Option<&str>) -> Result<Vec<ProjectSummary>> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .filter(|p| search.map_or(true, |q| matches_search(p.value(), q)))
            .map(|p| p.value().clone())
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        Ok(projects
            .into_iter()
            .map(|project| {
                let file_count = self
                    .files
                    .iter()
                    .filter(|f| f.project_id == project.id)
                    .count() as i64;
                ProjectSummary { project, file_count }
            })
            .collect())
    }

    fn create_file(&self, file: &NewCodeFile<'_>) -> Result<CodeFile> {
        let _guard = self.lock();
        if !self.projects.contains_key(&file.project_id) {
            return Err(Error::not_found("Project not found"));
        }
        self.insert_file(file, now())
    }

    fn get_file(&self, id: i32, owner_id: i32) -> Result<Option<CodeFile>> {
        let file = self.files.get(&id).map(|f| f.value().clone());
        Ok(file.filter(|f| self.owns(f.project_id, owner_id)))
    }

    fn get_file_by_name(&self, project_id: i32, filename: &str) -> Result<Option<CodeFile>> {
        Ok(self
            .files
            .iter()
            .find(|f| f.project_id == project_id && f.filename == filename)
            .map(|f| f.value().clone()))
    }

    fn list_files(&self, project_id: i32, owner_id: i32) -> Result<Vec<CodeFile>> {
        if !self.owns(project_id, owner_id) {
            return Ok(Vec::new());
        }
        let mut files: Vec<CodeFile> = self
            .files
            .iter()
            .filter(|f| f.project_id == project_id)
            .map(|f| f.value().clone())
            .collect();
        files.sort_by_key(|f| f.id);
        Ok(files)
    }

    fn update_file_content(&self, id: i32, owner_id: i32, content: &str) -> Result<Option<CodeFile>> {
        let _guard = self.lock();

        let project_id = match self.files.get(&id) {
            Some(file) => file.project_id,
            None => return Ok(None),
        };
        if !self.owns(project_id, owner_id) {
            return Ok(None);
        }

        let now = now();
        let updated = self.files.get_mut(&id).map(|mut file| {
            file.content = content.to_string();
            file.updated_at = now;
            file.value().clone()
        });
        if let Some(mut project) = self.projects.get_mut(&project_id) {
            project.updated_at = now;
        }
        Ok(updated)
    }
}
