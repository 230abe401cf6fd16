mod memory;
mod postgres;
mod sqlite;

pub use memory::MemoryStore;
pub use postgres::{PgPool, PgStore};
pub use sqlite::SqliteStore;

use std::fmt;

use crate::error::Result;
use crate::models::{CodeFile, NewCodeFile, NewProject, NewUser, Project, ProjectSummary, User, UserStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
    Memory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Postgres => f.write_str("postgresql"),
            Backend::Sqlite => f.write_str("sqlite"),
            Backend::Memory => f.write_str("in-memory"),
        }
    }
}

/// Store defines the persistence interface.
///
/// Every project and file lookup takes the requesting user's id and only
/// matches rows that user owns, so handlers never filter by owner themselves.
/// Unique constraint violations surface as `Error::Conflict`.
pub trait Store: Send + Sync {
    fn backend(&self) -> Backend;

    /// Creates the schema if it does not exist yet.
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &NewUser<'_>) -> Result<User>;
    fn get_user(&self, id: i32) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn user_stats(&self, user_id: i32) -> Result<UserStats>;

    // Project operations
    /// Inserts the project and its first file atomically.
    fn create_project(
        &self,
        project: &NewProject<'_>,
        filename: &str,
        content: &str,
    ) -> Result<(Project, CodeFile)>;
    fn get_project(&self, id: i32, owner_id: i32) -> Result<Option<Project>>;
    /// Newest update first. `search` matches title or description, case-insensitively.
    fn list_projects(&self, owner_id: i32, search: Option<&str>) -> Result<Vec<ProjectSummary>>;

    // File operations
    fn create_file(&self, file: &NewCodeFile<'_>) -> Result<CodeFile>;
    fn get_file(&self, id: i32, owner_id: i32) -> Result<Option<CodeFile>>;
    fn get_file_by_name(&self, project_id: i32, filename: &str) -> Result<Option<CodeFile>>;
    fn list_files(&self, project_id: i32, owner_id: i32) -> Result<Vec<CodeFile>>;
    /// Overwrites the content and bumps both file and project `updated_at`.
    /// Returns `None` when the file does not exist or belongs to someone else.
    fn update_file_content(&self, id: i32, owner_id: i32, content: &str) -> Result<Option<CodeFile>>;
}

/// Case-insensitive substring match used by dashboard search.
pub(crate) fn matches_search(project: &Project, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    project.title.to_lowercase().contains(&needle)
        || project.description.to_lowercase().contains(&needle)
}

/// `%needle%` for LIKE/ILIKE with `\` as the escape character, so `%` and `_`
/// in the search text match themselves.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("chess"), "%chess%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
