use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{matches_search, Backend, Store};
use crate::error::{Error, Result};
use crate::models::{CodeFile, NewCodeFile, NewProject, NewUser, Project, ProjectSummary, User, UserStats};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    bio TEXT,
    avatar_url TEXT NOT NULL DEFAULT '/static/default-avatar.svg',
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    language TEXT NOT NULL DEFAULT 'python',
    is_public BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (owner_id) REFERENCES users (id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects (owner_id);

CREATE TABLE IF NOT EXISTS code_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    language TEXT NOT NULL DEFAULT 'python',
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (project_id, filename),
    FOREIGN KEY (project_id) REFERENCES projects (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS project_members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    role TEXT NOT NULL DEFAULT 'collaborator',
    joined_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (project_id, user_id),
    FOREIGN KEY (project_id) REFERENCES projects (id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
);
"#;

const USER_COLUMNS: &str = "id, username, email, password_hash, bio, avatar_url, created_at";
const PROJECT_COLUMNS: &str =
    "p.id, p.owner_id, p.title, p.description, p.language, p.is_public, p.created_at, p.updated_at";
const FILE_COLUMNS: &str =
    "f.id, f.project_id, f.filename, f.content, f.language, f.created_at, f.updated_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn unique_violation(err: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            return Error::Conflict(message.clone().unwrap_or_else(|| failure.to_string()));
        }
    }
    Error::Sqlite(err)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        bio: row.get(4)?,
        avatar_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        language: row.get(4)?,
        is_public: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<CodeFile> {
    Ok(CodeFile {
        id: row.get(0)?,
        project_id: row.get(1)?,
        filename: row.get(2)?,
        content: row.get(3)?,
        language: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn select_user(conn: &Connection, column: &str, value: &dyn rusqlite::ToSql) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
        [value],
        user_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn insert_file(conn: &Connection, file: &NewCodeFile<'_>) -> Result<CodeFile> {
    conn.execute(
        "INSERT INTO code_files (project_id, filename, content, language) VALUES (?1, ?2, ?3, ?4)",
        params![file.project_id, file.filename, file.content, file.language],
    )
    .map_err(unique_violation)?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        &format!("SELECT {FILE_COLUMNS} FROM code_files f WHERE f.id = ?1"),
        params![id],
        file_from_row,
    )
    .map_err(Error::from)
}

impl Store for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &NewUser<'_>) -> Result<User> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
            params![user.username, user.email, user.password_hash],
        )
        .map_err(unique_violation)?;
        let id = conn.last_insert_rowid();
        select_user(&conn, "id", &id)?
            .ok_or_else(|| Error::not_found("User vanished after insert"))
    }

    fn get_user(&self, id: i32) -> Result<Option<User>> {
        select_user(&self.conn(), "id", &id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        select_user(&self.conn(), "username", &username)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        select_user(&self.conn(), "email", &email)
    }

    fn user_stats(&self, user_id: i32) -> Result<UserStats> {
        let conn = self.conn();
        let projects = conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE owner_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let files = conn.query_row(
            "SELECT COUNT(*) FROM code_files f
             JOIN projects p ON p.id = f.project_id
             WHERE p.owner_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(UserStats { projects, files })
    }

    // Project operations

    fn create_project(
        &self,
        project: &NewProject<'_>,
        filename: &str,
        content: &str,
    ) -> Result<(Project, CodeFile)> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO projects (owner_id, title, description, language, is_public)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.owner_id,
                project.title,
                project.description,
                project.language,
                project.is_public,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let created = tx.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?1"),
            params![id],
            project_from_row,
        )?;
        let file = insert_file(
            &tx,
            &NewCodeFile {
                project_id: created.id,
                filename,
                content,
                language: project.language,
            },
        )?;

        tx.commit()?;
        Ok((created, file))
    }

    fn get_project(&self, id: i32, owner_id: i32) -> Result<Option<Project>> {
        self.conn()
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?1 AND p.owner_id = ?2"),
                params![id, owner_id],
                project_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_projects(&self, owner_id: i32, search: Option<&str>) -> Result<Vec<ProjectSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS},
                    (SELECT COUNT(*) FROM code_files f WHERE f.project_id = p.id)
             FROM projects p
             WHERE p.owner_id = ?1
             ORDER BY p.updated_at DESC, p.id DESC"
        ))?;
        let rows = stmt.query_map(params![owner_id], |row| {
            Ok(ProjectSummary {
                project: project_from_row(row)?,
                file_count: row.get(8)?,
            })
        })?;
        let mut summaries = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        // SQLite's LIKE folds ASCII only, so the search runs here.
        if let Some(q) = search {
            summaries.retain(|s| matches_search(&s.project, q));
        }
        Ok(summaries)
    }

    // File operations

    fn create_file(&self, file: &NewCodeFile<'_>) -> Result<CodeFile> {
        insert_file(&self.conn(), file)
    }

    fn get_file(&self, id: i32, owner_id: i32) -> Result<Option<CodeFile>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {FILE_COLUMNS} FROM code_files f
                     JOIN projects p ON p.id = f.project_id
                     WHERE f.id = ?1 AND p.owner_id = ?2"
                ),
                params![id, owner_id],
                file_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_file_by_name(&self, project_id: i32, filename: &str) -> Result<Option<CodeFile>> {
        self.conn()
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM code_files f WHERE f.project_id = ?1 AND f.filename = ?2"),
                params![project_id, filename],
                file_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_files(&self, project_id: i32, owner_id: i32) -> Result<Vec<CodeFile>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM code_files f
             JOIN projects p ON p.id = f.project_id
             WHERE f.project_id = ?1 AND p.owner_id = ?2
             ORDER BY f.id"
        ))?;
        let rows = stmt.query_map(params![project_id, owner_id], file_from_row)?;
        let files = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    fn update_file_content(&self, id: i32, owner_id: i32, content: &str) -> Result<Option<CodeFile>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE code_files SET content = ?1, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?2
               AND project_id IN (SELECT id FROM projects WHERE owner_id = ?3)",
            params![content, id, owner_id],
        )?;
        if changed == 0 {
            return Ok(None);
        }

        tx.execute(
            "UPDATE projects SET updated_at = CURRENT_TIMESTAMP
             WHERE id = (SELECT project_id FROM code_files WHERE id = ?1)",
            params![id],
        )?;
        let file = tx.query_row(
            &format!("SELECT {FILE_COLUMNS} FROM code_files f WHERE f.id = ?1"),
            params![id],
            file_from_row,
        )?;

        tx.commit()?;
        Ok(Some(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;

    fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        store
    }

    #[test]
    fn users_are_unique() {
        conformance::users_are_unique(&store());
    }

    #[test]
    fn projects_are_scoped_to_owner() {
        conformance::projects_are_scoped_to_owner(&store());
    }

    #[test]
    fn saves_persist_and_respect_ownership() {
        conformance::saves_persist_and_respect_ownership(&store());
    }

    #[test]
    fn filenames_are_unique_per_project() {
        conformance::filenames_are_unique_per_project(&store());
    }

    #[test]
    fn listing_counts_and_searches() {
        conformance::listing_counts_and_searches(&store());
    }

    #[test]
    fn initialize_is_idempotent_and_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codecollab.db");

        let first = SqliteStore::new(&path).unwrap();
        first.initialize().unwrap();
        first
            .create_user(&NewUser {
                username: "dora",
                email: "dora@example.com",
                password_hash: "x",
            })
            .unwrap();
        drop(first);

        let second = SqliteStore::new(&path).unwrap();
        second.initialize().unwrap();
        let dora = second.get_user_by_username("dora").unwrap().unwrap();
        assert_eq!(dora.avatar_url, crate::models::DEFAULT_AVATAR_URL);
    }
}
