// codecollab/src/models.rs
use crate::schema::{code_files, projects, users};
use chrono::NaiveDateTime;
use diesel::prelude::*;

pub const DEFAULT_AVATAR_URL: &str = "/static/default-avatar.svg";

#[derive(Queryable, Identifiable, Selectable, Debug, PartialEq, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub avatar_url: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Queryable, Identifiable, Selectable, Associations, Debug, PartialEq, Clone)]
#[diesel(belongs_to(User, foreign_key = owner_id))]
#[diesel(table_name = projects)]
pub struct Project {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    pub language: String,
    pub is_public: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = projects)]
pub struct NewProject<'a> {
    pub owner_id: i32,
    pub title: &'a str,
    pub description: &'a str,
    pub language: &'a str,
    pub is_public: bool,
}

#[derive(Queryable, Identifiable, Selectable, Associations, Debug, PartialEq, Clone)]
#[diesel(belongs_to(Project))]
#[diesel(table_name = code_files)]
pub struct CodeFile {
    pub id: i32,
    pub project_id: i32,
    pub filename: String,
    pub content: String,
    pub language: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = code_files)]
pub struct NewCodeFile<'a> {
    pub project_id: i32,
    pub filename: &'a str,
    pub content: &'a str,
    pub language: &'a str,
}

/// A dashboard row: the project plus how many files it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub project: Project,
    pub file_count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub projects: i64,
    pub files: i64,
}
