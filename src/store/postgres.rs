// codecollab/src/store/postgres.rs
use std::collections::HashMap;
use std::time::Duration;

use diesel::dsl::{count_star, now};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use super::{like_pattern, Backend, Store};
use crate::error::{Error, Result};
use crate::models::{CodeFile, NewCodeFile, NewProject, NewUser, Project, ProjectSummary, User, UserStats};
use crate::schema::{code_files, projects, users};

// an R2D2 connection pool
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const POOL_SIZE: u32 = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Builds the pool. Fails if no connection can be made within the timeout.
    pub fn connect(database_url: &str) -> Result<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = r2d2::Pool::builder()
            .max_size(POOL_SIZE)
            .connection_timeout(CONNECT_TIMEOUT)
            .build(manager)?;
        Ok(Self { pool })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut PgConnection) -> Result<T>) -> Result<T> {
        let mut conn = self.pool.get()?;
        f(&mut conn)
    }
}

fn unique_violation(err: DieselError) -> Error {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => Error::Conflict(
            info.constraint_name()
                .unwrap_or_else(|| info.message())
                .to_string(),
        ),
        other => Error::Database(other),
    }
}

impl Store for PgStore {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn initialize(&self) -> Result<()> {
        self.with_conn(|conn| {
            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| Error::Migration(e.to_string()))?;
            if !applied.is_empty() {
                tracing::info!("applied {} database migration(s)", applied.len());
            }
            Ok(())
        })
    }

    fn create_user(&self, user: &NewUser<'_>) -> Result<User> {
        self.with_conn(|conn| {
            diesel::insert_into(users::table)
                .values(user)
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(unique_violation)
        })
    }

    fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = users::table
                .find(id)
                .select(User::as_select())
                .first(conn)
                .optional()?;
            Ok(user)
        })
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = users::table
                .filter(users::username.eq(username))
                .select(User::as_select())
                .first(conn)
                .optional()?;
            Ok(user)
        })
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = users::table
                .filter(users::email.eq(email))
                .select(User::as_select())
                .first(conn)
                .optional()?;
            Ok(user)
        })
    }

    fn user_stats(&self, user_id: i32) -> Result<UserStats> {
        self.with_conn(|conn| {
            let projects = projects::table
                .filter(projects::owner_id.eq(user_id))
                .count()
                .get_result::<i64>(conn)?;
            let files = code_files::table
                .inner_join(projects::table)
                .filter(projects::owner_id.eq(user_id))
                .count()
                .get_result::<i64>(conn)?;
            Ok(UserStats { projects, files })
        })
    }

    fn create_project(
        &self,
        project: &NewProject<'_>,
        filename: &str,
        content: &str,
    ) -> Result<(Project, CodeFile)> {
        self.with_conn(|conn| {
            conn.transaction::<_, Error, _>(|conn| {
                let created = diesel::insert_into(projects::table)
                    .values(project)
                    .returning(Project::as_returning())
                    .get_result(conn)?;
                let file = diesel::insert_into(code_files::table)
                    .values(&NewCodeFile {
                        project_id: created.id,
                        filename,
                        content,
                        language: project.language,
                    })
                    .returning(CodeFile::as_returning())
                    .get_result(conn)
                    .map_err(unique_violation)?;
                Ok((created, file))
            })
        })
    }

    fn get_project(&self, id: i32, owner_id: i32) -> Result<Option<Project>> {
        self.with_conn(|conn| {
            let project = projects::table
                .filter(projects::id.eq(id).and(projects::owner_id.eq(owner_id)))
                .select(Project::as_select())
                .first(conn)
                .optional()?;
            Ok(project)
        })
    }

    fn list_projects(&self, owner_id: i32, search: Option<&str>) -> Result<Vec<ProjectSummary>> {
        self.with_conn(|conn| {
            let mut query = projects::table
                .filter(projects::owner_id.eq(owner_id))
                .into_boxed();

            if let Some(q) = search {
                // Backslash is PostgreSQL's default LIKE escape.
                let pattern = like_pattern(q);
                query = query.filter(
                    projects::title
                        .ilike(pattern.clone())
                        .or(projects::description.ilike(pattern)),
                );
            }

            let rows = query
                .order((projects::updated_at.desc(), projects::id.desc()))
                .select(Project::as_select())
                .load::<Project>(conn)?;
            if rows.is_empty() {
                return Ok(Vec::new());
            }

            let ids: Vec<i32> = rows.iter().map(|p| p.id).collect();
            let counts: HashMap<i32, i64> = code_files::table
                .filter(code_files::project_id.eq_any(&ids))
                .group_by(code_files::project_id)
                .select((code_files::project_id, count_star()))
                .load::<(i32, i64)>(conn)?
                .into_iter()
                .collect();

            Ok(rows
                .into_iter()
                .map(|project| {
                    let file_count = counts.get(&project.id).copied().unwrap_or(0);
                    ProjectSummary { project, file_count }
                })
                .collect())
        })
    }

    fn create_file(&self, file: &NewCodeFile<'_>) -> Result<CodeFile> {
        self.with_conn(|conn| {
            diesel::insert_into(code_files::table)
                .values(file)
                .returning(CodeFile::as_returning())
                .get_result(conn)
                .map_err(unique_violation)
        })
    }

    fn get_file(&self, id: i32, owner_id: i32) -> Result<Option<CodeFile>> {
        self.with_conn(|conn| {
            let file = code_files::table
                .inner_join(projects::table)
                .filter(code_files::id.eq(id))
                .filter(projects::owner_id.eq(owner_id))
                .select(CodeFile::as_select())
                .first(conn)
                .optional()?;
            Ok(file)
        })
    }

    fn get_file_by_name(&self, project_id: i32, filename: &str) -> Result<Option<CodeFile>> {
        self.with_conn(|conn| {
            let file = code_files::table
                .filter(code_files::project_id.eq(project_id))
                .filter(code_files::filename.eq(filename))
                .select(CodeFile::as_select())
                .first(conn)
                .optional()?;
            Ok(file)
        })
    }

    fn list_files(&self, project_id: i32, owner_id: i32) -> Result<Vec<CodeFile>> {
        self.with_conn(|conn| {
            let files = code_files::table
                .inner_join(projects::table)
                .filter(code_files::project_id.eq(project_id))
                .filter(projects::owner_id.eq(owner_id))
                .order(code_files::id.asc())
                .select(CodeFile::as_select())
                .load(conn)?;
            Ok(files)
        })
    }

    fn update_file_content(&self, id: i32, owner_id: i32, content: &str) -> Result<Option<CodeFile>> {
        self.with_conn(|conn| {
            conn.transaction::<_, Error, _>(|conn| {
                let owned = code_files::table
                    .inner_join(projects::table)
                    .filter(code_files::id.eq(id))
                    .filter(projects::owner_id.eq(owner_id))
                    .select(code_files::project_id)
                    .first::<i32>(conn)
                    .optional()?;
                let Some(project_id) = owned else {
                    return Ok(None);
                };

                let file = diesel::update(code_files::table.find(id))
                    .set((code_files::content.eq(content), code_files::updated_at.eq(now)))
                    .returning(CodeFile::as_returning())
                    .get_result(conn)?;
                diesel::update(projects::table.find(project_id))
                    .set(projects::updated_at.eq(now))
                    .execute(conn)?;
                Ok(Some(file))
            })
        })
    }
}

// Run with `DATABASE_URL=postgres://... cargo test -- --ignored`. Tables are truncated.
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::DatabaseUrl;
    use crate::store::conformance;

    static SERIAL: Mutex<()> = Mutex::new(());

    fn with_store(check: fn(&dyn Store)) {
        let url = match std::env::var("DATABASE_URL").ok().map(|u| DatabaseUrl::parse(&u)) {
            Some(Ok(DatabaseUrl::Postgres(url))) => url,
            _ => {
                eprintln!("DATABASE_URL is not a PostgreSQL url; skipping");
                return;
            }
        };
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let store = PgStore::connect(&url).unwrap();
        store.initialize().unwrap();
        store
            .with_conn(|conn| {
                diesel::sql_query(
                    "TRUNCATE project_members, code_files, projects, users RESTART IDENTITY CASCADE",
                )
                .execute(conn)?;
                Ok(())
            })
            .unwrap();
        check(&store);
    }

    #[test]
    #[ignore = "needs a PostgreSQL DATABASE_URL"]
    fn users_are_unique() {
        with_store(conformance::users_are_unique);
    }

    #[test]
    #[ignore = "needs a PostgreSQL DATABASE_URL"]
    fn projects_are_scoped_to_owner() {
        with_store(conformance::projects_are_scoped_to_owner);
    }

    #[test]
    #[ignore = "needs a PostgreSQL DATABASE_URL"]
    fn saves_persist_and_respect_ownership() {
        with_store(conformance::saves_persist_and_respect_ownership);
    }

    #[test]
    #[ignore = "needs a PostgreSQL DATABASE_URL"]
    fn filenames_are_unique_per_project() {
        with_store(conformance::filenames_are_unique_per_project);
    }

    #[test]
    #[ignore = "needs a PostgreSQL DATABASE_URL"]
    fn listing_counts_and_searches() {
        with_store(conformance::listing_counts_and_searches);
    }
}
