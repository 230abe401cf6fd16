use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{post, State};
use serde::Deserialize;

use crate::responses::{ApiError, ApiResponse};
use crate::services::projects;
use crate::session::SessionUser;
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct SaveCodeRequest {
    pub file_id: Option<i32>,
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateFileRequest {
    pub project_id: Option<i32>,
    pub filename: Option<String>,
}

#[post("/save_code", data = "<body>")]
pub fn save_code(
    user: SessionUser,
    body: Json<SaveCodeRequest>,
    app_state: &State<AppState>,
) -> Result<Json<ApiResponse>, ApiError> {
    let SaveCodeRequest { file_id, content } = body.into_inner();
    let (Some(file_id), Some(content)) = (file_id, content) else {
        return Err(ApiError::new(Status::BadRequest, "Missing file_id or content"));
    };
    projects::save_code(app_state.store(), user.id, file_id, &content)?;
    Ok(Json(ApiResponse::ok()))
}

#[post("/create_file", data = "<body>")]
pub fn create_file(
    user: SessionUser,
    body: Json<CreateFileRequest>,
    app_state: &State<AppState>,
) -> Result<Json<ApiResponse>, ApiError> {
    let CreateFileRequest { project_id, filename } = body.into_inner();
    let (Some(project_id), Some(filename)) = (project_id, filename) else {
        return Err(ApiError::new(Status::BadRequest, "Missing project_id or filename"));
    };
    let file = projects::create_file(app_state.store(), user.id, project_id, &filename)?;
    Ok(Json(ApiResponse::created(file.id)))
}
