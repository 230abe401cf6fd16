use askama::Template;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::content::RawHtml;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::session;
use crate::views::{ApologyPage, Layout};

/// Error page shown to browsers.
#[derive(Debug)]
pub struct Apology {
    pub status: Status,
    pub message: String,
}

impl Apology {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Apology {
            status,
            message: message.into(),
        }
    }
}

impl From<Error> for Apology {
    fn from(err: Error) -> Self {
        if err.is_internal() {
            tracing::error!(error = %err, "request failed");
        }
        Apology::new(err.status(), err.public_message())
    }
}

impl<'r> Responder<'r, 'static> for Apology {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let page = ApologyPage {
            layout: Layout {
                username: session::username(req.cookies()).unwrap_or_default(),
                ..Layout::default()
            },
            code: self.status.code,
            message: self.message,
        };
        match page.render() {
            Ok(html) => (self.status, RawHtml(html)).respond_to(req),
            Err(err) => {
                tracing::error!(error = %err, "could not render apology page");
                Err(Status::InternalServerError)
            }
        }
    }
}

/// Body of every `/api` response.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        ApiResponse {
            success: true,
            ..ApiResponse::default()
        }
    }

    pub fn created(file_id: i32) -> Self {
        ApiResponse {
            success: true,
            file_id: Some(file_id),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            file_id: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_internal() {
            tracing::error!(error = %err, "api request failed");
        }
        ApiError::new(err.status(), err.public_message())
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        (self.status, Json(ApiResponse::failure(self.message))).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::ok()).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true }));

        let body = serde_json::to_value(ApiResponse::created(7)).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "file_id": 7 }));
    }

    #[test]
    fn errors_keep_their_status() {
        let api = ApiError::from(Error::not_found("File not found"));
        assert_eq!(api.status, Status::NotFound);
        assert_eq!(api.message, "File not found");

        let page = Apology::from(Error::Migration("boom".to_string()));
        assert_eq!(page.status, Status::InternalServerError);
        assert!(!page.message.contains("boom"));
    }
}
