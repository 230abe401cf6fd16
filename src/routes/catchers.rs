use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{Flash, Redirect};
use rocket::{catch, Responder};

use crate::responses::{Apology, ApiError};
use crate::session::{self, AuthError};

#[derive(Responder)]
pub enum Caught {
    Page(Apology),
    Api(ApiError),
    Login(Flash<Redirect>),
}

fn is_api(req: &Request<'_>) -> bool {
    req.uri().path().starts_with("/api/")
}

fn caught(req: &Request<'_>, status: Status, message: &str) -> Caught {
    if is_api(req) {
        Caught::Api(ApiError::new(status, message))
    } else {
        Caught::Page(Apology::new(status, message))
    }
}

fn auth_error(req: &Request<'_>) -> Option<AuthError> {
    *req.local_cache(|| None::<AuthError>)
}

#[catch(400)]
pub fn bad_request(req: &Request<'_>) -> Caught {
    caught(req, Status::BadRequest, "Malformed request")
}

#[catch(401)]
pub fn unauthorized(req: &Request<'_>) -> Caught {
    if is_api(req) {
        return Caught::Api(ApiError::new(Status::Unauthorized, "Login required"));
    }
    if auth_error(req) == Some(AuthError::UnknownUser) {
        session::clear(req.cookies());
    }
    Caught::Login(Flash::error(Redirect::to("/login"), "Please log in to continue."))
}

#[catch(404)]
pub fn not_found(req: &Request<'_>) -> Caught {
    caught(req, Status::NotFound, "Page not found")
}

#[catch(422)]
pub fn unprocessable_entity(req: &Request<'_>) -> Caught {
    caught(req, Status::UnprocessableEntity, "The request could not be understood")
}

#[catch(500)]
pub fn internal_server_error(req: &Request<'_>) -> Caught {
    match auth_error(req) {
        Some(AuthError::NoAppState) => tracing::error!("application state is not managed"),
        Some(AuthError::StoreUnavailable) => tracing::error!("storage unavailable while checking the session"),
        _ => {}
    }
    caught(req, Status::InternalServerError, "Something went wrong on our side. Please try again.")
}
