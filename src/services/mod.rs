//! Form handling and ownership-checked operations shared by the page and API routes.

pub mod auth;
pub mod projects;
pub mod validation;
