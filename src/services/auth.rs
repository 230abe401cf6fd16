use bcrypt::{hash, verify};
use rocket::FromForm;

use super::validation::{self, field};
use crate::error::{Error, Result};
use crate::models::{NewUser, User, UserStats};
use crate::store::Store;

#[derive(FromForm, Debug, Default)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirmation: Option<String>,
}

#[derive(FromForm, Debug, Default)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

// Passwords are taken verbatim; every other field is trimmed.
fn secret(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn taken_message(detail: &str) -> String {
    if detail.contains("email") {
        "Email already registered".to_string()
    } else {
        "Username already exists".to_string()
    }
}

pub fn register_user(store: &dyn Store, form: &RegisterForm, cost: u32) -> Result<User> {
    let username = field(&form.username);
    let email = field(&form.email).to_lowercase();
    let password = secret(&form.password);

    validation::validate_username(username)?;
    validation::validate_email(&email)?;
    validation::validate_password(password, secret(&form.confirmation))?;

    if store.get_user_by_username(username)?.is_some() {
        return Err(Error::Conflict("Username already exists".to_string()));
    }
    if store.get_user_by_email(&email)?.is_some() {
        return Err(Error::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash(password, cost)?;

    // A concurrent registration can still win between the check and the insert.
    let user = store
        .create_user(&NewUser {
            username,
            email: &email,
            password_hash: &password_hash,
        })
        .map_err(|err| match err {
            Error::Conflict(detail) => Error::Conflict(taken_message(&detail)),
            other => other,
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "registered new user");
    Ok(user)
}

pub fn login_user(store: &dyn Store, form: &LoginForm) -> Result<User> {
    let username = field(&form.username);
    let password = secret(&form.password);
    validation::required(username, "username")?;
    validation::required(password, "password")?;

    match store.get_user_by_username(username)? {
        Some(user) if verify(password, &user.password_hash)? => Ok(user),
        _ => {
            tracing::warn!(username = %username, "failed login attempt");
            Err(Error::InvalidCredentials)
        }
    }
}

/// The user's account together with how much they own.
pub fn profile(store: &dyn Store, user_id: i32) -> Result<(User, UserStats)> {
    let user = store
        .get_user(user_id)?
        .ok_or_else(|| Error::not_found("User not found"))?;
    let stats = store.user_stats(user_id)?;
    Ok((user, stats))
}
