use crate::error::{Error, Result};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 6;
const EMAIL_MAX_LEN: usize = 254;
const TITLE_MAX_LEN: usize = 100;
const DESCRIPTION_MAX_LEN: usize = 1000;
const FILENAME_MAX_LEN: usize = 100;

/// Trimmed value of an optional form field; missing fields read as empty.
pub fn field(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

pub fn required<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(Error::invalid(format!("Must provide {what}")));
    }
    Ok(value)
}

pub fn validate_username(username: &str) -> Result<()> {
    required(username, "username")?;
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(Error::invalid(format!(
            "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::invalid(
            "Username can only contain letters, digits, and underscores",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    required(email, "email")?;
    if email.len() > EMAIL_MAX_LEN {
        return Err(Error::invalid("Email address is too long"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(Error::invalid("Invalid email address"));
    }
    Ok(())
}

pub fn validate_password(password: &str, confirmation: &str) -> Result<()> {
    required(password, "password")?;
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(Error::invalid(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    if password != confirmation {
        return Err(Error::invalid("Passwords do not match"));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<()> {
    required(title, "a project title")?;
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(Error::invalid(format!(
            "Project title cannot exceed {TITLE_MAX_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(Error::invalid(format!(
            "Description cannot exceed {DESCRIPTION_MAX_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_filename(filename: &str) -> Result<()> {
    required(filename, "a filename")?;
    if filename.chars().count() > FILENAME_MAX_LEN {
        return Err(Error::invalid(format!(
            "Filename cannot exceed {FILENAME_MAX_LEN} characters"
        )));
    }
    if filename.contains(['/', '\\']) || filename.chars().any(char::is_control) {
        return Err(Error::invalid("Filename cannot contain slashes"));
    }
    if filename.chars().all(|c| c == '.') {
        return Err(Error::invalid("Invalid filename"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_defaults_fields() {
        assert_eq!(field(&Some("  alice \n".to_string())), "alice");
        assert_eq!(field(&None), "");
    }

    #[test]
    fn username_length_bounds() {
        assert!(validate_username("al").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username(&"a".repeat(21)).is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("12345", "12345").is_err());
        assert!(validate_password("123456", "123456").is_ok());
        let err = validate_password("123456", "654321").unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("dev@example.com").is_ok());
        assert!(validate_email("dev@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("dev@@example.com").is_err());
        assert!(validate_email("dev example@example.com").is_err());
    }

    #[test]
    fn filename_rules() {
        assert!(validate_filename("main.py").is_ok());
        assert!(validate_filename(".gitignore").is_ok());
        assert!(validate_filename("../etc/passwd").is_err());
        assert!(validate_filename("a\\b.txt").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("").is_err());
    }

    #[test]
    fn project_fields() {
        assert!(validate_title("").is_err());
        assert!(validate_title(&"t".repeat(101)).is_err());
        assert!(validate_description(&"d".repeat(1000)).is_ok());
        assert!(validate_description(&"d".repeat(1001)).is_err());
    }
}
