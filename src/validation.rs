use regex::Regex;

use crate::error::{AppError, AppResult};

/// Request validator. Built once at startup and carried in `AppState`.
#[derive(Debug, Clone)]
pub struct Validator {
    email_re: Regex,
}

impl Validator {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            email_re: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?,
        })
    }

    pub fn email(&self, field: &str, value: &str) -> AppResult<()> {
        self.length(field, value, 1, 255)?;
        if !self.email_re.is_match(value) {
            return Err(AppError::validation(format!("{field} must be a valid email")));
        }
        Ok(())
    }

    /// Inclusive bounds, counted in characters.
    pub fn length(&self, field: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
        let n = value.chars().count();
        if n < min {
            return Err(AppError::validation(if min == 1 {
                format!("{field} is required")
            } else {
                format!("{field} must be at least {min} characters")
            }));
        }
        if n > max {
            return Err(AppError::validation(format!(
                "{field} must be at most {max} characters"
            )));
        }
        Ok(())
    }

    pub fn max_items<T>(&self, field: &str, items: &[T], max: usize) -> AppResult<()> {
        if items.len() > max {
            return Err(AppError::validation(format!(
                "{field} must have at most {max} entries"
            )));
        }
        Ok(())
    }

    pub fn range(&self, field: &str, value: i64, min: i64, max: i64) -> AppResult<()> {
        if value < min || value > max {
            return Err(AppError::validation(format!(
                "{field} must be between {min} and {max}"
            )));
        }
        Ok(())
    }
}
