// Request validation that collects every violation before failing

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldError};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

/// Accumulates field errors. Each check returns the cleaned value when it
/// passes, so callers can build their typed input after [`Validator::finish`].
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, param: &str, msg: &str) {
        self.errors.push(FieldError::new(param, msg));
    }

    /// Present and not blank. The value is trimmed.
    pub fn required(&mut self, param: &str, value: Option<&str>, msg: &str) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.reject(param, msg);
                None
            }
        }
    }

    /// Present at all, even if empty. The value is passed through untouched.
    pub fn exists(&mut self, param: &str, value: Option<&str>, msg: &str) -> Option<String> {
        match value {
            Some(v) => Some(v.to_string()),
            None => {
                self.reject(param, msg);
                None
            }
        }
    }

    pub fn email(&mut self, param: &str, value: Option<&str>, msg: &str) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if EMAIL_RE.is_match(v) => Some(v.to_string()),
            _ => {
                self.reject(param, msg);
                None
            }
        }
    }

    /// At least `min` characters; not trimmed, since passwords may carry spaces.
    pub fn min_length(
        &mut self,
        param: &str,
        value: Option<&str>,
        min: usize,
        msg: &str,
    ) -> Option<String> {
        match value {
            Some(v) if v.chars().count() >= min => Some(v.to_string()),
            _ => {
                self.reject(param, msg);
                None
            }
        }
    }

    pub fn required_date(
        &mut self,
        param: &str,
        value: Option<&str>,
        missing_msg: &str,
    ) -> Option<NaiveDate> {
        let raw = self.required(param, value, missing_msg)?;
        self.parse_date(param, &raw)
    }

    /// `Some(None)` when absent or blank, `None` when present but invalid.
    pub fn optional_date(&mut self, param: &str, value: Option<&str>) -> Option<Option<NaiveDate>> {
        match value.map(str::trim) {
            Some(raw) if !raw.is_empty() => self.parse_date(param, raw).map(Some),
            _ => Some(None),
        }
    }

    fn parse_date(&mut self, param: &str, raw: &str) -> Option<NaiveDate> {
        let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));
        if parsed.is_none() {
            self.reject(param, &format!("{} must be a valid date (YYYY-MM-DD)", param));
        }
        parsed
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fails with every collected error, otherwise builds the validated value.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> AppResult<T> {
        if !self.errors.is_empty() {
            return Err(AppError::Validation(self.errors));
        }
        build().ok_or_else(|| AppError::Internal("validated field missing".to_string()))
    }
}

/// Optional free-text field: trimmed, blank treated as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Path ids that are not UUIDs refer to nothing.
pub fn parse_id(raw: &str, not_found: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(not_found.to_string()))
}
