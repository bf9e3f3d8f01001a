//! Local checks run before anything is sent to the service.
//!
//! Only presence and basic shape are verified here. Everything else (agent
//! existence, uniqueness of emails, ...) is left to the service.

use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

use crate::api::model::{LeadPatch, NewAgent, NewComment, NewLead};
use crate::model::{Priority, Source, Status, UnknownLabel};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("no changes to save")]
    NothingToUpdate,
}

impl FormError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            FormError::Missing(field) | FormError::Invalid { field, .. } => Some(*field),
            FormError::NothingToUpdate => None,
        }
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Missing(field));
    }
    Ok(trimmed)
}

fn parse_label<T>(field: &'static str, value: &str) -> Result<T, FormError>
where
    T: FromStr<Err = UnknownLabel>,
{
    value.parse::<T>().map_err(|e| FormError::Invalid {
        field,
        reason: e.to_string(),
    })
}

fn optional_label<T>(field: &'static str, value: &str) -> Result<Option<T>, FormError>
where
    T: FromStr<Err = UnknownLabel>,
{
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_label(field, value).map(Some)
}

/// Parse a time-to-close entry: a whole number of days, at least 1.
pub fn parse_time_to_close(value: &str) -> Result<u32, FormError> {
    const FIELD: &str = "time to close";
    let raw = required(FIELD, value)?;
    let days: u32 = raw.parse().map_err(|_| FormError::Invalid {
        field: FIELD,
        reason: format!("'{raw}' is not a whole number of days"),
    })?;
    if days == 0 {
        return Err(FormError::Invalid {
            field: FIELD,
            reason: "must be at least 1 day".into(),
        });
    }
    Ok(days)
}

/// Trim, drop blanks and duplicates, keep first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// New lead as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadForm {
    pub name: String,
    pub source: String,
    pub sales_agent: String,
    pub status: String,
    pub priority: String,
    pub time_to_close: String,
    pub tags: Vec<String>,
}

impl LeadForm {
    /// Status defaults to New and priority to Medium when left blank.
    pub fn validate(&self) -> Result<NewLead, FormError> {
        let name = required("name", &self.name)?;
        let source = required("source", &self.source)?;
        let sales_agent = required("sales agent", &self.sales_agent)?;
        let time_to_close = parse_time_to_close(&self.time_to_close)?;
        let source: Source = parse_label("source", source)?;
        let status = optional_label("status", &self.status)?.unwrap_or(Status::New);
        let priority = optional_label("priority", &self.priority)?.unwrap_or(Priority::Medium);

        Ok(NewLead {
            name: name.to_string(),
            source,
            sales_agent: sales_agent.to_string(),
            status,
            tags: normalize_tags(&self.tags),
            time_to_close,
            priority,
        })
    }
}

/// Edit of an existing lead. Blank fields mean "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadEdit {
    pub sales_agent: String,
    pub status: String,
    pub priority: String,
    pub time_to_close: String,
    pub tags: Option<Vec<String>>,
}

impl LeadEdit {
    pub fn validate(&self) -> Result<LeadPatch, FormError> {
        let time_to_close = if self.time_to_close.trim().is_empty() {
            None
        } else {
            Some(parse_time_to_close(&self.time_to_close)?)
        };
        let sales_agent = Some(self.sales_agent.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let patch = LeadPatch {
            sales_agent,
            status: optional_label("status", &self.status)?,
            priority: optional_label("priority", &self.priority)?,
            time_to_close,
            tags: self.tags.as_ref().map(normalize_tags),
        };
        if patch.is_empty() {
            return Err(FormError::NothingToUpdate);
        }
        Ok(patch)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentForm {
    pub name: String,
    pub email: String,
}

impl AgentForm {
    pub fn validate(&self) -> Result<NewAgent, FormError> {
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?;
        if !EMAIL_RE.is_match(email) {
            return Err(FormError::Invalid {
                field: "email",
                reason: format!("'{email}' is not an email address"),
            });
        }
        Ok(NewAgent {
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentForm {
    /// Agent identifier of the author.
    pub author: String,
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<NewComment, FormError> {
        let author = required("author", &self.author)?;
        let text = required("comment", &self.text)?;
        Ok(NewComment {
            author: author.to_string(),
            comment_text: text.to_string(),
        })
    }
}
