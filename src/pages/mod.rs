//! Page controllers: each page fetches what it needs, hands the snapshot to
//! the view model and keeps the derived result.
//!
//! Passive loads never fail: a fetch error is logged and the page shows its
//! empty state. User actions return `Result<_, Notice>` so the failure can be
//! shown to the user.

use std::fmt;
use tracing::warn;

use crate::api::{ApiError, ApiResult};
use crate::forms::FormError;

pub mod agents;
pub mod detail;
pub mod leads;
pub mod reports;

pub use agents::AgentsPage;
pub use detail::{AddLeadPage, LeadDetail, LeadDetailPage};
pub use leads::{
    AgentBoardPage, AgentLeads, DashboardPage, LeadListPage, LeadListView, LeadSettingsPage,
    StatusBoard, StatusBoardPage,
};
pub use reports::{Report, ReportsPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Dismissable message describing the outcome of a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Success".into(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

impl From<FormError> for Notice {
    fn from(err: FormError) -> Self {
        Notice::error(err.to_string())
    }
}

/// Turn a failed user action into a notice, logging the cause.
pub(crate) fn action_failed(action: &'static str, err: ApiError) -> Notice {
    warn!(?err, action, "action failed");
    Notice::error(err.user_message())
}

/// Collapse a passive fetch into an optional snapshot, logging failures.
pub(crate) fn passive<T>(what: &'static str, res: ApiResult<T>) -> Option<T> {
    match res {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(?err, what, "load failed; showing empty state");
            None
        }
    }
}

/// Like [`passive`] for lists, where the empty state is an empty list.
pub(crate) fn passive_list<T>(what: &'static str, res: ApiResult<Vec<T>>) -> Vec<T> {
    passive(what, res).unwrap_or_default()
}
