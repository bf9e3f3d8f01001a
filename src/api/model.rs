//! Wire shapes exchanged with the leads service.
use serde::{Deserialize, Serialize};

use crate::model::{Priority, Source, Status};

/// `{ data: ... }` wrapper used by every resource endpoint.
#[derive(Deserialize, Debug)]
pub struct DataEnvelope<T> {
    pub data: Option<T>,
}

/// Error payload returned alongside non-2xx responses.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    #[serde(rename = "totalLeadsInPipeline")]
    pub total_leads_in_pipeline: u64,
}

/// Server-side filters for `GET /leads`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadQuery {
    pub status: Option<Status>,
    pub sales_agent: Option<String>,
}

impl LeadQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_agent(agent_id: impl Into<String>) -> Self {
        Self {
            sales_agent: Some(agent_id.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: Option<Status>) -> Self {
        self.status = status;
        self
    }

    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(agent) = self.sales_agent.as_deref().filter(|a| !a.is_empty()) {
            pairs.push(("salesAgent", agent.to_string()));
        }
        pairs
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub source: Source,
    pub sales_agent: String,
    pub status: Status,
    pub tags: Vec<String>,
    pub time_to_close: u32,
    pub priority: Priority,
}

/// Partial update body; absent fields are left untouched by the service.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_close: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.sales_agent.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.time_to_close.is_none()
            && self.tags.is_none()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewAgent {
    pub name: String,
    pub email: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub author: String,
    pub comment_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_serializes_only_provided_fields() {
        let patch = LeadPatch {
            status: Some(Status::Qualified),
            time_to_close: Some(9),
            ..LeadPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "status": "Qualified", "timeToClose": 9 })
        );
        assert!(LeadPatch::default().is_empty());
    }

    #[test]
    fn query_pairs_skip_absent_criteria() {
        assert!(LeadQuery::all().pairs().is_empty());
        let q = LeadQuery::by_agent("a1").with_status(Some(Status::ProposalSent));
        assert_eq!(
            q.pairs(),
            vec![
                ("status", "Proposal Sent".to_string()),
                ("salesAgent", "a1".to_string())
            ]
        );
    }

    #[test]
    fn envelope_without_data_is_none() {
        let env: DataEnvelope<Vec<u32>> = serde_json::from_value(json!({})).unwrap();
        assert!(env.data.is_none());
    }

    #[test]
    fn error_body_prefers_message() {
        let body: ErrorBody =
            serde_json::from_value(json!({ "message": "Agent has leads", "error": "x" })).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Agent has leads"));
        let body: ErrorBody = serde_json::from_value(json!({ "message": "  " })).unwrap();
        assert_eq!(body.into_message(), None);
    }
}
