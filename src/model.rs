use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline stage of a lead. Transitions between values are unconstrained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    New,
    Contacted,
    Qualified,
    #[serde(rename = "Proposal Sent")]
    ProposalSent,
    Closed,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::New,
        Status::Contacted,
        Status::Qualified,
        Status::ProposalSent,
        Status::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "New",
            Status::Contacted => "Contacted",
            Status::Qualified => "Qualified",
            Status::ProposalSent => "Proposal Sent",
            Status::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Sort rank: High sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Source {
    Website,
    Referral,
    #[serde(rename = "Cold Call")]
    ColdCall,
    Advertisement,
    Email,
    Other,
}

impl Source {
    pub const ALL: [Source; 6] = [
        Source::Website,
        Source::Referral,
        Source::ColdCall,
        Source::Advertisement,
        Source::Email,
        Source::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Website => "Website",
            Source::Referral => "Referral",
            Source::ColdCall => "Cold Call",
            Source::Advertisement => "Advertisement",
            Source::Email => "Email",
            Source::Other => "Other",
        }
    }
}

/// Error returned when a label does not name a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! label_enum {
    ($ty:ty, $kind:literal) => {
        impl FromStr for $ty {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| UnknownLabel {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

label_enum!(Status, "status");
label_enum!(Priority, "priority");
label_enum!(Source, "source");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Agent {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Reference to a sales agent. The service returns either the populated
/// record or the bare identifier depending on the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AgentRef {
    Populated(Agent),
    Id(String),
}

impl AgentRef {
    pub fn id(&self) -> &str {
        match self {
            AgentRef::Populated(agent) => &agent.id,
            AgentRef::Id(id) => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            AgentRef::Populated(agent) => Some(&agent.name),
            AgentRef::Id(_) => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            AgentRef::Populated(agent) if !agent.email.is_empty() => Some(&agent.email),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub source: Source,
    #[serde(default)]
    pub sales_agent: Option<AgentRef>,
    pub status: Status,
    pub priority: Priority,
    pub time_to_close: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Lead {
    pub fn agent_id(&self) -> Option<&str> {
        self.sales_agent.as_ref().map(AgentRef::id)
    }

    pub fn is_assigned_to(&self, agent_id: &str) -> bool {
        self.agent_id() == Some(agent_id)
    }

    pub fn agent_name(&self) -> &str {
        self.sales_agent
            .as_ref()
            .and_then(AgentRef::name)
            .unwrap_or("N/A")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub author: AgentRef,
    pub comment_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn author_name(&self) -> &str {
        self.author.name().unwrap_or_else(|| self.author.id())
    }
}

/// Put comments in creation order. Comments without a timestamp keep their
/// relative server order and sort ahead of timestamped ones.
pub fn order_comments(comments: &mut [Comment]) {
    comments.sort_by_key(|c| c.created_at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lead_parses_populated_agent() {
        let lead: Lead = serde_json::from_value(json!({
            "_id": "l1",
            "name": "Acme",
            "source": "Cold Call",
            "salesAgent": { "_id": "a1", "name": "Jo", "email": "jo@example.com" },
            "status": "Proposal Sent",
            "priority": "High",
            "timeToClose": 12,
            "tags": ["High Value"],
            "createdAt": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(lead.source, Source::ColdCall);
        assert_eq!(lead.status, Status::ProposalSent);
        assert_eq!(lead.agent_id(), Some("a1"));
        assert_eq!(lead.agent_name(), "Jo");
        assert!(lead.created_at.is_some());
    }

    #[test]
    fn lead_parses_bare_agent_id() {
        let lead: Lead = serde_json::from_value(json!({
            "_id": "l2",
            "name": "Beta",
            "source": "Email",
            "salesAgent": "a9",
            "status": "New",
            "priority": "Low",
            "timeToClose": 3
        }))
        .unwrap();
        assert!(lead.is_assigned_to("a9"));
        assert_eq!(lead.agent_name(), "N/A");
        assert!(lead.tags.is_empty());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let res: Result<Status, _> = serde_json::from_value(json!("Lost"));
        assert!(res.is_err());
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("proposal sent".parse::<Status>().unwrap(), Status::ProposalSent);
        assert_eq!(" high ".parse::<Priority>().unwrap(), Priority::High);
        let err = "Fax".parse::<Source>().unwrap_err();
        assert_eq!(err.kind, "source");
    }

    #[test]
    fn comments_order_by_creation() {
        let mk = |id: &str, ts: &str| Comment {
            id: id.into(),
            author: AgentRef::Id("a1".into()),
            comment_text: id.into(),
            created_at: Some(ts.parse().unwrap()),
        };
        let mut comments = vec![
            mk("c2", "2024-01-02T00:00:00Z"),
            mk("c1", "2024-01-01T00:00:00Z"),
        ];
        order_comments(&mut comments);
        assert_eq!(comments[0].id, "c1");
        assert_eq!(comments[0].author_name(), "a1");
    }
}
