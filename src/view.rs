//! Lead view model: pure filtering, ordering and aggregation over fetched
//! snapshots. Nothing here touches the network; pages feed it whatever the
//! last fetch produced, or `None` when that fetch failed.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use crate::model::{Agent, Lead, Priority, Status};

/// Field-equality criteria. An absent criterion places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        self.status.map_or(true, |s| lead.status == s)
            && self.agent().map_or(true, |id| lead.is_assigned_to(id))
            && self.priority.map_or(true, |p| lead.priority == p)
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.agent().is_none() && self.priority.is_none()
    }

    /// Agent criterion; a blank id means "any agent", as in the service query.
    pub fn agent(&self) -> Option<&str> {
        self.agent_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Requested orderings.
///
/// With both keys set, priority is the primary key (High first) and
/// time-to-close descending breaks ties. Leads equal on every requested key
/// keep their fetched order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub by_priority: bool,
    #[serde(default)]
    pub by_time_to_close: bool,
}

impl SortSpec {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn priority() -> Self {
        Self {
            by_priority: true,
            ..Self::default()
        }
    }

    pub fn time_to_close() -> Self {
        Self {
            by_time_to_close: true,
            ..Self::default()
        }
    }

    pub fn is_none(&self) -> bool {
        !self.by_priority && !self.by_time_to_close
    }

    fn compare(&self, a: &Lead, b: &Lead) -> Ordering {
        let mut ord = Ordering::Equal;
        if self.by_priority {
            ord = a.priority.rank().cmp(&b.priority.rank());
        }
        if self.by_time_to_close {
            ord = ord.then_with(|| b.time_to_close.cmp(&a.time_to_close));
        }
        ord
    }
}

/// Everything a lead view needs to re-derive its display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub filter: LeadFilter,
    #[serde(default)]
    pub sort: SortSpec,
}

/// Count of leads per status. Every status is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    counts: [usize; 5],
}

impl StatusCounts {
    pub fn get(&self, status: Status) -> usize {
        self.counts[status_index(status)]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Status, usize)> + '_ {
        Status::ALL.iter().map(move |s| (*s, self.get(*s)))
    }
}

fn status_index(status: Status) -> usize {
    match status {
        Status::New => 0,
        Status::Contacted => 1,
        Status::Qualified => 2,
        Status::ProposalSent => 3,
        Status::Closed => 4,
    }
}

/// Derived lead display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadView {
    pub leads: Vec<Lead>,
    /// Size of the unfiltered snapshot.
    pub total: usize,
    /// Counts over the unfiltered snapshot.
    pub status_counts: StatusCounts,
}

impl LeadView {
    pub fn shown(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }
}

pub fn filter_leads(leads: &[Lead], filter: &LeadFilter) -> Vec<Lead> {
    leads.iter().filter(|l| filter.matches(l)).cloned().collect()
}

/// Stable sort per `sort`; a no-op when no key is requested.
pub fn sort_leads(leads: &mut [Lead], sort: SortSpec) {
    if sort.is_none() {
        return;
    }
    leads.sort_by(|a, b| sort.compare(a, b));
}

pub fn status_counts(leads: &[Lead]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for lead in leads {
        counts.counts[status_index(lead.status)] += 1;
    }
    counts
}

/// Apply `state` to a snapshot. A missing snapshot (failed fetch) yields the
/// empty view.
pub fn derive(state: &ViewState, leads: Option<&[Lead]>) -> LeadView {
    let Some(leads) = leads else {
        return LeadView::default();
    };
    let mut shown = filter_leads(leads, &state.filter);
    sort_leads(&mut shown, state.sort);
    LeadView {
        leads: shown,
        total: leads.len(),
        status_counts: status_counts(leads),
    }
}

/// One status column with its leads in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusGroup {
    pub status: Status,
    pub leads: Vec<Lead>,
}

/// Split an already ordered sequence into the five status columns, keeping
/// the order within each column.
pub fn group_by_status(leads: &[Lead]) -> Vec<StatusGroup> {
    Status::ALL
        .iter()
        .map(|status| StatusGroup {
            status: *status,
            leads: leads.iter().filter(|l| l.status == *status).cloned().collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentCount {
    pub agent_id: String,
    pub agent_name: String,
    pub leads: usize,
}

/// Leads per agent, in agent-list order. Leads referencing unknown agents are
/// not counted anywhere.
pub fn agent_counts(agents: &[Agent], leads: &[Lead]) -> Vec<AgentCount> {
    agents
        .iter()
        .map(|agent| AgentCount {
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            leads: leads.iter().filter(|l| l.is_assigned_to(&agent.id)).count(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("pipeline count {pipeline} exceeds total lead count {total}")]
    PipelineExceedsTotal { pipeline: u64, total: usize },
}

/// Pipeline share of all leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineSplit {
    pub pipeline: u64,
    pub other: u64,
}

impl PipelineSplit {
    /// `pipeline` comes from the service; it may not exceed `total`.
    pub fn compute(pipeline: u64, total: usize) -> Result<Self, ViewError> {
        let total_u64 = total as u64;
        if pipeline > total_u64 {
            return Err(ViewError::PipelineExceedsTotal { pipeline, total });
        }
        Ok(Self {
            pipeline,
            other: total_u64 - pipeline,
        })
    }

    pub fn total(&self) -> u64 {
        self.pipeline + self.other
    }
}
