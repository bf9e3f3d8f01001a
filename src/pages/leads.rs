use futures::future::join_all;
use tracing::{info, instrument};

use super::{action_failed, passive, passive_list, Notice};
use crate::api::model::LeadQuery;
use crate::api::LeadsApi;
use crate::model::{Agent, Lead, Status};
use crate::session::ViewSlot;
use crate::view::{derive, group_by_status, LeadFilter, LeadView, SortSpec, StatusGroup, ViewState};

/// Home page: every lead, filtered by status on the client.
pub struct DashboardPage<'a> {
    api: &'a dyn LeadsApi,
    snapshot: ViewSlot<Option<Vec<Lead>>>,
}

impl<'a> DashboardPage<'a> {
    pub fn new(api: &'a dyn LeadsApi) -> Self {
        Self {
            api,
            snapshot: ViewSlot::new(None),
        }
    }

    #[instrument(skip_all)]
    pub async fn load(&self) {
        let ticket = self.snapshot.begin();
        let leads = passive("leads", self.api.list_leads(&LeadQuery::all()).await);
        self.snapshot.store(ticket, leads).await;
    }

    /// Status filter changes re-derive from the last snapshot without fetching.
    pub async fn view(&self, status: Option<Status>) -> LeadView {
        let snapshot = self.snapshot.current().await;
        let state = ViewState {
            filter: LeadFilter {
                status,
                ..LeadFilter::default()
            },
            sort: SortSpec::none(),
        };
        derive(&state, snapshot.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadListView {
    pub view: LeadView,
    /// Choices for the agent filter.
    pub agents: Vec<Agent>,
}

/// Lead list: status and agent filtered by the service, priority filter and
/// ordering applied locally.
pub struct LeadListPage<'a> {
    api: &'a dyn LeadsApi,
    current: ViewSlot<LeadListView>,
}

impl<'a> LeadListPage<'a> {
    pub fn new(api: &'a dyn LeadsApi) -> Self {
        Self {
            api,
            current: ViewSlot::new(LeadListView::default()),
        }
    }

    /// Fetch for `state` and return whatever view is current afterwards.
    #[instrument(skip_all)]
    pub async fn load(&self, state: &ViewState) -> LeadListView {
        let ticket = self.current.begin();
        let query = LeadQuery {
            status: state.filter.status,
            sales_agent: state.filter.agent().map(str::to_string),
        };
        let (leads, agents) = futures::join!(self.api.list_leads(&query), self.api.list_agents());
        let leads = passive("leads", leads);
        let next = LeadListView {
            view: derive(state, leads.as_deref()),
            agents: passive_list("agents", agents),
        };
        self.current.store(ticket, next).await;
        self.current.current().await
    }

    pub async fn view(&self) -> LeadListView {
        self.current.current().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBoard {
    /// One column per status, in pipeline order.
    pub columns: Vec<StatusGroup>,
    pub agents: Vec<Agent>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self {
            columns: group_by_status(&[]),
            agents: Vec::new(),
        }
    }
}

impl StatusBoard {
    pub fn total(&self) -> usize {
        self.columns.iter().map(|c| c.leads.len()).sum()
    }
}

/// Leads grouped into status columns. The status criterion of the view state
/// is ignored since every status gets its own column.
pub struct StatusBoardPage<'a> {
    api: &'a dyn LeadsApi,
    current: ViewSlot<StatusBoard>,
}

impl<'a> StatusBoardPage<'a> {
    pub fn new(api: &'a dyn LeadsApi) -> Self {
        Self {
            api,
            current: ViewSlot::new(StatusBoard::default()),
        }
    }

    #[instrument(skip_all)]
    pub async fn load(&self, state: &ViewState) -> StatusBoard {
        let ticket = self.current.begin();
        let query = LeadQuery {
            status: None,
            sales_agent: state.filter.agent().map(str::to_string),
        };
        let (leads, agents) = futures::join!(self.api.list_leads(&query), self.api.list_agents());
        let leads = passive("leads", leads);
        let state = ViewState {
            filter: LeadFilter {
                status: None,
                ..state.filter.clone()
            },
            sort: state.sort,
        };
        let view = derive(&state, leads.as_deref());
        let next = StatusBoard {
            columns: group_by_status(&view.leads),
            agents: passive_list("agents", agents),
        };
        self.current.store(ticket, next).await;
        self.current.current().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLeads {
    pub agent: Agent,
    pub leads: Vec<Lead>,
}

/// Leads per agent. Per-agent fetches start only once the agent list has
/// resolved.
pub struct AgentBoardPage<'a> {
    api: &'a dyn LeadsApi,
    current: ViewSlot<Vec<AgentLeads>>,
}

impl<'a> AgentBoardPage<'a> {
    pub fn new(api: &'a dyn LeadsApi) -> Self {
        Self {
            api,
            current: ViewSlot::new(Vec::new()),
        }
    }

    #[instrument(skip_all)]
    pub async fn load(&self, state: &ViewState) -> Vec<AgentLeads> {
        let ticket = self.current.begin();
        let agents = passive_list("agents", self.api.list_agents().await);

        let fetches = agents.iter().map(|agent| {
            let query = LeadQuery::by_agent(agent.id.clone()).with_status(state.filter.status);
            async move { self.api.list_leads(&query).await }
        });
        let results = join_all(fetches).await;

        let board = agents
            .into_iter()
            .zip(results)
            .map(|(agent, leads)| {
                let leads = passive("agent leads", leads);
                let state = ViewState {
                    filter: LeadFilter {
                        agent_id: Some(agent.id.clone()),
                        ..state.filter.clone()
                    },
                    sort: state.sort,
                };
                let view = derive(&state, leads.as_deref());
                AgentLeads {
                    agent,
                    leads: view.leads,
                }
            })
            .collect();
        self.current.store(ticket, board).await;
        self.current.current().await
    }
}

/// Lead maintenance: list and delete.
pub struct LeadSettingsPage<'a> {
    api: &'a dyn LeadsApi,
    current: ViewSlot<Vec<Lead>>,
}

impl<'a> LeadSettingsPage<'a> {
    pub fn new(api: &'a dyn LeadsApi) -> Self {
        Self {
            api,
            current: ViewSlot::new(Vec::new()),
        }
    }

    #[instrument(skip_all)]
    pub async fn load(&self) -> Vec<Lead> {
        let ticket = self.current.begin();
        let leads = passive_list("leads", self.api.list_leads(&LeadQuery::all()).await);
        self.current.store(ticket, leads).await;
        self.current.current().await
    }

    pub async fn leads(&self) -> Vec<Lead> {
        self.current.current().await
    }

    /// Delete a lead and refresh the list from the service.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: &str) -> Result<(), Notice> {
        self.api
            .delete_lead(id)
            .await
            .map_err(|err| action_failed("delete lead", err))?;
        info!(id, "lead deleted");
        self.load().await;
        Ok(())
    }
}
