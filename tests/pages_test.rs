use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tokio::time::Duration;

use lead_desk::api::model::{LeadPatch, LeadQuery, NewAgent, NewComment, NewLead, PipelineReport};
use lead_desk::api::{ApiError, ApiResult, LeadsApi};
use lead_desk::forms::{AgentForm, CommentForm, LeadEdit, LeadForm};
use lead_desk::model::{Agent, AgentRef, Comment, Lead, Priority, Source, Status};
use lead_desk::pages::{
    AddLeadPage, AgentBoardPage, AgentsPage, DashboardPage, LeadDetailPage, LeadListPage,
    LeadSettingsPage, ReportsPage, StatusBoardPage,
};
use lead_desk::view::{LeadFilter, PipelineSplit, SortSpec, ViewState};

fn agent(id: &str, name: &str) -> Agent {
    Agent {
        id: id.into(),
        name: name.into(),
        email: format!("{id}@example.com"),
    }
}

fn lead(id: &str, status: Status, priority: Priority, ttc: u32, agent_id: &str) -> Lead {
    Lead {
        id: id.into(),
        name: format!("Lead {id}"),
        source: Source::Website,
        sales_agent: Some(AgentRef::Id(agent_id.into())),
        status,
        priority,
        time_to_close: ttc,
        tags: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

fn comment(id: &str, author: &str, text: &str, minute: u32) -> Comment {
    Comment {
        id: id.into(),
        author: AgentRef::Id(author.into()),
        comment_text: text.into(),
        created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap()),
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: "service down".into(),
    }
}

#[derive(Default)]
struct Store {
    leads: Vec<Lead>,
    agents: Vec<Agent>,
    comments: Vec<Comment>,
    pipeline: u64,
    /// Agents the service refuses to delete.
    protected_agents: HashSet<String>,
    /// Comments posted by someone else right after ours.
    concurrent_comments: Vec<Comment>,
}

#[derive(Clone, Default)]
struct RecordingApi {
    store: Arc<Mutex<Store>>,
    fail: Arc<Mutex<bool>>,
    leads_delays: Arc<Mutex<VecDeque<Duration>>>,
    lead_delays: Arc<Mutex<VecDeque<Duration>>>,
    calls: Arc<Mutex<Vec<String>>>,
    patches: Arc<Mutex<Vec<LeadPatch>>>,
}

impl RecordingApi {
    fn with_store(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            ..Default::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: Arc::new(Mutex::new(true)),
            ..Default::default()
        }
    }

    async fn delay_leads(&self, delays: Vec<Duration>) {
        *self.leads_delays.lock().await = VecDeque::from(delays);
    }

    async fn delay_lead(&self, delays: Vec<Duration>) {
        *self.lead_delays.lock().await = VecDeque::from(delays);
    }

    async fn record(&self, call: String) -> ApiResult<()> {
        self.calls.lock().await.push(call);
        if *self.fail.lock().await {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

fn describe(query: &LeadQuery) -> String {
    let params: Vec<String> = query
        .pairs()
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    if params.is_empty() {
        "list_leads".into()
    } else {
        format!("list_leads?{}", params.join("&"))
    }
}

#[async_trait]
impl LeadsApi for RecordingApi {
    async fn list_leads(&self, query: &LeadQuery) -> ApiResult<Vec<Lead>> {
        self.record(describe(query)).await?;
        let delay = self.leads_delays.lock().await.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let store = self.store.lock().await;
        Ok(store
            .leads
            .iter()
            .filter(|l| query.status.map_or(true, |s| l.status == s))
            .filter(|l| {
                query
                    .sales_agent
                    .as_deref()
                    .map_or(true, |id| l.is_assigned_to(id))
            })
            .cloned()
            .collect())
    }

    async fn get_lead(&self, id: &str) -> ApiResult<Lead> {
        self.record(format!("get_lead {id}")).await?;
        let delay = self.lead_delays.lock().await.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let store = self.store.lock().await;
        store
            .leads
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: StatusCode::NOT_FOUND,
                message: "Lead not found".into(),
            })
    }

    async fn create_lead(&self, lead: &NewLead) -> ApiResult<Lead> {
        self.record("create_lead".into()).await?;
        let mut store = self.store.lock().await;
        let created = Lead {
            id: format!("l{}", store.leads.len() + 1),
            name: lead.name.clone(),
            source: lead.source,
            sales_agent: Some(AgentRef::Id(lead.sales_agent.clone())),
            status: lead.status,
            priority: lead.priority,
            time_to_close: lead.time_to_close,
            tags: lead.tags.clone(),
            created_at: None,
            updated_at: None,
        };
        store.leads.push(created.clone());
        Ok(created)
    }

    async fn update_lead(&self, id: &str, patch: &LeadPatch) -> ApiResult<Lead> {
        self.record(format!("update_lead {id}")).await?;
        self.patches.lock().await.push(patch.clone());
        let mut store = self.store.lock().await;
        let lead = store
            .leads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(unavailable)?;
        if let Some(status) = patch.status {
            lead.status = status;
        }
        if let Some(priority) = patch.priority {
            lead.priority = priority;
        }
        if let Some(ttc) = patch.time_to_close {
            lead.time_to_close = ttc;
        }
        Ok(lead.clone())
    }

    async fn delete_lead(&self, id: &str) -> ApiResult<()> {
        self.record(format!("delete_lead {id}")).await?;
        self.store.lock().await.leads.retain(|l| l.id != id);
        Ok(())
    }

    async fn list_comments(&self, lead_id: &str) -> ApiResult<Vec<Comment>> {
        self.record(format!("list_comments {lead_id}")).await?;
        Ok(self.store.lock().await.comments.clone())
    }

    async fn add_comment(&self, lead_id: &str, comment: &NewComment) -> ApiResult<()> {
        self.record(format!("add_comment {lead_id}")).await?;
        let mut store = self.store.lock().await;
        let id = format!("c{}", store.comments.len() + 1);
        store.comments.push(comment_for(&id, comment));
        let others = std::mem::take(&mut store.concurrent_comments);
        store.comments.extend(others);
        Ok(())
    }

    async fn list_agents(&self) -> ApiResult<Vec<Agent>> {
        self.record("list_agents".into()).await?;
        Ok(self.store.lock().await.agents.clone())
    }

    async fn create_agent(&self, agent: &NewAgent) -> ApiResult<Agent> {
        self.record("create_agent".into()).await?;
        let mut store = self.store.lock().await;
        let created = Agent {
            id: format!("a{}", store.agents.len() + 1),
            name: agent.name.clone(),
            email: agent.email.clone(),
        };
        store.agents.push(created.clone());
        Ok(created)
    }

    async fn delete_agent(&self, id: &str) -> ApiResult<()> {
        self.record(format!("delete_agent {id}")).await?;
        let mut store = self.store.lock().await;
        if store.protected_agents.contains(id) {
            return Err(ApiError::Status {
                status: StatusCode::BAD_REQUEST,
                message: "Sales agent has assigned leads".into(),
            });
        }
        store.agents.retain(|a| a.id != id);
        Ok(())
    }

    async fn pipeline_report(&self) -> ApiResult<PipelineReport> {
        self.record("pipeline_report".into()).await?;
        Ok(PipelineReport {
            total_leads_in_pipeline: self.store.lock().await.pipeline,
        })
    }
}

fn comment_for(id: &str, comment: &NewComment) -> Comment {
    Comment {
        id: id.into(),
        author: AgentRef::Id(comment.author.clone()),
        comment_text: comment.comment_text.clone(),
        created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
    }
}

fn sample_store() -> Store {
    Store {
        leads: vec![
            lead("l1", Status::New, Priority::Low, 10, "a1"),
            lead("l2", Status::New, Priority::High, 5, "a2"),
            lead("l3", Status::Closed, Priority::Medium, 30, "a1"),
            lead("l4", Status::Qualified, Priority::High, 20, "a1"),
        ],
        agents: vec![agent("a1", "Ana"), agent("a2", "Ben")],
        ..Store::default()
    }
}

#[tokio::test]
async fn failed_fetch_shows_empty_views() {
    let api = RecordingApi::failing();

    let dashboard = DashboardPage::new(&api);
    dashboard.load().await;
    let view = dashboard.view(None).await;
    assert!(view.is_empty());
    assert_eq!(view.total, 0);
    assert_eq!(view.status_counts.total(), 0);

    let list = LeadListPage::new(&api).load(&ViewState::default()).await;
    assert!(list.view.leads.is_empty());
    assert!(list.agents.is_empty());

    let board = StatusBoardPage::new(&api).load(&ViewState::default()).await;
    assert_eq!(board.columns.len(), 5);
    assert_eq!(board.total(), 0);

    assert!(AgentsPage::new(&api).load().await.is_empty());

    let report = ReportsPage::new(&api).load().await;
    assert_eq!(report.total, 0);
    assert!(report.pipeline.is_none());
    assert!(report.agent_counts.is_empty());
}

#[tokio::test]
async fn dashboard_filters_snapshot_without_refetching() {
    let api = RecordingApi::with_store(sample_store());
    let page = DashboardPage::new(&api);
    page.load().await;

    let all = page.view(None).await;
    assert_eq!(all.total, 4);
    assert_eq!(all.status_counts.get(Status::New), 2);

    let closed = page.view(Some(Status::Closed)).await;
    assert_eq!(closed.shown(), 1);
    assert_eq!(closed.total, 4);
    assert_eq!(api.calls().await, vec!["list_leads"]);
}

#[tokio::test]
async fn lead_list_queries_server_and_sorts_locally() {
    let api = RecordingApi::with_store(sample_store());
    let state = ViewState {
        filter: LeadFilter {
            agent_id: Some("a1".into()),
            ..LeadFilter::default()
        },
        sort: SortSpec {
            by_priority: true,
            by_time_to_close: true,
        },
    };
    let list = LeadListPage::new(&api).load(&state).await;
    let ids: Vec<&str> = list.view.leads.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["l4", "l3", "l1"]);
    assert_eq!(list.agents.len(), 2);
    assert!(api.calls().await.contains(&"list_leads?salesAgent=a1".to_string()));
}

#[tokio::test]
async fn blank_agent_filter_lists_every_lead() {
    let api = RecordingApi::with_store(sample_store());
    let state = ViewState {
        filter: LeadFilter {
            agent_id: Some(String::new()),
            ..LeadFilter::default()
        },
        ..ViewState::default()
    };

    let list = LeadListPage::new(&api).load(&state).await;
    assert_eq!(list.view.shown(), 4);

    let board = StatusBoardPage::new(&api).load(&state).await;
    assert_eq!(board.total(), 4);

    let calls = api.calls().await;
    assert!(calls.iter().all(|c| !c.contains("salesAgent")));
}

#[tokio::test]
async fn older_load_finishing_last_is_discarded() {
    let api = RecordingApi::with_store(sample_store());
    api.delay_leads(vec![Duration::from_millis(150), Duration::ZERO])
        .await;
    let page = LeadListPage::new(&api);

    let stale = ViewState {
        filter: LeadFilter {
            status: Some(Status::New),
            ..LeadFilter::default()
        },
        ..ViewState::default()
    };
    let fresh = ViewState {
        filter: LeadFilter {
            status: Some(Status::Closed),
            ..LeadFilter::default()
        },
        ..ViewState::default()
    };
    futures::join!(page.load(&stale), page.load(&fresh));

    let shown = page.view().await;
    let ids: Vec<&str> = shown.view.leads.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["l3"]);
}

#[tokio::test]
async fn status_board_groups_every_status() {
    let api = RecordingApi::with_store(sample_store());
    let state = ViewState {
        filter: LeadFilter {
            status: Some(Status::Closed),
            ..LeadFilter::default()
        },
        sort: SortSpec::time_to_close(),
    };
    let board = StatusBoardPage::new(&api).load(&state).await;
    let sizes: Vec<usize> = board.columns.iter().map(|c| c.leads.len()).collect();
    assert_eq!(sizes, vec![2, 0, 1, 0, 1]);
    let new_ids: Vec<&str> = board.columns[0].leads.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(new_ids, vec!["l1", "l2"]);
}

#[tokio::test]
async fn agent_board_fetches_after_agent_list() {
    let api = RecordingApi::with_store(sample_store());
    let state = ViewState {
        filter: LeadFilter {
            status: Some(Status::New),
            ..LeadFilter::default()
        },
        ..ViewState::default()
    };
    let board = AgentBoardPage::new(&api).load(&state).await;

    let calls = api.calls().await;
    assert_eq!(calls[0], "list_agents");
    assert_eq!(calls.len(), 3);
    assert!(calls.contains(&"list_leads?status=New&salesAgent=a1".to_string()));
    assert!(calls.contains(&"list_leads?status=New&salesAgent=a2".to_string()));

    assert_eq!(board.len(), 2);
    assert_eq!(board[0].agent.id, "a1");
    assert_eq!(board[0].leads.len(), 1);
    assert_eq!(board[1].leads[0].id, "l2");
}

#[tokio::test]
async fn report_splits_pipeline_from_total() {
    let mut store = sample_store();
    store.leads = (0..10)
        .map(|i| lead(&format!("l{i}"), Status::New, Priority::Medium, 5, "a1"))
        .collect();
    store.pipeline = 3;
    let api = RecordingApi::with_store(store);

    let report = ReportsPage::new(&api).load().await;
    assert_eq!(report.total, 10);
    assert_eq!(
        report.pipeline,
        Some(PipelineSplit::compute(3, 10))
    );
    let split = report.pipeline.unwrap().unwrap();
    assert_eq!((split.pipeline, split.other), (3, 7));
    assert_eq!(report.status_counts.get(Status::New), 10);
    assert_eq!(report.agent_counts[0].leads, 10);
    assert_eq!(report.agent_counts[1].leads, 0);
}

#[tokio::test]
async fn report_flags_pipeline_larger_than_total() {
    let mut store = sample_store();
    store.pipeline = 9;
    let api = RecordingApi::with_store(store);

    let report = ReportsPage::new(&api).load().await;
    assert!(matches!(report.pipeline, Some(Err(_))));
    assert_eq!(report.total, 4);
}

#[tokio::test]
async fn empty_lead_name_never_reaches_service() {
    let api = RecordingApi::with_store(sample_store());
    let form = LeadForm {
        name: "   ".into(),
        source: "Website".into(),
        sales_agent: "a1".into(),
        time_to_close: "10".into(),
        ..LeadForm::default()
    };
    let notice = AddLeadPage::new(&api).submit(&form).await.unwrap_err();
    assert!(notice.is_error());
    assert!(!api.calls().await.iter().any(|c| c == "create_lead"));
}

#[tokio::test]
async fn new_lead_gets_default_status_and_priority() {
    let api = RecordingApi::with_store(sample_store());
    let form = LeadForm {
        name: "Globex".into(),
        source: "Cold Call".into(),
        sales_agent: "a2".into(),
        time_to_close: "14".into(),
        tags: vec!["High Value".into()],
        ..LeadForm::default()
    };
    let created = AddLeadPage::new(&api).submit(&form).await.unwrap();
    assert_eq!(created.status, Status::New);
    assert_eq!(created.priority, Priority::Medium);
    assert_eq!(created.source, Source::ColdCall);
}

#[tokio::test]
async fn partial_update_sends_only_given_fields() {
    let api = RecordingApi::with_store(sample_store());
    let page = LeadDetailPage::new(&api, "l1");
    page.load().await;

    let edit = LeadEdit {
        status: "Contacted".into(),
        ..LeadEdit::default()
    };
    let updated = page.update(&edit).await.unwrap();
    assert_eq!(updated.status, Status::Contacted);
    assert_eq!(updated.time_to_close, 10);

    let patches = api.patches.lock().await.clone();
    assert_eq!(patches.len(), 1);
    assert_eq!(
        serde_json::to_value(&patches[0]).unwrap(),
        serde_json::json!({ "status": "Contacted" })
    );
    assert_eq!(page.detail().await.lead, Some(updated));
}

#[tokio::test]
async fn update_during_load_keeps_loaded_detail() {
    let api = RecordingApi::with_store(sample_store());
    api.delay_lead(vec![Duration::from_millis(150)]).await;
    let page = LeadDetailPage::new(&api, "l1");

    let edit = LeadEdit {
        priority: "High".into(),
        ..LeadEdit::default()
    };
    let (_, updated) = futures::join!(page.load(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        page.update(&edit).await
    });
    assert_eq!(updated.unwrap().priority, Priority::High);

    let detail = page.detail().await;
    assert_eq!(detail.agents.len(), 2);
    assert_eq!(detail.lead.map(|l| l.priority), Some(Priority::High));
}

#[tokio::test]
async fn empty_edit_is_rejected_locally() {
    let api = RecordingApi::with_store(sample_store());
    let page = LeadDetailPage::new(&api, "l1");
    assert!(page.update(&LeadEdit::default()).await.is_err());
    assert!(api.patches.lock().await.is_empty());
}

#[tokio::test]
async fn adding_comment_refetches_list() {
    let mut store = sample_store();
    store.comments = vec![comment("c0", "a1", "first call done", 0)];
    store.concurrent_comments = vec![comment("cx", "a2", "sent pricing", 30)];
    let api = RecordingApi::with_store(store);
    let page = LeadDetailPage::new(&api, "l1");
    assert_eq!(page.load().await.comments.len(), 1);

    let comments = page
        .add_comment(&CommentForm {
            author: "a1".into(),
            text: "follow up next week".into(),
        })
        .await
        .unwrap();

    let texts: Vec<&str> = comments.iter().map(|c| c.comment_text.as_str()).collect();
    assert_eq!(texts, vec!["first call done", "sent pricing", "follow up next week"]);
    assert_eq!(page.detail().await.comments, comments);
    assert_eq!(api.calls().await.last().unwrap(), "list_comments l1");
}

#[tokio::test]
async fn rejected_agent_delete_keeps_agent_listed() {
    let mut store = sample_store();
    store.protected_agents.insert("a1".into());
    let api = RecordingApi::with_store(store);
    let page = AgentsPage::new(&api);
    page.load().await;

    let notice = page.delete("a1").await.unwrap_err();
    assert!(notice.is_error());
    assert_eq!(notice.description, "Sales agent has assigned leads");
    assert!(page.agents().await.iter().any(|a| a.id == "a1"));

    page.delete("a2").await.unwrap();
    let ids: Vec<String> = page.agents().await.into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["a1"]);
}

#[tokio::test]
async fn invalid_agent_email_is_rejected_locally() {
    let api = RecordingApi::with_store(sample_store());
    let page = AgentsPage::new(&api);
    let form = AgentForm {
        name: "Cleo".into(),
        email: "cleo-at-example".into(),
    };
    assert!(page.create(&form).await.is_err());
    assert!(!api.calls().await.iter().any(|c| c == "create_agent"));

    let form = AgentForm {
        email: "cleo@example.com".into(),
        ..form
    };
    let created = page.create(&form).await.unwrap();
    assert!(page.agents().await.contains(&created));
}

#[tokio::test]
async fn deleting_lead_refreshes_list() {
    let api = RecordingApi::with_store(sample_store());
    let page = LeadSettingsPage::new(&api);
    assert_eq!(page.load().await.len(), 4);
    page.delete("l2").await.unwrap();
    assert!(page.leads().await.iter().all(|l| l.id != "l2"));
    assert_eq!(page.leads().await.len(), 3);
}
