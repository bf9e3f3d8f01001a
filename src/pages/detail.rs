use tracing::{info, instrument};

use super::{action_failed, passive, passive_list, Notice};
use crate::api::LeadsApi;
use crate::forms::{CommentForm, LeadEdit, LeadForm};
use crate::model::{order_comments, Agent, Comment, Lead};
use crate::session::ViewSlot;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadDetail {
    /// `None` when the lead could not be loaded.
    pub lead: Option<Lead>,
    pub agents: Vec<Agent>,
    /// In creation order.
    pub comments: Vec<Comment>,
}

/// One lead with its comments; supports editing and commenting.
pub struct LeadDetailPage<'a> {
    api: &'a dyn LeadsApi,
    lead_id: String,
    current: ViewSlot<LeadDetail>,
}

impl<'a> LeadDetailPage<'a> {
    pub fn new(api: &'a dyn LeadsApi, lead_id: impl Into<String>) -> Self {
        Self {
            api,
            lead_id: lead_id.into(),
            current: ViewSlot::new(LeadDetail::default()),
        }
    }

    pub fn lead_id(&self) -> &str {
        &self.lead_id
    }

    #[instrument(skip_all, fields(lead_id = %self.lead_id))]
    pub async fn load(&self) -> LeadDetail {
        let ticket = self.current.begin();
        let (lead, agents, comments) = futures::join!(
            self.api.get_lead(&self.lead_id),
            self.api.list_agents(),
            self.api.list_comments(&self.lead_id)
        );
        let mut comments = passive_list("comments", comments);
        order_comments(&mut comments);
        let next = LeadDetail {
            lead: passive("lead", lead),
            agents: passive_list("agents", agents),
            comments,
        };
        self.current.store(ticket, next).await;
        self.current.current().await
    }

    pub async fn detail(&self) -> LeadDetail {
        self.current.current().await
    }

    /// Send the provided fields of `edit`; the displayed lead becomes the one
    /// returned by the service.
    #[instrument(skip_all, fields(lead_id = %self.lead_id))]
    pub async fn update(&self, edit: &LeadEdit) -> Result<Lead, Notice> {
        let patch = edit.validate()?;
        let updated = self
            .api
            .update_lead(&self.lead_id, &patch)
            .await
            .map_err(|err| action_failed("update lead", err))?;
        info!("lead updated");

        let lead = updated.clone();
        self.current.modify(|detail| detail.lead = Some(lead)).await;
        Ok(updated)
    }

    /// Post a comment, then replace the displayed comments with a fresh fetch.
    #[instrument(skip_all, fields(lead_id = %self.lead_id))]
    pub async fn add_comment(&self, form: &CommentForm) -> Result<Vec<Comment>, Notice> {
        let comment = form.validate()?;
        self.api
            .add_comment(&self.lead_id, &comment)
            .await
            .map_err(|err| action_failed("add comment", err))?;
        info!("comment added");

        let mut comments =
            passive_list("comments", self.api.list_comments(&self.lead_id).await);
        order_comments(&mut comments);
        let fresh = comments.clone();
        self.current.modify(|detail| detail.comments = fresh).await;
        Ok(comments)
    }
}

/// New lead entry; loads the agent list for the assignment picker.
pub struct AddLeadPage<'a> {
    api: &'a dyn LeadsApi,
    agents: ViewSlot<Vec<Agent>>,
}

impl<'a> AddLeadPage<'a> {
    pub fn new(api: &'a dyn LeadsApi) -> Self {
        Self {
            api,
            agents: ViewSlot::new(Vec::new()),
        }
    }

    #[instrument(skip_all)]
    pub async fn load(&self) -> Vec<Agent> {
        let ticket = self.agents.begin();
        let agents = passive_list("agents", self.api.list_agents().await);
        self.agents.store(ticket, agents).await;
        self.agents.current().await
    }

    /// Validate locally and create. Nothing is sent when validation fails.
    #[instrument(skip_all)]
    pub async fn submit(&self, form: &LeadForm) -> Result<Lead, Notice> {
        let lead = form.validate()?;
        let created = self
            .api
            .create_lead(&lead)
            .await
            .map_err(|err| action_failed("create lead", err))?;
        info!(id = %created.id, "lead created");
        Ok(created)
    }
}
