use tracing::{info, instrument};

use super::{action_failed, passive_list, Notice};
use crate::api::LeadsApi;
use crate::forms::AgentForm;
use crate::model::Agent;
use crate::session::ViewSlot;

/// Sales agent management.
///
/// After every write the list is fetched again, so an agent the service
/// refused to delete stays on screen.
pub struct AgentsPage<'a> {
    api: &'a dyn LeadsApi,
    current: ViewSlot<Vec<Agent>>,
}

impl<'a> AgentsPage<'a> {
    pub fn new(api: &'a dyn LeadsApi) -> Self {
        Self {
            api,
            current: ViewSlot::new(Vec::new()),
        }
    }

    #[instrument(skip_all)]
    pub async fn load(&self) -> Vec<Agent> {
        let ticket = self.current.begin();
        let agents = passive_list("agents", self.api.list_agents().await);
        self.current.store(ticket, agents).await;
        self.current.current().await
    }

    pub async fn agents(&self) -> Vec<Agent> {
        self.current.current().await
    }

    #[instrument(skip_all)]
    pub async fn create(&self, form: &AgentForm) -> Result<Agent, Notice> {
        let agent = form.validate()?;
        let created = self
            .api
            .create_agent(&agent)
            .await
            .map_err(|err| action_failed("create agent", err))?;
        info!(id = %created.id, "agent created");
        self.load().await;
        Ok(created)
    }

    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: &str) -> Result<(), Notice> {
        let res = self.api.delete_agent(id).await;
        self.load().await;
        res.map_err(|err| action_failed("delete agent", err))?;
        info!(id, "agent deleted");
        Ok(())
    }
}
