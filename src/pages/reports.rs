use tracing::{instrument, warn};

use super::{passive, passive_list};
use crate::api::model::LeadQuery;
use crate::api::LeadsApi;
use crate::session::ViewSlot;
use crate::view::{agent_counts, status_counts, AgentCount, PipelineSplit, StatusCounts, ViewError};

/// Figures behind the report charts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub total: usize,
    /// `None` when the pipeline count could not be fetched.
    pub pipeline: Option<Result<PipelineSplit, ViewError>>,
    pub status_counts: StatusCounts,
    pub agent_counts: Vec<AgentCount>,
}

pub struct ReportsPage<'a> {
    api: &'a dyn LeadsApi,
    current: ViewSlot<Report>,
}

impl<'a> ReportsPage<'a> {
    pub fn new(api: &'a dyn LeadsApi) -> Self {
        Self {
            api,
            current: ViewSlot::new(Report::default()),
        }
    }

    #[instrument(skip_all)]
    pub async fn load(&self) -> Report {
        let ticket = self.current.begin();
        let all = LeadQuery::all();
        let (pipeline, leads) =
            futures::join!(self.api.pipeline_report(), self.api.list_leads(&all));
        // without the lead snapshot no figure can be trusted
        let Some(leads) = passive("leads", leads) else {
            self.current.store(ticket, Report::default()).await;
            return self.current.current().await;
        };
        let total = leads.len();

        let pipeline = passive("pipeline report", pipeline).map(|report| {
            let split = PipelineSplit::compute(report.total_leads_in_pipeline, total);
            if let Err(err) = &split {
                warn!(%err, "inconsistent pipeline report");
            }
            split
        });

        // counts need the agent list first
        let agents = passive_list("agents", self.api.list_agents().await);

        let next = Report {
            total,
            pipeline,
            status_counts: status_counts(&leads),
            agent_counts: agent_counts(&agents, &leads),
        };
        self.current.store(ticket, next).await;
        self.current.current().await
    }
}
