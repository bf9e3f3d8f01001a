use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::model::{Agent, Comment, Lead};

pub mod model;

use self::model::{
    DataEnvelope, ErrorBody, LeadPatch, LeadQuery, NewAgent, NewComment, NewLead, PipelineReport,
};

pub const DEFAULT_API_BASE: &str = "http://localhost:7777/";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to reach leads service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("leads service returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("unexpected response from leads service: {0}")]
    Decode(String),
    #[error("invalid leads service URL: {0}")]
    Url(String),
}

impl ApiError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations offered by the remote leads service.
#[async_trait]
pub trait LeadsApi: Send + Sync {
    async fn list_leads(&self, query: &LeadQuery) -> ApiResult<Vec<Lead>>;

    async fn get_lead(&self, id: &str) -> ApiResult<Lead>;

    async fn create_lead(&self, lead: &NewLead) -> ApiResult<Lead>;

    async fn update_lead(&self, id: &str, patch: &LeadPatch) -> ApiResult<Lead>;

    async fn delete_lead(&self, id: &str) -> ApiResult<()>;

    async fn list_comments(&self, lead_id: &str) -> ApiResult<Vec<Comment>>;

    async fn add_comment(&self, lead_id: &str, comment: &NewComment) -> ApiResult<()>;

    async fn list_agents(&self) -> ApiResult<Vec<Agent>>;

    async fn create_agent(&self, agent: &NewAgent) -> ApiResult<Agent>;

    async fn delete_agent(&self, id: &str) -> ApiResult<()>;

    async fn pipeline_report(&self) -> ApiResult<PipelineReport>;
}

#[derive(Clone)]
pub struct LeadsClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for LeadsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeadsClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl LeadsClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("lead-desk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(http, base_url)
    }

    pub fn from_config(cfg: &Config) -> ApiResult<Self> {
        let http = Client::builder()
            .user_agent(cfg.api.user_agent.as_str())
            .timeout(Duration::from_secs(cfg.api.timeout_secs))
            .build()?;
        Self::with_client(http, &cfg.api.base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> ApiResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::Url(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Url(format!("{base_url} cannot be a base URL")));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded,
    /// so identifiers can never escape their position in the path.
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    async fn execute(&self, builder: RequestBuilder) -> ApiResult<String> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending request");

        let res = self.http.execute(request).await.map_err(|err| {
            warn!(%method, %url, ?err, "leads service unreachable");
            ApiError::Transport(err)
        })?;

        let status = res.status();
        let body = res.text().await?;
        debug!(%method, %url, %status, bytes = body.len(), "received response");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    } else {
                        body.clone()
                    }
                });
            warn!(%method, %url, %status, %message, "leads service error");
            return Err(ApiError::Status { status, message });
        }
        Ok(body)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let body = self.execute(builder).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_list<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<Vec<T>> {
        let envelope: DataEnvelope<Vec<T>> = self.fetch_json(builder).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn fetch_one<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let envelope: DataEnvelope<T> = self.fetch_json(builder).await?;
        envelope
            .data
            .ok_or_else(|| ApiError::Decode("response is missing `data`".into()))
    }

    fn json_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> RequestBuilder {
        self.request(method, url).json(body)
    }
}

#[async_trait]
impl LeadsApi for LeadsClient {
    #[instrument(skip_all)]
    async fn list_leads(&self, query: &LeadQuery) -> ApiResult<Vec<Lead>> {
        let mut url = self.endpoint(&["leads"])?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        self.fetch_list(self.request(Method::GET, url)).await
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn get_lead(&self, id: &str) -> ApiResult<Lead> {
        let url = self.endpoint(&["leads", "leadId", id])?;
        self.fetch_one(self.request(Method::GET, url)).await
    }

    #[instrument(skip_all)]
    async fn create_lead(&self, lead: &NewLead) -> ApiResult<Lead> {
        let url = self.endpoint(&["leads"])?;
        self.fetch_one(self.json_request(Method::POST, url, lead))
            .await
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn update_lead(&self, id: &str, patch: &LeadPatch) -> ApiResult<Lead> {
        let url = self.endpoint(&["leads", id])?;
        self.fetch_one(self.json_request(Method::PUT, url, patch))
            .await
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn delete_lead(&self, id: &str) -> ApiResult<()> {
        let url = self.endpoint(&["leads", id])?;
        self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(lead_id = %lead_id))]
    async fn list_comments(&self, lead_id: &str) -> ApiResult<Vec<Comment>> {
        let url = self.endpoint(&["leads", "comments", lead_id])?;
        self.fetch_list(self.request(Method::GET, url)).await
    }

    #[instrument(skip_all, fields(lead_id = %lead_id))]
    async fn add_comment(&self, lead_id: &str, comment: &NewComment) -> ApiResult<()> {
        let url = self.endpoint(&["leads", "comments", lead_id])?;
        self.execute(self.json_request(Method::POST, url, comment))
            .await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn list_agents(&self) -> ApiResult<Vec<Agent>> {
        let url = self.endpoint(&["agents"])?;
        self.fetch_list(self.request(Method::GET, url)).await
    }

    #[instrument(skip_all)]
    async fn create_agent(&self, agent: &NewAgent) -> ApiResult<Agent> {
        let url = self.endpoint(&["agents"])?;
        self.fetch_one(self.json_request(Method::POST, url, agent))
            .await
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn delete_agent(&self, id: &str) -> ApiResult<()> {
        let url = self.endpoint(&["agents", id])?;
        self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn pipeline_report(&self) -> ApiResult<PipelineReport> {
        let url = self.endpoint(&["report", "pipeline"])?;
        self.fetch_json(self.request(Method::GET, url)).await
    }
}
