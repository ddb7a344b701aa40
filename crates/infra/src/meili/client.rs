use async_trait::async_trait;
use meilisync_core::{DocumentWriter, TaskStatusClient};
use meilisync_domain::{
    ClientConfig, EnqueuedTask, Result, TaskError, TaskPage, TaskQuery, TaskRecord, TaskUid,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::conversions::error_from_response;
use crate::errors::map_reqwest_error;
use crate::http::{HttpClient, HttpClientBuilder};

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_available(&self) -> bool {
        self.status == "available"
    }
}

/// Client for the task and document endpoints of a MeiliSearch instance.
#[derive(Clone)]
pub struct MeiliClient {
    http: HttpClient,
    host: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for MeiliClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeiliClient")
            .field("host", &self.host)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl MeiliClient {
    /// Builds a client with retry and timeout settings from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = HttpClientBuilder::from_config(config)
            .user_agent(concat!("meilisync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(config.host.clone(), config.api_key.clone(), http))
    }

    pub fn with_http(host: impl Into<String>, api_key: Option<String>, http: HttpClient) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        let api_key = api_key.filter(|key| !key.is_empty());
        Self { http, host, api_key }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `GET /health`
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus> {
        self.execute(self.request(Method::GET, "/health")).await
    }

    /// Cancels enqueued or processing tasks matching `query`.
    ///
    /// Returns the handle of the cancelation task itself. `limit` and `from`
    /// are ignored; at least one filter is required.
    #[instrument(skip(self))]
    pub async fn cancel_tasks(&self, query: &TaskQuery) -> Result<EnqueuedTask> {
        let filters = task_filters(query, "cancel")?;
        let response: Value =
            self.execute(self.request(Method::POST, "/tasks/cancel").query(&filters)).await?;
        EnqueuedTask::from_response(response)
    }

    /// Deletes finished tasks matching `query` from the task history.
    #[instrument(skip(self))]
    pub async fn delete_tasks(&self, query: &TaskQuery) -> Result<EnqueuedTask> {
        let filters = task_filters(query, "delete")?;
        let response: Value =
            self.execute(self.request(Method::DELETE, "/tasks").query(&filters)).await?;
        EnqueuedTask::from_response(response)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.host, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.http.send(builder).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, "request rejected");
            return Err(error_from_response(status, &body));
        }

        let bytes = response.bytes().await.map_err(|err| map_reqwest_error(err, self.http.timeout()))?;
        serde_json::from_slice(&bytes).map_err(TaskError::from)
    }

    async fn write_documents(
        &self,
        method: Method,
        index_uid: &str,
        documents: Vec<Value>,
        primary_key: Option<&str>,
    ) -> Result<EnqueuedTask> {
        validate_index_uid(index_uid)?;
        let mut builder = self.request(method, &format!("/indexes/{index_uid}/documents"));
        if let Some(primary_key) = primary_key {
            builder = builder.query(&[("primaryKey", primary_key)]);
        }

        let response: Value = self.execute(builder.json(&documents)).await?;
        EnqueuedTask::from_response(response)
    }
}

#[async_trait]
impl TaskStatusClient for MeiliClient {
    async fn get_task(&self, uid: TaskUid) -> Result<TaskRecord> {
        self.execute(self.request(Method::GET, &format!("/tasks/{uid}"))).await
    }

    async fn get_tasks(&self, query: &TaskQuery) -> Result<TaskPage> {
        self.execute(self.request(Method::GET, "/tasks").query(&query.to_query_pairs())).await
    }
}

#[async_trait]
impl DocumentWriter for MeiliClient {
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    async fn add_documents(
        &self,
        index_uid: &str,
        documents: Vec<Value>,
        primary_key: Option<&str>,
    ) -> Result<EnqueuedTask> {
        self.write_documents(Method::POST, index_uid, documents, primary_key).await
    }

    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    async fn update_documents(
        &self,
        index_uid: &str,
        documents: Vec<Value>,
        primary_key: Option<&str>,
    ) -> Result<EnqueuedTask> {
        self.write_documents(Method::PUT, index_uid, documents, primary_key).await
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn delete_documents(&self, index_uid: &str, ids: Vec<Value>) -> Result<EnqueuedTask> {
        validate_index_uid(index_uid)?;
        let builder = self
            .request(Method::POST, &format!("/indexes/{index_uid}/documents/delete-batch"))
            .json(&ids);
        let response: Value = self.execute(builder).await?;
        EnqueuedTask::from_response(response)
    }
}

/// Index uids are limited to ASCII alphanumerics, `-` and `_`.
fn validate_index_uid(index_uid: &str) -> Result<()> {
    let valid = !index_uid.is_empty()
        && index_uid.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(TaskError::validation(format!("invalid index uid `{index_uid}`")))
    }
}

/// Filter pairs for the bulk task endpoints, which reject pagination.
fn task_filters(query: &TaskQuery, action: &str) -> Result<Vec<(&'static str, String)>> {
    let filters: Vec<_> = query
        .to_query_pairs()
        .into_iter()
        .filter(|(key, _)| *key != "limit" && *key != "from")
        .collect();
    if filters.is_empty() {
        return Err(TaskError::validation(format!(
            "refusing to {action} tasks without at least one filter"
        )));
    }
    Ok(filters)
}
