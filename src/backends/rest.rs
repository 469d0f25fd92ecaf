//! HTTP client for the hosted backend's REST interface.
//!
//! Rows live in PostgREST-style tables under `/rest/v1/<table>`; updates and
//! deletes address a row with an `id=eq.<id>` filter.

use crate::backends::traits::RemoteStore;
use crate::error::{Error, Result};
use crate::store::models::{MutationType, NewTimeEntry, OfflineQueueItem};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RestRemote {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestRemote {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("devlogify/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Request scoped to the single row whose id equals `id`
    fn row_request(&self, method: Method, table: &str, id: &str) -> RequestBuilder {
        self.request(method, &self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.api_key {
            Some(key) => builder
                .header("apikey", key)
                .bearer_auth(key),
            None => builder,
        }
    }

    /// Build the request a queue item replays as
    fn mutation_request(&self, item: &OfflineQueueItem) -> Result<RequestBuilder> {
        let table = item.entity.table();

        let builder = match item.mutation {
            MutationType::Create => self
                .request(Method::POST, &self.table_url(table))
                .header("Prefer", "return=minimal,resolution=ignore-duplicates")
                .json(&item.payload),
            MutationType::Update => {
                let id = target_id(item)?;
                self.row_request(Method::PATCH, table, &id)
                    .header("Prefer", "return=minimal")
                    .json(&item.payload)
            }
            MutationType::Delete => {
                let id = target_id(item)?;
                self.row_request(Method::DELETE, table, &id)
            }
        };

        Ok(builder.header("Idempotency-Key", &item.id))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<()> {
        let res = builder.send().await?;
        let status = res.status();

        if status.is_success() {
            return Ok(());
        }

        let body = res.text().await.unwrap_or_default();
        Err(Error::RemoteStatus {
            status: status.as_u16(),
            body,
        })
    }
}

fn target_id(item: &OfflineQueueItem) -> Result<String> {
    item.validate()?;
    item.target_id().ok_or_else(|| Error::InvalidMutation {
        message: format!("queue item {} has no target id", item.id),
    })
}

#[async_trait]
impl RemoteStore for RestRemote {
    async fn insert_time_entry(&self, entry: &NewTimeEntry) -> Result<()> {
        debug!(user = %entry.user_id, minutes = entry.duration_minutes, "Inserting time entry");

        let builder = self
            .request(Method::POST, &self.table_url("time_entries"))
            .header("Prefer", "return=minimal")
            .json(entry);

        self.send(builder).await
    }

    async fn apply(&self, item: &OfflineQueueItem) -> Result<()> {
        debug!(id = %item.id, mutation = %item.mutation, entity = %item.entity, "Applying mutation");
        let builder = self.mutation_request(item)?;
        self.send(builder).await
    }

    async fn ping(&self) -> Result<()> {
        let builder = self.request(Method::GET, &format!("{}/rest/v1/", self.base_url));
        let res = builder.send().await?;
        // Any HTTP answer means the backend is reachable
        if res.status().is_server_error() {
            return Err(Error::RemoteStatus {
                status: res.status().as_u16(),
                body: String::new(),
            });
        }
        Ok(())
    }
}
