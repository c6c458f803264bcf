//! HTTP client for the remote practice/count service and its auth endpoints.

use crate::models::{DailyEntry, LoginRequest, Practice, RegisterRequest, Session, UserAggregate};
use crate::sync::UnitRecorder;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("remote service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid remote url: {0}")]
    InvalidUrl(String),
}

/// Acknowledgement of an accepted write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
    session: Arc<RwLock<Option<Session>>>,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn clear_session(&self) {
        *self.session.write().await = None;
    }

    /// Logs in and keeps the issued token for subsequent calls.
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, RemoteError> {
        let response = self
            .send(self.client.post(self.url("/auth/login")).json(request))
            .await?;
        let session: Session = response.json().await?;
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Ack, RemoteError> {
        self.send(self.client.post(self.url("/auth/register")).json(request))
            .await?;
        Ok(Ack)
    }

    pub async fn list_practices(&self) -> Result<Vec<Practice>, RemoteError> {
        let response = self.send(self.client.get(self.url("/products/all"))).await?;
        Ok(response.json().await?)
    }

    /// Adds `count` taps directly, bypassing the mala accumulator.
    pub async fn add_count(&self, practice_id: &str, count: u64) -> Result<Ack, RemoteError> {
        let body = CountBody {
            product_id: practice_id,
            count: Some(count),
        };
        self.send(self.client.post(self.url("/products/count")).json(&body))
            .await?;
        Ok(Ack)
    }

    /// Credits one completed mala (108 taps) server-side.
    pub async fn record_mala(&self, practice_id: &str) -> Result<Ack, RemoteError> {
        let body = CountBody {
            product_id: practice_id,
            count: None,
        };
        self.send(self.client.post(self.url("/products/count/jap-tap")).json(&body))
            .await?;
        Ok(Ack)
    }

    pub async fn daily_counts(&self) -> Result<Vec<DailyEntry>, RemoteError> {
        let response = self.send(self.client.get(self.url("/products/daily"))).await?;
        Ok(response.json().await?)
    }

    pub async fn users_with_counts(&self) -> Result<Vec<UserAggregate>, RemoteError> {
        let response = self
            .send(self.client.get(self.url("/products/admin/users-with-counts")))
            .await?;
        let users: Vec<RemoteUser> = response.json().await?;
        Ok(users.into_iter().map(UserAggregate::from).collect())
    }

    pub async fn add_practice(&self, name: &str) -> Result<Ack, RemoteError> {
        self.send(
            self.client
                .post(self.url("/products/add"))
                .json(&serde_json::json!({ "name": name })),
        )
        .await?;
        Ok(Ack)
    }

    pub async fn delete_practice(&self, practice_id: &str) -> Result<Ack, RemoteError> {
        let url = segment_url(&self.url("/products"), practice_id)?;
        self.send(self.client.delete(url)).await?;
        Ok(Ack)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let request = match self.session.read().await.as_ref() {
            Some(session) => request.bearer_auth(&session.token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "remote response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message: rejection_message(&body, status.canonical_reason()),
        })
    }
}

impl UnitRecorder for HttpRemote {
    async fn record_unit(&self, practice_id: &str) -> Result<Ack, RemoteError> {
        self.record_mala(practice_id).await
    }
}

#[derive(Debug, Serialize)]
struct CountBody<'a> {
    #[serde(rename = "productId")]
    product_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    products: Vec<RemoteUserCount>,
    #[serde(rename = "totalUserCount", default)]
    total_user_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RemoteUserCount {
    #[serde(rename = "productId")]
    product_id: String,
    count: u64,
}

impl From<RemoteUser> for UserAggregate {
    fn from(user: RemoteUser) -> Self {
        let mut per_practice_counts = BTreeMap::new();
        for entry in user.products {
            let slot = per_practice_counts.entry(entry.product_id).or_insert(0u64);
            *slot = slot.saturating_add(entry.count);
        }

        let name = [user.name, user.email]
            .into_iter()
            .flatten()
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .unwrap_or_else(|| user.id.clone());

        let mut aggregate = UserAggregate {
            user_id: user.id,
            name,
            per_practice_counts,
            total_count: 0,
        };
        aggregate.total_count = user
            .total_user_count
            .unwrap_or_else(|| aggregate.counted_total());
        aggregate
    }
}

/// Appends `segment` to `base` as a single percent-encoded path segment.
fn segment_url(base: &str, segment: &str) -> Result<Url, RemoteError> {
    let mut url = Url::parse(base).map_err(|err| RemoteError::InvalidUrl(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| RemoteError::InvalidUrl(base.to_string()))?
        .push(segment);
    Ok(url)
}

fn rejection_message(body: &str, reason: Option<&str>) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    reason.unwrap_or("request failed").to_string()
}
