//! HTTP client for the approval backend.

use super::{
    BackendError, EntityKind, Organisation, PendingItem, RecordUpdate, ReviewBackend,
    ReviewTarget, Specialist,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

/// Header carrying the shared bot secret
const BOT_TOKEN_HEADER: &str = "X-BOT-TOKEN";

/// Backend client authenticating with a static `X-BOT-TOKEN` header.
///
/// Uses the HTTP client's default timeouts and never retries.
#[derive(Clone)]
pub struct ApiClient {
    client: HttpClient,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Creates a client for `base_url`; trailing slashes are ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .header(BOT_TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Json(e.to_string()))
    }

    async fn try_fetch_pending(&self, kind: EntityKind) -> Result<Vec<PendingItem>, BackendError> {
        let endpoint = kind.pending_endpoint();
        let items = match kind {
            EntityKind::Org => self
                .get_json::<Vec<Organisation>>(endpoint)
                .await?
                .into_iter()
                .map(PendingItem::Organisation)
                .collect(),
            EntityKind::Spec => self
                .get_json::<Vec<Specialist>>(endpoint)
                .await?
                .into_iter()
                .map(PendingItem::Specialist)
                .collect(),
        };
        Ok(items)
    }
}

#[async_trait::async_trait]
impl ReviewBackend for ApiClient {
    async fn fetch_pending(&self, kind: EntityKind) -> Vec<PendingItem> {
        match self.try_fetch_pending(kind).await {
            Ok(items) => items,
            Err(e) => {
                warn!("⚠️ Failed fetch {}: {e}", kind.pending_endpoint());
                Vec::new()
            }
        }
    }

    async fn update_record(
        &self,
        target: ReviewTarget,
        update: &RecordUpdate,
    ) -> Result<(), BackendError> {
        let endpoint = target.kind.update_endpoint(target.id);
        let response = self
            .client
            .post(self.url(&endpoint))
            .header(BOT_TOKEN_HEADER, &self.token)
            .json(update)
            .send()
            .await
            .map_err(|e| {
                warn!("⚠️ update {endpoint} failed: {e}");
                BackendError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        info!("📡 update {endpoint}: {} -> {body}", status.as_u16());

        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(BackendError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
