use super::remote::{RemoteClient, RemoteDocument, RemotePage};
use super::{ClientError, error_message, http_client};
use crate::config::RemoteConfig;
use crate::domain::{EntityKind, RemoteId};
use crate::registry::rest_base;
use crate::transcode::{RemotePayload, remote_id_of};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

const SERVICE: &str = "WordPress";

/// Error code WordPress answers with when a listing page is past the end.
const INVALID_PAGE: &str = "rest_post_invalid_page_number";

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// WordPress REST client for the Pods custom post types.
#[derive(Debug, Clone)]
pub struct WordPressClient {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl WordPressClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, ClientError> {
        let raw = config.base_url.trim();
        if raw.is_empty() {
            return Err(ClientError::NotConfigured {
                service: SERVICE,
                setting: "remote.base_url",
            });
        }

        let base_url = Url::parse(raw).map_err(|source| ClientError::Url {
            service: SERVICE,
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::invalid(
                SERVICE,
                format!("'{raw}' cannot be used as a REST root"),
            ));
        }

        let credentials = (!config.username.is_empty() && !config.application_password.is_empty())
            .then(|| Credentials {
                username: config.username.clone(),
                password: config.application_password.clone(),
            });
        if credentials.is_none() {
            warn!("No WordPress credentials configured, writes will be rejected");
        }

        Ok(Self {
            client: http_client(&config.user_agent, config.request_timeout_seconds),
            base_url,
            credentials,
        })
    }

    fn url(&self, kind: EntityKind, id: Option<RemoteId>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(rest_base(kind));
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        if self.credentials.is_some() {
            // Raw titles and every registered meta field are only returned in edit context.
            url.query_pairs_mut().append_pair("context", "edit");
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(c) => request.basic_auth(&c.username, Some(&c.password)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| ClientError::network(SERVICE, e))
    }

    async fn document(response: Response) -> Result<RemoteDocument, ClientError> {
        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::network(SERVICE, e))?;
        let id = remote_id_of(&body).map_err(|e| ClientError::invalid(SERVICE, e.to_string()))?;
        Ok(RemoteDocument { id, body })
    }

    async fn failure(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let (_, message) = error_message(response).await;
        ClientError::Status {
            service: SERVICE,
            status,
            message,
        }
    }
}

#[async_trait]
impl RemoteClient for WordPressClient {
    async fn get(
        &self,
        kind: EntityKind,
        id: RemoteId,
    ) -> Result<Option<RemoteDocument>, ClientError> {
        let url = self.url(kind, Some(id));
        debug!(%url, "Fetching remote {}", kind);

        let response = self.send(self.client.get(url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(None),
            status if status.is_success() => Self::document(response).await.map(Some),
            _ => Err(Self::failure(response).await),
        }
    }

    async fn create(
        &self,
        kind: EntityKind,
        payload: &RemotePayload,
    ) -> Result<RemoteDocument, ClientError> {
        let url = self.url(kind, None);
        debug!(%url, title = ?payload.title(), "Creating remote {}", kind);

        let response = self.send(self.client.post(url).json(payload)).await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        Self::document(response).await
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: RemoteId,
        payload: &RemotePayload,
    ) -> Result<RemoteDocument, ClientError> {
        let url = self.url(kind, Some(id));
        debug!(%url, "Updating remote {}", kind);

        let response = self.send(self.client.put(url).json(payload)).await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        Self::document(response).await
    }

    async fn list_page(
        &self,
        kind: EntityKind,
        page: u32,
        per_page: u32,
    ) -> Result<RemotePage, ClientError> {
        let mut url = self.url(kind, None);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());
        debug!(%url, "Listing remote {}", kind);

        let response = self.send(self.client.get(url)).await?;
        let status = response.status();

        if status == StatusCode::BAD_REQUEST {
            let (code, message) = error_message(response).await;
            if code.as_deref() == Some(INVALID_PAGE) {
                return Ok(RemotePage {
                    items: Vec::new(),
                    is_last_page: true,
                });
            }
            return Err(ClientError::Status {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            return Err(Self::failure(response).await);
        }

        let total_pages = response
            .headers()
            .get("X-WP-TotalPages")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok());

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::network(SERVICE, e))?;
        let Value::Array(items) = body else {
            return Err(ClientError::invalid(SERVICE, "listing is not an array"));
        };

        let is_last_page = total_pages.map_or_else(
            || items.len() < per_page as usize,
            |total| page >= total,
        );

        Ok(RemotePage {
            items,
            is_last_page,
        })
    }
}
