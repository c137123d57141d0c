pub mod omdb;
pub mod remote;
pub mod tmdb;
pub mod wordpress;

use thiserror::Error;

/// Failure talking to an external HTTP service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{service} is not configured: missing {setting}")]
    NotConfigured {
        service: &'static str,
        setting: &'static str,
    },

    #[error("{service} request failed: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} sent an unexpected response: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("invalid {service} url: {source}")]
    Url {
        service: &'static str,
        #[source]
        source: url::ParseError,
    },
}

impl ClientError {
    pub(crate) const fn network(service: &'static str, source: reqwest::Error) -> Self {
        Self::Network { service, source }
    }

    pub(crate) fn invalid(service: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn service(&self) -> &'static str {
        match self {
            Self::NotConfigured { service, .. }
            | Self::Network { service, .. }
            | Self::Status { service, .. }
            | Self::InvalidResponse { service, .. }
            | Self::Url { service, .. } => service,
        }
    }

    /// True for a missing credential or setting, as opposed to a transport failure.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }
}

/// Builds the shared reqwest client the way every service client here does.
pub(crate) fn http_client(user_agent: &str, timeout_seconds: u64) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().user_agent(user_agent.to_string());
    if timeout_seconds > 0 {
        builder = builder.timeout(std::time::Duration::from_secs(timeout_seconds));
    }
    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}

/// Reads an error body, preferring the `message` field WordPress and TMDB
/// both use for JSON errors.
pub(crate) async fn error_message(response: reqwest::Response) -> (Option<String>, String) {
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => {
            let code = json.get("code").and_then(|c| c.as_str()).map(String::from);
            let message = json
                .get("message")
                .or_else(|| json.get("status_message"))
                .and_then(|m| m.as_str())
                .map_or(body.clone(), String::from);
            (code, message)
        }
        Err(_) => (None, body),
    }
}
