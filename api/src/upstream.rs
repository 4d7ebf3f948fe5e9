use std::time::Duration;

use agentdash_core::upstream::{UpstreamAction, UpstreamEnvelope};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned an undecodable body: {0}")]
    Decode(String),
}

/// Outcome of a credential check against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Accepted,
    /// Rejected. A non-2xx reply always carries a reason; a 2xx reply
    /// without a success envelope carries none.
    Rejected(Option<String>),
}

/// Client for the workflow-automation backend.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    fn action_url(&self, action: UpstreamAction) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("action", action.as_str());
        url
    }

    fn request(
        &self,
        action: UpstreamAction,
        authorization: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .post(self.action_url(action))
            .header("content-type", "application/json");
        if let Some(value) = authorization {
            req = req.header("authorization", value);
        }
        req
    }

    /// Run one backend action and decode its envelope.
    ///
    /// The HTTP status of the backend is ignored; the envelope's `status`
    /// field decides success.
    pub async fn call(
        &self,
        action: UpstreamAction,
        authorization: Option<&str>,
        body: Option<&serde_json::Value>,
    ) -> Result<UpstreamEnvelope, UpstreamError> {
        let mut req = self.request(action, authorization);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let envelope = resp.json::<UpstreamEnvelope>().await.map_err(|e| {
            UpstreamError::Decode(format!("{e} (HTTP {})", status.as_u16()))
        })?;

        tracing::debug!(
            action = action.as_str(),
            http_status = status.as_u16(),
            envelope_status = %envelope.status,
            "upstream call completed"
        );
        Ok(envelope)
    }

    /// Check `Authorization: Basic <token>` against the backend's `auth` action.
    pub async fn authenticate(&self, basic_token: &str) -> Result<AuthOutcome, UpstreamError> {
        let resp = self
            .request(UpstreamAction::Auth, Some(&format!("Basic {basic_token}")))
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            let text = text.trim();
            let reason = if text.is_empty() {
                "Invalid credentials"
            } else {
                text
            };
            return Ok(AuthOutcome::Rejected(Some(reason.to_string())));
        }

        let envelope = resp
            .json::<UpstreamEnvelope>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        if envelope.is_success() {
            Ok(AuthOutcome::Accepted)
        } else {
            Ok(AuthOutcome::Rejected(None))
        }
    }
}
