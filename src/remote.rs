//! [`RemoteService`] implementations.
//!
//! - [`HttpRemote`] talks to the content backend over JSON/HTTP.
//! - [`OfflineRemote`] is used when no `[remote]` section is configured:
//!   saves are local-only and title suggestions come from templates.
//!
//! The backend wraps replies in `{ "code": 0, "message": "...", "data": ... }`;
//! a non-zero `code` is a business error even on HTTP 200.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use inkpad_core::remote::{RemoteService, SavePayload, TitleAnalysis};
use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, RemoteConfig};

/// Standard response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self, what: &str) -> Result<T> {
        if self.code != 0 {
            bail!("{} failed (code {}): {}", what, self.code, self.message);
        }
        match self.data {
            Some(data) => Ok(data),
            None => bail!("{} failed: response has no data", what),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedTitles {
    #[serde(default)]
    titles: Vec<GeneratedTitle>,
}

#[derive(Debug, Deserialize)]
struct GeneratedTitle {
    title: String,
}

pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
        what: &str,
    ) -> Result<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("{} failed: HTTP {}: {}", what, status, body_text);
        }
        let envelope: Envelope<T> = response.json().await?;
        envelope.into_data(what)
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    async fn save_document(&self, payload: &SavePayload) -> Result<()> {
        let response = self
            .client
            .post(self.url("/creation"))
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("save failed: HTTP {}: {}", status, body_text);
        }
        debug!(external_ref = ?payload.external_ref, "document saved remotely");
        Ok(())
    }

    async fn generate_titles(&self, topic: &str, count: usize) -> Result<Vec<String>> {
        let body = serde_json::json!({ "article": topic, "count": count });
        let generated: GeneratedTitles = self.post("/generate/titles", &body, "title generation").await?;
        Ok(generated
            .titles
            .into_iter()
            .map(|t| t.title)
            .filter(|t| !t.trim().is_empty())
            .take(count)
            .collect())
    }

    async fn analyze_title(&self, title: &str) -> Result<TitleAnalysis> {
        let body = serde_json::json!({ "title": title });
        let mut analysis: TitleAnalysis = self.post("/titles/analyze", &body, "title analysis").await?;
        if analysis.title.is_empty() {
            analysis.title = title.to_string();
        }
        Ok(analysis)
    }
}

const TITLE_TEMPLATES: [&str; 12] = [
    "{}: the truth is more complicated than you think",
    "3 key questions behind {}",
    "About {}: 99% of people get it wrong",
    "{}: an overlooked transformation",
    "Deep dive: the full story of {}",
    "{} sparks debate, and here is what experts say",
    "{}: opportunity or trap?",
    "Inside {}: what you were never told",
    "{}: this time it really is different",
    "Why did {} take over the internet?",
    "{}: a carefully staged illusion?",
    "The truth about {} can no longer be hidden",
];

/// Remote stand-in for offline use.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteService for OfflineRemote {
    async fn save_document(&self, payload: &SavePayload) -> Result<()> {
        debug!(external_ref = ?payload.external_ref, "offline: remote save skipped");
        Ok(())
    }

    async fn generate_titles(&self, topic: &str, count: usize) -> Result<Vec<String>> {
        let topic = topic.trim();
        if topic.is_empty() {
            bail!("topic must not be empty");
        }
        Ok(TITLE_TEMPLATES
            .iter()
            .take(count)
            .map(|t| t.replacen("{}", topic, 1))
            .collect())
    }

    async fn analyze_title(&self, _title: &str) -> Result<TitleAnalysis> {
        bail!("title analysis needs a [remote] backend; add one to the config")
    }
}

/// The remote configured in `[remote]`, or [`OfflineRemote`].
pub fn from_config(config: &Config) -> Result<Box<dyn RemoteService>> {
    match &config.remote {
        Some(remote) => Ok(Box::new(HttpRemote::new(remote)?)),
        None => Ok(Box::new(OfflineRemote)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_titles_follow_templates() {
        let titles = OfflineRemote.generate_titles(" AI agents ", 3).await.unwrap();
        assert_eq!(titles.len(), 3);
        assert_eq!(titles[0], "AI agents: the truth is more complicated than you think");
        assert_eq!(titles[1], "3 key questions behind AI agents");
    }

    #[tokio::test]
    async fn offline_count_is_capped_by_templates() {
        let titles = OfflineRemote.generate_titles("x", 100).await.unwrap();
        assert_eq!(titles.len(), TITLE_TEMPLATES.len());
        assert!(OfflineRemote.generate_titles("  ", 3).await.is_err());
    }

    #[tokio::test]
    async fn offline_analysis_is_unavailable() {
        assert!(OfflineRemote.analyze_title("x").await.is_err());
    }

    #[test]
    fn envelope_rejects_business_errors() {
        let env: Envelope<GeneratedTitles> =
            serde_json::from_str(r#"{"code":1,"message":"quota","data":null}"#).unwrap();
        let err = env.into_data("title generation").unwrap_err();
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let remote = HttpRemote::new(&RemoteConfig {
            base_url: "http://localhost:3001/".into(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(remote.url("/creation"), "http://localhost:3001/api/creation");
    }
}
