use async_trait::async_trait;
use reqwest::{Client, header};
use scraper::Html;
use std::fmt::Debug;
use tracing::debug;

use crate::{
    config::Config,
    error::{Result, WeatherError},
};

/// Something that can return the HTML body behind a URL.
///
/// The crawler and the forecast lookup only depend on this, so tests can
/// serve canned pages instead of talking to the network.
#[async_trait]
pub trait PageSource: Send + Sync + Debug {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Plain HTTP GET with a browser `User-Agent`. No timeout, no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self::with_client(Client::new(), user_agent)
    }

    /// Use a preconfigured client, e.g. one with a proxy or timeout set.
    pub fn with_client(http: Client, user_agent: impl Into<String>) -> Self {
        Self {
            http,
            user_agent: user_agent.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.user_agent.clone())
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!(url, "fetching page");

        let res = self
            .http
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| WeatherError::network(url, e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| WeatherError::network(url, e))?;

        if !status.is_success() {
            return Err(WeatherError::network(
                url,
                format!("status {}: {}", status, truncate_body(&body)),
            ));
        }

        Ok(body)
    }
}

/// Fetch `url` and parse it into a queryable document.
///
/// The HTML parser is lenient, so any body yields a document; structural
/// problems surface later as [`WeatherError::Parse`] from the extractors.
pub async fn fetch_document(source: &dyn PageSource, url: &str) -> Result<Html> {
    let body = source.fetch_page(url).await?;
    Ok(Html::parse_document(&body))
}

/// Text of an element with newlines removed and surrounding spaces trimmed.
pub(crate) fn normalize_text(s: &str) -> String {
    s.replace('\n', "").trim_matches(' ').to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
