//! Search index scroll client with retry logic
//!
//! Lists every dataset ID in the index with the scroll API: one search opens
//! the scroll, follow-up requests page through it until a page comes back
//! empty, and the scroll context is then cleared.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::config::IndexClientConfig;
use crate::constants::index::{DATASET_ID_FIELD, SCROLL_KEEP_ALIVE};
use crate::constants::limits;
use crate::errors::{IndexError, IndexResult};

/// One page of a scroll response
#[derive(Debug, Clone, Deserialize)]
pub struct ScrollPage {
    #[serde(rename = "_scroll_id")]
    pub scroll_id: Option<String>,
    pub hits: ScrollHits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrollHits {
    #[serde(default)]
    pub hits: Vec<ScrollHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrollHit {
    #[serde(rename = "_source", default)]
    pub source: Option<HitSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitSource {
    pub dataset_id: Option<String>,
}

impl ScrollPage {
    /// Dataset IDs on this page; hits without one are ignored
    pub fn dataset_ids(&self) -> impl Iterator<Item = &str> {
        self.hits
            .hits
            .iter()
            .filter_map(|hit| hit.source.as_ref()?.dataset_id.as_deref())
    }

    /// Whether the scroll is exhausted
    pub fn is_empty(&self) -> bool {
        self.hits.hits.is_empty()
    }
}

/// Client listing the datasets present in the search index
#[derive(Debug)]
pub struct SearchIndexClient {
    client: Client,
    config: IndexClientConfig,
}

impl SearchIndexClient {
    /// Creates a client for the configured index
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Http` if the HTTP client cannot be built
    pub fn new(config: IndexClientConfig) -> IndexResult<Self> {
        let client = config.build_http_client()?;
        Ok(Self { client, config })
    }

    /// Collect the dataset ID of every dataset copy in the index
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if a request fails after retries or a response has
    /// an unexpected shape
    pub async fn dataset_ids(&self) -> IndexResult<BTreeSet<String>> {
        let search_url = self.config.search_url()?;
        let scroll_url = self.config.scroll_url()?;
        info!("Scrolling dataset copies from {}", search_url);

        let body = json!({
            "size": self.config.scroll_page_size,
            "_source": [DATASET_ID_FIELD],
            "query": { "match_all": {} },
        });
        let mut page = self
            .fetch_page(|| self.client.post(search_url.as_str()).json(&body))
            .await?;

        let mut dataset_ids = BTreeSet::new();
        let mut pages = 0usize;
        let mut last_scroll_id = None;

        loop {
            if page.is_empty() {
                break;
            }
            pages += 1;
            dataset_ids.extend(page.dataset_ids().map(str::to_string));
            debug!(
                "Scroll page {}: {} datasets so far",
                pages,
                dataset_ids.len()
            );

            let scroll_id =
                page.scroll_id
                    .take()
                    .ok_or_else(|| IndexError::UnexpectedResponse {
                        reason: "scroll response has hits but no _scroll_id".to_string(),
                    })?;
            let body = json!({ "scroll": SCROLL_KEEP_ALIVE, "scroll_id": scroll_id });
            page = self
                .fetch_page(|| self.client.post(scroll_url.as_str()).json(&body))
                .await?;
            last_scroll_id = Some(scroll_id);
        }

        if let Some(scroll_id) = page.scroll_id.or(last_scroll_id) {
            self.clear_scroll(&scroll_id).await;
        }

        info!(
            "Found {} indexed datasets across {} scroll pages",
            dataset_ids.len(),
            pages
        );
        Ok(dataset_ids)
    }

    async fn fetch_page<F>(&self, build: F) -> IndexResult<ScrollPage>
    where
        F: Fn() -> RequestBuilder,
    {
        let response = self.send_with_retry(build).await?;
        response
            .json::<ScrollPage>()
            .await
            .map_err(|e| IndexError::UnexpectedResponse {
                reason: e.to_string(),
            })
    }

    /// Sends a request, backing off on 429, 503 and transport errors
    async fn send_with_retry<F>(&self, build: F) -> IndexResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        if retries < limits::MAX_RETRIES {
                            retries += 1;
                            let delay = backoff_delay(retries);
                            warn!(
                                "Search index responded {}. Backing off for {}ms",
                                status,
                                delay.as_millis()
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        } else if status == StatusCode::TOO_MANY_REQUESTS {
                            return Err(IndexError::RateLimitExceeded);
                        } else {
                            return Err(IndexError::ServerOverloaded);
                        }
                    }

                    if !status.is_success() {
                        return Err(IndexError::ServerError {
                            status: status.as_u16(),
                        });
                    }

                    return Ok(response);
                }
                Err(e) if retries < limits::MAX_RETRIES => {
                    retries += 1;
                    let delay = backoff_delay(retries);
                    warn!(
                        "Search index request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        limits::MAX_RETRIES,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Search index request failed after {} retries: {}",
                        limits::MAX_RETRIES,
                        e
                    );
                    return Err(IndexError::MaxRetriesExceeded {
                        max_retries: limits::MAX_RETRIES,
                    });
                }
            }
        }
    }

    /// Release the scroll context, best effort
    async fn clear_scroll(&self, scroll_id: &str) {
        let url = match self.config.scroll_url() {
            Ok(url) => url,
            Err(e) => {
                debug!("Not clearing scroll: {}", e);
                return;
            }
        };

        let result = self
            .client
            .delete(url.as_str())
            .json(&json!({ "scroll_id": [scroll_id] }))
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => debug!("Cleared scroll context"),
            Ok(response) => debug!("Clearing scroll returned HTTP {}", response.status()),
            Err(e) => debug!("Clearing scroll failed: {}", e),
        }
    }
}

/// Exponential backoff delay for a retry attempt
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(limits::RETRY_BASE_DELAY_MS * 2_u64.pow(attempt))
}
