//! Search index client configuration and building logic

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::index;
use crate::errors::{IndexError, IndexResult};

/// Connection and query settings for the search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexClientConfig {
    /// Search index host
    pub host: String,
    /// Search index port
    pub port: u16,
    /// Index name, empty to search every index
    pub index: String,
    /// Document type holding one document per dataset copy
    pub doc_type: String,
    /// Documents per scroll page
    pub scroll_page_size: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for IndexClientConfig {
    fn default() -> Self {
        Self {
            host: index::DEFAULT_HOST.to_string(),
            port: index::DEFAULT_PORT,
            index: index::DEFAULT_INDEX.to_string(),
            doc_type: index::DATASET_COPY_DOC_TYPE.to_string(),
            scroll_page_size: index::SCROLL_PAGE_SIZE,
            request_timeout: index::REQUEST_TIMEOUT,
            connect_timeout: index::CONNECT_TIMEOUT,
        }
    }
}

impl IndexClientConfig {
    /// Config for a host and port with every other setting at its default
    pub fn for_host(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Base URL of the search index
    ///
    /// A host given with a scheme is used as is, otherwise `http` is assumed.
    pub fn base_url(&self) -> IndexResult<Url> {
        let raw = if self.host.contains("://") {
            self.host.clone()
        } else {
            format!("http://{}", self.host)
        };

        let mut url = Url::parse(&raw).map_err(|e| IndexError::InvalidUrl {
            url: raw.clone(),
            error: e.to_string(),
        })?;
        url.set_port(Some(self.port))
            .map_err(|_| IndexError::InvalidUrl {
                url: raw,
                error: "URL cannot carry a port".to_string(),
            })?;
        Ok(url)
    }

    /// URL opening a scroll over the dataset copy documents
    pub fn search_url(&self) -> IndexResult<Url> {
        let mut url = self.base_url()?;
        let path = if self.index.is_empty() {
            format!("/{}/_search", self.doc_type)
        } else {
            format!("/{}/{}/_search", self.index, self.doc_type)
        };
        url.set_path(&path);
        url.query_pairs_mut()
            .append_pair("scroll", index::SCROLL_KEEP_ALIVE);
        Ok(url)
    }

    /// URL continuing or clearing a scroll
    pub fn scroll_url(&self) -> IndexResult<Url> {
        let mut url = self.base_url()?;
        url.set_path("/_search/scroll");
        Ok(url)
    }

    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> IndexResult<Client> {
        Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(index::USER_AGENT)
            .build()
            .map_err(IndexError::Http)
    }
}
