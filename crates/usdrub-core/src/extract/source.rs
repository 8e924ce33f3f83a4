use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use tracing::debug;

use crate::{domain::Region, errors::Error, Result};

/// Browser-like agent; the listing serves a stripped page to unknown clients.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// Where raw branch listing documents come from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_document(&self, region: &Region) -> Result<String>;
}

/// GET against a URL template containing a `{region}` placeholder.
#[derive(Clone, Debug)]
pub struct HttpDocumentSource {
    http: reqwest::Client,
    url_template: String,
}

impl HttpDocumentSource {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            url_template: url_template.into(),
        })
    }

    pub fn url_for(&self, region: &Region) -> String {
        self.url_template.replace("{region}", region.as_str())
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn fetch_document(&self, region: &Region) -> Result<String> {
        let url = self.url_for(region);
        debug!(%url, "fetching branch listing");

        let res = self.http.get(&url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = res.text().await?;
        debug!(bytes = body.len(), "branch listing received");
        Ok(body)
    }
}

/// Reads a saved listing from disk. `{region}` in the path is substituted.
#[derive(Clone, Debug)]
pub struct FileDocumentSource {
    path: String,
}

impl FileDocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into().to_string_lossy().into_owned(),
        }
    }

    pub fn path_for(&self, region: &Region) -> PathBuf {
        PathBuf::from(self.path.replace("{region}", region.as_str()))
    }
}

#[async_trait]
impl DocumentSource for FileDocumentSource {
    async fn fetch_document(&self, region: &Region) -> Result<String> {
        let path = self.path_for(region);
        debug!(path = %path.display(), "reading branch listing");
        Ok(tokio::fs::read_to_string(&path).await?)
    }
}
