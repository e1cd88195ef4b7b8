use crate::error::{FoundryError, Result};
use crate::models::catalog::CatalogSource;
use crate::models::download::DownloadRequest;
use crate::models::variant::ModelVariant;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Raw download body, chunk by chunk
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "modelDirPath", default)]
    model_dir_path: String,
}

/// HTTP client for the local service's management endpoints
#[derive(Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
    base: Url,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("client", &"Client { ... }")
            .field("base", &self.base.as_str())
            .finish()
    }
}

impl ServiceClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(FoundryError::Service(format!(
                "invalid service endpoint '{base}'"
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// Parse `base` and build a client for it
    pub fn parse(base: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(base).map_err(|e| {
            FoundryError::Service(format!("invalid service endpoint '{base}': {e}"))
        })?;
        Self::new(url, timeout)
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// OpenAI-compatible API root, `<base>/v1`
    #[must_use]
    pub fn openai_endpoint(&self) -> String {
        format!("{}/v1", self.base.as_str().trim_end_matches('/'))
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| FoundryError::Service(format!("invalid service endpoint '{}'", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Response> {
        tracing::debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        ensure_success(response)
    }

    /// GET a JSON body, reading `null` as the type's default
    async fn get_json<T>(&self, segments: &[&str]) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let response = self.get(self.url(segments)?).await?;
        let body = response.bytes().await?;
        let value: Option<T> = serde_json::from_slice(&body)?;
        Ok(value.unwrap_or_default())
    }

    pub async fn list_catalog(&self) -> Result<Vec<ModelVariant>> {
        self.get_json(&["foundry", "list"]).await
    }

    /// Ids of the models present in local storage
    pub async fn cached_model_ids(&self) -> Result<Vec<String>> {
        self.get_json(&["openai", "models"]).await
    }

    /// Ids of the models currently loaded for inference
    pub async fn loaded_model_ids(&self) -> Result<Vec<String>> {
        self.get_json(&["openai", "loadedmodels"]).await
    }

    /// Directory where the service stores downloaded models
    pub async fn cache_location(&self) -> Result<String> {
        let status: Option<StatusResponse> = self.get_json(&["openai", "status"]).await?;
        status
            .map(|s| s.model_dir_path)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                FoundryError::Service("service status did not report a model directory".to_string())
            })
    }

    /// Start a download and hand back the raw response body
    pub async fn download(&self, request: &DownloadRequest) -> Result<ByteStream> {
        let url = self.url(&["openai", "download"])?;
        tracing::debug!("POST {url} for {}", request.model.name);
        let response = self.client.post(url).json(request).send().await?;
        let response = ensure_success(response)?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(FoundryError::from))
            .boxed())
    }

    pub async fn load(&self, id: &str, ttl: Duration, ep: Option<&str>) -> Result<()> {
        let mut url = self.url(&["openai", "load", id])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ttl", &ttl.as_secs().to_string());
            if let Some(ep) = ep {
                query.append_pair("ep", ep);
            }
        }
        self.get(url).await.map(drop)
    }

    /// Unload a model, even if requests are in flight
    pub async fn unload(&self, id: &str) -> Result<()> {
        let mut url = self.url(&["openai", "unload", id])?;
        url.query_pairs_mut().append_pair("force", "true");
        self.get(url).await.map(drop)
    }
}

#[async_trait]
impl CatalogSource for ServiceClient {
    async fn fetch_catalog(&self) -> Result<Vec<ModelVariant>> {
        self.list_catalog().await
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::debug!("{} returned {status}", response.url());
        Err(FoundryError::Status(status.as_u16()))
    }
}
