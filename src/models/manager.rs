use crate::cancel::CancelToken;
use crate::config::schema::Config;
use crate::error::{FoundryError, Result};
use crate::models::catalog::{CatalogCache, Snapshot};
use crate::models::download::{
    single_event, spawn_decoder, DecodeSession, DownloadEvent, DownloadFailure, DownloadOptions,
    DownloadRequest,
};
use crate::models::resolver::Resolver;
use crate::models::variant::{DeviceType, ModelVariant};
use crate::models::version::{self, strip_version, UNVERSIONED};
use crate::service::{ServiceClient, ServiceLauncher};
use reqwest::Url;
use std::time::Duration;
use tokio::sync::mpsc;

/// Connection to a running service
#[derive(Debug)]
struct Connection {
    client: ServiceClient,
    /// Endpoint was given to us rather than obtained from the runtime CLI
    attached: bool,
}

/// Client-side controller for the Foundry Local runtime.
///
/// Owns the catalog cache and the HTTP connection, and sequences the model
/// lifecycle: start service, resolve, download if absent, load.
#[derive(Debug)]
pub struct Manager {
    config: Config,
    resolver: Resolver,
    catalog: CatalogCache,
    connection: Option<Connection>,
}

impl Manager {
    /// Create a manager with no service connection yet
    #[must_use]
    pub fn new(config: Config) -> Self {
        let resolver = Resolver::new(config.catalog.cpu_fallback);
        Self {
            config,
            resolver,
            catalog: CatalogCache::new(),
            connection: None,
        }
    }

    /// Attach to a service already listening at `endpoint`
    pub fn with_endpoint(config: Config, endpoint: &str) -> Result<Self> {
        let client = ServiceClient::parse(endpoint, config.service.request_timeout())?;
        let mut manager = Self::new(config);
        manager.connection = Some(Connection {
            client,
            attached: true,
        });
        Ok(manager)
    }

    /// Start the service and prepare a model: resolve, download if absent, load
    pub async fn start_model(config: Config, reference: &str) -> Result<Self> {
        let mut manager = Self::new(config);
        manager.start_service().await?;

        let variant = manager.resolve(reference, None).await.inspect_err(|e| {
            if e.is_not_found() {
                tracing::error!("Model not found in catalog: {reference}");
            }
        })?;

        manager
            .download_model(&variant.id, None, DownloadOptions::default(), CancelToken::new())
            .await?;
        manager.load_model(reference, None, None).await?;
        Ok(manager)
    }

    /// Make sure the service is running. Calling this again is a no-op.
    pub async fn start_service(&mut self) -> Result<()> {
        if let Some(conn) = &self.connection {
            tracing::info!("Foundry service already running at {}", conn.client.base_url());
            return Ok(());
        }

        let timeout = self.config.service.request_timeout();
        let connection = if let Some(endpoint) = &self.config.service.endpoint {
            tracing::info!("Using configured service endpoint {endpoint}");
            Connection {
                client: ServiceClient::parse(endpoint, timeout)?,
                attached: true,
            }
        } else {
            let launcher = ServiceLauncher::new(&self.config.service.program)?;
            let url = match launcher.status().await? {
                Some(url) => {
                    tracing::info!("Found running Foundry service at {url}");
                    url
                }
                None => launcher.start().await.inspect_err(|e| {
                    tracing::error!("Foundry service did not start: {e}");
                })?,
            };
            Connection {
                client: ServiceClient::new(url, timeout)?,
                attached: false,
            }
        };

        tracing::info!("Foundry service ready at {}", connection.client.base_url());
        self.connection = Some(connection);
        Ok(())
    }

    /// Stop the service if this manager started it. Calling this again is a no-op.
    ///
    /// A service we only attached to is left running; the connection is dropped.
    pub async fn stop_service(&mut self) -> Result<()> {
        let Some(conn) = self.connection.take() else {
            tracing::info!("Foundry service not running, nothing to stop");
            return Ok(());
        };

        if conn.attached {
            tracing::info!("Detached from Foundry service at {}", conn.client.base_url());
            return Ok(());
        }

        ServiceLauncher::new(&self.config.service.program)?
            .stop()
            .await?;
        tracing::info!("Foundry service stopped");
        Ok(())
    }

    #[must_use]
    pub const fn is_service_running(&self) -> bool {
        self.connection.is_some()
    }

    /// OpenAI-compatible endpoint of the running service
    pub fn endpoint(&self) -> Result<String> {
        Ok(self.client()?.openai_endpoint())
    }

    #[must_use]
    pub fn service_url(&self) -> Option<&Url> {
        self.connection.as_ref().map(|c| c.client.base_url())
    }

    /// Key handed to OpenAI-compatible clients of the local endpoint
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.config.service.api_key
    }

    fn client(&self) -> Result<&ServiceClient> {
        self.connection
            .as_ref()
            .map(|c| &c.client)
            .ok_or(FoundryError::ServiceNotRunning)
    }

    /// All catalog variants, fetched once and cached until refreshed
    pub async fn list_catalog(&self) -> Result<Snapshot> {
        self.catalog.get(self.client()?).await
    }

    /// Drop the cached catalog. The next lookup fetches it again.
    pub fn refresh_catalog(&self) {
        self.catalog.refresh();
    }

    /// Resolve a reference (id, unversioned id or alias) to one catalog variant
    pub async fn resolve(&self, reference: &str, device: Option<DeviceType>) -> Result<ModelVariant> {
        let snapshot = self.list_catalog().await?;
        self.resolver
            .resolve(&snapshot, reference, device)
            .cloned()
    }

    /// Catalog entries for the models in local storage
    pub async fn list_cached_models(&self) -> Result<Vec<ModelVariant>> {
        let ids = self.client()?.cached_model_ids().await?;
        self.resolve_ids(&ids).await
    }

    /// Catalog entries for the models currently loaded
    pub async fn list_loaded_models(&self) -> Result<Vec<ModelVariant>> {
        let ids = self.client()?.loaded_model_ids().await?;
        self.resolve_ids(&ids).await
    }

    async fn resolve_ids(&self, ids: &[String]) -> Result<Vec<ModelVariant>> {
        let snapshot = self.list_catalog().await?;
        let mut variants = Vec::with_capacity(ids.len());
        for id in ids {
            match self.resolver.resolve(&snapshot, id, None) {
                Ok(variant) => variants.push(variant.clone()),
                Err(e) if e.is_not_found() => {
                    tracing::debug!("Skipping {id}: not in catalog");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(variants)
    }

    async fn is_cached(&self, variant: &ModelVariant) -> Result<bool> {
        let ids = self.client()?.cached_model_ids().await?;
        Ok(ids.iter().any(|id| id.eq_ignore_ascii_case(&variant.id)))
    }

    /// Start downloading a model and return its event stream.
    ///
    /// Resolution and cache lookups fail here. Once the download call is
    /// attempted, every outcome arrives as events on the returned channel,
    /// ending in exactly one `Completed` or `Failed`.
    pub async fn start_download(
        &self,
        reference: &str,
        device: Option<DeviceType>,
        options: DownloadOptions,
        cancel: CancelToken,
    ) -> Result<mpsc::Receiver<DownloadEvent>> {
        let variant = self.resolve(reference, device).await?;
        let already_cached = self.is_cached(&variant).await?;

        if already_cached && !options.force {
            tracing::info!("Model {} ({}) already cached", variant.alias, variant.id);
            return Ok(single_event(DownloadEvent::Completed { variant }));
        }

        let token = options.token.or_else(|| self.config.download.token());
        let request = DownloadRequest::for_variant(&variant, token.as_deref());
        tracing::info!("Downloading model {} ({})", variant.alias, variant.id);

        let client = self.client()?;
        let stream = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(single_event(DownloadEvent::cancelled())),
            stream = client.download(&request) => stream,
        };

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Download request for {} failed: {e}", variant.id);
                return Ok(single_event(DownloadEvent::failed(
                    DownloadFailure::Transport,
                    e.to_string(),
                )));
            }
        };

        let session = DecodeSession {
            variant,
            already_cached,
            force: options.force,
        };
        Ok(spawn_decoder(stream, session, cancel))
    }

    /// Download a model and wait for the outcome
    pub async fn download_model(
        &self,
        reference: &str,
        device: Option<DeviceType>,
        options: DownloadOptions,
        cancel: CancelToken,
    ) -> Result<ModelVariant> {
        let mut events = self.start_download(reference, device, options, cancel).await?;

        while let Some(event) = events.recv().await {
            match event {
                DownloadEvent::Progress { percentage } => {
                    tracing::debug!("Download progress {percentage:.2}%");
                }
                DownloadEvent::Completed { variant } => {
                    tracing::info!("Model {} downloaded", variant.id);
                    return Ok(variant);
                }
                DownloadEvent::Failed { kind, message } => {
                    return Err(match kind {
                        DownloadFailure::Cancelled => FoundryError::Cancelled,
                        DownloadFailure::Remote => FoundryError::RemoteFailure(message),
                        DownloadFailure::Transport | DownloadFailure::Decode => {
                            FoundryError::Download(message)
                        }
                    });
                }
            }
        }

        Err(FoundryError::Download(
            "download ended without a terminal event".to_string(),
        ))
    }

    /// Load a cached model for inference. `ttl` defaults to the configured value.
    pub async fn load_model(
        &self,
        reference: &str,
        device: Option<DeviceType>,
        ttl: Option<Duration>,
    ) -> Result<ModelVariant> {
        let variant = self.resolve(reference, device).await?;
        if !self.is_cached(&variant).await? {
            return Err(FoundryError::NotCached(reference.to_string()));
        }

        let ttl = ttl.unwrap_or_else(|| self.config.load.ttl());
        tracing::info!(
            "Loading model {} ({}) ttl={}s ep={:?}",
            variant.alias,
            variant.id,
            ttl.as_secs(),
            variant.ep_override
        );
        self.client()?
            .load(&variant.id, ttl, variant.ep_override.as_deref())
            .await?;
        Ok(variant)
    }

    /// Unload a model, even if it is serving requests
    pub async fn unload_model(&self, reference: &str, device: Option<DeviceType>) -> Result<ModelVariant> {
        let variant = self.resolve(reference, device).await?;
        tracing::info!("Unloading model {} ({})", variant.alias, variant.id);
        self.client()?.unload(&variant.id).await?;
        Ok(variant)
    }

    /// Newest catalog variant for a reference.
    ///
    /// A versioned id present in the catalog is returned as is. Otherwise the
    /// version is dropped and the base resolved, so `name:1` yields the
    /// highest `name:N`.
    pub async fn latest_model_info(&self, reference: &str) -> Result<ModelVariant> {
        if reference.is_empty() {
            return Err(FoundryError::InvalidReference(
                "model reference cannot be empty".to_string(),
            ));
        }

        let snapshot = self.list_catalog().await?;
        if version::has_version(reference) {
            if let Some(exact) = snapshot.iter().find(|v| v.id.eq_ignore_ascii_case(reference)) {
                return Ok(exact.clone());
            }
        }

        self.resolver
            .resolve(&snapshot, strip_version(reference), None)
            .cloned()
    }

    /// True when the catalog has a newer versioned variant than local storage
    pub async fn is_model_upgradable(&self, reference: &str) -> Result<bool> {
        let latest = match self.latest_model_info(reference).await {
            Ok(latest) => latest,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };

        if latest.version_number() == UNVERSIONED {
            tracing::debug!("{} carries no version, nothing to upgrade", latest.id);
            return Ok(false);
        }

        Ok(!self.is_cached(&latest).await?)
    }

    /// Download the newest variant of a model.
    ///
    /// Lookup errors pass through unchanged; a failed download is wrapped in
    /// [`FoundryError::UpgradeFailed`].
    pub async fn upgrade_model(&self, reference: &str, token: Option<&str>) -> Result<ModelVariant> {
        let latest = self.latest_model_info(reference).await?;

        let mut options = DownloadOptions::default();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            options = options.with_token(token);
        }
        self.download_model(&latest.id, None, options, CancelToken::new())
            .await
            .map_err(|e| FoundryError::UpgradeFailed(Box::new(e)))
    }

    /// Directory where the service keeps downloaded models
    pub async fn cache_location(&self) -> Result<String> {
        self.client()?.cache_location().await
    }
}
