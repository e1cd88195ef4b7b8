use thiserror::Error;

/// Main error type for foundry-local
#[derive(Error, Debug)]
pub enum FoundryError {
    #[error("Model not found in catalog: {reference}{}", suggestion_hint(.suggestion))]
    NotFound {
        reference: String,
        suggestion: Option<String>,
    },

    #[error("Model {0} not found in local models, download first:\n  foundry-local download {0}")]
    NotCached(String),

    #[error("Invalid model reference: {0}")]
    InvalidReference(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("received non-success status code {0}")]
    Status(u16),

    #[error("Invalid JSON from service: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("failed to download model: {0}")]
    RemoteFailure(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("failed to upgrade model: {0}")]
    UpgradeFailed(Box<FoundryError>),

    #[error("Foundry service is not running\n\nTroubleshooting:\n- Start it with: foundry-local service start\n- Or set [service] endpoint in config")]
    ServiceNotRunning,

    #[error("Service error: {0}\n\nTroubleshooting:\n- Is the foundry CLI installed and in PATH?\n- Check status with: foundry service status\n- Run with RUST_LOG=debug for more details")]
    Service(String),

    #[error("Config error: {0}\n\nTroubleshooting:\n- Check config file: ~/.config/foundry-local/config.toml\n- Run with RUST_LOG=debug for more details")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FoundryError {
    /// Build a not-found error without a suggestion
    #[must_use]
    pub fn not_found(reference: &str) -> Self {
        Self::NotFound {
            reference: reference.to_string(),
            suggestion: None,
        }
    }

    /// True for failures reported by the network layer or a non-2xx status
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status(_))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, FoundryError>;
