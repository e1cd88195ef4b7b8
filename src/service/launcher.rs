use crate::error::{FoundryError, Result};
use reqwest::Url;
use std::path::PathBuf;
use tokio::process::Command;

const RUNNING_PHRASE: &str = "is running on ";

/// Drives the local runtime through its own CLI (`foundry service ...`)
#[derive(Debug, Clone)]
pub struct ServiceLauncher {
    program: PathBuf,
}

impl ServiceLauncher {
    /// Locate the runtime CLI on PATH
    pub fn new(program: &str) -> Result<Self> {
        let program = which::which(program).map_err(|e| {
            FoundryError::Service(format!(
                "'{program}' not found in PATH ({e}). Install Foundry Local and make sure its CLI is on PATH"
            ))
        })?;
        tracing::debug!("Using runtime CLI at {}", program.display());
        Ok(Self { program })
    }

    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Start the service and return the endpoint it reports
    pub async fn start(&self) -> Result<Url> {
        tracing::info!("Starting Foundry Local service");
        let output = self.invoke(&["service", "start"]).await?;
        if !output.success {
            return Err(FoundryError::Service(format!(
                "service start failed: {}",
                output.text.trim()
            )));
        }

        self.status().await?.ok_or_else(|| {
            FoundryError::Service("service started but status reported no endpoint".to_string())
        })
    }

    /// Endpoint of the running service, or `None` if it is not running
    pub async fn status(&self) -> Result<Option<Url>> {
        let output = self.invoke(&["service", "status"]).await?;
        let endpoint = parse_status_endpoint(&output.text);
        tracing::debug!("Service status endpoint: {endpoint:?}");
        Ok(endpoint)
    }

    pub async fn stop(&self) -> Result<()> {
        tracing::info!("Stopping Foundry Local service");
        let output = self.invoke(&["service", "stop"]).await?;
        if output.success {
            Ok(())
        } else {
            Err(FoundryError::Service(format!(
                "service stop failed: {}",
                output.text.trim()
            )))
        }
    }

    async fn invoke(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                FoundryError::Service(format!(
                    "failed to run {} {}: {e}",
                    self.program.display(),
                    args.join(" ")
                ))
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CommandOutput {
            success: output.status.success(),
            text,
        })
    }
}

struct CommandOutput {
    success: bool,
    text: String,
}

/// Extract the service base URL from `service status` output.
///
/// Looks for `is running on http://...`, takes the rest of that line and
/// drops any path so only scheme, host and port remain.
#[must_use]
pub fn parse_status_endpoint(output: &str) -> Option<Url> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once(RUNNING_PHRASE)?;
        let candidate = rest.trim();
        if !candidate.starts_with("http://") {
            return None;
        }
        let mut url = Url::parse(candidate).ok()?;
        url.set_path("");
        url.set_query(None);
        url.set_fragment(None);
        Some(url)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_endpoint() {
        let output = "🟢 Model management service is running on http://127.0.0.1:5273/openai/status\n";
        let url = parse_status_endpoint(output).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5273/");
        assert_eq!(url.port(), Some(5273));
    }

    #[test]
    fn test_parse_status_endpoint_multiline() {
        let output = "Checking service...\r\nService is running on http://localhost:61234  \r\nDone\n";
        let url = parse_status_endpoint(output).unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(61234));
    }

    #[test]
    fn test_parse_status_not_running() {
        assert!(parse_status_endpoint("🔴 Model management service is not running!").is_none());
        assert!(parse_status_endpoint("").is_none());
        assert!(parse_status_endpoint("is running on ftp://nope").is_none());
    }

    #[test]
    fn test_new_with_missing_program() {
        let err = ServiceLauncher::new("definitely-not-a-real-foundry-binary").unwrap_err();
        assert!(matches!(err, FoundryError::Service(_)));
        assert!(err.to_string().contains("not found in PATH"));
    }
}
