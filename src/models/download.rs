//! Download progress decoding
//!
//! The service answers a download request with a text stream: free-form log
//! lines, `Total 42.10% Downloading model.onnx.data` progress lines, a
//! completion marker, then a JSON object reporting the outcome:
//!
//! ```text
//! Total 0.00% Downloading model.onnx.data
//! Total 57.31% Downloading model.onnx.data
//! [DONE] All Completed!
//! {
//!   "success": true,
//!   "errorMessage": null
//! }
//! ```
//!
//! [`ProgressDecoder`] is the pure per-line state machine. [`spawn_decoder`]
//! drives it over a live byte stream and delivers [`DownloadEvent`]s on a
//! channel with room for one pending event, so a slow consumer holds the
//! reader back without losing events.

use crate::cancel::CancelToken;
use crate::models::variant::{ModelVariant, PromptTemplate};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tokio::sync::mpsc;

/// Pending events the producer may queue ahead of the consumer
pub const EVENT_CHANNEL_CAPACITY: usize = 1;

pub const NO_COMPLETION_MESSAGE: &str = "No completion response received";
pub const CANCELLED_MESSAGE: &str = "context cancelled";
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

const COMPLETION_MARKERS: [&str; 2] = ["[DONE]", "All Completed"];

/// Why a download session ended without completing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFailure {
    /// The request could not be made or the stream could not be read
    Transport,
    /// No completion object, or one that failed to parse
    Decode,
    /// The service reported `success: false`
    Remote,
    Cancelled,
}

/// One step of a download session. Exactly one `Completed` or `Failed` ends it.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Progress { percentage: f64 },
    Completed { variant: ModelVariant },
    Failed { kind: DownloadFailure, message: String },
}

impl DownloadEvent {
    pub fn failed(kind: DownloadFailure, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self::failed(DownloadFailure::Cancelled, CANCELLED_MESSAGE)
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        match self {
            Self::Progress { percentage } => *percentage,
            Self::Completed { .. } => 100.0,
            Self::Failed { .. } => 0.0,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Options for a single download call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Auth token for private models
    pub token: Option<String>,
    /// Download again even if the model is already cached
    pub force: bool,
}

impl DownloadOptions {
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub const fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Model subset sent to the download endpoint
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DownloadRequestModel {
    pub name: String,
    pub uri: String,
    pub provider_type: String,
    pub prompt_template: Option<PromptTemplate>,
}

/// Body of `POST /openai/download`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DownloadRequest {
    #[serde(rename = "Model")]
    pub model: DownloadRequestModel,
    pub token: String,
    #[serde(rename = "IgnorePipeReport")]
    pub ignore_pipe_report: bool,
}

impl DownloadRequest {
    #[must_use]
    pub fn for_variant(variant: &ModelVariant, token: Option<&str>) -> Self {
        Self {
            model: DownloadRequestModel {
                name: variant.id.clone(),
                uri: variant.uri.clone(),
                provider_type: format!("{}Local", variant.provider_type),
                prompt_template: variant.prompt_template.clone(),
            },
            token: token.unwrap_or_default().to_string(),
            ignore_pipe_report: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionObject {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
}

/// Parser state between lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Scanning,
    CollectingJson,
}

/// Result of feeding one line to the decoder
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineOutcome {
    Progress(f64),
    Ignored,
    /// The completion object is fully buffered; stop reading
    Complete,
}

/// Line-at-a-time decoder for the download text protocol
#[derive(Debug, Clone)]
pub struct ProgressDecoder {
    state: ParserState,
    buffer: String,
}

impl Default for ProgressDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ParserState::Scanning,
            buffer: String::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> ParserState {
        self.state
    }

    pub fn feed_line(&mut self, line: &str) -> LineOutcome {
        match self.state {
            ParserState::Scanning => {
                if is_progress_line(line) {
                    return parse_percentage(line).map_or(LineOutcome::Ignored, LineOutcome::Progress);
                }
                if COMPLETION_MARKERS.iter().any(|marker| line.contains(marker)) {
                    tracing::debug!("Completion marker seen, collecting JSON");
                    self.state = ParserState::CollectingJson;
                }
                LineOutcome::Ignored
            }
            ParserState::CollectingJson => {
                let trimmed = line.trim();
                if self.buffer.is_empty() && !trimmed.starts_with('{') {
                    return LineOutcome::Ignored;
                }
                self.buffer.push_str(line);
                self.buffer.push('\n');
                if trimmed == "}" {
                    LineOutcome::Complete
                } else {
                    LineOutcome::Ignored
                }
            }
        }
    }

    /// Terminal event for the text buffered so far
    #[must_use]
    pub fn finish(&self, variant: &ModelVariant) -> DownloadEvent {
        if self.buffer.is_empty() {
            return DownloadEvent::failed(DownloadFailure::Decode, NO_COMPLETION_MESSAGE);
        }

        match serde_json::from_str::<CompletionObject>(&self.buffer) {
            Ok(completion) if completion.success => DownloadEvent::Completed {
                variant: variant.clone(),
            },
            Ok(completion) => DownloadEvent::failed(
                DownloadFailure::Remote,
                completion
                    .error_message
                    .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            ),
            Err(e) => DownloadEvent::failed(DownloadFailure::Decode, e.to_string()),
        }
    }
}

fn is_progress_line(line: &str) -> bool {
    line.to_lowercase().starts_with("total") && line.contains("Downloading") && line.contains('%')
}

fn parse_percentage(line: &str) -> Option<f64> {
    line.split_whitespace()
        .find_map(|token| token.strip_suffix('%'))
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 100.0))
}

/// Decode a complete download transcript without I/O
#[must_use]
pub fn decode_text(text: &str, variant: &ModelVariant) -> Vec<DownloadEvent> {
    let mut decoder = ProgressDecoder::new();
    let mut events = Vec::new();

    for line in text.lines() {
        match decoder.feed_line(line) {
            LineOutcome::Progress(percentage) => events.push(DownloadEvent::Progress { percentage }),
            LineOutcome::Complete => break,
            LineOutcome::Ignored => {}
        }
    }

    events.push(decoder.finish(variant));
    events
}

/// Splits arbitrary byte chunks into text lines
#[derive(Debug, Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(Self::decode_line(&line[..line.len() - 1]));
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(Self::decode_line(&rest))
    }

    fn decode_line(bytes: &[u8]) -> String {
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Inputs of one decode session
#[derive(Debug, Clone)]
pub struct DecodeSession {
    /// Variant reported on completion
    pub variant: ModelVariant,
    /// The model is already in local storage
    pub already_cached: bool,
    /// Re-download even when cached
    pub force: bool,
}

/// Channel holding a single terminal event
#[must_use]
pub fn single_event(event: DownloadEvent) -> mpsc::Receiver<DownloadEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    // Fresh channel with free capacity, so this cannot fail
    let _ = tx.try_send(event);
    rx
}

/// Decode a download byte stream on its own task.
///
/// Returns the receiving end of the event channel. The channel closes right
/// after the terminal event. A cached model that is not being forced
/// completes immediately without touching the stream.
pub fn spawn_decoder<S, B, E>(
    stream: S,
    session: DecodeSession,
    cancel: CancelToken,
) -> mpsc::Receiver<DownloadEvent>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    if session.already_cached && !session.force {
        tracing::info!("Model {} already cached, skipping download", session.variant.id);
        return single_event(DownloadEvent::Completed {
            variant: session.variant,
        });
    }

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let Some(terminal) = decode_stream(stream, &session.variant, &cancel, &tx).await else {
            tracing::debug!("Download event consumer dropped");
            return;
        };
        if tx.send(terminal).await.is_err() {
            tracing::debug!("Download event consumer dropped before terminal event");
        }
    });
    rx
}

/// Feed the stream through a decoder, sending progress as it arrives.
/// Returns the terminal event, or `None` once the consumer is gone.
async fn decode_stream<S, B, E>(
    mut stream: S,
    variant: &ModelVariant,
    cancel: &CancelToken,
    tx: &mpsc::Sender<DownloadEvent>,
) -> Option<DownloadEvent>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut decoder = ProgressDecoder::new();
    let mut splitter = LineSplitter::default();

    loop {
        let chunk = tokio::select! {
            biased;
            () = cancel.cancelled() => return Some(DownloadEvent::cancelled()),
            chunk = stream.next() => chunk,
        };

        let (lines, at_eof) = match chunk {
            Some(Ok(bytes)) => (splitter.push(bytes.as_ref()), false),
            Some(Err(e)) => {
                return Some(DownloadEvent::failed(DownloadFailure::Transport, e.to_string()));
            }
            None => (splitter.finish().into_iter().collect(), true),
        };

        for line in lines {
            if cancel.is_cancelled() {
                return Some(DownloadEvent::cancelled());
            }
            match decoder.feed_line(&line) {
                LineOutcome::Progress(percentage) => {
                    let sent = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Some(DownloadEvent::cancelled()),
                        sent = tx.send(DownloadEvent::Progress { percentage }) => sent,
                    };
                    sent.ok()?;
                }
                LineOutcome::Complete => return Some(decoder.finish(variant)),
                LineOutcome::Ignored => {}
            }
        }

        if at_eof {
            return Some(decoder.finish(variant));
        }
    }
}

/// Format bytes as human-readable string
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn test_variant() -> ModelVariant {
        ModelVariant {
            id: "model-3-cuda-gpu:1".to_string(),
            alias: "model-3".to_string(),
            provider_type: "AzureFoundry".to_string(),
            uri: "azureml://registries/azureml/models/model-3-cuda-gpu/versions/1".to_string(),
            ..Default::default()
        }
    }

    fn session(variant: ModelVariant) -> DecodeSession {
        DecodeSession {
            variant,
            already_cached: false,
            force: false,
        }
    }

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(p.as_bytes().to_vec()))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(mut rx: mpsc::Receiver<DownloadEvent>) -> Vec<DownloadEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_decoder_state_transitions() {
        let mut decoder = ProgressDecoder::new();
        assert_eq!(decoder.state(), ParserState::Scanning);

        assert_eq!(
            decoder.feed_line("Total 12.50% Downloading model.onnx.data"),
            LineOutcome::Progress(12.5)
        );
        assert_eq!(decoder.feed_line("some log line"), LineOutcome::Ignored);
        assert_eq!(decoder.feed_line("[DONE] All Completed!"), LineOutcome::Ignored);
        assert_eq!(decoder.state(), ParserState::CollectingJson);

        // Progress lines no longer count once collecting
        assert_eq!(
            decoder.feed_line("Total 99.00% Downloading model.onnx.data"),
            LineOutcome::Ignored
        );
        assert_eq!(decoder.feed_line("{"), LineOutcome::Ignored);
        assert_eq!(decoder.feed_line("  \"success\": true"), LineOutcome::Ignored);
        assert_eq!(decoder.feed_line("}"), LineOutcome::Complete);

        assert_eq!(
            decoder.finish(&test_variant()),
            DownloadEvent::Completed {
                variant: test_variant()
            }
        );
    }

    #[test]
    fn test_progress_line_matching() {
        assert!(is_progress_line("Total 0.00% Downloading model.onnx.data"));
        assert!(is_progress_line("TOTAL 5% Downloading x"));
        assert!(!is_progress_line("Total 5% downloading x"));
        assert!(!is_progress_line("Total Downloading x"));
        assert!(!is_progress_line("  Total 5% Downloading x"));

        assert_eq!(parse_percentage("Total 0.00% Downloading a"), Some(0.0));
        assert_eq!(parse_percentage("Total 42.7% Downloading a 13%"), Some(42.7));
        assert_eq!(parse_percentage("Total abc% Downloading a"), None);
        assert_eq!(parse_percentage("Total 150% Downloading a"), Some(100.0));
    }

    #[test]
    fn test_decode_text_progress_then_success() {
        let text = "Total 0.00% Downloading model.onnx.data\n\
                    [DONE] All Completed!\n\
                    {\"success\": true, \"errorMessage\": null}";
        let events = decode_text(text, &test_variant());
        assert_eq!(
            events,
            vec![
                DownloadEvent::Progress { percentage: 0.0 },
                DownloadEvent::Completed {
                    variant: test_variant()
                },
            ]
        );
    }

    #[test]
    fn test_decode_text_remote_failure() {
        let text = "[DONE] All Completed!\n\
                    {\"success\": false, \"errorMessage\": \"Download error occurred.\"}";
        let events = decode_text(text, &test_variant());
        assert_eq!(
            events,
            vec![DownloadEvent::failed(
                DownloadFailure::Remote,
                "Download error occurred."
            )]
        );
    }

    #[test]
    fn test_decode_text_failure_without_message() {
        let text = "[DONE]\n{\"success\": false, \"errorMessage\": null}\n";
        let events = decode_text(text, &test_variant());
        assert_eq!(
            events,
            vec![DownloadEvent::failed(DownloadFailure::Remote, UNKNOWN_ERROR_MESSAGE)]
        );
    }

    #[test]
    fn test_decode_text_without_completion() {
        let events = decode_text("Total 10% Downloading a\nTotal 20% Downloading a\n", &test_variant());
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[2],
            DownloadEvent::failed(DownloadFailure::Decode, NO_COMPLETION_MESSAGE)
        );

        // JSON without a completion marker is never collected
        let events = decode_text("{\"success\": true}\n", &test_variant());
        assert_eq!(
            events,
            vec![DownloadEvent::failed(DownloadFailure::Decode, NO_COMPLETION_MESSAGE)]
        );
    }

    #[test]
    fn test_decode_text_malformed_json() {
        let events = decode_text("All Completed\n{\"success\": tru\n}\n", &test_variant());
        assert!(matches!(
            &events[..],
            [DownloadEvent::Failed {
                kind: DownloadFailure::Decode,
                ..
            }]
        ));
    }

    #[test]
    fn test_decode_text_stops_at_closing_brace() {
        let text = "[DONE]\nnoise before json\n{\n\"success\": true\n}\ntrailing garbage {\n";
        let events = decode_text(text, &test_variant());
        assert_eq!(
            events,
            vec![DownloadEvent::Completed {
                variant: test_variant()
            }]
        );
    }

    #[test]
    fn test_decode_text_is_deterministic() {
        let text = "Total 1.00% Downloading a\nTotal 50.00% Downloading a\n[DONE]\n{\n\"success\": true\n}\n";
        assert_eq!(decode_text(text, &test_variant()), decode_text(text, &test_variant()));
    }

    #[test]
    fn test_line_splitter_across_chunks() {
        let mut splitter = LineSplitter::default();
        assert!(splitter.push(b"Total 1").is_empty());
        assert_eq!(splitter.push(b"0% Downloading\r\nnext"), vec!["Total 10% Downloading"]);
        assert_eq!(splitter.push(b" line\n"), vec!["next line"]);
        assert_eq!(splitter.finish(), None);

        splitter.push(b"tail");
        assert_eq!(splitter.finish().as_deref(), Some("tail"));
    }

    #[test]
    fn test_download_request_payload() {
        let variant = ModelVariant {
            prompt_template: Some(PromptTemplate {
                assistant: "<|assistant|>".to_string(),
                prompt: "<|user|>".to_string(),
            }),
            ..test_variant()
        };
        let request = DownloadRequest::for_variant(&variant, Some("hf_token"));
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["Model"]["Name"], "model-3-cuda-gpu:1");
        assert_eq!(
            json["Model"]["Uri"],
            "azureml://registries/azureml/models/model-3-cuda-gpu/versions/1"
        );
        assert_eq!(json["Model"]["ProviderType"], "AzureFoundryLocal");
        assert_eq!(json["Model"]["PromptTemplate"]["assistant"], "<|assistant|>");
        assert_eq!(json["token"], "hf_token");
        assert_eq!(json["IgnorePipeReport"], true);

        let anonymous = DownloadRequest::for_variant(&test_variant(), None);
        assert_eq!(anonymous.token, "");
    }

    #[test]
    fn test_event_accessors() {
        assert!(!DownloadEvent::Progress { percentage: 3.0 }.is_terminal());
        assert!(DownloadEvent::cancelled().is_terminal());
        assert_eq!(DownloadEvent::Progress { percentage: 3.0 }.percentage(), 3.0);
        assert_eq!(
            DownloadEvent::Completed {
                variant: test_variant()
            }
            .percentage(),
            100.0
        );
    }

    #[test]
    fn test_download_options_builder() {
        let options = DownloadOptions::default().with_token("t").forced();
        assert_eq!(options.token.as_deref(), Some("t"));
        assert!(options.force);
    }

    #[tokio::test]
    async fn test_spawn_decoder_progress_and_completion() {
        let stream = chunks(&[
            "Total 0.00% Down",
            "loading model.onnx.data\n[DONE] All Completed!\n",
            "{\"success\": true, \"errorMessage\": null}",
        ]);
        let events = collect(spawn_decoder(stream, session(test_variant()), CancelToken::new())).await;
        assert_eq!(
            events,
            vec![
                DownloadEvent::Progress { percentage: 0.0 },
                DownloadEvent::Completed {
                    variant: test_variant()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_spawn_decoder_matches_decode_text() {
        let text = "Total 5.00% Downloading a\nTotal 75.00% Downloading a\nAll Completed\n{\n\"success\": false,\n\"errorMessage\": \"disk full\"\n}\n";
        let events = collect(spawn_decoder(chunks(&[text]), session(test_variant()), CancelToken::new())).await;
        assert_eq!(events, decode_text(text, &test_variant()));
    }

    #[tokio::test]
    async fn test_cached_short_circuit_does_not_read_stream() {
        let polled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&polled);
        let stream = stream::poll_fn(move |_| {
            flag.store(true, Ordering::SeqCst);
            std::task::Poll::Ready(None::<Result<Vec<u8>, std::io::Error>>)
        });

        let session = DecodeSession {
            variant: test_variant(),
            already_cached: true,
            force: false,
        };
        let events = collect(spawn_decoder(stream, session, CancelToken::new())).await;
        assert_eq!(
            events,
            vec![DownloadEvent::Completed {
                variant: test_variant()
            }]
        );
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_forced_download_reads_stream_even_if_cached() {
        let session = DecodeSession {
            variant: test_variant(),
            already_cached: true,
            force: true,
        };
        let events = collect(spawn_decoder(chunks(&["nothing useful\n"]), session, CancelToken::new())).await;
        assert_eq!(
            events,
            vec![DownloadEvent::failed(DownloadFailure::Decode, NO_COMPLETION_MESSAGE)]
        );
    }

    #[tokio::test]
    async fn test_read_error_is_terminal() {
        let stream = stream::iter(vec![
            Ok(b"Total 10% Downloading a\n".to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset")),
            Ok(b"[DONE]\n{\"success\": true}\n".to_vec()),
        ]);
        let events = collect(spawn_decoder(stream, session(test_variant()), CancelToken::new())).await;
        assert_eq!(
            events,
            vec![
                DownloadEvent::Progress { percentage: 10.0 },
                DownloadEvent::failed(DownloadFailure::Transport, "connection reset"),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let events = collect(spawn_decoder(
            chunks(&["Total 10% Downloading a\n"]),
            session(test_variant()),
            cancel,
        ))
        .await;
        assert_eq!(events, vec![DownloadEvent::cancelled()]);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_stream() {
        let cancel = CancelToken::new();
        let stream = chunks(&["Total 10% Downloading a\n"]).chain(stream::pending());
        let mut rx = spawn_decoder(stream, session(test_variant()), cancel.clone());

        assert_eq!(rx.recv().await, Some(DownloadEvent::Progress { percentage: 10.0 }));
        cancel.cancel();
        assert_eq!(rx.recv().await, Some(DownloadEvent::cancelled()));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1_048_576), "1.00 MB");
        assert_eq!(format_bytes(1_610_612_736), "1.50 GB");
    }
}
