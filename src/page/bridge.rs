use std::process::Stdio;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::dom::{Document, EventKind, Mutation, SetterPath, SnapshotNode};
use crate::page::PageError;

/// One DOM write replayed in the live page. `path` is the child-index path
/// from the snapshot root, as produced by [`Document::path_of`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CommitOp {
    SetValue {
        path: Vec<usize>,
        value: String,
        setter: SetterPath,
    },
    SetChecked {
        path: Vec<usize>,
        checked: bool,
    },
    Dispatch {
        path: Vec<usize>,
        event: EventKind,
    },
    ScrollIntoView {
        path: Vec<usize>,
    },
}

impl CommitOp {
    pub fn from_mutation(doc: &Document, mutation: &Mutation) -> Self {
        match mutation {
            Mutation::SetValue {
                target,
                value,
                setter,
            } => CommitOp::SetValue {
                path: doc.path_of(*target),
                value: value.clone(),
                setter: *setter,
            },
            Mutation::SetChecked { target, checked } => CommitOp::SetChecked {
                path: doc.path_of(*target),
                checked: *checked,
            },
            Mutation::Dispatch { target, event } => CommitOp::Dispatch {
                path: doc.path_of(*target),
                event: *event,
            },
            Mutation::ScrollIntoView { target } => CommitOp::ScrollIntoView {
                path: doc.path_of(*target),
            },
        }
    }
}

/// Replayable form of every mutation recorded on `doc`.
pub fn commit_ops(doc: &Document) -> Vec<CommitOp> {
    doc.mutations()
        .iter()
        .map(|m| CommitOp::from_mutation(doc, m))
        .collect()
}

/// Request sent to the bridge script over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BridgeRequest<'a> {
    Navigate { url: &'a str },
    Snapshot,
    Commit { ops: &'a [CommitOp] },
    StartRecording,
    StopRecording,
    Quit,
}

impl BridgeRequest<'_> {
    fn name(&self) -> &'static str {
        match self {
            BridgeRequest::Navigate { .. } => "navigate",
            BridgeRequest::Snapshot => "snapshot",
            BridgeRequest::Commit { .. } => "commit",
            BridgeRequest::StartRecording => "start_recording",
            BridgeRequest::StopRecording => "stop_recording",
            BridgeRequest::Quit => "quit",
        }
    }
}

/// Response read from the bridge script over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BridgeResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
    /// Recorded audio as a `data:` URL.
    #[serde(default)]
    pub audio: Option<String>,
}

/// A live browser tab driven by a long-lived Node.js bridge process.
///
/// Commands go out as NDJSON on stdin, responses come back one line each on
/// stdout. The first line the process prints must be `{"ok":true,"ready":true}`.
pub struct BrowserBridge {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    current_url: Option<String>,
}

impl BrowserBridge {
    pub async fn launch(program: &str, script: &str) -> Result<Self, PageError> {
        let mut child = Command::new(program)
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PageError::Spawn {
                program: format!("{} {}", program, script),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PageError::Io("Failed to capture stdin of bridge".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PageError::Io("Failed to capture stdout of bridge".into()))?;
        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| PageError::Io(format!("Failed to read ready signal: {}", e)))?;

        let response: BridgeResponse =
            serde_json::from_str(line.trim()).map_err(|source| PageError::JsonParse {
                context: "bridge ready signal".into(),
                source,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(PageError::Protocol {
                command: "launch".into(),
                error: "Did not receive ready signal from bridge".into(),
            });
        }

        Ok(Self {
            child,
            stdin,
            reader,
            current_url: None,
        })
    }

    /// Send a request and read its response line. A dead process surfaces as
    /// [`PageError::ChannelUnavailable`].
    async fn send(&mut self, request: &BridgeRequest<'_>) -> Result<BridgeResponse, PageError> {
        let json = serde_json::to_string(request).map_err(|source| PageError::JsonSerialize {
            context: "BridgeRequest".into(),
            source,
        })?;
        debug!(cmd = request.name(), "bridge request");

        self.stdin
            .write_all(json.as_bytes())
            .await
            .map_err(|e| PageError::ChannelUnavailable(format!("write failed: {}", e)))?;
        self.stdin
            .write_all(b"\n")
            .await
            .map_err(|e| PageError::ChannelUnavailable(format!("write failed: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| PageError::ChannelUnavailable(format!("flush failed: {}", e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .await
            .map_err(|e| PageError::ChannelUnavailable(format!("read failed: {}", e)))?;

        if line.trim().is_empty() {
            return Err(PageError::ChannelUnavailable(
                "empty response from bridge (process may have died)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|source| PageError::JsonParse {
            context: "bridge response".into(),
            source,
        })
    }

    async fn send_ok(&mut self, request: &BridgeRequest<'_>) -> Result<BridgeResponse, PageError> {
        let response = self.send(request).await?;
        if !response.ok {
            return Err(PageError::Protocol {
                command: request.name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    pub async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        self.send_ok(&BridgeRequest::Navigate { url }).await?;
        self.current_url = Some(url.to_string());
        Ok(())
    }

    /// Serialize the current page into a snapshot tree.
    pub async fn snapshot(&mut self) -> Result<Document, PageError> {
        let response = self.send_ok(&BridgeRequest::Snapshot).await?;
        if let Some(url) = response.url {
            self.current_url = Some(url);
        }
        let data = response.data.ok_or_else(|| PageError::Protocol {
            command: "snapshot".into(),
            error: "No data in snapshot response".into(),
        })?;
        let root: SnapshotNode =
            serde_json::from_value(data).map_err(|source| PageError::JsonParse {
                context: "page snapshot".into(),
                source,
            })?;
        Ok(Document::from_snapshot(&root))
    }

    /// Replay recorded DOM writes in the page, in order.
    pub async fn commit(&mut self, ops: &[CommitOp]) -> Result<(), PageError> {
        if ops.is_empty() {
            return Ok(());
        }
        self.send_ok(&BridgeRequest::Commit { ops }).await?;
        Ok(())
    }

    pub async fn start_recording(&mut self) -> Result<(), PageError> {
        self.send_ok(&BridgeRequest::StartRecording).await?;
        Ok(())
    }

    /// Stop recording and return the clip as a `data:` URL.
    pub async fn stop_recording(&mut self) -> Result<String, PageError> {
        let response = self.send_ok(&BridgeRequest::StopRecording).await?;
        response.audio.ok_or_else(|| PageError::Protocol {
            command: "stop_recording".into(),
            error: "No audio in stop_recording response".into(),
        })
    }

    pub fn last_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub async fn quit(&mut self) -> Result<(), PageError> {
        // The process may already be gone.
        if let Err(e) = self.send(&BridgeRequest::Quit).await {
            warn!(error = %e, "bridge quit");
        }
        let _ = self.child.wait().await;
        Ok(())
    }
}
