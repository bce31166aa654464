//! Tool server exposing `download_media` over line-delimited JSON-RPC.
//!
//! One JSON message per line in each direction. `tools/call` runs in its own
//! task so progress notifications and other requests keep flowing while a
//! download is in flight. Stdout belongs to the protocol; logs go elsewhere.

mod protocol;
mod tool;

pub use protocol::{
    DEFAULT_PROTOCOL_VERSION, JSONRPC_VERSION, RpcError, RpcRequest, RpcResponse, TextContent,
    ToolCallResult, progress_notification,
};
pub use tool::{DOWNLOAD_MEDIA, DownloadMediaArgs, DownloadMediaTool, ResolvedArgs, ToolError};

use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::download::{ChannelSink, ProgressSink, ProgressUpdate};

/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "media-downloader";

/// Errors that stop the server loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Reading from the client failed.
    #[error("failed to read request: {0}")]
    Read(#[source] std::io::Error),

    /// Writing to the client failed.
    #[error("failed to write response: {0}")]
    Write(#[source] std::io::Error),
}

type Outgoing = mpsc::UnboundedSender<Value>;

/// Forwards a job's progress as `notifications/progress` for `token` until
/// every sender is dropped.
async fn relay_progress(
    token: Value,
    mut updates: mpsc::UnboundedReceiver<ProgressUpdate>,
    tx: Outgoing,
) {
    while let Some(update) = updates.recv().await {
        let _ = tx.send(progress_notification(&token, update.event));
    }
}

/// JSON-RPC server for the download tool.
#[derive(Debug, Clone)]
pub struct ToolServer {
    tool: Arc<DownloadMediaTool>,
}

impl ToolServer {
    /// Creates a server around `tool`.
    #[must_use]
    pub fn new(tool: DownloadMediaTool) -> Self {
        Self {
            tool: Arc::new(tool),
        }
    }

    /// Serves requests from `reader` until end of input, writing to `writer`.
    ///
    /// In-flight tool calls are awaited before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if reading or writing the transport fails.
    #[instrument(skip_all)]
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        info!("tool server ready");

        let read_loop = async move {
            let mut calls = JoinSet::new();
            let mut lines = reader.lines();
            let result = loop {
                match lines.next_line().await {
                    Ok(Some(line)) => self.handle_line(&line, &tx, &mut calls),
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(ServerError::Read(e)),
                }
            };
            debug!(in_flight = calls.len(), "input closed, waiting for tool calls");
            while let Some(joined) = calls.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "tool call task panicked");
                }
            }
            result
        };

        let (read_result, write_result) = tokio::join!(read_loop, write_messages(writer, rx));
        read_result?;
        write_result
    }

    fn handle_line(&self, line: &str, tx: &Outgoing, calls: &mut JoinSet<()>) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let request = match parse_request(line) {
            Ok(request) => request,
            Err((id, error)) => {
                warn!(code = error.code, message = %error.message, "rejected message");
                let _ = tx.send(RpcResponse::error(id, error).into_value());
                return;
            }
        };

        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let reply = match request.method.as_str() {
            "initialize" => Ok(initialize_result(request.params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": [self.tool.descriptor()] })),
            "tools/call" => match self.start_call(id.clone(), request.params, tx, calls) {
                Ok(()) => return,
                Err(error) => Err(error),
            },
            other => Err(RpcError::method_not_found(other)),
        };

        let response = match reply {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::error(id, error),
        };
        let _ = tx.send(response.into_value());
    }

    /// Validates a `tools/call` envelope and spawns the call.
    fn start_call(
        &self,
        id: Value,
        params: Option<Value>,
        tx: &Outgoing,
        calls: &mut JoinSet<()>,
    ) -> Result<(), RpcError> {
        let params = params.unwrap_or_else(|| json!({}));
        let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
        if name != DOWNLOAD_MEDIA {
            return Err(RpcError::invalid_params(format!("unknown tool '{name}'")));
        }

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        let args: DownloadMediaArgs = serde_json::from_value(arguments)
            .map_err(|e| RpcError::invalid_params(e.to_string()))?;

        let token = params
            .pointer("/_meta/progressToken")
            .filter(|token| !token.is_null())
            .cloned();

        let tool = Arc::clone(&self.tool);
        let tx = tx.clone();
        calls.spawn(async move {
            // The relay ends once the call drops its sink, so every
            // notification is queued before the response.
            let outcome = match token {
                Some(token) => {
                    let (sink, updates) = ChannelSink::new();
                    let sink: Arc<dyn ProgressSink> = Arc::new(sink);
                    let relay = relay_progress(token, updates, tx.clone());
                    tokio::join!(tool.call(&args, Some(sink)), relay).0
                }
                None => tool.call(&args, None).await,
            };
            let result = match outcome {
                Ok(path) => ToolCallResult::text(path.display().to_string()),
                Err(err) => ToolCallResult::failure(tool.failure_payload(&args, &err)),
            };
            let result = serde_json::to_value(result).unwrap_or(Value::Null);
            let _ = tx.send(RpcResponse::success(id, result).into_value());
        });
        Ok(())
    }
}

fn parse_request(line: &str) -> Result<RpcRequest, (Value, RpcError)> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| (Value::Null, RpcError::parse_error(e.to_string())))?;
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = serde_json::from_value(value)
        .map_err(|e| (id.clone(), RpcError::invalid_request(e.to_string())))?;
    if request.jsonrpc != JSONRPC_VERSION {
        return Err((id, RpcError::invalid_request("jsonrpc must be \"2.0\"")));
    }
    Ok(request)
}

fn initialize_result(params: Option<&Value>) -> Value {
    let protocol_version = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);
    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

async fn write_messages<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Value>) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = message.to_string();
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(ServerError::Write)?;
        writer.flush().await.map_err(ServerError::Write)?;
    }
    Ok(())
}
