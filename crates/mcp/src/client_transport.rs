//! Client-side bindings for talking to a tool provider.
//!
//! One [`RpcTransport`] trait, two bindings chosen at construction:
//! newline-delimited JSON over a spawned process's stdio, or one HTTP POST
//! per message.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::error::McpError;
use crate::types::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// Moves one JSON-RPC envelope to the provider and, for requests, one back.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send a request and wait for its response.
    async fn request(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, McpError>;

    /// Send a notification. No response is read.
    async fn notify(&self, notification: &JsonRpcNotification) -> Result<(), McpError>;

    /// Release the underlying connection or process.
    async fn shutdown(&self) -> Result<(), McpError> {
        Ok(())
    }

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}

// ── Line-delimited stream binding ───────────────────────────────────

/// Newline-delimited JSON over any async reader/writer pair.
///
/// The reader and writer sit behind one lock so a request and its response
/// line are never interleaved with another caller's.
pub struct StreamTransport<R, W> {
    io: Mutex<(BufReader<R>, W)>,
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((BufReader::new(reader), writer)),
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<(), McpError> {
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[async_trait]
impl<R, W> RpcTransport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn request(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
        let json = serde_json::to_string(request)?;
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;

        write_line(writer, &json).await?;

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Err(McpError::ServerUnavailable(
                    "server closed its output".to_string(),
                ));
            }
            if !line.trim().is_empty() {
                break;
            }
        }

        Ok(serde_json::from_str(line.trim())?)
    }

    async fn notify(&self, notification: &JsonRpcNotification) -> Result<(), McpError> {
        let json = serde_json::to_string(notification)?;
        let mut io = self.io.lock().await;
        write_line(&mut io.1, &json).await
    }

    fn kind(&self) -> &'static str {
        "stream"
    }
}

// ── Stdio process binding ───────────────────────────────────────────

/// Spawns the tool provider and speaks to it over its stdin/stdout.
///
/// The child inherits stderr, so its logs land on ours. It is killed on
/// [`RpcTransport::shutdown`] or when the transport is dropped.
pub struct ProcessTransport {
    child: Mutex<Child>,
    stream: StreamTransport<ChildStdout, ChildStdin>,
}

impl ProcessTransport {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, McpError> {
        tracing::info!(program = %program, args = ?args, "Spawning MCP server process");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::ServerUnavailable(format!("failed to spawn '{program}': {e}")))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            McpError::ServerUnavailable("failed to capture server stdin".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::ServerUnavailable("failed to capture server stdout".to_string())
        })?;

        Ok(Self {
            child: Mutex::new(child),
            stream: StreamTransport::new(stdout, stdin),
        })
    }
}

#[async_trait]
impl RpcTransport for ProcessTransport {
    async fn request(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
        self.stream.request(request).await
    }

    async fn notify(&self, notification: &JsonRpcNotification) -> Result<(), McpError> {
        self.stream.notify(notification).await
    }

    async fn shutdown(&self) -> Result<(), McpError> {
        tracing::info!("Shutting down MCP server process");
        let mut child = self.child.lock().await;
        if child.try_wait()?.is_none() {
            child.kill().await?;
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "stdio"
    }
}

// ── HTTP binding ────────────────────────────────────────────────────

/// One POST per message to a single endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, McpError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn post<T: serde::Serialize + ?Sized>(&self, body: &T) -> Result<reqwest::Response, McpError> {
        let response = self.client.post(&self.url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
        let response = self.post(request).await?;
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Err(McpError::NoResponse(request.method.clone()));
        }
        Ok(response.json::<JsonRpcResponse>().await?)
    }

    async fn notify(&self, notification: &JsonRpcNotification) -> Result<(), McpError> {
        self.post(notification).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "http"
    }
}
