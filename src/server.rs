//! MCP tool server over newline-delimited stdio, backed by `rmcp`.
//!
//! `rmcp` owns the session: handshake, version negotiation, `ping`,
//! `tools/list` and `tools/call`, with each request handled on its own task so
//! a long generation never blocks `get_progress` or `interrupt_generation`.
//!
//! A line guard sits between the raw input and the session. The session closes
//! its transport on the first frame it cannot decode, so lines that are not
//! UTF-8, not JSON, or not a routable JSON-RPC message are answered here and
//! never reach it.

use crate::{
    forge::ForgeClient,
    tools::{ToolDescriptor, ToolRegistry},
};
use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, ClientJsonRpcMessage, Content, ErrorCode,
        ErrorData, Implementation, InitializeRequestParam, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    RoleServer, ServerHandler, ServiceExt,
};
use serde_json::{json, Map, Value};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub const SERVER_NAME: &str = "rforge";

const INSTRUCTIONS: &str = "Drive a Stable Diffusion Forge server: generate, edit and upscale \
images, manage checkpoints and assets, and watch or interrupt running jobs.";

/// Methods the session routes; a malformed one of these is a params problem.
const ROUTED_METHODS: &[&str] = &["initialize", "ping", "tools/list", "tools/call"];

const PIPE_CAPACITY: usize = 1 << 20;

pub struct ToolServer {
    forge: ForgeClient,
    registry: ToolRegistry,
}

impl ToolServer {
    pub fn new(forge: ForgeClient, registry: ToolRegistry) -> Self {
        Self { forge, registry }
    }

    pub async fn serve_stdio(self) -> io::Result<()> {
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serves one session until the reader reaches EOF or the peer goes away.
    pub async fn run<R, W>(self, reader: R, writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (frames, frame_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (guard_end, session_in) = tokio::io::duplex(PIPE_CAPACITY);
        let (session_out, pump_end) = tokio::io::duplex(PIPE_CAPACITY);

        let writer_task = tokio::spawn(write_frames(frame_rx, writer));
        tokio::spawn(pump_frames(pump_end, frames.clone()));
        tokio::spawn(guard_lines(reader, guard_end, frames));

        let session = ServiceExt::serve(self, (session_in, session_out))
            .await
            .map_err(io::Error::other)?;
        log::info!("MCP session initialized");

        let reason = session.waiting().await.map_err(io::Error::other)?;
        log::info!("MCP session ended: {:?}", reason);

        writer_task.await.map_err(io::Error::other)?
    }
}

impl ServerHandler for ToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self.registry.descriptors().map(to_tool).collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        log::info!("Calling tool {}", request.name);
        let args = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        let outcome = self.registry.invoke(&self.forge, &request.name, args).await;

        let content = vec![Content::text(outcome.text)];
        Ok(if outcome.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        })
    }
}

fn to_tool(descriptor: &ToolDescriptor) -> Tool {
    let schema = match &descriptor.input_schema {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    Tool::new(descriptor.name, descriptor.description, Arc::new(schema))
}

/// What to do with one raw input line.
#[derive(Debug, PartialEq)]
enum Screened {
    Forward,
    Skip,
    Reply(Value),
}

fn screen(line: &[u8]) -> Screened {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            log::warn!("Input line is not UTF-8: {}", e);
            return Screened::Reply(error_frame(
                Value::Null,
                ErrorCode::PARSE_ERROR,
                format!("Parse error: line is not valid UTF-8 ({})", e),
            ));
        }
    };
    if text.is_empty() {
        return Screened::Skip;
    }

    let message: Value = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            log::warn!("Unparseable request: {}", e);
            return Screened::Reply(error_frame(
                Value::Null,
                ErrorCode::PARSE_ERROR,
                format!("Parse error: {}", e),
            ));
        }
    };

    let Some(fields) = message.as_object() else {
        return Screened::Reply(error_frame(
            Value::Null,
            ErrorCode::INVALID_REQUEST,
            "Invalid request: expected a JSON object".to_string(),
        ));
    };
    let id = fields.get("id").cloned();
    if let Some(id) = id.as_ref().filter(|id| !(id.is_string() || id.is_number())) {
        log::warn!("Rejected request with id {}", id);
        return Screened::Reply(error_frame(
            id.clone(),
            ErrorCode::INVALID_REQUEST,
            "Invalid request: id must be a string or a number".to_string(),
        ));
    }

    let method = fields.get("method").and_then(Value::as_str).unwrap_or("");
    let routing_error = match check_routable(&message, method) {
        Ok(()) => return Screened::Forward,
        Err(e) => e,
    };

    // Without an id there is nobody to answer.
    let Some(id) = id else {
        log::debug!("Dropping unroutable notification: {}", routing_error);
        return Screened::Skip;
    };

    let (code, text) = if method.is_empty() {
        (
            ErrorCode::INVALID_REQUEST,
            format!("Invalid request: {}", routing_error),
        )
    } else if ROUTED_METHODS.contains(&method) {
        (
            ErrorCode::INVALID_PARAMS,
            format!("Invalid {} params: {}", method, routing_error),
        )
    } else {
        (ErrorCode::METHOD_NOT_FOUND, format!("Method not found: {}", method))
    };
    log::warn!("Rejected request {}: {}", id, text);
    Screened::Reply(error_frame(id, code, text))
}

/// Params of the methods this server answers are checked up front, so a bad
/// `tools/call` is reported as such instead of as an unknown method.
fn check_routable(message: &Value, method: &str) -> Result<(), serde_json::Error> {
    let params = || message.get("params").cloned().unwrap_or(Value::Null);
    match method {
        "tools/call" => {
            serde_json::from_value::<CallToolRequestParam>(params())?;
        }
        "initialize" => {
            serde_json::from_value::<InitializeRequestParam>(params())?;
        }
        _ => {}
    }
    serde_json::from_value::<ClientJsonRpcMessage>(message.clone()).map(|_| ())
}

fn error_frame(id: Value, code: ErrorCode, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": ErrorData::new(code, message, None),
    })
}

async fn guard_lines<R>(reader: R, mut session_in: DuplexStream, frames: UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        }

        match screen(&line) {
            Screened::Forward => {
                if line.last() != Some(&b'\n') {
                    line.push(b'\n');
                }
                if session_in.write_all(&line).await.is_err() {
                    break;
                }
            }
            Screened::Skip => {}
            Screened::Reply(reply) => {
                if let Ok(frame) = serde_json::to_vec(&reply) {
                    let _ = frames.send(frame);
                }
            }
        }
    }
    log::info!("Input closed");
}

async fn pump_frames(session_out: DuplexStream, frames: UnboundedSender<Vec<u8>>) {
    let mut reader = BufReader::new(session_out);
    loop {
        let mut frame = Vec::new();
        match reader.read_until(b'\n', &mut frame).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if frame.last() == Some(&b'\n') {
                    frame.pop();
                }
                if frames.send(frame).is_err() {
                    break;
                }
            }
        }
    }
}

async fn write_frames<W>(mut frames: UnboundedReceiver<Vec<u8>>, mut writer: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut frame) = frames.recv().await {
        frame.push(b'\n');
        writer.write_all(&frame).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForgeConfig;
    use std::time::Duration;
    use tokio::io::{Lines, ReadHalf, WriteHalf};

    struct Client {
        writer: WriteHalf<DuplexStream>,
        lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    }

    impl Client {
        fn start() -> Self {
            let forge = ForgeClient::new(ForgeConfig::new().with_url("http://127.0.0.1:9"));
            let server = ToolServer::new(forge, ToolRegistry::with_forge_tools());
            let (client_end, server_end) = tokio::io::duplex(64 * 1024);
            let (server_read, server_write) = tokio::io::split(server_end);
            tokio::spawn(server.run(server_read, server_write));

            let (read, writer) = tokio::io::split(client_end);
            Self {
                writer,
                lines: BufReader::new(read).lines(),
            }
        }

        async fn send_raw(&mut self, bytes: &[u8]) {
            self.writer.write_all(bytes).await.unwrap();
            self.writer.flush().await.unwrap();
        }

        async fn send(&mut self, message: Value) {
            let mut line = serde_json::to_vec(&message).unwrap();
            line.push(b'\n');
            self.send_raw(&line).await;
        }

        async fn recv(&mut self) -> Value {
            let line = tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
                .await
                .expect("no reply in time")
                .unwrap()
                .expect("server closed the stream");
            serde_json::from_str(&line).unwrap()
        }

        async fn initialize(&mut self, version: &str) -> Value {
            self.send(json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {
                    "protocolVersion": version,
                    "capabilities": {},
                    "clientInfo": {"name": "harness", "version": "0.0.1"}
                }
            }))
            .await;
            let reply = self.recv().await;
            self.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
                .await;
            reply
        }

        async fn ping(&mut self, id: i64) {
            self.send(json!({"jsonrpc": "2.0", "id": id, "method": "ping"}))
                .await;
        }
    }

    #[test]
    fn test_screen_classifies_lines() {
        assert_eq!(screen(b"\n"), Screened::Skip);
        assert_eq!(
            screen(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#),
            Screened::Forward
        );

        let Screened::Reply(bad_utf8) = screen(b"\xff\xfe garbage\n") else {
            panic!("invalid UTF-8 must be answered");
        };
        assert_eq!(bad_utf8["id"], Value::Null);
        assert_eq!(bad_utf8["error"]["code"], -32700);

        let Screened::Reply(bad_json) = screen(b"{not json") else {
            panic!("invalid JSON must be answered");
        };
        assert_eq!(bad_json["error"]["code"], -32700);
    }

    #[test]
    fn test_screen_rejects_unroutable_requests() {
        let Screened::Reply(null_id) = screen(br#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
        else {
            panic!("a null id must still be answered");
        };
        assert_eq!(null_id["id"], Value::Null);
        assert_eq!(null_id["error"]["code"], -32600);

        let Screened::Reply(bad_call) =
            screen(br#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{}}"#)
        else {
            panic!("tools/call without a name must be answered");
        };
        assert_eq!(bad_call["id"], 3);
        assert_eq!(bad_call["error"]["code"], -32602);

        assert_eq!(
            screen(br#"{"jsonrpc":"2.0","method":"tools/call","params":{}}"#),
            Screened::Skip
        );
    }

    #[tokio::test]
    async fn test_initialize_negotiates_supported_version() {
        let mut client = Client::start();
        let reply = client.initialize("2099-01-01").await;
        assert_eq!(reply["id"], 0);
        assert_eq!(reply["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(reply["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(reply["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let mut client = Client::start();
        client.initialize("2024-11-05").await;
        client
            .send(json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"}))
            .await;
        let reply = client.recv().await;
        let tools = reply["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 15);
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
        assert!(tools.iter().any(|t| t["name"] == "txt2img"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let mut client = Client::start();
        client.initialize("2024-11-05").await;

        client.ping(1).await;
        client.send_raw(b"\xff\xfe garbage\n").await;
        client.ping(2).await;

        let mut replies = Vec::new();
        for _ in 0..3 {
            replies.push(client.recv().await);
        }
        let parse_error = replies
            .iter()
            .find(|r| r.get("error").is_some())
            .expect("parse error reply");
        assert_eq!(parse_error["error"]["code"], -32700);
        assert_eq!(parse_error["id"], Value::Null);

        let mut answered: Vec<i64> = replies.iter().filter_map(|r| r["id"].as_i64()).collect();
        answered.sort();
        assert_eq!(answered, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_null_id_gets_a_reply() {
        let mut client = Client::start();
        client.initialize("2024-11-05").await;
        client
            .send(json!({"jsonrpc": "2.0", "id": null, "method": "ping"}))
            .await;
        let reply = client.recv().await;
        assert_eq!(reply["id"], Value::Null);
        assert_eq!(reply["error"]["code"], -32600);

        client.ping(7).await;
        assert_eq!(client.recv().await["id"], 7);
    }

    #[tokio::test]
    async fn test_tool_failure_is_reported_in_content() {
        let mut client = Client::start();
        client.initialize("2024-11-05").await;
        client
            .send(json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": {"name": "no_such_tool", "arguments": {}}
            }))
            .await;
        let reply = client.recv().await;
        assert_eq!(reply["id"], 5);
        assert_eq!(reply["result"]["isError"], true);
        assert_eq!(
            reply["result"]["content"][0]["text"],
            "Unknown tool: no_such_tool"
        );
    }

    #[tokio::test]
    async fn test_unknown_method_is_rejected() {
        let mut client = Client::start();
        client.initialize("2024-11-05").await;
        client
            .send(json!({"jsonrpc": "2.0", "id": 9, "method": "forge/explode"}))
            .await;
        let reply = client.recv().await;
        assert_eq!(reply["id"], 9);
        assert_eq!(reply["error"]["code"], -32601);
    }
}
