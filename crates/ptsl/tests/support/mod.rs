//! Simulated host for integration tests.
//!
//! Every `open` creates an in-memory duplex pipe and serves it with a small
//! stateful DAW model. Requests are answered from spawned tasks so scripted
//! delays can reorder responses on the wire.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use ptsl::bridge::codec::FrameCodec;
use ptsl::bridge::protocol::{
    ClientMessage, CorrelationTag, HostMessage, ResponseHeader, TaskStatus,
};
use ptsl::wire::WireCodec;
use ptsl::{
    Client, ClientConfig, CommandId, Connection, Connector, Endpoint, Error, StaticCatalog, Value,
};
use rand::Rng;
use serde_json::json;
use tokio_util::codec::{FramedRead, FramedWrite};

/// Wire number of `PT_NoOpenedSession` in the builtin error table.
const NO_OPENED_SESSION: i32 = 2;

#[derive(Debug, Default, Clone)]
pub struct HostScript {
    pub refuse_authorization: bool,
    /// Pretend nothing listens at the endpoint.
    pub unreachable: bool,
    pub delays: HashMap<CommandId, Duration>,
    /// Random extra delay per response, up to this bound.
    pub jitter: Option<Duration>,
    /// Commands the host reads but never answers.
    pub silent: HashSet<CommandId>,
    /// Task status polls needed before a task completes. `None` never completes.
    pub task_polls: Option<u32>,
    /// Drop the connection, unanswered, when this many requests have been
    /// read in total. Fires once.
    pub drop_after: Option<usize>,
}

impl HostScript {
    pub fn delay(mut self, command: CommandId, delay: Duration) -> Self {
        self.delays.insert(command, delay);
        self
    }

    pub fn silent(mut self, command: CommandId) -> Self {
        self.silent.insert(command);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub command: CommandId,
    pub session_id: Option<String>,
    pub args: Value,
}

#[derive(Debug, Default)]
struct HostState {
    script: HostScript,
    session_name: Option<String>,
    polls: u32,
    opens: usize,
    requests: Vec<SeenRequest>,
    disconnects: usize,
}

enum Reply {
    Ok {
        payload: serde_json::Value,
        status: TaskStatus,
        task_id: Option<String>,
    },
    Fail {
        error_type: i32,
        message: String,
    },
}

impl Reply {
    fn ok(payload: serde_json::Value) -> Self {
        Self::Ok {
            payload,
            status: TaskStatus::Completed,
            task_id: None,
        }
    }

    fn no_session() -> Self {
        Self::Fail {
            error_type: NO_OPENED_SESSION,
            message: "No session is open".to_string(),
        }
    }

    fn into_message(
        self,
        codec: &WireCodec,
        command: CommandId,
        tag: CorrelationTag,
    ) -> HostMessage {
        let (body, status, task_id, error) = match self {
            Reply::Ok {
                payload,
                status,
                task_id,
            } => {
                let body = codec
                    .encode_response(command, &Value::from(payload))
                    .expect("fake host payload matches schema");
                (body, status, task_id, None)
            }
            Reply::Fail {
                error_type,
                message,
            } => {
                let error = json!({
                    "command_error_type": error_type,
                    "command_error_message": message,
                    "is_warning": false,
                });
                (String::new(), TaskStatus::Failed, None, Some(error.to_string()))
            }
        };
        HostMessage::Response {
            header: ResponseHeader {
                tag,
                command: command.code(),
                status,
                task_id,
            },
            body,
            error,
        }
    }
}

impl HostState {
    fn delay_for(&self, command: CommandId) -> Duration {
        let base = self.script.delays.get(&command).copied().unwrap_or_default();
        let jitter = self
            .script
            .jitter
            .map(|max| Duration::from_micros(rand::rng().random_range(0..=max.as_micros() as u64)))
            .unwrap_or_default();
        base + jitter
    }

    fn handle(&mut self, command: CommandId, args: &Value) -> Reply {
        let text = |key: &str| args.get(key).and_then(Value::as_str).unwrap_or("").to_string();

        match command {
            CommandId::AuthorizeConnection => Reply::ok(json!({
                "is_authorized": !self.script.refuse_authorization,
            })),
            CommandId::RegisterConnection => Reply::ok(json!({"session_id": "sess-1"})),
            CommandId::HostReadyCheck => Reply::ok(json!({"is_host_ready": true})),
            CommandId::GetPTSLVersion => Reply::ok(json!({"version": 3})),
            CommandId::CreateSession => {
                self.session_name = Some(text("session_name"));
                Reply::ok(json!({}))
            }
            _ if self.session_name.is_none() => Reply::no_session(),
            CommandId::GetSessionName => Reply::ok(json!({"session_name": self.session_name})),
            CommandId::GetSessionPath => Reply::ok(json!({
                "session_path": format!("~/{}", self.session_name.as_deref().unwrap_or("")),
            })),
            CommandId::CreateNewTracks => {
                let n = args.get("number_of_tracks").and_then(Value::as_i64).unwrap_or(0);
                let base = text("track_name");
                let names: Vec<String> = (1..=n).map(|i| format!("{base} {i}")).collect();
                Reply::ok(json!({"number_of_tracks": n, "created_track_names": names}))
            }
            CommandId::ExportMix => Reply::Ok {
                payload: json!({}),
                status: TaskStatus::Queued,
                task_id: Some("task-1".to_string()),
            },
            CommandId::GetTaskStatus => {
                self.polls += 1;
                let done = self.script.task_polls.is_some_and(|k| self.polls >= k);
                let progress = match self.script.task_polls {
                    Some(k) => (self.polls as f64 / k as f64).min(1.0),
                    None => 0.5,
                };
                Reply::ok(json!({
                    "task_id": text("task_id"),
                    "status": if done { "Completed" } else { "InProgress" },
                    "progress": progress,
                }))
            }
            _ => Reply::ok(json!({})),
        }
    }
}

/// Connector that serves each connection from the simulated host.
#[derive(Clone)]
pub struct FakeHost {
    state: Arc<Mutex<HostState>>,
    codec: WireCodec,
}

impl FakeHost {
    pub fn new(script: HostScript) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(HostState {
                script,
                ..HostState::default()
            })),
            codec: WireCodec::new(Arc::new(StaticCatalog::builtin())),
        })
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn commands(&self) -> Vec<CommandId> {
        self.requests().into_iter().map(|r| r.command).collect()
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    pub fn polls(&self) -> u32 {
        self.state.lock().unwrap().polls
    }

    /// Wait until the host has seen `command`.
    pub async fn wait_for(&self, command: CommandId) {
        for _ in 0..200 {
            if self.commands().contains(&command) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("host never saw {command}");
    }

    async fn serve(self, stream: tokio::io::DuplexStream) {
        let (r, w) = tokio::io::split(stream);
        let mut rx = FramedRead::new(r, FrameCodec::<ClientMessage>::new());
        let tx = Arc::new(tokio::sync::Mutex::new(FramedWrite::new(
            w,
            FrameCodec::<HostMessage>::new(),
        )));

        while let Some(Ok(msg)) = rx.next().await {
            let (header, body) = match msg {
                ClientMessage::Request { header, body } => (header, body),
                ClientMessage::Disconnect { .. } => {
                    self.state.lock().unwrap().disconnects += 1;
                    break;
                }
            };
            let Some(command) = CommandId::from_code(header.command) else {
                continue;
            };
            let args = self
                .codec
                .decode_request(command, &body)
                .expect("client sent a valid body");

            let (reply, delay, silent) = {
                let mut state = self.state.lock().unwrap();
                state.requests.push(SeenRequest {
                    command,
                    session_id: header.session_id.clone(),
                    args: args.clone(),
                });
                if state.script.drop_after == Some(state.requests.len()) {
                    state.script.drop_after = None;
                    break;
                }
                let silent = state.script.silent.contains(&command);
                (state.handle(command, &args), state.delay_for(command), silent)
            };
            if silent {
                continue;
            }

            let tx = Arc::clone(&tx);
            let codec = self.codec.clone();
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let msg = reply.into_message(&codec, command, header.tag);
                let _ = tx.lock().await.send(msg).await;
            });
        }
    }
}

#[async_trait]
impl Connector for FakeHost {
    async fn open(&self, endpoint: &Endpoint) -> Result<Connection, Error> {
        let unreachable = {
            let mut state = self.state.lock().unwrap();
            state.opens += 1;
            state.script.unreachable
        };
        if unreachable {
            return Err(Error::HostUnavailable {
                endpoint: endpoint.clone(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }
        let (client, host) = tokio::io::duplex(256 * 1024);
        tokio::spawn(self.clone().serve(host));
        Ok(Connection::from_stream(client))
    }
}

pub fn client(host: &Arc<FakeHost>, config: ClientConfig) -> Client {
    ptsl::logging::init_tracing();
    let connector: Arc<dyn Connector> = Arc::clone(host) as Arc<dyn Connector>;
    Client::with_parts(config, connector, Arc::new(StaticCatalog::builtin()))
}

pub fn fast_config() -> ClientConfig {
    ClientConfig::default()
        .with_request_timeout(Duration::from_secs(5))
        .with_poll_interval(Duration::from_millis(10))
}

/// A client that has completed the handshake against `host`.
pub async fn connected(host: &Arc<FakeHost>) -> Client {
    let client = client(host, fast_config());
    client.connect("py-ptsl", "demo").await.unwrap();
    client
}
