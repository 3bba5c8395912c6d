//! Request/response engine.
//!
//! Many callers share one link. Each request gets a fresh [`CorrelationTag`]
//! and an entry in the pending table; a single reader task per link routes
//! responses back by tag. Physical sends are serialized by the transport's
//! writer lock, never by the dispatcher itself.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dashmap::DashMap;
use ptsl_catalog::CommandId;
use tokio::sync::{RwLock, oneshot, watch};

use crate::bridge::protocol::{
    ClientMessage, CorrelationTag, HostMessage, RequestHeader, ResponseHeader,
};
use crate::bridge::transport::{FrameReceiver, Transport, deadline_after};
use crate::error::{Error, Result, TransportError};
use crate::session::ConnectionState;
use crate::task::TaskHandle;
use crate::value::Value;
use crate::wire::WireCodec;

/// Raw response as it came off the wire.
#[derive(Debug)]
pub(crate) struct Reply {
    pub header: ResponseHeader,
    pub body: String,
    pub error: Option<String>,
}

struct PendingRequest {
    command: CommandId,
    reply: oneshot::Sender<Result<Reply>>,
}

/// One live connection: transport, pending table and host session id.
pub(crate) struct Link {
    transport: Transport,
    pending: DashMap<CorrelationTag, PendingRequest>,
    session_id: OnceLock<String>,
}

impl Link {
    fn new(transport: Transport) -> Self {
        Self {
            transport,
            pending: DashMap::new(),
            session_id: OnceLock::new(),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.get().map(String::as_str)
    }

    pub fn set_session_id(&self, id: String) {
        if self.session_id.set(id).is_err() {
            tracing::warn!("Session id already assigned for this link");
        }
    }

    #[cfg(test)]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn route(&self, header: ResponseHeader, body: String, error: Option<String>) {
        let tag = header.tag;
        let Some((_, pending)) = self.pending.remove(&tag) else {
            tracing::warn!(%tag, command = header.command, "Discarding orphaned response");
            return;
        };

        let result = if CommandId::from_code(header.command) == Some(pending.command) {
            Ok(Reply {
                header,
                body,
                error,
            })
        } else {
            Err(Error::MalformedResponse {
                command: pending.command,
                reason: format!("response carries command code {}", header.command),
            })
        };

        if pending.reply.send(result).is_err() {
            tracing::debug!(%tag, "Caller gave up before response arrived");
        }
    }

    /// Resolve everything still waiting with a closed-transport error.
    fn fail_pending(&self) {
        let tags: Vec<CorrelationTag> = self.pending.iter().map(|e| *e.key()).collect();
        if !tags.is_empty() {
            tracing::debug!(count = tags.len(), "Failing pending requests");
        }
        for tag in tags {
            if let Some((_, pending)) = self.pending.remove(&tag) {
                let _ = pending
                    .reply
                    .send(Err(Error::Transport(TransportError::Closed)));
            }
        }
    }
}

/// Removes a pending entry when the waiting caller finishes, times out or is
/// dropped.
struct PendingGuard<'a> {
    link: &'a Link,
    tag: CorrelationTag,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.link.pending.remove(&self.tag);
    }
}

async fn run_reader(link: Arc<Link>, mut receiver: FrameReceiver) {
    loop {
        match receiver.receive().await {
            Ok(Some(HostMessage::Response {
                header,
                body,
                error,
            })) => link.route(header, body, error),
            Ok(Some(HostMessage::Closing { reason })) => {
                tracing::info!(%reason, "Host is closing the connection");
                break;
            }
            Ok(None) => {
                tracing::debug!("Host connection closed");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Read from host failed");
                break;
            }
        }
    }
    link.transport.close().await;
    link.fail_pending();
    tracing::debug!("Reader task exiting");
}

pub struct Dispatcher {
    codec: WireCodec,
    state: watch::Receiver<ConnectionState>,
    link: RwLock<Option<Arc<Link>>>,
    protocol_version: u32,
}

impl Dispatcher {
    pub fn new(
        codec: WireCodec,
        state: watch::Receiver<ConnectionState>,
        protocol_version: u32,
    ) -> Self {
        Self {
            codec,
            state,
            link: RwLock::new(None),
            protocol_version,
        }
    }

    pub fn codec(&self) -> &WireCodec {
        &self.codec
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Install a fresh link and start its reader task.
    pub(crate) async fn attach(&self, transport: Transport, receiver: FrameReceiver) -> Arc<Link> {
        let link = Arc::new(Link::new(transport));
        tokio::spawn(run_reader(Arc::clone(&link), receiver));

        let previous = self.link.write().await.replace(Arc::clone(&link));
        if let Some(old) = previous {
            old.transport.close().await;
        }
        link
    }

    /// Remove the current link, if any. The caller decides how to close it.
    pub(crate) async fn detach(&self) -> Option<Arc<Link>> {
        self.link.write().await.take()
    }

    pub(crate) async fn is_current(&self, link: &Arc<Link>) -> bool {
        self.link
            .read()
            .await
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, link))
    }

    async fn current_link(&self) -> Option<Arc<Link>> {
        self.link.read().await.clone()
    }

    /// Run one command and return its decoded payload.
    ///
    /// Host-reported failures come back as [`Error::Command`]; the link stays
    /// usable. No retries are attempted.
    pub async fn run_command(
        &self,
        command: CommandId,
        args: &Value,
        timeout: Duration,
    ) -> Result<Value> {
        let reply = self.exchange(command, args, timeout).await?;
        self.finish(command, &reply)
    }

    /// Start a long-running command and return the host's task handle.
    pub async fn submit_task(
        &self,
        command: CommandId,
        args: &Value,
        timeout: Duration,
    ) -> Result<TaskHandle> {
        let schema = self.codec.schema(command)?;
        if !schema.returns_task {
            return Err(Error::SchemaMismatch {
                command,
                path: String::new(),
                reason: "command does not run as a task".to_string(),
            });
        }

        let reply = self.exchange(command, args, timeout).await?;
        self.finish(command, &reply)?;
        let task_id = reply
            .header
            .task_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::MalformedResponse {
                command,
                reason: "response carries no task id".to_string(),
            })?;

        tracing::debug!(
            %command,
            %task_id,
            status = reply.header.status.as_str(),
            "Task submitted"
        );
        Ok(TaskHandle::new(task_id, command))
    }

    fn finish(&self, command: CommandId, reply: &Reply) -> Result<Value> {
        if let Some(error_json) = reply.error.as_deref().filter(|e| !e.trim().is_empty())
            && let Some(err) = self.codec.classify_error(command, error_json)?
        {
            tracing::debug!(%command, error_type = err.error_type.name(), "Command failed on host");
            return Err(err.into());
        }
        self.codec.decode(command, &reply.body)
    }

    async fn exchange(&self, command: CommandId, args: &Value, timeout: Duration) -> Result<Reply> {
        if !command.is_handshake() && self.state() != ConnectionState::Registered {
            return Err(Error::NotConnected);
        }

        let body = self.codec.encode(command, args)?;
        let link = self.current_link().await.ok_or(Error::NotConnected)?;

        // One budget covers queueing for the writer, the write and the reply.
        let deadline = deadline_after(timeout);
        let tag = CorrelationTag::new();
        let timed_out = || {
            tracing::debug!(%command, %tag, ?timeout, "Request timed out");
            Error::RequestTimeout {
                command,
                tag,
                timeout,
            }
        };

        let (tx, rx) = oneshot::channel();
        link.pending.insert(tag, PendingRequest { command, reply: tx });
        let _guard = PendingGuard { link: &link, tag };

        // The reader fails pending entries only after marking the link
        // closed, so an entry inserted after that point is caught here.
        if link.transport.is_closed() {
            return Err(TransportError::Closed.into());
        }

        let header = RequestHeader {
            tag,
            command: command.code(),
            version: self.protocol_version,
            session_id: link.session_id().map(str::to_string),
        };
        tracing::trace!(%command, %tag, "Sending request");
        match link
            .transport
            .send(ClientMessage::Request { header, body }, deadline)
            .await
        {
            Ok(()) => {}
            Err(TransportError::WriteTimeout) => return Err(timed_out()),
            Err(e) => return Err(e.into()),
        }

        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::Closed.into()),
            Err(_) => Err(timed_out()),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state())
            .field("protocol_version", &self.protocol_version)
            .finish_non_exhaustive()
    }
}
