//! Connection lifecycle and the authorize/register handshake.
//!
//! The session manager is the only writer of [`ConnectionState`]. Everyone
//! else, the dispatcher included, watches it through a receiver.

use std::sync::Arc;
use std::time::Duration;

use ptsl_catalog::CommandId;
use tokio::sync::watch;

use crate::bridge::protocol::ClientMessage;
use crate::bridge::transport::{Connector, Endpoint, Transport, deadline_after};
use crate::dispatcher::{Dispatcher, Link};
use crate::error::{Error, Result};
use crate::value::Value;
use crate::wire::WireCodec;

/// How long `close` waits for the disconnect notice to be written.
const DISCONNECT_NOTICE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Authorized,
    Registered,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authorized => "authorized",
            Self::Registered => "registered",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings the session manager needs to open and handshake a link.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub endpoint: Endpoint,
    pub handshake_timeout: Duration,
    pub max_frame_length: usize,
    pub protocol_version: u32,
}

pub struct SessionManager {
    settings: SessionSettings,
    connector: Arc<dyn Connector>,
    dispatcher: Arc<Dispatcher>,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl SessionManager {
    pub fn new(settings: SessionSettings, connector: Arc<dyn Connector>, codec: WireCodec) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let dispatcher = Arc::new(Dispatcher::new(codec, state_rx, settings.protocol_version));
        Self {
            settings,
            connector,
            dispatcher,
            state: Arc::new(state_tx),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.settings.endpoint
    }

    /// Open the transport and run the authorize/register handshake.
    ///
    /// On failure the link is torn down and the state returns to
    /// `Disconnected`, so `connect` may simply be called again.
    pub async fn connect(&self, company_name: &str, application_name: &str) -> Result<()> {
        let mut rejected = None;
        self.state.send_if_modified(|state| match *state {
            ConnectionState::Registered => {
                rejected = Some(Error::AlreadyConnected);
                false
            }
            ConnectionState::Connecting | ConnectionState::Authorized => {
                rejected = Some(Error::AlreadyConnecting);
                false
            }
            ConnectionState::Disconnected | ConnectionState::Closed => {
                *state = ConnectionState::Connecting;
                true
            }
        });
        if let Some(err) = rejected {
            return Err(err);
        }

        let endpoint = &self.settings.endpoint;
        tracing::info!(%endpoint, company_name, application_name, "Connecting to host");
        match self.handshake(company_name, application_name).await {
            Ok(()) => {
                tracing::info!(%endpoint, "Connection registered");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%endpoint, error = %err, "Connection handshake failed");
                if let Some(link) = self.dispatcher.detach().await {
                    link.transport().close().await;
                }
                self.state.send_if_modified(|state| {
                    if *state == ConnectionState::Closed {
                        return false;
                    }
                    *state = ConnectionState::Disconnected;
                    true
                });
                Err(err)
            }
        }
    }

    async fn handshake(&self, company_name: &str, application_name: &str) -> Result<()> {
        let connection = self.connector.open(&self.settings.endpoint).await?;
        let (transport, receiver) = Transport::open(connection, self.settings.max_frame_length);
        let link = self.dispatcher.attach(transport, receiver).await;

        let identity = Value::map([
            ("company_name", company_name),
            ("application_name", application_name),
        ]);
        let timeout = self.settings.handshake_timeout;

        let authorized = match self
            .dispatcher
            .run_command(CommandId::AuthorizeConnection, &identity, timeout)
            .await
        {
            Ok(payload) => payload
                .get("is_authorized")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Err(Error::Command(e)) => return Err(Error::AuthorizationDenied(e.to_string())),
            Err(e) => return Err(e),
        };
        if !authorized {
            return Err(Error::AuthorizationDenied(format!(
                "host refused {company_name}/{application_name}"
            )));
        }
        self.advance(ConnectionState::Connecting, ConnectionState::Authorized)?;

        let registered = match self
            .dispatcher
            .run_command(CommandId::RegisterConnection, &identity, timeout)
            .await
        {
            Ok(payload) => payload,
            Err(Error::Command(e)) => return Err(Error::AuthorizationDenied(e.to_string())),
            Err(e) => return Err(e),
        };
        if let Some(session_id) = registered
            .get("session_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
        {
            tracing::debug!(session_id, "Host assigned session id");
            link.set_session_id(session_id.to_string());
        }

        self.advance(ConnectionState::Authorized, ConnectionState::Registered)?;
        self.spawn_link_monitor(link);
        Ok(())
    }

    /// Move `from -> to`. Fails if something else (a concurrent `close`)
    /// changed the state in between.
    fn advance(&self, from: ConnectionState, to: ConnectionState) -> Result<()> {
        let moved = self.state.send_if_modified(|state| {
            if *state != from {
                return false;
            }
            *state = to;
            true
        });
        if moved {
            tracing::debug!(%from, %to, "Connection state changed");
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    /// Drop back to `Disconnected` if the link dies under a registered
    /// session.
    fn spawn_link_monitor(&self, link: Arc<Link>) {
        let closed = link.transport().closed();
        let dispatcher = Arc::clone(&self.dispatcher);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            closed.cancelled().await;
            if !dispatcher.is_current(&link).await {
                return;
            }
            let dropped = state.send_if_modified(|s| {
                if *s != ConnectionState::Registered {
                    return false;
                }
                *s = ConnectionState::Disconnected;
                true
            });
            if dropped {
                tracing::warn!("Host link lost, session is now disconnected");
            }
        });
    }

    /// Send a best-effort disconnect notice and release the transport.
    ///
    /// Safe to call in any state, and more than once. Pending requests are
    /// resolved with a closed-transport error.
    pub async fn close(&self) {
        let previous = self.state.send_replace(ConnectionState::Closed);
        let Some(link) = self.dispatcher.detach().await else {
            tracing::debug!(%previous, "Close with no live link");
            return;
        };

        let notice = ClientMessage::Disconnect {
            session_id: link.session_id().map(str::to_string),
        };
        let deadline = deadline_after(DISCONNECT_NOTICE_TIMEOUT);
        match link.transport().send(notice, deadline).await {
            Ok(()) => tracing::debug!("Disconnect notice sent"),
            Err(e) => tracing::debug!(error = %e, "Disconnect notice not sent"),
        }
        link.transport().close().await;
        tracing::info!(endpoint = %self.settings.endpoint, "Connection closed");
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("endpoint", &self.settings.endpoint)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
