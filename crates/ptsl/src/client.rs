//! Caller-facing client.
//!
//! Wraps the session manager, dispatcher and task poller behind one object.
//! `Client` is `Send + Sync`; share it through an `Arc` to issue commands
//! from several tasks at once over the single connection.

use std::sync::Arc;
use std::time::Duration;

use ptsl_catalog::{Catalog, CommandId, StaticCatalog};

use crate::bridge::transport::{Connector, Endpoint, SocketConnector};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::session::{ConnectionState, SessionManager};
use crate::task::{self, TaskHandle, TaskResult};
use crate::value::Value;
use crate::wire::WireCodec;

#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    session: SessionManager,
}

impl Client {
    /// Client using real sockets and the built-in command table.
    pub fn new(config: ClientConfig) -> Self {
        let connector = Arc::new(SocketConnector::new(config.connect_timeout));
        Self::with_parts(config, connector, Arc::new(StaticCatalog::builtin()))
    }

    pub fn with_parts(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        let session = SessionManager::new(
            config.session_settings(),
            connector,
            WireCodec::new(catalog),
        );
        Self { config, session }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.session.endpoint()
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Open the connection and identify this application to the host.
    pub async fn connect(&self, company_name: &str, application_name: &str) -> Result<()> {
        self.session.connect(company_name, application_name).await
    }

    /// Run a command with the configured request timeout.
    pub async fn run_command(&self, command: CommandId, args: impl Into<Value>) -> Result<Value> {
        self.run_command_with_timeout(command, args, self.config.request_timeout)
            .await
    }

    pub async fn run_command_with_timeout(
        &self,
        command: CommandId,
        args: impl Into<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        let args = args.into();
        self.session
            .dispatcher()
            .run_command(command, &args, timeout)
            .await
    }

    /// Start a long-running command; redeem the handle with
    /// [`await_task`](Self::await_task).
    pub async fn submit_task(
        &self,
        command: CommandId,
        args: impl Into<Value>,
    ) -> Result<TaskHandle> {
        let args = args.into();
        self.session
            .dispatcher()
            .submit_task(command, &args, self.config.request_timeout)
            .await
    }

    pub async fn await_task(
        &self,
        handle: &TaskHandle,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Result<TaskResult> {
        task::await_task(
            self.session.dispatcher(),
            handle,
            poll_interval,
            max_wait,
            self.config.request_timeout,
        )
        .await
    }

    /// [`await_task`](Self::await_task) with the configured interval and
    /// wait limit.
    pub async fn await_task_default(&self, handle: &TaskHandle) -> Result<TaskResult> {
        self.await_task(handle, self.config.poll_interval, self.config.max_task_wait)
            .await
    }

    pub async fn close(&self) {
        self.session.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn client_is_shareable() {
        assert_send_sync::<Client>();
    }

    #[tokio::test]
    async fn commands_before_connect_are_rejected() {
        let client = Client::new(ClientConfig::default());
        assert_eq!(client.state(), ConnectionState::Disconnected);
        let err = client
            .run_command(CommandId::GetSessionName, Value::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::NotConnected));
    }
}
