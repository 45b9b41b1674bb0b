//! Remote todo service.
//!
//! # State Machine
//! ```text
//! Uninitialized → Initializing → Ready
//!       ↑              │
//!       └── failure / cancellation ───┘
//! ```
//! The connection (pipeline + table binding) is built on first use. Callers
//! racing on first use wait on the same initialization; once `Ready` the
//! service never reconnects.
//!
//! # Design Decisions
//! - Argument checks run before initialization or any request
//! - Every failure is logged here, then returned unchanged
//! - Notifications go out on a broadcast channel after the server confirms

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, OnceCell};
use tower::{Layer, ServiceBuilder};
use uuid::Uuid;

use crate::config::{validate_config, ClientConfig, ConfigError};
use crate::error::{Error, Result};
use crate::http::{AuthLayer, Connector, HttpClient, LoggingLayer, ReqwestConnector, TokenProvider};
use crate::model::{validate_id, ListAction, TodoEvent, TodoItem};
use crate::observability::metrics;
use crate::service::table::RemoteTable;
use crate::service::TodoService;

/// Buffered notifications per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 64;

/// Connection state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
}

impl From<u8> for ConnectionState {
    fn from(val: u8) -> Self {
        match val {
            1 => ConnectionState::Initializing,
            2 => ConnectionState::Ready,
            _ => ConnectionState::Uninitialized,
        }
    }
}

/// A [`TodoService`] backed by a remote table.
pub struct RemoteTodoService {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    installation_id: Uuid,
    table: OnceCell<RemoteTable<TodoItem>>,
    state: AtomicU8,
    events: broadcast::Sender<TodoEvent>,
}

impl RemoteTodoService {
    /// Create an unauthenticated service. Nothing is connected until first use.
    pub fn new(config: ClientConfig) -> Result<Self> {
        validate_config(&config).map_err(|errors| Error::Config(ConfigError::Validation(errors)))?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            config,
            connector: Arc::new(ReqwestConnector),
            token_provider: None,
            installation_id: Uuid::new_v4(),
            table: OnceCell::new(),
            state: AtomicU8::new(ConnectionState::Uninitialized as u8),
            events,
        })
    }

    /// Authenticate every request with tokens from `provider`.
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Replace the transport factory.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state.load(Ordering::Acquire).into()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Identifier sent with every request from this client.
    pub fn installation_id(&self) -> Uuid {
        self.installation_id
    }

    /// Read one item by id.
    pub async fn get_item(&self, id: &str) -> Result<Option<TodoItem>> {
        validate_id(id)?;
        let table = self.table().await?;
        table
            .get(id)
            .await
            .inspect_err(|e| tracing::error!(id = %id, error = %e, "Failed to read item"))
    }

    async fn table(&self) -> Result<&RemoteTable<TodoItem>> {
        self.table.get_or_try_init(|| self.initialize()).await
    }

    async fn initialize(&self) -> Result<RemoteTable<TodoItem>> {
        let mut guard = InitGuard::new(&self.state);

        match self.connect().await {
            Ok(table) => {
                guard.complete();
                tracing::info!(
                    table_uri = %table.table_uri(),
                    authenticated = self.token_provider.is_some(),
                    "Remote table initialized"
                );
                Ok(table)
            }
            Err(e) => {
                tracing::error!(error = %e, "Remote table initialization failed");
                Err(e)
            }
        }
    }

    async fn connect(&self) -> Result<RemoteTable<TodoItem>> {
        let transport = self.connector.connect(&self.config).await?;
        let logging = LoggingLayer::from_config(&self.config.observability, &self.config.auth);

        let client = match &self.token_provider {
            Some(provider) => HttpClient::new(
                ServiceBuilder::new()
                    .layer(AuthLayer::new(provider.clone(), &self.config.auth)?)
                    .layer(logging)
                    .service(transport),
            ),
            None => HttpClient::new(logging.layer(transport)),
        };

        RemoteTable::new(client, &self.config.endpoint, self.installation_id)
    }

    fn publish(&self, action: ListAction, item: TodoItem) {
        tracing::debug!(action = %action, id = ?item.id, "Publishing change notification");
        metrics::record_event(action);
        // No subscribers is not an error.
        let _ = self.events.send(TodoEvent::new(action, item));
    }
}

/// Marks the state `Initializing` while alive. Unless completed, dropping it
/// (on failure or when the caller's future is cancelled) puts the state
/// back to `Uninitialized`.
struct InitGuard<'a> {
    state: &'a AtomicU8,
    done: bool,
}

impl<'a> InitGuard<'a> {
    fn new(state: &'a AtomicU8) -> Self {
        state.store(ConnectionState::Initializing as u8, Ordering::Release);
        Self { state, done: false }
    }

    fn complete(&mut self) {
        self.state.store(ConnectionState::Ready as u8, Ordering::Release);
        self.done = true;
    }
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.state
                .store(ConnectionState::Uninitialized as u8, Ordering::Release);
        }
    }
}

fn require_item(item: Option<&TodoItem>) -> Result<&TodoItem> {
    item.ok_or_else(|| Error::Argument("item must not be absent".to_string()))
}

impl TodoService for RemoteTodoService {
    async fn get_items(&self) -> Result<Vec<TodoItem>> {
        let table = self.table().await?;
        table
            .list()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to list items"))
    }

    async fn refresh_items(&self) -> Result<()> {
        // A remote table has no local copy to refresh.
        self.table().await.map(|_| ())
    }

    async fn remove_item(&self, item: Option<&TodoItem>) -> Result<()> {
        let item = require_item(item)?;
        let Some(id) = item.id.as_deref() else {
            tracing::debug!("Item was never saved; nothing to delete");
            return Ok(());
        };
        validate_id(id)?;

        let table = self.table().await?;
        table
            .delete(item)
            .await
            .inspect_err(|e| tracing::error!(id = %id, error = %e, "Failed to delete item"))?;

        self.publish(ListAction::Delete, item.clone());
        Ok(())
    }

    async fn save_item(&self, item: Option<&TodoItem>) -> Result<TodoItem> {
        let item = require_item(item)?;
        if let Some(id) = item.id.as_deref() {
            validate_id(id)?;
        }

        let table = self.table().await?;
        let (action, saved) = match item.id {
            None => (ListAction::Add, table.insert(item).await),
            Some(_) => (ListAction::Update, table.replace(item).await),
        };
        let saved = saved.inspect_err(
            |e| tracing::error!(action = %action, id = ?item.id, error = %e, "Failed to save item"),
        )?;

        self.publish(action, saved.clone());
        Ok(saved)
    }

    fn subscribe(&self) -> broadcast::Receiver<TodoEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for RemoteTodoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTodoService")
            .field("service_uri", &self.config.endpoint.service_uri)
            .field("table", &self.config.endpoint.table)
            .field("state", &self.state())
            .field("authenticated", &self.token_provider.is_some())
            .finish()
    }
}
