//! Todo data services.
//!
//! # Data Flow
//! ```text
//! consumer (view model, CLI)
//!     → TodoService (list / save / remove / refresh / subscribe)
//!     → remote.rs (argument checks, init-once guard, notifications)
//!     → table.rs (typed CRUD requests, status + body decoding)
//!     → http pipeline
//! ```

use std::future::Future;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::model::{TodoEvent, TodoItem};

pub mod remote;
pub mod table;

pub use remote::{ConnectionState, RemoteTodoService};
pub use table::RemoteTable;

/// Operations a to-do list front end needs from its data source.
pub trait TodoService: Send + Sync {
    /// All items currently stored.
    fn get_items(&self) -> impl Future<Output = Result<Vec<TodoItem>>> + Send;

    /// Bring local state up to date with the store.
    fn refresh_items(&self) -> impl Future<Output = Result<()>> + Send;

    /// Delete an item. Unsaved items are ignored; `None` is an argument error.
    fn remove_item(&self, item: Option<&TodoItem>) -> impl Future<Output = Result<()>> + Send;

    /// Insert (no id) or replace (id set) an item, returning the stored copy.
    /// `None` is an argument error.
    fn save_item(&self, item: Option<&TodoItem>) -> impl Future<Output = Result<TodoItem>> + Send;

    /// Receive a notification after each successful mutation.
    fn subscribe(&self) -> broadcast::Receiver<TodoEvent>;
}
