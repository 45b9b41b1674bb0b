//! Client library for a hosted to-do table service.
//!
//! ```text
//!   TodoListViewModel ──▶ TodoService (RemoteTodoService)
//!          ▲                     │  init-once: Connector → pipeline → RemoteTable
//!          │                     ▼
//!   broadcast<TodoEvent>   AuthLayer → LoggingLayer → ReqwestTransport ──▶ tables/{name}
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod observability;
pub mod service;
pub mod viewmodel;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use model::{ListAction, TodoEvent, TodoItem};
pub use service::{RemoteTodoService, TodoService};
pub use viewmodel::{Presenter, TodoListViewModel};
