//! Outbound HTTP pipeline.
//!
//! # Data Flow
//! ```text
//! RemoteTable builds HttpRequest
//!     → auth.rs (attach cached token, optional)
//!     → logging.rs (log request, forward unchanged, log response)
//!     → transport.rs (reqwest, built once by a Connector)
//!     → HttpResponse back up the stack
//! ```
//!
//! # Design Decisions
//! - Each stage is a tower `Layer`; the assembled stack is boxed as a
//!   `Clone + Send + Sync` service and cloned per call
//! - Bodies are fully buffered (`Bytes`) so stages can log them without
//!   consuming them

use hyper::body::Bytes;
use tower::util::BoxCloneSyncService;

use crate::error::Error;

pub mod auth;
pub mod logging;
pub mod transport;

/// Request flowing down the pipeline.
pub type HttpRequest = hyper::Request<Bytes>;

/// Response flowing back up the pipeline.
pub type HttpResponse = hyper::Response<Bytes>;

/// A type-erased pipeline (any stack of layers over a transport).
pub type HttpClient = BoxCloneSyncService<HttpRequest, HttpResponse, Error>;

pub use auth::{AuthLayer, AuthToken, FnTokenProvider, StaticTokenProvider, TokenProvider};
pub use logging::LoggingLayer;
pub use transport::{Connector, ReqwestConnector, ReqwestTransport};
