//! Typed CRUD against one remote table.
//!
//! # Wire Protocol
//! ```text
//! GET    tables/{name}?ZUMO-API-VERSION=3.0.0   → [items] or { items, nextLink }
//! GET    tables/{name}/{id}                     → item | 404
//! POST   tables/{name}                          → 201 item
//! PUT    tables/{name}/{id}   If-Match: "v"     → 200 item | 409/412 item
//! DELETE tables/{name}/{id}   If-Match: "v"     → 204 | 409/412 item
//! ```
//! Every request also carries `ZUMO-API-VERSION` and
//! `X-ZUMO-INSTALLATION-ID` headers.

use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCEPT, CONTENT_TYPE, IF_MATCH};
use hyper::{Method, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use std::marker::PhantomData;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::model::{validate_id, TableRecord};

pub const API_VERSION_HEADER: &str = "zumo-api-version";
pub const API_VERSION_QUERY: &str = "ZUMO-API-VERSION";
pub const INSTALLATION_ID_HEADER: &str = "x-zumo-installation-id";

/// One page of a list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    items: Vec<T>,
    #[serde(default)]
    next_link: Option<String>,
}

/// Client for a single table of `T` records.
pub struct RemoteTable<T> {
    client: HttpClient,
    table_uri: Url,
    api_version: String,
    installation_id: String,
    _record: PhantomData<fn() -> T>,
}

impl<T: TableRecord> RemoteTable<T> {
    /// Bind a pipeline to `{service_uri}/tables/{table}`.
    pub fn new(client: HttpClient, endpoint: &EndpointConfig, installation_id: Uuid) -> Result<Self> {
        let mut table_uri = Url::parse(&endpoint.service_uri).map_err(|e| {
            Error::Argument(format!("invalid service URI '{}': {}", endpoint.service_uri, e))
        })?;
        let table = if endpoint.table.is_empty() {
            T::TABLE_NAME
        } else {
            endpoint.table.as_str()
        };
        table_uri
            .path_segments_mut()
            .map_err(|_| Error::Argument(format!("service URI '{}' cannot be a base", endpoint.service_uri)))?
            .pop_if_empty()
            .push("tables")
            .push(table);
        table_uri.set_query(None);

        Ok(Self {
            client,
            table_uri,
            api_version: endpoint.api_version.clone(),
            installation_id: installation_id.to_string(),
            _record: PhantomData,
        })
    }

    /// Address of the table collection.
    pub fn table_uri(&self) -> &Url {
        &self.table_uri
    }

    /// Read every record, following `nextLink` pages. Each page is read at
    /// most once.
    pub async fn list(&self) -> Result<Vec<T>> {
        let mut url = self.table_uri.clone();
        url.query_pairs_mut()
            .append_pair(API_VERSION_QUERY, &self.api_version);

        let mut items = Vec::new();
        let mut visited = HashSet::new();
        loop {
            visited.insert(url.clone());
            let response = self.send(self.request(Method::GET, &url, None, None)?).await?;
            let response = check_status(response)?;

            let value: serde_json::Value = serde_json::from_slice(response.body())?;
            let next = match value {
                serde_json::Value::Array(_) => {
                    items.extend(serde_json::from_value::<Vec<T>>(value)?);
                    None
                }
                serde_json::Value::Object(_) => {
                    let page: Page<T> = serde_json::from_value(value)?;
                    items.extend(page.items);
                    page.next_link
                }
                other => {
                    return Err(Error::Deserialize(serde::de::Error::custom(format!(
                        "expected an array or a page of items, got {}",
                        other
                    ))))
                }
            };

            match next {
                Some(link) => {
                    let next_url = self.table_uri.join(&link).map_err(|e| {
                        Error::Transport(format!("invalid nextLink '{}': {}", link, e))
                    })?;
                    if visited.contains(&next_url) {
                        tracing::warn!(next_link = %link, "nextLink points at a page already read; stopping");
                        break;
                    }
                    url = next_url;
                }
                None => break,
            }
        }

        tracing::debug!(count = items.len(), table = %self.table_uri, "Listed items");
        Ok(items)
    }

    /// Read one record; `None` when the server has no such id.
    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        let url = self.item_uri(id)?;
        let response = self.send(self.request(Method::GET, &url, None, None)?).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        Ok(Some(serde_json::from_slice(response.body())?))
    }

    /// Create a record; the server assigns id and metadata.
    pub async fn insert(&self, item: &T) -> Result<T> {
        let body = serde_json::to_vec(item)?;
        let request = self.request(Method::POST, &self.table_uri, Some(body), None)?;
        let response = check_status(self.send(request).await?)?;
        Ok(serde_json::from_slice(response.body())?)
    }

    /// Overwrite an existing record.
    pub async fn replace(&self, item: &T) -> Result<T> {
        let id = required_id(item)?;
        let url = self.item_uri(id)?;
        let body = serde_json::to_vec(item)?;
        let request = self.request(Method::PUT, &url, Some(body), item.version())?;
        let response = check_status(self.send(request).await?)?;
        Ok(serde_json::from_slice(response.body())?)
    }

    /// Remove a record.
    pub async fn delete(&self, item: &T) -> Result<()> {
        let id = required_id(item)?;
        let url = self.item_uri(id)?;
        let request = self.request(Method::DELETE, &url, None, item.version())?;
        check_status(self.send(request).await?)?;
        Ok(())
    }

    fn item_uri(&self, id: &str) -> Result<Url> {
        validate_id(id)?;
        let mut url = self.table_uri.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Argument("table URI cannot be a base".to_string()))?
            .push(id);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        url: &Url,
        body: Option<Vec<u8>>,
        version: Option<&str>,
    ) -> Result<HttpRequest> {
        let mut builder = hyper::Request::builder()
            .method(method)
            .uri(url.as_str())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(API_VERSION_HEADER, self.api_version.as_str())
            .header(INSTALLATION_ID_HEADER, self.installation_id.as_str());

        if let Some(version) = version {
            builder = builder.header(IF_MATCH, format!("\"{}\"", version));
        }

        let body = match body {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Bytes::from(bytes)
            }
            None => Bytes::new(),
        };

        builder
            .body(body)
            .map_err(|e| Error::Argument(format!("failed to build request: {}", e)))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.client.clone().oneshot(request).await
    }
}

fn required_id<T: TableRecord>(item: &T) -> Result<&str> {
    item.id()
        .ok_or_else(|| Error::Argument("item has no id".to_string()))
}

/// Map non-success statuses onto the error taxonomy.
fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
        return Err(Error::Conflict {
            status: status.as_u16(),
            server_item: serde_json::from_slice(response.body()).ok(),
        });
    }

    Err(Error::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
        body: String::from_utf8_lossy(response.body()).into_owned(),
    })
}
