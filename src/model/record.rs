//! Sync metadata shared by every table record.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest identifier the service accepts.
pub const MAX_ID_LEN: usize = 127;

/// Server-managed metadata. The client never sets these; the service stamps
/// them on every insert and replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemProperties {
    /// Last modification time on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Opaque concurrency token, sent back as `If-Match`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Soft-delete marker.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

/// A record type stored in one named remote table.
pub trait TableRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Default table name, used when the configuration does not name one.
    const TABLE_NAME: &'static str;

    /// Identifier assigned by the store; `None` until first insert.
    fn id(&self) -> Option<&str>;

    fn system(&self) -> &SystemProperties;

    /// True when the record has never been persisted.
    fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// Version token for optimistic concurrency, if the server issued one.
    fn version(&self) -> Option<&str> {
        self.system().version.as_deref()
    }
}

/// Validate a client-visible identifier.
///
/// Accepted ids start with an ASCII letter or digit, continue with letters,
/// digits or `_ . | : -`, and are at most 127 characters long.
pub fn validate_id(id: &str) -> Result<()> {
    let mut chars = id.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_alphanumeric())
        .unwrap_or(false);
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '|' | ':' | '-'));

    if first_ok && rest_ok && id.len() <= MAX_ID_LEN {
        Ok(())
    } else {
        Err(Error::Argument(format!("invalid item id '{}'", id)))
    }
}
