//! The to-do record.

use serde::{Deserialize, Serialize};

use crate::model::record::{SystemProperties, TableRecord};

/// A single to-do entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Assigned by the service on first insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub is_complete: bool,

    #[serde(flatten)]
    pub system: SystemProperties,
}

impl TodoItem {
    /// A new, unsaved item.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

impl TableRecord for TodoItem {
    const TABLE_NAME: &'static str = "todoitem";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn system(&self) -> &SystemProperties {
        &self.system
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_item_is_new() {
        let item = TodoItem::new("buy milk");
        assert!(item.is_new());
        assert_eq!(item.version(), None);
    }

    #[test]
    fn test_new_item_wire_format() {
        let json = serde_json::to_value(TodoItem::new("buy milk")).unwrap();
        assert_eq!(json, json!({ "title": "buy milk", "isComplete": false }));
    }

    #[test]
    fn test_server_item_decodes_metadata() {
        let item: TodoItem = serde_json::from_value(json!({
            "id": "abc",
            "title": "walk dog",
            "isComplete": true,
            "updatedAt": "2024-12-16T11:14:10.000Z",
            "version": "AAAAAAAAB9E=",
            "deleted": false
        }))
        .unwrap();

        assert_eq!(item.id(), Some("abc"));
        assert!(item.is_complete);
        assert_eq!(item.version(), Some("AAAAAAAAB9E="));
        assert!(item.system.updated_at.is_some());
        assert!(!item.is_new());
    }

    #[test]
    fn test_missing_fields_default() {
        let item: TodoItem = serde_json::from_value(json!({ "id": "x" })).unwrap();
        assert_eq!(item.title, "");
        assert!(!item.is_complete);
        assert_eq!(item.system, SystemProperties::default());
    }
}
