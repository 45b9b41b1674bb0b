//! Change notifications.

use crate::model::TodoItem;

/// What happened to the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListAction {
    Add,
    Update,
    Delete,
}

impl ListAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListAction::Add => "add",
            ListAction::Update => "update",
            ListAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ListAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published after a mutation has completed on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoEvent {
    pub action: ListAction,
    pub item: TodoItem,
}

impl TodoEvent {
    pub fn new(action: ListAction, item: TodoItem) -> Self {
        Self { action, item }
    }
}
