//! Headless view model for a to-do list screen.
//!
//! # Responsibilities
//! - Hold the observable list of items shown to the user
//! - Translate user intents (refresh, add, toggle, delete) into service calls
//! - Keep the list in step with change notifications
//! - Surface failures to the user through a [`Presenter`]
//!
//! Rendering is left to whatever front end subscribes to [`TodoListViewModel::items`].

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::model::{ListAction, TodoEvent, TodoItem};
use crate::service::TodoService;

/// Front-end hook for user-visible alerts.
pub trait Presenter: Send + Sync {
    fn display_error(&self, title: &str, message: &str);
}

pub struct TodoListViewModel<S, P> {
    service: Arc<S>,
    presenter: P,
    items: watch::Sender<Vec<TodoItem>>,
    is_refreshing: watch::Sender<bool>,
}

impl<S, P> TodoListViewModel<S, P>
where
    S: TodoService + 'static,
    P: Presenter + 'static,
{
    pub fn new(service: Arc<S>, presenter: P) -> Self {
        let (items, _) = watch::channel(Vec::new());
        let (is_refreshing, _) = watch::channel(false);
        Self {
            service,
            presenter,
            items,
            is_refreshing,
        }
    }

    /// Observable list of items.
    pub fn items(&self) -> watch::Receiver<Vec<TodoItem>> {
        self.items.subscribe()
    }

    /// Current list contents.
    pub fn snapshot(&self) -> Vec<TodoItem> {
        self.items.borrow().clone()
    }

    /// True while a refresh is in flight.
    pub fn is_refreshing(&self) -> watch::Receiver<bool> {
        self.is_refreshing.subscribe()
    }

    /// Reload the whole list from the service.
    pub async fn load_items(&self) {
        self.is_refreshing.send_replace(true);

        let loaded = match self.service.refresh_items().await {
            Ok(()) => self.service.get_items().await,
            Err(e) => Err(e),
        };
        match loaded {
            Ok(items) => {
                tracing::debug!(count = items.len(), "Items loaded");
                self.items.send_replace(items);
            }
            Err(e) => self.alert(&format!("Error loading items: {}", e)),
        }

        self.is_refreshing.send_replace(false);
    }

    /// Create a new item with the given title.
    pub async fn add_item(&self, title: &str) {
        let item = TodoItem::new(title);
        match self.service.save_item(Some(&item)).await {
            Ok(saved) => self.apply(&TodoEvent::new(ListAction::Add, saved)),
            Err(e) => self.report(&e),
        }
    }

    /// Set the completion flag of the item with `id`.
    pub async fn update_item(&self, id: &str, is_complete: bool) {
        let Some(mut item) = self.find(id) else {
            tracing::warn!(id = %id, "Update requested for an item that is not in the list");
            return;
        };
        item.is_complete = is_complete;

        match self.service.save_item(Some(&item)).await {
            Ok(saved) => self.apply(&TodoEvent::new(ListAction::Update, saved)),
            Err(e) => self.report(&e),
        }
    }

    /// Delete the item with `id`.
    pub async fn delete_item(&self, id: &str) {
        let item = self.find(id);
        match self.service.remove_item(item.as_ref()).await {
            Ok(()) => {
                if let Some(item) = item {
                    self.apply(&TodoEvent::new(ListAction::Delete, item));
                }
            }
            Err(e) => self.report(&e),
        }
    }

    /// Fold a change notification into the list. Applying the same event
    /// twice leaves the list unchanged.
    pub fn apply(&self, event: &TodoEvent) {
        let Some(id) = event.item.id.as_deref() else {
            return;
        };

        self.items.send_modify(|items| {
            let position = items.iter().position(|i| i.id.as_deref() == Some(id));
            match (event.action, position) {
                (ListAction::Add, None) => items.push(event.item.clone()),
                (ListAction::Add, Some(idx)) | (ListAction::Update, Some(idx)) => {
                    items[idx] = event.item.clone();
                }
                (ListAction::Update, None) => {}
                (ListAction::Delete, Some(idx)) => {
                    items.remove(idx);
                }
                (ListAction::Delete, None) => {}
            }
        });
    }

    /// Apply service notifications in the background. The task ends when
    /// the view model or the service goes away.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.service.subscribe();
        let mut alive = self.items.subscribe();
        let this = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    received = events.recv() => match received {
                        Ok(event) => match this.upgrade() {
                            Some(vm) => vm.apply(&event),
                            None => break,
                        },
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Dropped change notifications; list may be stale");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    // Errors once the view model (and its list sender) is dropped.
                    changed = alive.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Notification listener stopped");
        })
    }

    fn find(&self, id: &str) -> Option<TodoItem> {
        self.items
            .borrow()
            .iter()
            .find(|i| i.id.as_deref() == Some(id))
            .cloned()
    }

    fn report(&self, error: &Error) {
        self.alert(&error.to_string());
    }

    fn alert(&self, message: &str) {
        self.presenter.display_error("Error", message);
    }
}
