//! Records exchanged with the remote table and the change notifications
//! published after each mutation.

pub mod event;
pub mod record;
pub mod todo_item;

pub use event::{ListAction, TodoEvent};
pub use record::{validate_id, SystemProperties, TableRecord};
pub use todo_item::TodoItem;
