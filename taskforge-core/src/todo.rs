//! Task item contract.
//!
//! Item CRUD lives outside this crate; the core only needs enough of the
//! item shape to drive the due-reminder scan, which resolves owners by
//! username and formats the due time for the notification body.

use crate::id::generate_prefixed_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,

    /// Username of the owning user.
    pub username: String,

    pub title: String,

    pub description: Option<String>,

    pub completed: bool,

    pub due_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Input for inserting a task item.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub id: String,
    pub username: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTodo {
    pub fn new(username: String, title: String) -> Self {
        Self {
            id: generate_prefixed_id("todo"),
            username,
            title,
            description: None,
            due_date: None,
        }
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }
}
