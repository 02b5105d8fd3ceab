use crate::{
    Error,
    todo::{NewTodo, Todo},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for task item access.
///
/// The item layer is a plain keyed store owned by the application; the core
/// consumes only what the reminder scan needs.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    /// Insert a new task item
    async fn insert(&self, todo: NewTodo) -> Result<Todo, Error>;

    /// Not-yet-completed items with `start <= due_date < end`
    async fn find_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, Error>;
}
