use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use taskforge_core::{
    Error,
    error::StorageError,
    repositories::TodoRepository,
    todo::{NewTodo, Todo},
};

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteTodo {
    id: String,
    username: String,
    title: String,
    description: Option<String>,
    completed: bool,
    due_date: Option<i64>,
    created_at: i64,
}

impl From<SqliteTodo> for Todo {
    fn from(row: SqliteTodo) -> Self {
        Todo {
            id: row.id,
            username: row.username,
            title: row.title,
            description: row.description,
            completed: row.completed,
            due_date: row
                .due_date
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_default(),
        }
    }
}

pub struct SqliteTodoRepository {
    pool: SqlitePool,
}

impl SqliteTodoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn insert(&self, todo: NewTodo) -> Result<Todo, Error> {
        let row = sqlx::query_as::<_, SqliteTodo>(
            r#"
            INSERT INTO todos (id, username, title, description, completed, due_date, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
            RETURNING *
            "#,
        )
        .bind(&todo.id)
        .bind(&todo.username)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.due_date.map(|d| d.timestamp()))
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(row.into())
    }

    async fn find_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, Error> {
        let rows = sqlx::query_as::<_, SqliteTodo>(
            r#"
            SELECT * FROM todos
            WHERE completed = 0 AND due_date IS NOT NULL AND due_date >= ?1 AND due_date < ?2
            ORDER BY due_date ASC
            "#,
        )
        .bind(start.timestamp())
        .bind(end.timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
