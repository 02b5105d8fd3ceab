//! Due-item reminder scan.
//!
//! Every tick computes the window `[now + lead, now + lead + scan_window)`
//! and mails the owner of each not-yet-completed item whose due time falls
//! inside it. One failing item never aborts the rest of the batch, and one
//! failing run never stops future runs.

use crate::{
    AppConfig, Error,
    repositories::{TodoRepository, UserRepository},
    services::Notifier,
    todo::Todo,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Human-readable due time for the reminder body.
pub(crate) fn format_due_date(due: Option<DateTime<Utc>>) -> String {
    match due {
        Some(due) => due.format("%b %-d, %Y at %-I:%M %p").to_string(),
        None => "No due date".to_string(),
    }
}

pub struct ReminderService<T: TodoRepository, U: UserRepository> {
    todos: Arc<T>,
    users: Arc<U>,
    notifier: Arc<Notifier>,
    lead: Duration,
    scan_window: Duration,
    interval: std::time::Duration,
}

impl<T: TodoRepository, U: UserRepository> Clone for ReminderService<T, U> {
    fn clone(&self) -> Self {
        Self {
            todos: self.todos.clone(),
            users: self.users.clone(),
            notifier: self.notifier.clone(),
            lead: self.lead,
            scan_window: self.scan_window,
            interval: self.interval,
        }
    }
}

impl<T: TodoRepository, U: UserRepository> ReminderService<T, U> {
    pub fn new(todos: Arc<T>, users: Arc<U>, notifier: Arc<Notifier>, config: &AppConfig) -> Self {
        Self {
            todos,
            users,
            notifier,
            lead: config.reminder_lead,
            scan_window: config.reminder_scan_window,
            interval: config.reminder_interval,
        }
    }

    /// Run a single scan at `now`. Returns the number of reminders sent.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        let window_start = now + self.lead;
        let window_end = window_start + self.scan_window;

        let due = self
            .todos
            .find_due_between(window_start, window_end)
            .await?;

        tracing::debug!(count = due.len(), "Found items due for reminder");

        let mut sent = 0;
        for todo in &due {
            match self.remind(todo).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(todo.id = %todo.id, error = %e, "Failed to send reminder");
                }
            }
        }

        Ok(sent)
    }

    /// Send one reminder. `Ok(false)` means the item was skipped because
    /// its owner or their email is missing.
    async fn remind(&self, todo: &Todo) -> Result<bool, Error> {
        let Some(user) = self.users.find_by_username(&todo.username).await? else {
            tracing::warn!(todo.id = %todo.id, username = %todo.username, "User not found for item");
            return Ok(false);
        };

        if user.email.trim().is_empty() {
            tracing::warn!(username = %user.username, "User has no email address for reminder");
            return Ok(false);
        }

        let due = format_due_date(todo.due_date);

        self.notifier
            .send_todo_reminder(&user.email, &user.username, &todo.title, &due)
            .await?;

        tracing::info!(todo.id = %todo.id, username = %user.username, "Sent reminder");

        Ok(true)
    }

    /// Start the periodic reminder scan.
    pub fn start(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let service = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match service.run_once(Utc::now()).await {
                            Ok(sent) if sent > 0 => {
                                tracing::info!(count = sent, "Reminder scan completed");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Reminder scan failed");
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down reminder scan task");
                        break;
                    }
                }
            }
        })
    }
}
