//! Adapters that wrap a [`RepositoryProvider`] and implement the individual
//! repository traits, so generic services can each hold their own handle to
//! a shared provider.

use crate::{
    Error, User,
    code::{CodePurpose, NewVerificationCode, VerificationCode},
    repositories::{
        CodeRepository, CodeRepositoryProvider, RepositoryProvider, TodoRepository,
        TodoRepositoryProvider, UserRepository, UserRepositoryProvider,
    },
    todo::{NewTodo, Todo},
    user::NewUser,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct UserRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.users().create(user).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.provider.users().find_by_username(username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.provider.users().find_by_email(email).await
    }

    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, Error> {
        self.provider
            .users()
            .find_by_username_or_email(identifier)
            .await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, Error> {
        self.provider.users().exists_by_username(username).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, Error> {
        self.provider.users().exists_by_email(email).await
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        self.provider.users().update(user).await
    }
}

pub struct CodeRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> CodeRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> CodeRepository for CodeRepositoryAdapter<R> {
    async fn insert(&self, code: NewVerificationCode) -> Result<VerificationCode, Error> {
        self.provider.codes().insert(code).await
    }

    async fn find_and_consume(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>, Error> {
        self.provider
            .codes()
            .find_and_consume(email, code, purpose, now)
            .await
    }

    async fn mark_all_used(&self, email: &str, purpose: CodePurpose) -> Result<(), Error> {
        self.provider.codes().mark_all_used(email, purpose).await
    }

    async fn delete_expired_before(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.codes().delete_expired_before(now).await
    }
}

pub struct TodoRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> TodoRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> TodoRepository for TodoRepositoryAdapter<R> {
    async fn insert(&self, todo: NewTodo) -> Result<Todo, Error> {
        self.provider.todos().insert(todo).await
    }

    async fn find_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, Error> {
        self.provider.todos().find_due_between(start, end).await
    }
}
