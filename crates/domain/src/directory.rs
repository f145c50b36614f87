//! Lookups for the delivery/payment methods and users an order refers to.
//!
//! These are owned by other parts of the store; the lifecycle only needs to
//! know that a referenced record exists and, for methods, what it is for.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{MethodId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::DomainError;

/// What a method may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodKind {
    Delivery,
    Payment,
}

impl std::fmt::Display for MethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodKind::Delivery => write!(f, "delivery"),
            MethodKind::Payment => write!(f, "payment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub id: MethodId,
    pub kind: MethodKind,
    pub name: String,
}

impl Method {
    pub fn delivery(name: impl Into<String>) -> Self {
        Self {
            id: MethodId::new(),
            kind: MethodKind::Delivery,
            name: name.into(),
        }
    }

    pub fn payment(name: impl Into<String>) -> Self {
        Self {
            id: MethodId::new(),
            kind: MethodKind::Payment,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

#[async_trait]
pub trait MethodDirectory: Send + Sync {
    async fn method(&self, id: MethodId) -> Result<Option<Method>, DomainError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user(&self, id: UserId) -> Result<Option<User>, DomainError>;
}

/// In-memory directory of methods and users.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    methods: Arc<RwLock<HashMap<MethodId, Method>>>,
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_method(&self, method: Method) {
        self.methods.write().await.insert(method.id, method);
    }

    pub async fn add_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl MethodDirectory for InMemoryDirectory {
    async fn method(&self, id: MethodId) -> Result<Option<Method>, DomainError> {
        Ok(self.methods.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn user(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}
