//! Identity service access: sign-in, registration, verification, reset.

pub mod jwt;
pub mod memory;
pub mod rest;
pub mod validation;

pub use memory::InMemoryAuth;
pub use rest::IdentityToolkit;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The signed-in account as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
    /// Bearer token for document database requests, when the backend issues one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Send a verification email to the signed-in account.
    async fn send_email_verification(&self) -> Result<()>;

    async fn send_password_reset(&self, email: &str) -> Result<()>;

    fn sign_out(&self);

    fn current_user(&self) -> Option<AuthUser>;

    /// Observe sign-in and sign-out.
    fn watch_user(&self) -> watch::Receiver<Option<AuthUser>>;
}
